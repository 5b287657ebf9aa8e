pub mod chunks;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod run;
pub mod types;
pub mod validate;

pub use chunks::ChunksConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use queue::QueueConfig;
pub use run::{RetryConfig, RunConfig, Thresholds};
pub use types::{HumanDuration, SizeClass, TimeSpan};
