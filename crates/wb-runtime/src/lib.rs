//! Worker runtime: consumption loops, bounded retry, the work-queue
//! boundary and tracing setup.

#[macro_use]
mod log_macros;

pub mod consumer;
pub mod error;
pub mod queue;
pub mod retry;
pub mod tracing_init;

pub use consumer::{BatchSummary, Consumer, index_by_uid};
pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use queue::{MemoryQueue, QueueMessage, WorkQueue};
pub use retry::RetryPolicy;
