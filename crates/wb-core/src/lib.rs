//! Core domain logic for turning waterbody polygons into percentage-full
//! time series: identity handling, work chunking, per-pixel classification,
//! time-window planning and the per-polygon extraction engine.

pub mod chunk;
pub mod classify;
pub mod codes;
pub mod engine;
pub mod error;
pub mod history;
pub mod ids;
pub mod polygon;
pub mod raster;
pub mod window;

pub use chunk::{Chunk, ChunkManifest, alloc_chunks};
pub use classify::{ObservationResult, ObservedValues, PixelTally, tally};
pub use engine::{RunOutcome, TimeSeriesEngine};
pub use error::{CoreError, CoreReason, CoreResult};
pub use history::HistoryStore;
pub use polygon::{PolygonContext, PolygonRecord, PolygonSource, RecordFilter, load_polygons};
pub use raster::{RasterCube, RasterSource};
pub use window::TimeWindow;
