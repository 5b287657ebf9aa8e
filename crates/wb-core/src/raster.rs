//! The classified-raster boundary: observation cubes and the source trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::Polygon;
use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult};
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// RasterCube
// ---------------------------------------------------------------------------

/// A stack of classified observations over one polygon's extent.
///
/// `layers` holds one row-major `rows x cols` code grid per timestamp, in
/// chronological order. `footprint` is the polygon rasterised onto the same
/// grid (`true` = inside), produced by the source alongside the data.
#[derive(Debug, Clone)]
pub struct RasterCube {
    timestamps: Vec<DateTime<Utc>>,
    rows: usize,
    cols: usize,
    layers: Vec<Vec<u8>>,
    footprint: Vec<bool>,
}

impl RasterCube {
    /// Build a cube, validating its shape. A source handing back mismatched
    /// layer sizes or out-of-order timestamps is malformed; the caller
    /// treats that as a transient query failure.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        rows: usize,
        cols: usize,
        layers: Vec<Vec<u8>>,
        footprint: Vec<bool>,
    ) -> CoreResult<Self> {
        if layers.len() != timestamps.len() {
            return StructError::from(CoreReason::DataFormat)
                .with_detail(format!(
                    "{} layers for {} timestamps",
                    layers.len(),
                    timestamps.len()
                ))
                .err();
        }
        let cells = rows * cols;
        if footprint.len() != cells {
            return StructError::from(CoreReason::DataFormat)
                .with_detail(format!(
                    "footprint has {} cells, grid is {rows}x{cols}",
                    footprint.len()
                ))
                .err();
        }
        if let Some(bad) = layers.iter().position(|l| l.len() != cells) {
            return StructError::from(CoreReason::DataFormat)
                .with_detail(format!(
                    "layer {bad} has {} cells, grid is {rows}x{cols}",
                    layers[bad].len()
                ))
                .err();
        }
        if timestamps.windows(2).any(|pair| pair[0] > pair[1]) {
            return StructError::from(CoreReason::DataFormat)
                .with_detail("timestamps out of chronological order")
                .err();
        }
        Ok(Self {
            timestamps,
            rows,
            cols,
            layers,
            footprint,
        })
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn layer(&self, ix: usize) -> &[u8] {
        &self.layers[ix]
    }

    pub fn footprint(&self) -> &[bool] {
        &self.footprint
    }
}

// ---------------------------------------------------------------------------
// RasterSource
// ---------------------------------------------------------------------------

/// Boundary to the remote classification product.
///
/// `Ok(None)` means the product has no observations for the window, which
/// is a normal outcome, not an error. `Err` is a transient query failure
/// and eligible for retry upstream.
#[async_trait]
pub trait RasterSource: Send + Sync {
    async fn load(
        &self,
        geometry: &Polygon<f64>,
        window: &TimeWindow,
    ) -> CoreResult<Option<RasterCube>>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
