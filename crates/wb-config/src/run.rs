use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::{HumanDuration, SizeClass, TimeSpan};

// ---------------------------------------------------------------------------
// RunConfig — deserialized from [run]
// ---------------------------------------------------------------------------

/// Settings for a time-series extraction run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Root of the per-waterbody CSV tree.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub time_span: TimeSpan,
    /// Start of the queried range. Only meaningful with `time_span = "custom"`.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// End of the queried range. Only meaningful with `time_span = "custom"`.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Skip waterbodies that already have a CSV under `output_dir`.
    #[serde(default)]
    pub missing_only: bool,
    /// Restrict the run to polygons carrying this region label.
    #[serde(default)]
    pub filter_region: Option<String>,
    #[serde(default)]
    pub size: SizeClass,
    /// Keep every time step regardless of data quality and record the
    /// invalid pixel count alongside the wet counts.
    #[serde(default)]
    pub include_uncertainty: bool,
    /// Name of the classified water product to query.
    #[serde(default = "default_product")]
    pub product: String,
    /// In append mode, never reach further back than this many days even if
    /// the stored history is older.
    #[serde(default)]
    pub max_lookback_days: Option<i64>,
}

fn default_product() -> String {
    "wofs_albers".to_string()
}

impl RunConfig {
    /// The custom query range, when both bounds are present.
    pub fn custom_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds — deserialized from [thresholds]
// ---------------------------------------------------------------------------

/// Empirically derived cut-offs. The defaults come from production runs of
/// the water observation product; override only with domain guidance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// A time step is admitted only when its unclassified-pixel share is
    /// strictly below this percentage (ignored in uncertainty mode).
    pub invalid_percent: f64,
    /// Envelope area above which full-history queries are split into
    /// year blocks to bound the raster cube size.
    pub large_polygon_m2: f64,
    /// Width of those year blocks.
    pub window_span_years: i32,
    /// First year with observations in the product.
    pub epoch_year: i32,
    /// Minimum envelope width/height for polygon masking; anything narrower
    /// than one pixel is tallied over the whole queried extent.
    pub min_maskable_extent_m: f64,
    /// Envelope-area boundary between the `small` and `huge` size classes.
    pub small_polygon_m2: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            invalid_percent: 10.0,
            large_polygon_m2: 2_000_000.0,
            window_span_years: 5,
            epoch_year: 1986,
            min_maskable_extent_m: 25.3,
            small_polygon_m2: 200_000.0,
        }
    }
}

impl Thresholds {
    /// The admission cut-off in effect: uncertainty mode keeps everything
    /// short of fully invalid.
    pub fn admission_cutoff(&self, include_uncertainty: bool) -> f64 {
        if include_uncertainty {
            100.0
        } else {
            self.invalid_percent
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig — deserialized from [retry]
// ---------------------------------------------------------------------------

/// Bounded retry for transient per-polygon failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep before the first retry; doubles on each further attempt.
    pub backoff: HumanDuration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: "500ms".parse().expect("literal duration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
