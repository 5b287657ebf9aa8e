//! Per-polygon time-series extraction.
//!
//! Drives one polygon through window planning, raster queries, per-time-step
//! classification and the merge into its persisted CSV, and reports how the
//! run ended. Transient failures (raster source errors, malformed cubes,
//! store IO) surface as `Err` and are retried by the consumption loop;
//! everything else is a terminal [`RunOutcome`].

use chrono::NaiveDate;
use wb_config::{RunConfig, Thresholds, TimeSpan};

use crate::classify::{self, ObservationResult};
use crate::error::CoreResult;
use crate::history::HistoryStore;
use crate::polygon::PolygonRecord;
use crate::raster::RasterSource;
use crate::window::{self, WindowPlan};

/// Terminal state of one polygon's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Rows were merged into the polygon's CSV.
    Written,
    /// No window produced observations (or nothing newer than the stored
    /// tail); the existing history is untouched.
    NoNewData,
    /// Append was requested but the polygon has no CSV yet.
    NoCsvForAppend,
}

pub struct TimeSeriesEngine<R: RasterSource> {
    raster: R,
    store: HistoryStore,
    run: RunConfig,
    thresholds: Thresholds,
}

impl<R: RasterSource> TimeSeriesEngine<R> {
    pub fn new(raster: R, store: HistoryStore, run: RunConfig, thresholds: Thresholds) -> Self {
        Self {
            raster,
            store,
            run,
            thresholds,
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Run the full extraction for one polygon. `today` bounds the planned
    /// windows; callers pass the current UTC date.
    pub async fn process(
        &self,
        polygon: &PolygonRecord,
        today: NaiveDate,
    ) -> CoreResult<RunOutcome> {
        let uid = polygon.uid.as_str();

        // Append planning needs the persisted tail before anything else.
        let last = match self.run.time_span {
            TimeSpan::Append => self.store.last_timestamp(uid).await,
            _ => None,
        };

        let windows = match window::plan(
            self.run.time_span,
            self.run.custom_range(),
            polygon.envelope_area(),
            last,
            &self.thresholds,
            self.run.max_lookback_days,
            today,
        ) {
            WindowPlan::Ranges(windows) => windows,
            WindowPlan::NoHistory => {
                log::info!("{uid}: no CSV to append to");
                return Ok(RunOutcome::NoCsvForAppend);
            }
        };

        let cutoff = self
            .thresholds
            .admission_cutoff(self.run.include_uncertainty);

        // A polygon narrower than one pixel cannot be rasterised into a
        // meaningful mask; tally the whole queried extent instead.
        let min_extent = self.thresholds.min_maskable_extent_m;
        let apply_mask = polygon
            .envelope()
            .is_some_and(|r| r.width() > min_extent && r.height() > min_extent);

        let mut rows: Vec<ObservationResult> = Vec::new();
        let mut sample_size = 0u64;

        for win in &windows {
            let Some(cube) = self.raster.load(&polygon.geometry, win).await? else {
                log::debug!("{uid}: no observations in {}..{}", win.start, win.end);
                continue;
            };
            let mask = apply_mask.then(|| cube.footprint());
            for (ix, timestamp) in cube.timestamps().iter().enumerate() {
                let tally = classify::tally(cube.layer(ix), mask);
                sample_size = tally.masked_total;
                rows.push(classify::observe(*timestamp, &tally, cutoff));
            }
        }

        if rows.is_empty() {
            log::info!("{uid}: no new data");
            return Ok(RunOutcome::NoNewData);
        }

        match self.run.time_span {
            TimeSpan::Append => {
                // Never rewrite the persisted tail: drop anything at or
                // before the last stored timestamp.
                if let Some(last) = last {
                    rows.retain(|row| row.timestamp > last);
                }
                if rows.is_empty() {
                    log::info!("{uid}: nothing newer than the stored tail");
                    return Ok(RunOutcome::NoNewData);
                }
                self.store
                    .append(uid, &rows, self.run.include_uncertainty)
                    .await?;
            }
            TimeSpan::All | TimeSpan::Custom => {
                self.store
                    .overwrite(uid, &rows, sample_size, self.run.include_uncertainty)
                    .await?;
            }
        }

        log::info!("{uid}: wrote {} rows", rows.len());
        Ok(RunOutcome::Written)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
