//! Driving the time-series engine over a source of waterbody polygons.

use std::collections::HashMap;

use chrono::Utc;
use wb_core::engine::{RunOutcome, TimeSeriesEngine};
use wb_core::polygon::PolygonRecord;
use wb_core::raster::RasterSource;

use crate::error::RuntimeResult;
use crate::queue::WorkQueue;
use crate::retry::RetryPolicy;

// ---------------------------------------------------------------------------
// BatchSummary
// ---------------------------------------------------------------------------

/// Per-outcome counts for one batch. A batch "succeeds" by completing;
/// individual polygon failures are recorded here, not raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub written: usize,
    pub no_new_data: usize,
    pub no_csv_for_append: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn tally(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Written => self.written += 1,
            RunOutcome::NoNewData => self.no_new_data += 1,
            RunOutcome::NoCsvForAppend => self.no_csv_for_append += 1,
        }
    }
}

/// Index records by uid for queue-mode shape resolution.
pub fn index_by_uid(records: Vec<PolygonRecord>) -> HashMap<String, PolygonRecord> {
    records
        .into_iter()
        .map(|record| (record.uid.clone(), record))
        .collect()
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// Sequentially feeds polygons into the engine, from either a fixed list or
/// a work queue. Per-polygon raster IO dominates the cost, so there is
/// nothing to gain from overlap inside one worker.
pub struct Consumer<R: RasterSource> {
    engine: TimeSeriesEngine<R>,
    retry: RetryPolicy,
}

impl<R: RasterSource> Consumer<R> {
    pub fn new(engine: TimeSeriesEngine<R>, retry: RetryPolicy) -> Self {
        Self { engine, retry }
    }

    pub fn engine(&self) -> &TimeSeriesEngine<R> {
        &self.engine
    }

    /// Process a fixed polygon list. Transient failures are retried by the
    /// policy; a polygon that still fails is logged and skipped, never
    /// fatal to the batch.
    pub async fn run_list(&self, polygons: &[PolygonRecord]) -> BatchSummary {
        let total = polygons.len();
        let mut summary = BatchSummary::default();
        for (ix, polygon) in polygons.iter().enumerate() {
            wb_info!(pipe, uid = %polygon.uid, "processing ({}/{total})", ix + 1);
            summary.processed += 1;
            let today = Utc::now().date_naive();
            let result = self
                .retry
                .run(&polygon.uid, || self.engine.process(polygon, today))
                .await;
            match result {
                Ok(outcome) => summary.tally(outcome),
                Err(e) => {
                    wb_warn!(pipe, uid = %polygon.uid, error = %e, "giving up on polygon");
                    summary.failed += 1;
                }
            }
        }
        wb_info!(
            sys,
            written = summary.written,
            failed = summary.failed,
            "batch complete"
        );
        summary
    }

    /// Drain a queue of uids. A message is acknowledged only on a persisted
    /// success or a definitive no-op; anything else is left in flight for
    /// the queue's own redelivery policy. Returns when a poll comes back
    /// empty.
    pub async fn run_queue(
        &self,
        queue: &dyn WorkQueue,
        index: &HashMap<String, PolygonRecord>,
    ) -> RuntimeResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        loop {
            let Some(message) = queue.receive().await? else {
                wb_info!(queue, "no messages received, stopping");
                break;
            };
            let uid = message.body.trim();
            let Some(polygon) = index.get(uid) else {
                wb_warn!(queue, uid = %uid, "unknown waterbody id, leaving message");
                continue;
            };

            wb_info!(queue, uid = %uid, "processing");
            summary.processed += 1;
            let today = Utc::now().date_naive();
            match self.engine.process(polygon, today).await {
                Ok(outcome @ (RunOutcome::Written | RunOutcome::NoNewData)) => {
                    summary.tally(outcome);
                    queue.acknowledge(&message).await?;
                }
                Ok(outcome) => {
                    // NoCsvForAppend: terminal for this polygon, but the
                    // message stays for the queue's redelivery accounting.
                    summary.tally(outcome);
                }
                Err(e) => {
                    wb_warn!(queue, uid = %uid, error = %e, "processing failed, leaving message");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use geo::{LineString, Polygon};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wb_config::{RunConfig, Thresholds};
    use wb_core::error::{CoreReason, CoreResult};
    use wb_core::history::HistoryStore;
    use wb_core::raster::RasterCube;
    use wb_core::window::TimeWindow;

    fn record(uid: &str) -> PolygonRecord {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (400.0, 0.0),
            (400.0, 300.0),
            (0.0, 300.0),
            (0.0, 0.0),
        ]);
        PolygonRecord {
            uid: uid.to_string(),
            region: None,
            geometry: Polygon::new(exterior, vec![]),
        }
    }

    fn one_step_cube() -> RasterCube {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        RasterCube::new(vec![ts], 2, 2, vec![vec![128u8; 4]], vec![true; 4]).unwrap()
    }

    /// Fails the first `failures` loads, then serves a one-step cube.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RasterSource for FlakySource {
        async fn load(
            &self,
            _geometry: &Polygon<f64>,
            _window: &TimeWindow,
        ) -> CoreResult<Option<RasterCube>> {
            use orion_error::prelude::*;
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return StructError::from(CoreReason::RasterQuery)
                    .with_detail("connection reset")
                    .err();
            }
            Ok(Some(one_step_cube()))
        }
    }

    fn consumer(
        dir: &std::path::Path,
        failures: u32,
        max_attempts: u32,
    ) -> Consumer<FlakySource> {
        let run = RunConfig {
            output_dir: dir.to_path_buf(),
            time_span: Default::default(),
            start_date: None,
            end_date: None,
            missing_only: false,
            filter_region: None,
            size: Default::default(),
            include_uncertainty: false,
            product: "wofs_albers".to_string(),
            max_lookback_days: None,
        };
        let engine = TimeSeriesEngine::new(
            FlakySource {
                failures,
                calls: AtomicU32::new(0),
            },
            HistoryStore::new(dir),
            run,
            Thresholds::default(),
        );
        Consumer::new(engine, RetryPolicy::new(max_attempts, Duration::ZERO))
    }

    #[tokio::test]
    async fn list_mode_retries_transient_failures() {
        let dir = tempfile::tempdir().unwrap();
        let consumer = consumer(dir.path(), 1, 2);
        let summary = consumer.run_list(&[record("aaaa1111")]).await;
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 0);
        assert!(consumer.engine().store().exists("aaaa1111"));
    }

    #[tokio::test]
    async fn list_mode_skips_a_polygon_that_keeps_failing() {
        let dir = tempfile::tempdir().unwrap();
        // First polygon burns both attempts; the second then succeeds.
        let consumer = consumer(dir.path(), 2, 2);
        let summary = consumer
            .run_list(&[record("aaaa1111"), record("bbbb2222")])
            .await;
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 1);
        assert!(!consumer.engine().store().exists("aaaa1111"));
        assert!(consumer.engine().store().exists("bbbb2222"));
    }

    #[tokio::test]
    async fn queue_mode_acknowledges_successes_only() {
        let dir = tempfile::tempdir().unwrap();
        // One failure: the first message's processing fails and stays in
        // flight; the second succeeds and is acknowledged.
        let consumer = consumer(dir.path(), 1, 1);
        let queue = MemoryQueue::new(["aaaa1111", "bbbb2222"]);
        let index = index_by_uid(vec![record("aaaa1111"), record("bbbb2222")]);

        let summary = consumer.run_queue(&queue, &index).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(queue.unacknowledged().await, vec!["aaaa1111".to_string()]);
    }

    #[tokio::test]
    async fn queue_mode_leaves_unknown_ids_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let consumer = consumer(dir.path(), 0, 1);
        let queue = MemoryQueue::new(["who-dis"]);
        let index = index_by_uid(vec![]);

        let summary = consumer.run_queue(&queue, &index).await.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(queue.unacknowledged().await, vec!["who-dis".to_string()]);
    }
}
