//! Time-window planning.
//!
//! Decides which date ranges to query for a polygon. Pure: the caller
//! injects `today` and the persisted tail, so plans are reproducible.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use wb_config::{Thresholds, TimeSpan};

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// An inclusive date range handed to the raster source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The planner's decision for one polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPlan {
    /// Query these, in order.
    Ranges(Vec<TimeWindow>),
    /// Append was requested but the polygon has no persisted history.
    NoHistory,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Plan the query windows for one polygon.
pub fn plan(
    mode: TimeSpan,
    custom: Option<(NaiveDate, NaiveDate)>,
    envelope_area_m2: f64,
    last_timestamp: Option<DateTime<Utc>>,
    thresholds: &Thresholds,
    max_lookback_days: Option<i64>,
    today: NaiveDate,
) -> WindowPlan {
    match mode {
        TimeSpan::All => WindowPlan::Ranges(plan_full_history(
            envelope_area_m2,
            thresholds,
            today,
        )),
        TimeSpan::Append => match last_timestamp {
            Some(last) => WindowPlan::Ranges(vec![plan_append(
                last,
                max_lookback_days,
                today,
            )]),
            None => WindowPlan::NoHistory,
        },
        TimeSpan::Custom => WindowPlan::Ranges(
            custom
                .map(|(start, end)| vec![TimeWindow { start, end }])
                .unwrap_or_default(),
        ),
    }
}

/// Full history from the product epoch. Large polygons produce raster cubes
/// proportional to elapsed time, so their history is cut into fixed-width
/// year blocks queried one at a time.
pub fn plan_full_history(
    envelope_area_m2: f64,
    thresholds: &Thresholds,
    today: NaiveDate,
) -> Vec<TimeWindow> {
    let current_year = today.year();
    if envelope_area_m2 > thresholds.large_polygon_m2 {
        let span = thresholds.window_span_years.max(1);
        (thresholds.epoch_year..=current_year)
            .step_by(span as usize)
            .map(|year| TimeWindow {
                start: jan1(year),
                end: dec31(year + span - 1),
            })
            .collect()
    } else {
        vec![TimeWindow {
            start: jan1(thresholds.epoch_year),
            end: dec31(current_year),
        }]
    }
}

/// One window covering everything after the persisted tail, optionally
/// clamped to a maximum lookback.
pub fn plan_append(
    last_timestamp: DateTime<Utc>,
    max_lookback_days: Option<i64>,
    today: NaiveDate,
) -> TimeWindow {
    let mut start = last_timestamp.date_naive() + Days::new(1);
    if let Some(max_days) = max_lookback_days {
        let floor = today - Days::new(max_days.max(0) as u64);
        if start < floor {
            start = floor;
        }
    }
    TimeWindow { start, end: today }
}

fn jan1(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).expect("valid calendar date")
}

fn dec31(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).expect("valid calendar date")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
