//! Per-time-step observation classification and the admission policy.

use chrono::{DateTime, Utc};

use crate::codes::{WaterClass, classify};

// ---------------------------------------------------------------------------
// PixelTally
// ---------------------------------------------------------------------------

/// Pixel counts and percentages for one time step of one waterbody.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTally {
    pub wet: u64,
    pub dry: u64,
    /// All pixels considered after masking.
    pub masked_total: u64,
    /// Considered pixels that are neither wet nor dry.
    pub missing: u64,
    /// Rounded to one decimal.
    pub wet_percent: f64,
    /// Rounded to one decimal.
    pub dry_percent: f64,
    pub invalid_percent: f64,
}

/// Count wet/dry/unclassified pixels over one time step's code slice.
///
/// `mask` selects the pixels considered (the polygon footprint); `None`
/// considers the whole slice, which is how sub-pixel polygons are handled.
/// An empty selection is defined behavior, not an error: the tally reports
/// a fully invalid observation instead of dividing by zero.
pub fn tally(codes: &[u8], mask: Option<&[bool]>) -> PixelTally {
    debug_assert!(mask.is_none_or(|m| m.len() == codes.len()));

    let mut wet = 0u64;
    let mut dry = 0u64;
    let mut masked_total = 0u64;
    for (ix, &code) in codes.iter().enumerate() {
        if mask.is_some_and(|m| !m[ix]) {
            continue;
        }
        masked_total += 1;
        match classify(code) {
            WaterClass::Wet => wet += 1,
            WaterClass::Dry => dry += 1,
            WaterClass::Invalid => {}
        }
    }

    let missing = masked_total - (wet + dry);
    if masked_total == 0 {
        return PixelTally {
            wet,
            dry,
            masked_total,
            missing,
            wet_percent: 0.0,
            dry_percent: 0.0,
            invalid_percent: 100.0,
        };
    }

    let percent = |n: u64| n as f64 / masked_total as f64 * 100.0;
    PixelTally {
        wet,
        dry,
        masked_total,
        missing,
        wet_percent: round1(percent(wet)),
        dry_percent: round1(percent(dry)),
        invalid_percent: percent(missing),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// ObservationResult + admission policy
// ---------------------------------------------------------------------------

/// One output row: a timestamp plus either observed values or an empty
/// marker when the time step failed admission. Rejected steps keep their
/// row so the record stays one-row-per-observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationResult {
    pub timestamp: DateTime<Utc>,
    pub values: Option<ObservedValues>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedValues {
    pub wet_percent: f64,
    pub wet_pixels: u64,
    pub dry_pixels: u64,
    pub invalid_pixels: u64,
    pub invalid_percent: f64,
}

/// Admission policy: a time step's values are kept only when its
/// unclassified share is *strictly* below `cutoff_percent`.
pub fn admit(tally: &PixelTally, cutoff_percent: f64) -> bool {
    tally.invalid_percent < cutoff_percent
}

/// Turn a tally into an output row under the admission policy.
pub fn observe(
    timestamp: DateTime<Utc>,
    tally: &PixelTally,
    cutoff_percent: f64,
) -> ObservationResult {
    let values = admit(tally, cutoff_percent).then(|| ObservedValues {
        wet_percent: tally.wet_percent,
        wet_pixels: tally.wet,
        dry_pixels: tally.dry,
        invalid_pixels: tally.missing,
        invalid_percent: tally.invalid_percent,
    });
    ObservationResult { timestamp, values }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn counts_all_wet_and_dry_variants() {
        let codes = [
            codes::WET_CLEAR,
            codes::WET_SEA,
            codes::WET_LOW_SOLAR,
            codes::WET_SEA_LOW_SOLAR,
            codes::DRY_CLEAR,
            codes::DRY_SEA,
            codes::DRY_LOW_SOLAR,
            2, // cloud
            3,
        ];
        let t = tally(&codes, None);
        assert_eq!(t.wet, 4);
        assert_eq!(t.dry, 3);
        assert_eq!(t.masked_total, 9);
        assert_eq!(t.missing, 2);
        assert_eq!(t.wet_percent, 44.4);
        assert_eq!(t.dry_percent, 33.3);
    }

    #[test]
    fn mask_restricts_the_counted_pixels() {
        let codes = [codes::WET_CLEAR, codes::WET_CLEAR, codes::DRY_CLEAR, 2];
        let mask = [true, false, true, false];
        let t = tally(&codes, Some(&mask));
        assert_eq!(t.masked_total, 2);
        assert_eq!(t.wet, 1);
        assert_eq!(t.dry, 1);
        assert_eq!(t.wet_percent, 50.0);
        assert_eq!(t.invalid_percent, 0.0);
    }

    #[test]
    fn empty_selection_is_fully_invalid_not_an_error() {
        let codes = [codes::WET_CLEAR, codes::DRY_CLEAR];
        let mask = [false, false];
        let t = tally(&codes, Some(&mask));
        assert_eq!(t.masked_total, 0);
        assert_eq!(t.wet_percent, 0.0);
        assert_eq!(t.dry_percent, 0.0);
        assert_eq!(t.invalid_percent, 100.0);
        assert_eq!(t.missing, 0);
    }

    #[test]
    fn admission_is_strictly_below_the_cutoff() {
        // 3 of 20 invalid = 15%; 2 of 20 = 10% exactly.
        let mut fifteen = vec![codes::WET_CLEAR; 17];
        fifteen.extend([2u8; 3]);
        let t15 = tally(&fifteen, None);
        assert_eq!(t15.invalid_percent, 15.0);
        assert!(!admit(&t15, 10.0));
        assert!(admit(&t15, 100.0));

        let mut ten = vec![codes::WET_CLEAR; 18];
        ten.extend([2u8; 2]);
        let t10 = tally(&ten, None);
        assert_eq!(t10.invalid_percent, 10.0);
        assert!(!admit(&t10, 10.0), "exactly at the cutoff is rejected");
    }

    #[test]
    fn rejected_rows_keep_their_timestamp() {
        let all_cloud = [2u8; 4];
        let t = tally(&all_cloud, None);
        let row = observe(ts(), &t, 10.0);
        assert_eq!(row.timestamp, ts());
        assert!(row.values.is_none());
    }

    #[test]
    fn admitted_rows_carry_the_tally() {
        let codes = [codes::WET_CLEAR, codes::WET_CLEAR, codes::DRY_CLEAR];
        let t = tally(&codes, None);
        let row = observe(ts(), &t, 10.0);
        let values = row.values.unwrap();
        assert_eq!(values.wet_pixels, 2);
        assert_eq!(values.dry_pixels, 1);
        assert_eq!(values.wet_percent, 66.7);
        assert_eq!(values.invalid_pixels, 0);
        assert_eq!(values.invalid_percent, 0.0);
    }
}
