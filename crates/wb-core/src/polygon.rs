//! Waterbody polygons and the vector-store boundary.

use std::collections::HashSet;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::{Polygon, Rect};
use serde::{Deserialize, Serialize};
use wb_config::SizeClass;

use crate::error::CoreResult;
use crate::history::HistoryStore;

// ---------------------------------------------------------------------------
// PolygonContext — attribute view used by chunk allocation
// ---------------------------------------------------------------------------

/// Identity, area estimate and region label for one waterbody, as exported
/// from the vector store. This is all the allocator needs; geometries stay
/// behind until a worker actually processes the polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonContext {
    pub uid: String,
    /// Envelope (bounding-box) area in square metres.
    pub area: f64,
    #[serde(default)]
    pub region: Option<String>,
}

// ---------------------------------------------------------------------------
// PolygonRecord — resolved shape used by the engine
// ---------------------------------------------------------------------------

/// A waterbody shape ready for time-series extraction. Geometries are in a
/// projected CRS, so planar measures are metres.
#[derive(Debug, Clone)]
pub struct PolygonRecord {
    pub uid: String,
    pub region: Option<String>,
    pub geometry: Polygon<f64>,
}

impl PolygonRecord {
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Bounding-box area in square metres. Degenerate geometries report 0.
    pub fn envelope_area(&self) -> f64 {
        self.envelope()
            .map(|r| r.width() * r.height())
            .unwrap_or(0.0)
    }

    pub fn context(&self) -> PolygonContext {
        PolygonContext {
            uid: self.uid.clone(),
            area: self.envelope_area(),
            region: self.region.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// PolygonSource — vector-store boundary
// ---------------------------------------------------------------------------

/// Read-only boundary to the vector store holding the waterbody polygon set.
///
/// Implementations resolve the identity attribute (see [`crate::ids`]) and
/// normalise uids before handing records out.
pub trait PolygonSource: Send + Sync {
    fn polygons(&self) -> CoreResult<Vec<PolygonRecord>>;
}

// ---------------------------------------------------------------------------
// Record filtering
// ---------------------------------------------------------------------------

/// Filters narrowing a polygon set before processing.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Only these uids (queue mode, or an explicit id list).
    pub allow: Option<HashSet<String>>,
    /// Only polygons carrying this region label.
    pub region: Option<String>,
    pub size: SizeClass,
    /// Envelope-area boundary between `small` and `huge`.
    pub small_cutoff_m2: f64,
}

impl RecordFilter {
    pub fn matches(&self, record: &PolygonRecord) -> bool {
        if let Some(allow) = &self.allow
            && !allow.contains(&record.uid)
        {
            return false;
        }
        if let Some(region) = &self.region
            && record.region.as_deref() != Some(region.as_str())
        {
            return false;
        }
        match self.size {
            SizeClass::All => true,
            SizeClass::Small => record.envelope_area() <= self.small_cutoff_m2,
            SizeClass::Huge => record.envelope_area() > self.small_cutoff_m2,
        }
    }
}

/// Read the polygon set from the vector store and narrow it for one run.
pub fn load_polygons(
    source: &dyn PolygonSource,
    filter: &RecordFilter,
    missing_only: Option<&HistoryStore>,
) -> CoreResult<Vec<PolygonRecord>> {
    Ok(filter_records(source.polygons()?, filter, missing_only))
}

/// Apply `filter`, then optionally drop records that already have persisted
/// output.
pub fn filter_records(
    records: Vec<PolygonRecord>,
    filter: &RecordFilter,
    missing_only: Option<&HistoryStore>,
) -> Vec<PolygonRecord> {
    records
        .into_iter()
        .filter(|r| filter.matches(r))
        .filter(|r| missing_only.is_none_or(|store| !store.exists(&r.uid)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn rect_record(uid: &str, region: Option<&str>, w: f64, h: f64) -> PolygonRecord {
        let exterior = LineString::from(vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h), (0.0, 0.0)]);
        PolygonRecord {
            uid: uid.to_string(),
            region: region.map(str::to_string),
            geometry: Polygon::new(exterior, vec![]),
        }
    }

    #[test]
    fn envelope_area_is_width_times_height() {
        let r = rect_record("a", None, 200.0, 50.0);
        assert_eq!(r.envelope_area(), 10_000.0);
    }

    #[test]
    fn filter_by_region() {
        let records = vec![
            rect_record("a", Some("NSW"), 10.0, 10.0),
            rect_record("b", Some("QLD"), 10.0, 10.0),
            rect_record("c", None, 10.0, 10.0),
        ];
        let filter = RecordFilter {
            region: Some("NSW".to_string()),
            ..Default::default()
        };
        let kept = filter_records(records, &filter, None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].uid, "a");
    }

    #[test]
    fn filter_by_allow_list() {
        let records = vec![
            rect_record("a", None, 10.0, 10.0),
            rect_record("b", None, 10.0, 10.0),
        ];
        let filter = RecordFilter {
            allow: Some(HashSet::from(["b".to_string()])),
            ..Default::default()
        };
        let kept = filter_records(records, &filter, None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].uid, "b");
    }

    #[test]
    fn filter_by_size_class() {
        // 100 x 100 = 10,000 m² vs 1000 x 1000 = 1,000,000 m².
        let records = vec![
            rect_record("small", None, 100.0, 100.0),
            rect_record("huge", None, 1000.0, 1000.0),
        ];
        let base = RecordFilter {
            small_cutoff_m2: 200_000.0,
            ..Default::default()
        };

        let small = filter_records(
            records.clone(),
            &RecordFilter {
                size: SizeClass::Small,
                ..base.clone()
            },
            None,
        );
        assert_eq!(small[0].uid, "small");
        assert_eq!(small.len(), 1);

        let huge = filter_records(
            records,
            &RecordFilter {
                size: SizeClass::Huge,
                ..base
            },
            None,
        );
        assert_eq!(huge[0].uid, "huge");
        assert_eq!(huge.len(), 1);
    }
}
