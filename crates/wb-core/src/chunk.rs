//! Area-balanced allocation of waterbodies into work chunks.
//!
//! A run over the full continental polygon set is split across independent
//! workers. Per-polygon cost is dominated by the raster cube, which scales
//! with polygon area, so chunks are balanced by area rather than by count.

use serde::{Deserialize, Serialize};

use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult};
use crate::history::HistoryStore;
use crate::polygon::PolygonContext;

// ---------------------------------------------------------------------------
// Memory model
// ---------------------------------------------------------------------------

/// Empirical linear model of peak worker memory per polygon: area in m²,
/// result in MiB. The slope was fitted against production runs; the
/// intercept covers the process baseline.
const MEM_SLOPE_MI_PER_M2: f64 = 1.627_162_372_884_191_5e-5;
const MEM_INTERCEPT_MI: f64 = 320.0;

fn estimated_mem_mi(area_m2: f64) -> f64 {
    area_m2 * MEM_SLOPE_MI_PER_M2 + MEM_INTERCEPT_MI
}

// ---------------------------------------------------------------------------
// Chunk / ChunkManifest
// ---------------------------------------------------------------------------

/// One unit of work: a set of waterbody uids plus the peak memory a worker
/// needs for it. Peak memory is the *max* over members, not the sum; only
/// one raster cube is resident at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "max_mem_Mi")]
    pub max_mem_mi: f64,
    pub ids: Vec<String>,
}

/// The allocator's output document, consumed by the job submission layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub chunks: Vec<Chunk>,
}

// ---------------------------------------------------------------------------
// Pre-allocation filtering
// ---------------------------------------------------------------------------

/// Narrow the context set before allocation: optional region label match,
/// optional skip of uids with existing persisted output, optional skip-list
/// of uids already handled elsewhere.
pub fn filter_contexts(
    contexts: Vec<PolygonContext>,
    region: Option<&str>,
    existing: Option<&HistoryStore>,
    processed: Option<&std::collections::HashSet<String>>,
) -> Vec<PolygonContext> {
    contexts
        .into_iter()
        .filter(|c| region.is_none_or(|r| c.region.as_deref() == Some(r)))
        .filter(|c| existing.is_none_or(|store| !store.exists(&c.uid)))
        .filter(|c| processed.is_none_or(|done| !done.contains(&c.uid)))
        .collect()
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Split `contexts` into exactly `n_chunks` area-balanced chunks.
///
/// Contexts are placed largest-first against a per-chunk area budget that is
/// recomputed from the *remaining* area and chunk count every time a chunk
/// closes, so the tail of small polygons spreads evenly instead of
/// inheriting the stale global average. A single polygon larger than the
/// budget gets a chunk to itself; it is never split. Surplus chunks are
/// returned empty. Fails when polygons remain after the last chunk closes.
pub fn alloc_chunks(
    mut contexts: Vec<PolygonContext>,
    n_chunks: usize,
) -> CoreResult<Vec<Chunk>> {
    if n_chunks == 0 {
        return StructError::from(CoreReason::ChunkAlloc)
            .with_detail("chunk count must be positive")
            .err();
    }

    // Largest first; stable, so equal areas keep their input order.
    contexts.sort_by(|a, b| b.area.total_cmp(&a.area));

    let total_area: f64 = contexts.iter().map(|c| c.area).sum();
    let mut budget = total_area / n_chunks as f64;

    let mut chunks: Vec<Chunk> = Vec::with_capacity(n_chunks);
    let mut current_ids: Vec<String> = Vec::new();
    let mut current_max_area = 0.0f64;
    let mut accumulated = 0.0f64;

    for (ix, context) in contexts.iter().enumerate() {
        accumulated += context.area;
        current_max_area = current_max_area.max(context.area);
        current_ids.push(context.uid.clone());

        if accumulated < budget {
            continue;
        }

        chunks.push(Chunk {
            max_mem_mi: estimated_mem_mi(current_max_area),
            ids: std::mem::take(&mut current_ids),
        });
        accumulated = 0.0;
        current_max_area = 0.0;

        let rest = &contexts[ix + 1..];
        let remaining_chunks = n_chunks - chunks.len();
        if remaining_chunks == 0 {
            if rest.is_empty() {
                break;
            }
            return StructError::from(CoreReason::ChunkAlloc)
                .with_detail(format!(
                    "{} polygons left but no chunks remaining",
                    rest.len()
                ))
                .err();
        }
        if rest.is_empty() {
            break;
        }
        let remaining_area: f64 = rest.iter().map(|c| c.area).sum();
        budget = remaining_area / remaining_chunks as f64;
    }

    // Float summation order can leave the final accumulation a hair under
    // its budget; close the partial chunk rather than dropping polygons.
    if !current_ids.is_empty() {
        chunks.push(Chunk {
            max_mem_mi: estimated_mem_mi(current_max_area),
            ids: current_ids,
        });
    }

    while chunks.len() < n_chunks {
        chunks.push(Chunk {
            max_mem_mi: 0.0,
            ids: Vec::new(),
        });
    }

    Ok(chunks)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn context(area: f64, uid: &str) -> PolygonContext {
        PolygonContext {
            uid: uid.to_string(),
            area,
            region: Some("NSW".to_string()),
        }
    }

    #[test]
    fn balances_by_area_not_count() {
        let contexts = vec![context(100.0, "a"), context(200.0, "b"), context(100.0, "c")];
        let chunks = alloc_chunks(contexts, 2).unwrap();
        assert_eq!(chunks.len(), 2);
        // The 200-area polygon fills one chunk alone; the two 100-area
        // polygons share the other.
        assert_eq!(chunks[0].ids, vec!["b"]);
        let mut rest = chunks[1].ids.clone();
        rest.sort();
        assert_eq!(rest, vec!["a", "c"]);
    }

    #[test]
    fn surplus_chunks_are_empty() {
        let contexts = vec![context(100.0, "a"), context(200.0, "b"), context(100.0, "c")];
        let chunks = alloc_chunks(contexts, 4).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[3].ids.is_empty());
        assert_eq!(chunks[3].max_mem_mi, 0.0);
    }

    #[test]
    fn no_polygons_yields_all_empty_chunks() {
        let chunks = alloc_chunks(Vec::new(), 3).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.ids.is_empty()));
    }

    #[test]
    fn zero_chunks_is_an_error() {
        assert!(alloc_chunks(vec![context(1.0, "a")], 0).is_err());
    }

    #[test]
    fn exhausted_chunks_with_polygons_left_is_an_error() {
        // Zero-area polygons close a chunk each (0 >= 0), so the third
        // polygon finds no chunk left.
        let contexts = vec![context(0.0, "a"), context(0.0, "b"), context(0.0, "c")];
        assert!(alloc_chunks(contexts, 2).is_err());
    }

    #[test]
    fn partition_fuzz() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let n_poly = rng.gen_range(2..1500);
            let n_chunks = rng.gen_range(1..150);
            let contexts: Vec<PolygonContext> = (0..n_poly)
                .map(|ix| context(rng.gen_range(1..10_000) as f64, &format!("wb{ix:05}")))
                .collect();
            let input_ids: HashSet<String> =
                contexts.iter().map(|c| c.uid.clone()).collect();

            let chunks = alloc_chunks(contexts, n_chunks).unwrap();
            assert_eq!(chunks.len(), n_chunks);

            let mut seen = HashSet::new();
            for chunk in &chunks {
                for id in &chunk.ids {
                    assert!(seen.insert(id.clone()), "{id} allocated twice");
                }
            }
            assert_eq!(seen, input_ids);
        }
    }

    #[test]
    fn peak_memory_is_max_over_members() {
        let contexts = vec![context(1_000_000.0, "big"), context(10.0, "tiny")];
        let chunks = alloc_chunks(contexts, 1).unwrap();
        let expected = 1_000_000.0 * MEM_SLOPE_MI_PER_M2 + MEM_INTERCEPT_MI;
        assert!((chunks[0].max_mem_mi - expected).abs() < 1e-9);
    }

    #[test]
    fn manifest_wire_field_name() {
        let manifest = ChunkManifest {
            chunks: vec![Chunk {
                max_mem_mi: 320.5,
                ids: vec!["a".to_string()],
            }],
        };
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"max_mem_Mi\""));
        let back: ChunkManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn filter_contexts_by_region_and_skip_list() {
        let contexts = vec![
            context(1.0, "a"),
            PolygonContext {
                uid: "b".to_string(),
                area: 1.0,
                region: Some("QLD".to_string()),
            },
            context(1.0, "c"),
        ];
        let processed = HashSet::from(["c".to_string()]);
        let kept = filter_contexts(contexts, Some("NSW"), None, Some(&processed));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].uid, "a");
    }
}
