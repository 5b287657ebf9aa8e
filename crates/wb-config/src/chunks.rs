use std::path::PathBuf;

use serde::Deserialize;

/// Settings for chunk allocation, deserialized from `[chunks]`.
///
/// `contexts` points at the vector store's attribute export: a JSON array of
/// `{uid, area, region}` objects, one per waterbody polygon.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunksConfig {
    pub contexts: PathBuf,
    /// Directory receiving the chunk manifest documents.
    pub manifest_dir: PathBuf,
    /// Allocate only waterbodies without an existing CSV.
    #[serde(default)]
    pub missing_only: bool,
    #[serde(default)]
    pub filter_region: Option<String>,
}
