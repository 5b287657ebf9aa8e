//! Per-waterbody CSV history store.
//!
//! One CSV per polygon at `{root}/{uid[:4]}/{uid}.csv`. Files are always
//! published whole via a same-directory temp file and rename, so an
//! interrupted run leaves either the old file or the new one on disk,
//! never a torn row.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use orion_error::prelude::*;
use tokio::fs;

use crate::classify::ObservationResult;
use crate::error::{CoreError, CoreReason, CoreResult};
use crate::ids::shard_prefix;

/// Timestamp layout of the first CSV column (ISO-8601, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{uid[:4]}/{uid}.csv`.
    pub fn csv_path(&self, uid: &str) -> PathBuf {
        self.root
            .join(shard_prefix(uid))
            .join(format!("{uid}.csv"))
    }

    pub fn exists(&self, uid: &str) -> bool {
        self.csv_path(uid).is_file()
    }

    /// Timestamp of the last persisted row, or `None` when the polygon has
    /// no usable history (missing file, header-only file, unparsable tail).
    pub async fn last_timestamp(&self, uid: &str) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(self.csv_path(uid)).await.ok()?;
        let last_line = content.lines().rev().find(|line| !line.trim().is_empty())?;
        let first_field = last_line.split(',').next()?;
        NaiveDateTime::parse_from_str(first_field, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.and_utc())
    }

    /// Replace the polygon's history with `rows`. The header's pixel-count
    /// column embeds `sample_size`, the last observed masked pixel count,
    /// as a human-readable sanity annotation.
    pub async fn overwrite(
        &self,
        uid: &str,
        rows: &[ObservationResult],
        sample_size: u64,
        include_uncertainty: bool,
    ) -> CoreResult<()> {
        let mut content = header(sample_size, include_uncertainty);
        render_rows(&mut content, rows, include_uncertainty);
        self.publish(uid, content).await
    }

    /// Extend the polygon's history with `rows` (header-less, matching the
    /// overwrite layout). The merged file is published atomically.
    pub async fn append(
        &self,
        uid: &str,
        rows: &[ObservationResult],
        include_uncertainty: bool,
    ) -> CoreResult<()> {
        let path = self.csv_path(uid);
        let mut content = fs::read_to_string(&path)
            .await
            .map_err(|e| store_error(&path, "read for append", e))?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        render_rows(&mut content, rows, include_uncertainty);
        self.publish(uid, content).await
    }

    async fn publish(&self, uid: &str, content: String) -> CoreResult<()> {
        let path = self.csv_path(uid);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| store_error(parent, "create shard directory", e))?;
        }
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| store_error(&tmp, "write", e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| store_error(&path, "publish", e))?;
        Ok(())
    }
}

fn store_error(path: &Path, action: &str, e: std::io::Error) -> CoreError {
    StructError::from(CoreReason::HistoryStore)
        .with_detail(format!("{action} {}: {e}", path.display()))
}

fn header(sample_size: u64, include_uncertainty: bool) -> String {
    let mut header = format!(
        "Observation Date,Wet pixel percentage,Wet pixel count (n = {sample_size})"
    );
    if include_uncertainty {
        header.push_str(",Invalid pixel count");
    }
    header.push('\n');
    header
}

fn render_rows(out: &mut String, rows: &[ObservationResult], include_uncertainty: bool) {
    use std::fmt::Write as _;

    for row in rows {
        let _ = write!(out, "{}", row.timestamp.format(TIMESTAMP_FORMAT));
        match &row.values {
            Some(v) => {
                let _ = write!(out, ",{:.1},{}", v.wet_percent, v.wet_pixels);
                if include_uncertainty {
                    let _ = write!(out, ",{}", v.invalid_pixels);
                }
            }
            None => {
                out.push_str(",,");
                if include_uncertainty {
                    out.push(',');
                }
            }
        }
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
