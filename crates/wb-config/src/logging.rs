use std::path::PathBuf;

use serde::Deserialize;

/// Logging configuration. Every field has a default so the `[logging]`
/// section may be omitted entirely.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level filter, e.g. `"info"` or `"wb_core=debug,info"`.
    pub level: String,
    /// Optional log file. Relative paths are resolved against the config
    /// file's parent directory.
    pub file: Option<PathBuf>,
    /// `plain` for humans, `json` for log shippers.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
