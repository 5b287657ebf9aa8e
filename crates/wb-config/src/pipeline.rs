use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::chunks::ChunksConfig;
use crate::logging::LoggingConfig;
use crate::queue::QueueConfig;
use crate::run::{RetryConfig, RunConfig, Thresholds};
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PipelineConfigRaw {
    run: RunConfig,
    #[serde(default)]
    thresholds: Thresholds,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    chunks: Option<ChunksConfig>,
    #[serde(default)]
    queue: Option<QueueConfig>,
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// PipelineConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// The whole `waterbodies.toml`, validated. Passed by value into the
/// components that need it; nothing here is mutated after load.
#[derive(Debug)]
pub struct PipelineConfig {
    pub run: RunConfig,
    pub thresholds: Thresholds,
    pub retry: RetryConfig,
    pub chunks: Option<ChunksConfig>,
    pub queue: Option<QueueConfig>,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Read and parse a `waterbodies.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }
}

impl FromStr for PipelineConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: PipelineConfigRaw = toml::from_str(toml_str)?;

        let config = PipelineConfig {
            run: raw.run,
            thresholds: raw.thresholds,
            retry: raw.retry,
            chunks: raw.chunks,
            queue: raw.queue,
            logging: raw.logging,
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SizeClass, TimeSpan};

    const FULL_TOML: &str = r#"
[run]
output_dir = "timeseries"
time_span = "custom"
start_date = "2019-01-01"
end_date = "2019-12-01"
missing_only = true
filter_region = "NSW"
size = "small"
include_uncertainty = true
product = "wofs_albers"

[thresholds]
invalid_percent = 5.0
large_polygon_m2 = 1000000.0

[retry]
max_attempts = 3
backoff = "1s"

[chunks]
contexts = "contexts.json"
manifest_dir = "chunks"
missing_only = true

[queue]
name = "waterbodies_backlog"
visibility_timeout = "5m"
dead_letter = "waterbodies_deadletter"

[logging]
level = "debug"
format = "json"
"#;

    #[test]
    fn full_config_parses() {
        let config: PipelineConfig = FULL_TOML.parse().unwrap();
        assert_eq!(config.run.time_span, TimeSpan::Custom);
        assert_eq!(config.run.size, SizeClass::Small);
        assert_eq!(config.run.filter_region.as_deref(), Some("NSW"));
        assert_eq!(config.thresholds.invalid_percent, 5.0);
        // Unset thresholds keep their defaults.
        assert_eq!(config.thresholds.window_span_years, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.queue.unwrap().name, "waterbodies_backlog");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn minimal_config_parses() {
        let config: PipelineConfig = "[run]\noutput_dir = \"ts\"".parse().unwrap();
        assert_eq!(config.run.time_span, TimeSpan::All);
        assert!(config.chunks.is_none());
        assert!(config.queue.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn custom_span_requires_both_dates() {
        let err = "[run]\noutput_dir = \"ts\"\ntime_span = \"custom\""
            .parse::<PipelineConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn dates_require_custom_span() {
        let err = "[run]\noutput_dir = \"ts\"\nstart_date = \"2019-01-01\""
            .parse::<PipelineConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("custom"));
    }

    #[test]
    fn inverted_range_rejected() {
        let toml = r#"
[run]
output_dir = "ts"
time_span = "custom"
start_date = "2020-01-01"
end_date = "2019-01-01"
"#;
        assert!(toml.parse::<PipelineConfig>().is_err());
    }

    #[test]
    fn foreign_queue_name_rejected() {
        let toml = r#"
[run]
output_dir = "ts"

[queue]
name = "someone-elses-queue"
"#;
        assert!(toml.parse::<PipelineConfig>().is_err());
    }
}
