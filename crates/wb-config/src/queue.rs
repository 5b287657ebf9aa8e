use serde::Deserialize;

use crate::types::HumanDuration;

/// Required prefix for work-queue names, so a worker can never drain a queue
/// that belongs to another system.
pub const QUEUE_NAME_PREFIX: &str = "waterbodies_";

/// Work-queue settings, deserialized from `[queue]`.
///
/// The queue itself is provisioned externally; visibility timeout, receive
/// count and dead-letter routing are applied there, not by the consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub name: String,
    #[serde(default = "default_visibility")]
    pub visibility_timeout: HumanDuration,
    /// Deliveries before a message is routed to the dead-letter queue.
    #[serde(default = "default_max_receive")]
    pub max_receive_count: u32,
    #[serde(default)]
    pub dead_letter: Option<String>,
}

fn default_visibility() -> HumanDuration {
    "2m".parse().expect("literal duration")
}

fn default_max_receive() -> u32 {
    5
}

/// Check the `waterbodies_` naming convention for a queue (the dead-letter
/// queue included).
pub fn validate_queue_name(name: &str) -> anyhow::Result<()> {
    if !name.starts_with(QUEUE_NAME_PREFIX) {
        anyhow::bail!("queue name {name:?} must start with {QUEUE_NAME_PREFIX:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_name_prefix_enforced() {
        assert!(validate_queue_name("waterbodies_backlog").is_ok());
        assert!(validate_queue_name("backlog").is_err());
    }

    #[test]
    fn queue_config_defaults() {
        let q: QueueConfig = toml::from_str(r#"name = "waterbodies_backlog""#).unwrap();
        assert_eq!(q.visibility_timeout, "2m".parse().unwrap());
        assert_eq!(q.max_receive_count, 5);
        assert!(q.dead_letter.is_none());
    }
}
