//! Download worker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the download worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Enable/disable the worker.
    /// When disabled, jobs accumulate in the queue until it is turned on.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often to claim the next job (milliseconds).
    /// At most one job is claimed per tick.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single fetch and move (seconds).
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Upper bound on a single transcode (seconds).
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,

    /// Maximum concurrent handlers (0 = unlimited).
    /// When the limit is reached, ticks are skipped without claiming.
    #[serde(default)]
    pub max_in_flight: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    10_000 // 10 seconds
}

fn default_download_timeout() -> u64 {
    3600 // 1 hour
}

fn default_transcode_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval(),
            download_timeout_secs: default_download_timeout(),
            transcode_timeout_secs: default_transcode_timeout(),
            max_in_flight: 0,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.download_timeout(), Duration::from_secs(3600));
        assert_eq!(config.transcode_timeout(), Duration::from_secs(1800));
        assert_eq!(config.max_in_flight, 0);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: WorkerConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.poll_interval_ms, 10_000);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            enabled = true
            poll_interval_ms = 500
            download_timeout_secs = 60
            transcode_timeout_secs = 30
            max_in_flight = 4
        "#;
        let config: WorkerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.download_timeout_secs, 60);
        assert_eq!(config.transcode_timeout_secs, 30);
        assert_eq!(config.max_in_flight, 4);
    }
}
