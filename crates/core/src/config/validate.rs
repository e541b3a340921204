use super::{types::Config, ConfigError};

const LOG_LEVELS: &[&str] = &[
    "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
];

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker poll interval and timeouts are not 0
/// - Database path and media directory are set
/// - Transcoder log level is one ffmpeg understands
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Worker validation
    if config.worker.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "worker.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.worker.download_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "worker.download_timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.worker.transcode_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "worker.transcode_timeout_secs cannot be 0".to_string(),
        ));
    }

    // Storage validation
    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.path cannot be empty".to_string(),
        ));
    }
    if config.storage.media_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.media_dir cannot be empty".to_string(),
        ));
    }

    // Transcoder validation
    if !LOG_LEVELS.contains(&config.transcoder.log_level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "transcoder.log_level '{}' is not an ffmpeg log level",
            config.transcoder.log_level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.worker.poll_interval_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_zero_timeouts_fail() {
        let mut config = Config::default();
        config.worker.download_timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.worker.transcode_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_media_dir_fails() {
        let mut config = Config::default();
        config.storage.media_dir = PathBuf::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("media_dir"));
    }

    #[test]
    fn test_validate_unknown_log_level_fails() {
        let mut config = Config::default();
        config.transcoder.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }
}
