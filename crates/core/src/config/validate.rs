use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Platform base URL is http(s)
/// - Polling interval and timeout are non-zero
/// - At least one projection model is configured
///
/// Credentials and agent ids are checked per request instead, so a server
/// with an incomplete deployment still starts and reports the problem.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let base_url = config.platform.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "platform.base_url must be an http(s) URL, got '{}'",
            config.platform.base_url
        )));
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval_ms cannot be 0".to_string(),
        ));
    }

    if config.polling.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "polling.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.pipeline.models.is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.models must list at least one projection model".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = Config::default();
        config.platform.base_url = "api.swarmnode.ai".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_models_fails() {
        let mut config = Config::default();
        config.pipeline.models.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pipeline.models"));
    }

    #[test]
    fn test_validate_ignores_missing_agents() {
        let mut config = Config::default();
        config.agents.ingest.clear();
        assert!(validate_config(&config).is_ok());
    }
}
