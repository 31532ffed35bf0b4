use crate::config::types::CrawlerConfig;
use crate::ConfigError;
use url::Url;

/// Validates crawler configuration
pub fn validate(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 || config.timeout > 600 {
        return Err(ConfigError::Validation(format!(
            "timeout must be between 1 and 600 seconds, got {}",
            config.timeout
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the start URL: http(s) with a host
pub fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            start_url
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(format!(
            "could not determine domain of '{}'",
            start_url
        ))),
    }
}
