use crate::config::types::{ConfigFile, CrawlerConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads the `[crawler]` table from a TOML configuration file
///
/// Missing keys fall back to [`CrawlerConfig::default`]. The result is
/// validated before it is returned.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use offline_mirror::config::load_crawler_config;
///
/// let crawler = load_crawler_config(Path::new("mirror.toml")).unwrap();
/// println!("Checkpoint every {} pages", crawler.checkpoint_interval);
/// ```
pub fn load_crawler_config(path: &Path) -> Result<CrawlerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_crawler_config(&content)
}

/// Parses and validates crawler settings from TOML text
pub fn parse_crawler_config(content: &str) -> Result<CrawlerConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content)?;
    validate(&file.crawler)?;
    Ok(file.crawler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
timeout = 30
ignore-query = true
checkpoint-interval = 5
user-agent = "MirrorBot/1.0"
"#;

        let file = create_temp_config(config_content);
        let config = load_crawler_config(file.path()).unwrap();

        assert_eq!(config.timeout, 30);
        assert!(config.ignore_query);
        assert_eq!(config.checkpoint_interval, 5);
        assert_eq!(config.user_agent, "MirrorBot/1.0");
        assert!(!config.rewrite_failed_references);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = parse_crawler_config("[crawler]\ntimeout = 40\n").unwrap();
        assert_eq!(config.timeout, 40);
        assert_eq!(config.checkpoint_interval, 20);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_crawler_config("").unwrap();
        assert_eq!(config, CrawlerConfig::default());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_crawler_config(Path::new("/nonexistent/mirror.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_crawler_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\ncheckpoint-interval = 0\n");
        let result = load_crawler_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
