//! Configuration validation

use super::schema::Config;
use crate::{Error, Result};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Reject configurations that would fail at runtime
pub fn validate_config(config: &Config) -> Result<()> {
    if !config.remote.base_url.starts_with("http://") && !config.remote.base_url.starts_with("https://") {
        return Err(Error::Config(format!(
            "remote.base_url must be an http(s) URL, got '{}'",
            config.remote.base_url
        )));
    }

    if config.remote.request_timeout_secs == 0 {
        return Err(Error::Config(
            "remote.request_timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.session.max_image_bytes == 0 {
        return Err(Error::Config(
            "session.max_image_bytes must be greater than zero".to_string(),
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        return Err(Error::Config(format!(
            "unknown log level '{}'",
            config.logging.level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut config = Config::default();
        config.remote.base_url = "ftp://example.com".to_string();
        assert!(matches!(validate_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(validate_config(&config), Err(Error::Config(_))));
    }
}
