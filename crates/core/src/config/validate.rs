use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Backend URLs are absolute http(s) URLs
/// - Backend timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    validate_http_url("trace_moe.base_url", &config.trace_moe.base_url)?;
    validate_http_url("anilist.endpoint", &config.anilist.endpoint)?;

    if config.trace_moe.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "trace_moe.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.anilist.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "anilist.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::ValidationError(format!("{} is not a valid URL: {}", field, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = Config::default();
        config.trace_moe.base_url = "not a url".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("trace_moe.base_url"));
    }

    #[test]
    fn test_validate_non_http_scheme_fails() {
        let mut config = Config::default();
        config.anilist.endpoint = "ftp://graphql.anilist.co".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.anilist.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
