use crate::models::{AppConfig, LoggingConfig};
use crate::proxy::config::{CorsConfig, CorsMode, ProxyConfig, UpstreamConfig};
use std::fmt;

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub actual_value: Option<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual_value {
            Some(val) => write!(f, "  • {}: {} (got: {})", self.field, self.message, val),
            None => write!(f, "  • {}: {}", self.field, self.message),
        }
    }
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: None,
        }
    }

    fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: Some(value.to_string()),
        }
    }
}

pub fn validate_app_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    validate_upstream_config(&config.upstream, &mut errors);
    validate_proxy_config(&config.proxy, &mut errors);
    validate_logging_config(&config.logging, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream_config(config: &UpstreamConfig, errors: &mut Vec<ConfigError>) {
    // Never echo the key itself back.
    if config.api_key.trim().is_empty() {
        errors.push(ConfigError::new(
            "upstream.api_key",
            format!(
                "{} must be set",
                crate::modules::system::config::API_KEY_ENV
            ),
        ));
    }

    match url::Url::parse(&config.url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(ConfigError::with_value(
            "upstream.url",
            "scheme must be http or https",
            parsed.scheme(),
        )),
        Err(e) => errors.push(ConfigError::with_value(
            "upstream.url",
            format!("invalid URL: {}", e),
            &config.url,
        )),
    }

    if config.request_timeout == 0 {
        errors.push(ConfigError::with_value(
            "upstream.request_timeout",
            "must be greater than 0",
            config.request_timeout,
        ));
    }

    if config.default_model.trim().is_empty() {
        errors.push(ConfigError::new(
            "upstream.default_model",
            "must not be empty",
        ));
    }
}

fn validate_proxy_config(config: &ProxyConfig, errors: &mut Vec<ConfigError>) {
    if config.port == 0 {
        errors.push(ConfigError::with_value(
            "proxy.port",
            "must be between 1 and 65535",
            config.port,
        ));
    }
    if config.host.parse::<std::net::IpAddr>().is_err() && config.host != "localhost" {
        errors.push(ConfigError::with_value(
            "proxy.host",
            "must be an IP address or localhost",
            &config.host,
        ));
    }
    validate_cors_config(&config.cors, errors);
}

fn validate_cors_config(config: &CorsConfig, errors: &mut Vec<ConfigError>) {
    if config.mode == CorsMode::Permissive {
        return;
    }
    for (i, origin) in config.allowed_origins.iter().enumerate() {
        let trimmed = origin.trim();
        let valid = url::Url::parse(trimmed)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if !valid {
            errors.push(ConfigError::with_value(
                format!("proxy.cors.allowed_origins[{}]", i),
                "must be an http(s) origin",
                origin,
            ));
        }
    }
}

fn validate_logging_config(config: &LoggingConfig, errors: &mut Vec<ConfigError>) {
    if tracing_subscriber::EnvFilter::try_new(&config.level).is_err() {
        errors.push(ConfigError::with_value(
            "logging.level",
            "is not a valid tracing filter",
            &config.level,
        ));
    }
    let file = config.request_log_file.trim();
    if file.is_empty() || file.contains('/') || file.contains('\\') {
        errors.push(ConfigError::with_value(
            "logging.request_log_file",
            "must be a plain file name",
            &config.request_log_file,
        ));
    }
}
