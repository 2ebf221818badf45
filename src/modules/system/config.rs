use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::{AppConfig, Platform};
use crate::proxy::config::CorsConfig;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Result of loading a `.env` file. Loading happens before the subscriber is
/// installed, so the outcome is reported afterwards via [`EnvFileStatus::report`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnvFileStatus {
    Loaded(PathBuf),
    Missing,
    Invalid(String),
}

impl EnvFileStatus {
    fn from_result(result: Result<PathBuf, dotenv::Error>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(e) if e.not_found() => Self::Missing,
            Err(e) => Self::Invalid(e.to_string()),
        }
    }

    pub fn report(&self) {
        match self {
            Self::Loaded(path) => {
                tracing::debug!("Loaded environment variables from {}", path.display())
            }
            Self::Missing => tracing::debug!("No .env file found"),
            Self::Invalid(e) => tracing::warn!("Failed to load .env file: {}", e),
        }
    }
}

/// Loads `.env` from the working directory if one exists. Variables already
/// present in the process environment win.
pub fn load_env_file() -> EnvFileStatus {
    EnvFileStatus::from_result(dotenv::dotenv())
}

pub fn load_env_file_from(path: &Path) -> EnvFileStatus {
    EnvFileStatus::from_result(dotenv::from_path(path).map(|()| path.to_path_buf()))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("invalid_{}: {} ({})", key.to_ascii_lowercase(), raw, e)),
        None => Ok(None),
    }
}

fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builds the process configuration from environment variables on top of the
/// defaults. Only malformed values fail here; semantic checks such as the
/// required credential live in `validation`.
pub fn load_app_config() -> Result<AppConfig, String> {
    let mut config = AppConfig::default();

    if let Some(key) = env_string(API_KEY_ENV) {
        config.upstream.api_key = key;
    }
    if let Some(model) = env_string("DEFAULT_MODEL") {
        config.upstream.default_model = model;
    }
    if let Some(url) = env_string("UPSTREAM_URL") {
        config.upstream.url = url;
    }
    if let Some(referer) = env_string("HTTP_REFERER") {
        config.upstream.referer = referer;
    }
    if let Some(timeout) = env_parse::<u64>("REQUEST_TIMEOUT")? {
        config.upstream.request_timeout = timeout;
    }

    if let Some(host) = env_string("HOST") {
        config.proxy.host = host;
    }
    if let Some(port) = env_parse::<u16>("PORT")? {
        config.proxy.port = port;
    }
    if let Some(origins) = env_string("CORS_ALLOWED_ORIGINS") {
        config.proxy.cors = CorsConfig::from_origin_list(&origins);
    }

    if let Some(level) = env_string("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(dir) = env_string("LOG_DIR") {
        config.logging.dir = PathBuf::from(dir);
    }
    if let Some(file) = env_string("REQUEST_LOG_FILE") {
        config.logging.request_log_file = file;
    }
    if let Some(max_bytes) = env_parse::<u64>("REQUEST_LOG_MAX_BYTES")? {
        config.logging.request_log_max_bytes = max_bytes;
    }
    if let Some(backups) = env_parse::<usize>("REQUEST_LOG_BACKUPS")? {
        config.logging.request_log_backups = backups;
    }

    if let Some(render) = env_string("RENDER") {
        if parse_env_bool(&render) == Some(true) {
            config.platform = Platform::Render;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::config::CorsMode;
    use crate::test_utils::{lock_env, ScopedEnvVar};

    const ALL_KEYS: [&str; 14] = [
        API_KEY_ENV,
        "DEFAULT_MODEL",
        "UPSTREAM_URL",
        "HTTP_REFERER",
        "REQUEST_TIMEOUT",
        "HOST",
        "PORT",
        "CORS_ALLOWED_ORIGINS",
        "LOG_LEVEL",
        "LOG_DIR",
        "REQUEST_LOG_FILE",
        "REQUEST_LOG_MAX_BYTES",
        "REQUEST_LOG_BACKUPS",
        "RENDER",
    ];

    fn clear_env() -> Vec<ScopedEnvVar> {
        ALL_KEYS.into_iter().map(ScopedEnvVar::unset).collect()
    }

    const ENV_FILE_KEY: &str = "CHAT_RELAY_ENV_FILE_TEST";

    fn temp_env_file(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            ".chat-relay-env-file-test-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn env_file_values_are_loaded() {
        let _lock = lock_env();
        let _key = ScopedEnvVar::unset(ENV_FILE_KEY);
        let path = temp_env_file(&format!("{}=from-file\n", ENV_FILE_KEY));

        assert_eq!(load_env_file_from(&path), EnvFileStatus::Loaded(path.clone()));
        assert_eq!(std::env::var(ENV_FILE_KEY).as_deref(), Ok("from-file"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let missing = std::env::temp_dir()
            .join(format!(".chat-relay-env-file-test-{}", uuid::Uuid::new_v4()))
            .join(".env");
        assert_eq!(load_env_file_from(&missing), EnvFileStatus::Missing);
    }

    #[test]
    fn malformed_env_file_is_reported_as_invalid() {
        let _lock = lock_env();
        let _key = ScopedEnvVar::unset(ENV_FILE_KEY);
        let path = temp_env_file(&format!("{}=\"unterminated\n", ENV_FILE_KEY));

        match load_env_file_from(&path) {
            EnvFileStatus::Invalid(msg) => assert!(!msg.is_empty()),
            other => panic!("expected invalid env file, got {:?}", other),
        }
        assert!(std::env::var(ENV_FILE_KEY).is_err());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let _lock = lock_env();
        let _cleared = clear_env();

        let config = load_app_config().expect("load config");
        assert!(config.upstream.api_key.is_empty());
        assert_eq!(config.upstream.default_model, crate::constants::DEFAULT_MODEL);
        assert_eq!(config.upstream.request_timeout, 30);
        assert_eq!(config.proxy.port, 8000);
        assert_eq!(config.proxy.host, "0.0.0.0");
        assert_eq!(config.proxy.cors.mode, CorsMode::Strict);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.platform, Platform::Local);
    }

    #[test]
    fn environment_overrides_defaults() {
        let _lock = lock_env();
        let _cleared = clear_env();
        let _key = ScopedEnvVar::set(API_KEY_ENV, "  sk-or-test  ");
        let _model = ScopedEnvVar::set("DEFAULT_MODEL", "openai/gpt-4o-mini");
        let _port = ScopedEnvVar::set("PORT", "10000");
        let _timeout = ScopedEnvVar::set("REQUEST_TIMEOUT", "5");
        let _cors = ScopedEnvVar::set("CORS_ALLOWED_ORIGINS", "*");
        let _backups = ScopedEnvVar::set("REQUEST_LOG_BACKUPS", "7");
        let _render = ScopedEnvVar::set("RENDER", "true");

        let config = load_app_config().expect("load config");
        assert_eq!(config.upstream.api_key, "sk-or-test");
        assert_eq!(config.upstream.default_model, "openai/gpt-4o-mini");
        assert_eq!(config.proxy.port, 10000);
        assert_eq!(config.upstream.request_timeout, 5);
        assert_eq!(config.proxy.cors.mode, CorsMode::Permissive);
        assert_eq!(config.logging.request_log_backups, 7);
        assert_eq!(config.platform, Platform::Render);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let _lock = lock_env();
        let _cleared = clear_env();
        let _port = ScopedEnvVar::set("PORT", "eighty");

        let err = load_app_config().expect_err("port must be numeric");
        assert!(err.starts_with("invalid_port"), "unexpected error: {}", err);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let _lock = lock_env();
        let _cleared = clear_env();
        let _model = ScopedEnvVar::set("DEFAULT_MODEL", "   ");

        let config = load_app_config().expect("load config");
        assert_eq!(config.upstream.default_model, crate::constants::DEFAULT_MODEL);
    }
}
