use crate::proxy::config::{ProxyConfig, UpstreamConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_request_log_file")]
    pub request_log_file: String,
    #[serde(default = "default_request_log_max_bytes")]
    pub request_log_max_bytes: u64,
    #[serde(default = "default_request_log_backups")]
    pub request_log_backups: usize,
}

impl LoggingConfig {
    pub fn request_log_path(&self) -> PathBuf {
        self.dir.join(&self.request_log_file)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            request_log_file: default_request_log_file(),
            request_log_max_bytes: default_request_log_max_bytes(),
            request_log_backups: default_request_log_backups(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Local,
    Render,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Local => write!(f, "Local"),
            Platform::Render => write!(f, "Render"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_request_log_file() -> String {
    "requests.log".to_string()
}

fn default_request_log_max_bytes() -> u64 {
    1024 * 1024
}

fn default_request_log_backups() -> usize {
    3
}
