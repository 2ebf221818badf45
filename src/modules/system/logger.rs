use crate::models::LoggingConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DIAGNOSTIC_LOG_PREFIX: &str = "relay.log";

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(w, "{}", now.to_rfc3339())
    }
}

pub fn ensure_log_dir(dir: &Path) -> Result<PathBuf, String> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;
    }
    Ok(dir.to_path_buf())
}

/// Installs the global subscriber: console output plus a daily-rolling
/// diagnostic file under the log directory. `RUST_LOG` overrides the
/// configured level.
pub fn init_logger(config: &LoggingConfig) {
    let _ = tracing_log::LogTracer::init();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_timer(LocalTimer);

    let log_dir = match ensure_log_dir(&config.dir) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();
            return;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&log_dir, DIAGNOSTIC_LOG_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(LocalTimer);
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    // The writer thread must outlive every log call.
    std::mem::forget(guard);

    info!("Log system initialized (Console + File persistence)");
    if let Err(e) = cleanup_old_logs(&log_dir, 7) {
        warn!("Failed to cleanup old logs: {}", e);
    }
}

/// Removes rolled diagnostic files older than `days_to_keep`. The request log
/// and its backups are managed by the request log sink and left alone.
pub fn cleanup_old_logs(log_dir: &Path, days_to_keep: u64) -> Result<usize, String> {
    use std::time::{SystemTime, UNIX_EPOCH};

    if !log_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Failed to get system time: {}", e))?
        .as_secs();
    let cutoff_time = now.saturating_sub(days_to_keep * 24 * 60 * 60);

    let entries =
        fs::read_dir(log_dir).map_err(|e| format!("Failed to read log directory: {}", e))?;

    let mut deleted_count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_diagnostic = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(DIAGNOSTIC_LOG_PREFIX))
            .unwrap_or(false);
        if !path.is_file() || !is_diagnostic {
            continue;
        }

        let modified_secs = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(now);
        if modified_secs >= cutoff_time {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                deleted_count += 1;
                info!("Deleted old log file (expired): {:?}", path.file_name());
            }
            Err(e) => error!("Failed to delete old log file {:?}: {}", path, e),
        }
    }

    if deleted_count > 0 {
        info!("Log cleanup completed: deleted {} files", deleted_count);
    }
    Ok(deleted_count)
}
