pub mod constants;
pub mod error;
pub mod models;
pub mod modules;
pub mod proxy;

#[cfg(test)]
mod test_utils;

use error::{AppError, AppResult};
use models::AppConfig;
use modules::system::{config, logger, request_log::RequestLog, validation};
use proxy::{AppState, AxumServer, UpstreamClient};
use tracing::{error, info};

fn validate_or_fail(config: &AppConfig) -> AppResult<()> {
    validation::validate_app_config(config).map_err(|errors| {
        AppError::Config(format!(
            "configuration_validation_failed:\n{}",
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        ))
    })
}

/// Builds the shared state from a validated configuration.
pub fn build_state(config: &AppConfig) -> AppResult<AppState> {
    let upstream = UpstreamClient::new(&config.upstream)?;
    info!("Upstream client ready for {}", upstream.url());
    logger::ensure_log_dir(&config.logging.dir).map_err(AppError::Config)?;
    let request_log = RequestLog::from_config(&config.logging);
    info!(
        "Request log at {} (max {} bytes, {} backups)",
        request_log.path().display(),
        config.logging.request_log_max_bytes,
        config.logging.request_log_backups
    );
    Ok(AppState::new(
        upstream,
        request_log,
        config.upstream.default_model.clone(),
    ))
}

/// Validates the configuration and only then installs logging, so an invalid
/// configuration leaves no log directory behind.
fn init_runtime(env_file: &config::EnvFileStatus, config: &AppConfig) -> AppResult<()> {
    validate_or_fail(config)?;
    logger::init_logger(&config.logging);
    env_file.report();
    Ok(())
}

async fn start_runtime(config: AppConfig) -> AppResult<tokio::task::JoinHandle<()>> {
    info!(
        "Default model: {} | upstream timeout: {}s",
        config.upstream.default_model, config.upstream.request_timeout
    );

    let state = build_state(&config)?;
    let (server, handle) = AxumServer::start(&config.proxy, state)
        .await
        .map_err(AppError::Config)?;
    info!(
        "Relay is running on {} at http://{}",
        config.platform, server.local_addr
    );
    Ok(handle)
}

pub fn run() {
    let env_file = config::load_env_file();
    let app_config = match config::load_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed_to_load_config: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_runtime(&env_file, &app_config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(async {
        let handle = match start_runtime(app_config).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };

        info!("Press Ctrl+C to exit.");
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down relay");
        handle.abort();
    });
}
