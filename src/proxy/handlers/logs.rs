use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::constants::{EMPTY_LOGS_PLACEHOLDER, NO_LOGS_PLACEHOLDER};
use crate::modules::system::request_log::RequestLog;

pub async fn handle_get_logs(State(request_log): State<Arc<RequestLog>>) -> Response {
    let res = tokio::task::spawn_blocking(move || request_log.read_all()).await;

    match res {
        Ok(Ok(Some(content))) if !content.is_empty() => content.into_response(),
        Ok(Ok(Some(_))) => EMPTY_LOGS_PLACEHOLDER.into_response(),
        Ok(Ok(None)) => NO_LOGS_PLACEHOLDER.into_response(),
        Ok(Err(e)) => {
            tracing::error!("Failed to read request log: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error reading logs: {}", e),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error reading logs: {}", e),
        )
            .into_response(),
    }
}
