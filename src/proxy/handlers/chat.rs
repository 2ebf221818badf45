use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::modules::system::request_context::{current_client_addr, current_request_id};
use crate::modules::system::request_log::LogEntry;
use crate::proxy::handlers::errors::{invalid_request_response, relay_error_response};
use crate::proxy::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub message: String,
}

impl ChatRequest {
    /// The requested model, or `default_model` when absent or blank.
    pub fn resolve_model(&self, default_model: &str) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_model)
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected chat request: {}", rejection.body_text());
            return invalid_request_response(rejection.body_text());
        }
    };

    let model = request.resolve_model(&state.config.default_model);
    let request_id = current_request_id();
    let rid = request_id.as_deref().unwrap_or("-");
    let client = current_client_addr();
    let client = client.as_deref().unwrap_or("-");
    info!(request_id = %rid, client = %client, "Request received: {} | {}", model, request.message);

    let result = state.core.upstream.relay(&model, &request.message).await;
    match &result {
        Ok(reply) => info!(request_id = %rid, client = %client, "Response: {}", reply),
        Err(e) => error!(request_id = %rid, client = %client, "Error: {}", e),
    }

    let entry = LogEntry::from_result(request_id.clone(), &model, &request.message, &result);
    let request_log = state.core.request_log.clone();
    match tokio::task::spawn_blocking(move || request_log.append(&entry)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(request_id = %rid, "Failed to write request log: {}", e),
        Err(e) => error!(request_id = %rid, "Request log task failed: {}", e),
    }

    match result {
        Ok(text) => Json(ChatResponse { response: text }).into_response(),
        Err(e) => relay_error_response(&e),
    }
}
