use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::RelayError;

pub fn relay_error_response(err: &RelayError) -> Response {
    let body = match err.upstream_status() {
        Some(status) => json!({
            "error": err.to_string(),
            "upstream_status": status.as_u16()
        }),
        None => json!({ "error": err.to_string() }),
    };
    (StatusCode::BAD_GATEWAY, Json(body)).into_response()
}

pub fn invalid_request_response(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}
