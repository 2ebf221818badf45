use axum::{
    routing::{get, post},
    Router,
};

use crate::proxy::config::CorsConfig;
use crate::proxy::handlers;
use crate::proxy::middleware::{cors_layer, request_context_middleware};
use crate::proxy::state::AppState;

pub fn build_proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(crate::proxy::health::health_check_handler))
        .route("/healthz", get(crate::proxy::health::health_check_handler))
        .route("/chat", post(handlers::chat::handle_chat))
        .route("/logs", get(handlers::logs::handle_get_logs))
}

/// Full application: routes plus request context and CORS layers.
pub fn build_app(state: AppState, cors: &CorsConfig) -> Router {
    build_proxy_routes()
        .layer(axum::middleware::from_fn(request_context_middleware))
        .layer(cors_layer(cors))
        .with_state(state)
}
