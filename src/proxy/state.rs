use std::sync::Arc;

use crate::modules::system::request_log::RequestLog;
use crate::proxy::upstream::client::UpstreamClient;

#[derive(Clone)]
pub struct CoreServices {
    pub upstream: Arc<UpstreamClient>,
    pub request_log: Arc<RequestLog>,
}

#[derive(Clone)]
pub struct ConfigState {
    pub default_model: String,
}

// Axum application state. Everything here is created once at startup and
// only read afterwards; the request log serialises its own writes.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<CoreServices>,
    pub config: Arc<ConfigState>,
}

impl AppState {
    pub fn new(upstream: UpstreamClient, request_log: RequestLog, default_model: String) -> Self {
        Self {
            core: Arc::new(CoreServices {
                upstream: Arc::new(upstream),
                request_log: Arc::new(request_log),
            }),
            config: Arc::new(ConfigState { default_model }),
        }
    }
}

impl axum::extract::FromRef<AppState> for Arc<CoreServices> {
    fn from_ref(state: &AppState) -> Self {
        state.core.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ConfigState> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<RequestLog> {
    fn from_ref(state: &AppState) -> Self {
        state.core.request_log.clone()
    }
}
