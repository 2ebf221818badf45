// Upstream client for the chat completions API.
// One request per relay call; failures are terminal for that call.

use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

use crate::constants::{APP_NAME, FALLBACK_REPLY, USER_AGENT};
use crate::error::{AppError, AppResult, ChatResult, RelayError};
use crate::proxy::config::UpstreamConfig;
use crate::proxy::upstream::models::{extract_reply, ChatCompletionRequest};

pub struct UpstreamClient {
    client: Client,
    url: String,
    headers: header::HeaderMap,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        Self::with_timeout(config, Duration::from_secs(config.request_timeout))
    }

    pub fn with_timeout(config: &UpstreamConfig, timeout: Duration) -> AppResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .user_agent(USER_AGENT.as_str());

        // System proxies never apply to a loopback upstream.
        if is_loopback_url(&config.url) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            headers: Self::build_headers(config)?,
            timeout,
        })
    }

    // Fixed for the lifetime of the process, so built once.
    fn build_headers(config: &UpstreamConfig) -> AppResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| AppError::Config("upstream API key contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        match header::HeaderValue::from_str(&config.referer) {
            Ok(v) => {
                headers.insert(header::REFERER, v.clone());
                headers.insert(header::HeaderName::from_static("http-referer"), v);
            }
            Err(e) => tracing::warn!("Ignoring invalid referer {:?}: {}", config.referer, e),
        }
        headers.insert(
            header::HeaderName::from_static("x-title"),
            header::HeaderValue::from_static(APP_NAME),
        );
        Ok(headers)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends `message` as a single user turn to `model` and returns the reply
    /// text. An upstream success without content yields the fallback reply.
    pub async fn relay(&self, model: &str, message: &str) -> ChatResult {
        let payload = ChatCompletionRequest::single_turn(model, message);

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Failed to read upstream error body: {}", e);
                    String::new()
                }
            };
            tracing::warn!(
                status = status.as_u16(),
                model = %model,
                "Upstream returned error status"
            );
            return Err(RelayError::UpstreamStatus { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::Transport(format!("malformed upstream response: {}", e)))?;

        match extract_reply(&body) {
            Some(text) => {
                tracing::debug!("✓ Upstream request succeeded | model: {} | status: {}", model, status);
                Ok(text)
            }
            None => {
                tracing::warn!("Upstream returned no content for model {}, using fallback reply", model);
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        let message = if e.is_timeout() {
            format!("upstream request timed out after {:?}", self.timeout)
        } else if e.is_connect() {
            format!("failed to connect to upstream: {}", e)
        } else if e.is_decode() || e.is_body() {
            format!("failed to read upstream response: {}", e)
        } else {
            format!("upstream request failed: {}", e)
        };
        tracing::debug!("{}", message);
        RelayError::Transport(message)
    }
}

fn is_loopback_url(raw: &str) -> bool {
    match url::Url::parse(raw).ok().and_then(|u| u.host().map(|h| h.to_owned())) {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
