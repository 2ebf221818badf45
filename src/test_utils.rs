use std::sync::{Mutex, OnceLock};

fn global_env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub(crate) fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    global_env_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) struct ScopedEnvVar {
    key: &'static str,
    original: Option<String>,
}

impl ScopedEnvVar {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, original }
    }

    pub(crate) fn unset(key: &'static str) -> Self {
        let original = std::env::var(key).ok();
        std::env::remove_var(key);
        Self { key, original }
    }
}

impl Drop for ScopedEnvVar {
    fn drop(&mut self) {
        if let Some(value) = self.original.as_deref() {
            std::env::set_var(self.key, value);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

pub(crate) use mock_upstream::{MockBehavior, MockUpstream};

mod mock_upstream {
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// How the fake chat completions endpoint answers.
    #[derive(Clone)]
    pub(crate) enum MockBehavior {
        Reply(Value),
        /// Replies `echo: <content>` so callers can check correlation.
        Echo,
        Status(StatusCode, String),
        Delay(Duration),
        Raw(&'static str),
    }

    #[derive(Debug, Clone)]
    pub(crate) struct RecordedRequest {
        pub authorization: Option<String>,
        pub referer: Option<String>,
        pub body: Value,
    }

    #[derive(Clone)]
    struct MockState {
        behavior: MockBehavior,
        hits: Arc<AtomicUsize>,
        last: Arc<parking_lot::Mutex<Option<RecordedRequest>>>,
    }

    pub(crate) struct MockUpstream {
        pub url: String,
        hits: Arc<AtomicUsize>,
        last: Arc<parking_lot::Mutex<Option<RecordedRequest>>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl MockUpstream {
        pub(crate) async fn start(behavior: MockBehavior) -> Self {
            let state = MockState {
                behavior,
                hits: Arc::new(AtomicUsize::new(0)),
                last: Arc::new(parking_lot::Mutex::new(None)),
            };
            let app = Router::new()
                .route("/api/v1/chat/completions", post(completions))
                .with_state(state.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind mock upstream");
            let addr = listener.local_addr().expect("mock upstream addr");
            let handle = tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    eprintln!("Mock upstream error: {}", e);
                }
            });

            Self {
                url: format!("http://{}/api/v1/chat/completions", addr),
                hits: state.hits,
                last: state.last,
                handle,
            }
        }

        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        pub(crate) fn last_request(&self) -> Option<RecordedRequest> {
            self.last.lock().clone()
        }
    }

    impl Drop for MockUpstream {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn completions(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        state.hits.fetch_add(1, Ordering::SeqCst);
        *state.last.lock() = Some(RecordedRequest {
            authorization: header(&headers, "authorization"),
            referer: header(&headers, "http-referer"),
            body: body.clone(),
        });

        match state.behavior {
            MockBehavior::Reply(reply) => Json(reply).into_response(),
            MockBehavior::Echo => {
                let content = body["messages"][0]["content"].as_str().unwrap_or_default();
                Json(json!({
                    "model": body["model"],
                    "choices": [{
                        "message": {"role": "assistant", "content": format!("echo: {}", content)}
                    }]
                }))
                .into_response()
            }
            MockBehavior::Status(status, text) => (status, text).into_response(),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Json(json!({"choices": [{"message": {"content": "late"}}]})).into_response()
            }
            MockBehavior::Raw(text) => (
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                text,
            )
                .into_response(),
        }
    }
}
