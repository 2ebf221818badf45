use std::sync::LazyLock;

pub const APP_NAME: &str = "chat-relay";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct:free";
pub const DEFAULT_REFERER: &str = "http://localhost:8000";

// Returned in place of an empty upstream completion.
pub const FALLBACK_REPLY: &str = "no response generated";

pub const NO_LOGS_PLACEHOLDER: &str = "No logs available.";
pub const EMPTY_LOGS_PLACEHOLDER: &str = "Log file is empty.";

pub static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}/{} {}/{}",
        APP_NAME,
        VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
});
