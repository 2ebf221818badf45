pub mod config;
pub mod logger;
pub mod request_context;
pub mod request_log;
pub mod validation;
