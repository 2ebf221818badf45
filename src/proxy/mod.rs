pub mod config;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod upstream;

pub use config::{CorsConfig, CorsMode, ProxyConfig, UpstreamConfig};
pub use server::AxumServer;
pub use state::AppState;
pub use upstream::client::UpstreamClient;
