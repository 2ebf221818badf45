use std::net::SocketAddr;
use tracing::{debug, error};

use crate::proxy::config::ProxyConfig;
use crate::proxy::state::AppState;

pub struct AxumServer {
    pub local_addr: SocketAddr,
}

impl AxumServer {
    /// Binds the listener and spawns the accept loop. Returns once the socket
    /// is bound so callers can report the real address (port 0 is allowed).
    pub async fn start(
        config: &ProxyConfig,
        state: AppState,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        let app = crate::proxy::routes::build_app(state, &config.cors);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Address {} binding failed: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        tracing::info!("Relay server started at http://{}", local_addr);

        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                match listener.accept().await {
                    Ok((stream, remote_addr)) => {
                        let io = TokioIo::new(stream);
                        use hyper::body::Incoming;
                        use tower::ServiceExt;
                        let app_with_info = app.clone().map_request(
                            move |mut req: axum::http::Request<Incoming>| {
                                req.extensions_mut()
                                    .insert(axum::extract::ConnectInfo(remote_addr));
                                req
                            },
                        );

                        let service = TowerToHyperService::new(app_with_info);

                        tokio::task::spawn(async move {
                            if let Err(err) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                debug!("Connection handling ended or failed: {:?}", err);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {:?}", e);
                    }
                }
            }
        });

        Ok((Self { local_addr }, handle))
    }
}
