//! Web server using Axum.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::router::create_app_router;
use super::state::AppState;
use crate::config::ServerConfig;
use crate::core::MessageQueue;
use crate::error::{Error, Result};

/// Web server configuration.
pub struct WebServerConfig {
    pub port: u16,
    pub host: String,
    pub token: String,
}

impl WebServerConfig {
    pub fn new(server: &ServerConfig, token: impl Into<String>) -> Self {
        Self {
            port: server.port,
            host: server.host.clone(),
            token: token.into(),
        }
    }

    fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address {}:{}: {}", self.host, self.port, e)))
    }
}

/// Bind the configured address.
pub async fn bind(config: &WebServerConfig) -> Result<TcpListener> {
    let addr = config.addr()?;
    Ok(TcpListener::bind(addr).await?)
}

/// Serve the relay on an already bound listener until `shutdown` resolves.
///
/// The queue starts empty and lives as long as the server.
pub async fn serve(
    listener: TcpListener,
    token: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let queue = Arc::new(MessageQueue::new());
    let app = create_app_router(AppState::new(queue, token));

    tracing::info!("SMS Bridge listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("SMS Bridge stopped");
    Ok(())
}

/// Run the web server until Ctrl-C.
pub async fn run_server(config: WebServerConfig) -> Result<()> {
    let listener = bind(&config).await?;

    serve(listener, &config.token, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        tracing::info!("Shutdown signal received");
    })
    .await
}
