//! Web server using Axum.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::{Error, Result};

/// Web server configuration.
pub struct WebServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            port: crate::config::DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl WebServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self { port, ..Default::default() }
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Web(format!("Invalid address {}:{}: {}", self.host, self.port, e)))
    }
}

/// Bind the configured address. Bind failures are startup errors.
pub async fn bind(config: &WebServerConfig) -> Result<TcpListener> {
    let addr = config.addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Web(format!("Failed to bind {}: {}", addr, e)))
}

/// Bind and serve `app` until `shutdown` resolves.
pub async fn run_server<F>(config: WebServerConfig, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(&config).await?;
    serve(listener, app, shutdown).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 Starting web server on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}
