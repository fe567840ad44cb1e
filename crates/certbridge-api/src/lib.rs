//! Debug HTTP endpoint for the materialized trust certificate
//!
//! Serves a single `GET /` page that echoes the configured certificate, the
//! generated trust file location, the indirect reference to it, the file as
//! re-read from disk, and the decoded X.509 summary.

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use certbridge_cert::{CERT_CONTENTS_KEY, INDIRECT_TRUST_FILE_KEY, TRUST_FILE_LOCATION_KEY};
use certbridge_config::{ConfigError, PropertySources};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ErrorResponse};

/// Values rendered by the debug page, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugState {
    /// Raw `cert.contents`
    pub cert_contents: String,
    /// Resolved `tibco.ems.SSLTrustedCertificate`
    pub trust_file_location: String,
    /// Resolved `SSLTrustedCertificate`
    pub indirect: String,
}

impl DebugState {
    /// Resolve all three values from the configuration chain
    ///
    /// Must be called after the bridge has installed its fallback source.
    pub fn from_sources(sources: &PropertySources) -> Result<Self, ConfigError> {
        Ok(Self {
            cert_contents: sources.require(CERT_CONTENTS_KEY)?,
            trust_file_location: sources.require(TRUST_FILE_LOCATION_KEY)?,
            indirect: sources.require(INDIRECT_TRUST_FILE_KEY)?,
        })
    }
}

/// Debug server configuration
#[derive(Debug, Clone)]
pub struct DebugServerConfig {
    /// Address to bind, `host:port`
    pub bind_addr: String,
}

impl DebugServerConfig {
    pub const DEFAULT_ADDRESS: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn new(address: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", address, port),
        }
    }
}

impl Default for DebugServerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ADDRESS, Self::DEFAULT_PORT)
    }
}

/// Debug server
pub struct DebugServer {
    config: DebugServerConfig,
    state: Arc<DebugState>,
}

impl DebugServer {
    pub fn new(config: DebugServerConfig, state: DebugState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::debug_page))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", self.config.bind_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();

        info!("Debug endpoint: http://{}/", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
