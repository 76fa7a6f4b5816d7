//! Gateway service: wiring and lifecycle.

use axum::Router;
use shared_auth::TokenService;
use shared_bus::BusTransport;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::config::{ConfigError, GatewayConfig};
use crate::routes::{self, AppState};
use crate::rpc::{self, RpcClient};

/// Fatal service errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// The gateway as one startable unit: validated config, token service, RPC
/// client and the HTTP server around them.
pub struct GatewayService {
    config: GatewayConfig,
    rpc: Arc<RpcClient>,
    tokens: Arc<TokenService>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl GatewayService {
    /// Validates the configuration and assembles the service. The bus is not
    /// touched yet; `start` connects.
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn BusTransport>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let tokens = Arc::new(TokenService::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.token_ttl,
        ));
        let rpc = Arc::new(RpcClient::new(transport, config.rpc.clone()));

        Ok(Self {
            config,
            rpc,
            tokens,
            shutdown_tx: None,
        })
    }

    /// The assembled router. Exposed on its own so tests can drive the HTTP
    /// surface without a TCP listener.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(AppState {
            rpc: Arc::clone(&self.rpc),
            tokens: Arc::clone(&self.tokens),
        })
    }

    #[must_use]
    pub fn rpc(&self) -> Arc<RpcClient> {
        Arc::clone(&self.rpc)
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<TokenService> {
        Arc::clone(&self.tokens)
    }

    /// Runs the HTTP server until `shutdown` is called or the server dies.
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let sweep = rpc::cleanup_task(self.rpc.pending_store(), self.config.rpc.sweep_interval);

        // Connect eagerly so an unreachable bus shows up in the logs at
        // boot instead of on the first request. Calls reconnect on their own.
        if let Err(error) = self.rpc.connect().await {
            warn!(%error, "Bus not reachable at startup");
        }

        let addr = self.config.http_addr();
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!(%addr, "Gateway listening");

        let server = tokio::spawn(async move { axum::serve(listener, router).await });

        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Received shutdown signal");
            }
            result = server => match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "HTTP server error"),
                Err(e) => error!(error = %e, "HTTP server task failed"),
            },
        }

        sweep.abort();
        self.rpc.shutdown().await;
        info!("Gateway stopped");
        Ok(())
    }

    /// Triggers a graceful stop of a running `start`.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
