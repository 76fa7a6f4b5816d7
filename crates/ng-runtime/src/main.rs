//! Northgate runtime entry point.
//!
//! Boots the HTTP gateway plus the three backend responders. With no
//! `NATS_SERVER` in the environment everything runs in one process over the
//! in-memory bus; with it, the gateway and responders all dial the configured
//! NATS servers, which is the same wiring a multi-process deployment uses.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ng_auth_service::{AuthHandler, InMemoryUserStore};
use ng_customers_service::{CustomersHandler, InMemoryCustomerStore};
use ng_gateway::{GatewayConfig, GatewayService};
use ng_products_service::{InMemoryProductStore, ProductsHandler};
use shared_auth::TokenService;
use shared_bus::{responder, BusTransport, InMemoryBus, NatsTransport, SubjectHandler};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Start one detached serve loop per responder, each on its own connection.
async fn spawn_responders(
    transport: &Arc<dyn BusTransport>,
    tokens: Arc<TokenService>,
) -> Result<()> {
    let handlers: [(&str, Arc<dyn SubjectHandler>); 3] = [
        (
            "auth",
            Arc::new(AuthHandler::new(Arc::new(InMemoryUserStore::new()), tokens)),
        ),
        (
            "products",
            Arc::new(ProductsHandler::new(Arc::new(
                InMemoryProductStore::seeded(),
            ))),
        ),
        (
            "customers",
            Arc::new(CustomersHandler::new(Arc::new(
                InMemoryCustomerStore::seeded(),
            ))),
        ),
    ];

    for (name, handler) in handlers {
        let conn = transport
            .connect()
            .await
            .with_context(|| format!("connecting the {name} responder to the bus"))?;
        tokio::spawn(async move {
            if let Err(err) = responder::serve(conn, handler).await {
                error!(responder = name, error = %err, "Responder exited with an error");
            }
        });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = GatewayConfig::from_env().context("gateway configuration")?;

    let transport: Arc<dyn BusTransport> = if env::var("NATS_SERVER").is_ok() {
        info!(servers = ?config.bus.servers, "Using the NATS transport");
        Arc::new(NatsTransport::new(config.bus.servers.clone()))
    } else {
        info!("NATS_SERVER not set, running everything over the in-process bus");
        Arc::new(InMemoryBus::new())
    };

    let mut gateway = GatewayService::new(config, Arc::clone(&transport))?;
    spawn_responders(&transport, gateway.tokens()).await?;

    info!(version = ng_gateway::VERSION, "Northgate starting");
    tokio::select! {
        result = gateway.start() => result.context("gateway server")?,
        _ = tokio::signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
    }
    Ok(())
}
