use crate::config::RelayConfig;
use crate::hub::RelayHub;
use crate::signaling::ws_handler;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

/// Path clients open their WebSocket on.
pub const WS_PATH: &str = "/ws";

pub fn router(hub: RelayHub) -> Router {
    Router::new()
        .route(WS_PATH, get(ws_handler))
        .with_state(hub)
}

/// Binds `config.bind` and serves until the listener fails.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.bind))?;

    serve_on(listener, RelayHub::new(config.ice_servers)).await
}

pub async fn serve_on(listener: TcpListener, hub: RelayHub) -> Result<()> {
    info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, router(hub))
        .await
        .context("Relay server stopped")?;
    Ok(())
}
