//! Web server and API endpoints for remote pin control.
//!
//! This module exposes the pin store over a JSON REST API and streams
//! confirmed state changes to observers over WebSocket.

pub mod config;
pub mod handlers;
pub mod router;
pub mod websocket;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::auth::AccessRegistry;
use crate::error::{PinError, Result};
use crate::gpio::audit::MemoryAuditSink;
use crate::gpio::hardware::EdgeEvent;
use crate::gpio::store::PinStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Shared application state handed to every handler.
pub struct AppState {
    pub store: PinStore,
    pub registry: AccessRegistry,
    pub audit: Arc<MemoryAuditSink>,
}

/// The state type axum extracts in handlers.
pub type SharedState = Arc<AppState>;

/// Start the web server and the edge-event pump.
///
/// `edge_rx` is the receiving end of the hardware adapter's edge channel;
/// events are fed into the pin store's per-pin serialization domain.
pub async fn start_web_server(
    config: WebConfig,
    state: SharedState,
    mut edge_rx: mpsc::UnboundedReceiver<EdgeEvent>,
) -> Result<()> {
    let app = create_app(&config, state.clone());

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| PinError::config_error(format!("invalid bind address: {}", e)))?;

    info!("Starting pin_pilot web server on http://{}", addr);
    info!("API endpoint: http://{}/api/pins", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PinError::web_server_error(format!("failed to bind to address: {}", e)))?;

    // Feed hardware edge triggers into the store.
    let edge_state = state.clone();
    let _edge_task = tokio::spawn(async move {
        while let Some(event) = edge_rx.recv().await {
            if let Err(e) = edge_state
                .store
                .edge_triggered(event.pin, event.timestamp)
                .await
            {
                warn!("failed to ingest edge event for pin {}: {}", event.pin, e);
            }
        }
    });

    axum::serve(listener, app)
        .await
        .map_err(|e| PinError::web_server_error(format!("server error: {}", e)))?;

    Ok(())
}
