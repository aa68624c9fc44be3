//! Web application router and middleware setup.

use crate::web::config::WebConfig;
use crate::web::handlers;
use crate::web::websocket;
use crate::web::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main axum application with all routes and middleware.
pub fn create_app(config: &WebConfig, state: SharedState) -> Router {
    let mut app = Router::new()
        // Query routes
        .route("/api/pins", get(handlers::list_pins))
        .route("/api/pins/:pin", get(handlers::get_pin))
        .route("/api/board", get(handlers::board))
        .route("/api/host", get(handlers::host_telemetry))
        .route("/api/audit", get(handlers::audit_log))
        .route("/api/health", get(handlers::health_check))
        // Mutation routes
        .route("/api/pins/:pin/level", post(handlers::set_level))
        .route("/api/pins/:pin/mode", post(handlers::set_mode))
        .route("/api/pins/:pin/function", post(handlers::set_function))
        .route("/api/pins/:pin/pwm", post(handlers::set_pwm))
        .route("/api/pins/:pin/pull", post(handlers::set_pull))
        .route("/api/pins/:pin/edge", post(handlers::set_edge))
        .route("/api/pins/:pin/advanced", post(handlers::set_advanced))
        .route("/api/pins/:pin/metadata", post(handlers::set_metadata))
        // WebSocket route
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessRegistry;
    use crate::gpio::{
        audit::MemoryAuditSink, board::BoardMap, events::EventNotifier, hardware,
        hardware::SimulatedAdapter, store::PinStore,
    };
    use crate::web::AppState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_app() {
        let (tx, _rx) = hardware::edge_channel();
        let audit = Arc::new(MemoryAuditSink::default());
        let state = Arc::new(AppState {
            store: PinStore::new(
                Arc::new(BoardMap::raspberry_pi()),
                Arc::new(SimulatedAdapter::new(tx)),
                EventNotifier::default(),
                audit.clone(),
            ),
            registry: AccessRegistry::open(),
            audit,
        });
        let _app = create_app(&WebConfig::default(), state);
    }
}
