//! # Pin Pilot - Remote GPIO Control for Raspberry Pi
//!
//! A clean, minimalist Rust crate for controlling Raspberry Pi GPIO pins
//! over a web API, with live state-change streaming and an audit trail.
//! Designed for plug-and-play operation on a Raspberry Pi running
//! RaspberryOS x64, and for simulated operation everywhere else.
//!
//! ## Features
//!
//! - **Typed pin model**: mode, function, level, PWM, pulls, edge
//!   detection, and pad tuning, validated against a static capability table
//! - **Per-pin serialization**: concurrent mutations to different pins run
//!   in parallel; same-pin changes are atomic
//! - **Live updates**: confirmed changes stream to observers via WebSocket
//! - **Hardware or simulation**: rppal backend (feature-gated) or a
//!   recording simulator, selected once at startup
//! - **Audit trail**: every accepted mutation is attributed and logged
//!
//! ## Hardware commit policy
//!
//! State commits optimistically: if the hardware backend faults after a
//! mutation passed validation, the in-memory state keeps the attempted
//! values and the fault is reported to the caller. Validation failures
//! never touch hardware or state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pin_pilot::{
//!     AccessRegistry, AppState, BoardMap, EventNotifier, MemoryAuditSink, PinStore, WebConfig,
//!     edge_channel, default_adapter, start_web_server,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (edge_tx, edge_rx) = edge_channel();
//!     let adapter = default_adapter(true, edge_tx)?;
//!     let audit = Arc::new(MemoryAuditSink::default());
//!     let store = PinStore::new(
//!         Arc::new(BoardMap::raspberry_pi()),
//!         adapter,
//!         EventNotifier::default(),
//!         audit.clone(),
//!     );
//!     let state = Arc::new(AppState {
//!         store,
//!         registry: AccessRegistry::open(),
//!         audit,
//!     });
//!
//!     // Start web server on port 8080
//!     start_web_server(WebConfig::default(), state, edge_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod gpio;
pub mod host;
pub mod web;

// Re-export public API
pub use auth::{AccessRegistry, ActorIdentity};
pub use error::{PinError, Result};
pub use gpio::{
    audit::{AuditRecord, AuditSink, MemoryAuditSink},
    board::{BoardMap, BusAssignment, PinCapabilities, PinRole, DEFAULT_BOARD},
    events::{EventNotifier, PinEvent},
    hardware::{default_adapter, edge_channel, EdgeEvent, HardwareAdapter, PinEffect, SimulatedAdapter},
    state::{EdgeDetect, Level, PinFunction, PinMode, PinMutation, PinState, PullResistor, SlewRate},
    store::PinStore,
    validate::validate,
};
pub use host::read_host_telemetry;
pub use web::{start_web_server, AppState, SharedState, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;
