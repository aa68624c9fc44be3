//! Live state-change broadcasting.

use crate::gpio::state::PinState;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast buffer depth; slow observers past this miss events
/// rather than blocking the mutating path.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// A confirmed state change on one pin.
#[derive(Debug, Clone, Serialize)]
pub struct PinEvent {
    pub pin: u8,
    pub state: PinState,
}

/// Broadcasts confirmed pin state changes to all subscribed observers.
///
/// Delivery is best-effort over a bounded `tokio::sync::broadcast` channel:
/// sending never waits, lagged receivers skip ahead, and each observer sees
/// events for a pin in the order its mutations were accepted. Dropping the
/// receiver unsubscribes.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<PinEvent>,
}

impl EventNotifier {
    /// Create a notifier with the given buffer depth per observer.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the live event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PinEvent> {
        self.tx.subscribe()
    }

    /// Publish a confirmed state change. Fire-and-forget: an error only
    /// means no observer is currently subscribed.
    pub fn broadcast(&self, pin: u8, state: PinState) {
        match self.tx.send(PinEvent { pin, state }) {
            Ok(receivers) => debug!("broadcast pin {} change to {} observers", pin, receivers),
            Err(_) => debug!("no observers for pin {} change", pin),
        }
    }

    /// Number of currently subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
