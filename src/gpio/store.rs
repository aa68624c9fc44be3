//! The authoritative pin state store.
//!
//! One `PinState` per pin, each behind its own async mutex: mutations to
//! different pins proceed in parallel, while `validate -> hardware write ->
//! commit -> broadcast -> audit` is atomic with respect to a single pin.
//! Edge-trigger events enter the same per-pin serialization domain.

use crate::auth::ActorIdentity;
use crate::error::{PinError, Result};
use crate::gpio::audit::{AuditRecord, AuditSink};
use crate::gpio::board::BoardMap;
use crate::gpio::events::EventNotifier;
use crate::gpio::hardware::{HardwareAdapter, PinEffect};
use crate::gpio::state::{EdgeDetect, PinFunction, PinMode, PinMutation, PinState};
use crate::gpio::validate::validate;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Per-pin serialized state store.
///
/// Hardware commit policy: state is committed optimistically. When the
/// adapter faults after validation passed, the store keeps the attempted
/// values, the change is still broadcast and audited, and the caller
/// receives the fault. Validation failures touch nothing.
pub struct PinStore {
    board: Arc<BoardMap>,
    adapter: Arc<dyn HardwareAdapter>,
    notifier: EventNotifier,
    audit: Arc<dyn AuditSink>,
    slots: HashMap<u8, Arc<Mutex<PinState>>>,
    order: Vec<u8>,
}

impl PinStore {
    /// Create a store with one default-initialized state per board pin.
    pub fn new(
        board: Arc<BoardMap>,
        adapter: Arc<dyn HardwareAdapter>,
        notifier: EventNotifier,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let order: Vec<u8> = board.pins().collect();
        let slots = order
            .iter()
            .map(|&pin| (pin, Arc::new(Mutex::new(PinState::default()))))
            .collect();
        Self {
            board,
            adapter,
            notifier,
            audit,
            slots,
            order,
        }
    }

    /// The capability table this store was built from.
    pub fn board(&self) -> &BoardMap {
        &self.board
    }

    /// The notifier mutations broadcast through.
    pub fn notifier(&self) -> &EventNotifier {
        &self.notifier
    }

    fn slot(&self, pin: u8) -> Result<&Arc<Mutex<PinState>>> {
        self.slots.get(&pin).ok_or(PinError::UnknownPin(pin))
    }

    /// Snapshot one pin's state.
    pub async fn get(&self, pin: u8) -> Result<PinState> {
        let slot = self.slot(pin)?;
        Ok(slot.lock().await.clone())
    }

    /// Snapshot every pin's state, in capability-table order.
    pub async fn get_all(&self) -> Vec<(u8, PinState)> {
        let mut all = Vec::with_capacity(self.order.len());
        for &pin in &self.order {
            if let Some(slot) = self.slots.get(&pin) {
                all.push((pin, slot.lock().await.clone()));
            }
        }
        all
    }

    /// Apply a mutation to one pin on behalf of `actor`.
    ///
    /// Returns the resulting state once it is durably reflected. A rejected
    /// mutation returns the validation error, leaves state unchanged, and
    /// produces no broadcast and no audit record.
    pub async fn apply(
        &self,
        pin: u8,
        mutation: PinMutation,
        actor: &ActorIdentity,
    ) -> Result<PinState> {
        let caps = self.board.capabilities_of(pin)?;
        let slot = self.slot(pin)?;
        let mut state = slot.lock().await;

        validate(&state, caps, &mutation)?;

        let mut fault: Option<PinError> = None;
        for effect in plan_effects(&state, &mutation) {
            if let Err(err) = self.adapter.write(pin, &effect).await {
                warn!("hardware write failed on pin {}: {}", pin, err);
                fault = Some(err);
                break;
            }
        }

        state.apply(&mutation);
        let snapshot = state.clone();
        drop(state);

        self.notifier.broadcast(pin, snapshot.clone());

        let mut detail = json!({ "mutation": &mutation });
        if let Some(ref err) = fault {
            detail["hardware_fault"] = json!(err.to_string());
        }
        self.audit.record(AuditRecord::new(
            actor.name.clone(),
            mutation.action_kind(),
            Some(pin),
            detail,
        ));

        match fault {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    /// Ingest an edge trigger reported by the hardware adapter.
    ///
    /// Updates `last_trigger` and broadcasts exactly one event. An event
    /// arriving after edge detection was disarmed lost the per-pin race and
    /// is dropped (`Ok(None)`).
    pub async fn edge_triggered(
        &self,
        pin: u8,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<PinState>> {
        let slot = self.slot(pin)?;
        let mut state = slot.lock().await;

        if state.edge_detect == EdgeDetect::None {
            debug!("dropping edge event for disarmed pin {}", pin);
            return Ok(None);
        }

        state.last_trigger = Some(timestamp);
        let snapshot = state.clone();
        drop(state);

        self.notifier.broadcast(pin, snapshot.clone());
        Ok(Some(snapshot))
    }
}

/// Translate an accepted mutation into the physical effects it requires,
/// given the pin's current state. Ordering matters: waveforms stop before
/// the function switch away from PWM, and interrupts disarm before the
/// switch to output mode.
fn plan_effects(state: &PinState, mutation: &PinMutation) -> Vec<PinEffect> {
    match mutation {
        PinMutation::SetLevel(level) => {
            // The stored level is written regardless; only an output pin
            // drives the electrical level.
            if state.mode == PinMode::Out {
                vec![PinEffect::WriteLevel(*level)]
            } else {
                Vec::new()
            }
        }
        PinMutation::SetMode(mode) => {
            if *mode == PinMode::Out && state.edge_detect != EdgeDetect::None {
                vec![PinEffect::DisarmInterrupt, PinEffect::SetDirection(*mode)]
            } else {
                vec![PinEffect::SetDirection(*mode)]
            }
        }
        PinMutation::SetFunction(target) => {
            if state.function == PinFunction::Pwm && *target != PinFunction::Pwm {
                vec![PinEffect::StopPwm, PinEffect::SelectFunction(*target)]
            } else if state.function != PinFunction::Pwm && *target == PinFunction::Pwm {
                vec![
                    PinEffect::SelectFunction(*target),
                    PinEffect::StartPwm {
                        frequency_hz: state.pwm_frequency_hz,
                        duty_cycle: state.pwm_duty_cycle,
                    },
                ]
            } else {
                vec![PinEffect::SelectFunction(*target)]
            }
        }
        PinMutation::SetPwm {
            frequency_hz,
            duty_cycle,
        } => vec![PinEffect::ReconfigurePwm {
            frequency_hz: frequency_hz.unwrap_or(state.pwm_frequency_hz),
            duty_cycle: duty_cycle.unwrap_or(state.pwm_duty_cycle),
        }],
        PinMutation::SetPull(pull) => {
            if state.mode != PinMode::In {
                vec![
                    PinEffect::SetDirection(PinMode::In),
                    PinEffect::SetPull(*pull),
                ]
            } else {
                vec![PinEffect::SetPull(*pull)]
            }
        }
        PinMutation::SetEdge(edge) => match edge {
            EdgeDetect::None => vec![PinEffect::DisarmInterrupt],
            _ => vec![PinEffect::ArmInterrupt(*edge)],
        },
        PinMutation::SetAdvanced {
            drive_strength_ma,
            slew_rate,
            hysteresis,
        } => vec![PinEffect::Tune {
            drive_strength_ma: drive_strength_ma.unwrap_or(state.drive_strength_ma),
            slew_rate: slew_rate.unwrap_or(state.slew_rate),
            hysteresis: hysteresis.unwrap_or(state.hysteresis),
        }],
        PinMutation::SetMetadata { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::audit::MemoryAuditSink;
    use crate::gpio::hardware::{edge_channel, SimulatedAdapter};
    use crate::gpio::state::Level;

    fn store_with_adapter() -> (PinStore, Arc<SimulatedAdapter>, Arc<MemoryAuditSink>) {
        let (tx, _rx) = edge_channel();
        let adapter = Arc::new(SimulatedAdapter::new(tx));
        let audit = Arc::new(MemoryAuditSink::default());
        let store = PinStore::new(
            Arc::new(BoardMap::raspberry_pi()),
            adapter.clone(),
            EventNotifier::default(),
            audit.clone(),
        );
        (store, adapter, audit)
    }

    #[tokio::test]
    async fn test_apply_commits_broadcasts_and_audits() {
        let (store, adapter, audit) = store_with_adapter();
        let mut rx = store.notifier().subscribe();
        let actor = ActorIdentity::anonymous();

        let state = store
            .apply(17, PinMutation::SetLevel(Level::High), &actor)
            .await
            .unwrap();
        assert_eq!(state.level, Level::High);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.pin, 17);
        assert_eq!(event.state.level, Level::High);

        assert_eq!(audit.len(), 1);
        assert_eq!(
            adapter.journal(),
            vec![(17, PinEffect::WriteLevel(Level::High))]
        );
    }

    #[tokio::test]
    async fn test_rejection_leaves_no_trace() {
        let (store, adapter, audit) = store_with_adapter();
        let mut rx = store.notifier().subscribe();
        let actor = ActorIdentity::anonymous();

        let before = store.get(4).await.unwrap();
        let err = store
            .apply(4, PinMutation::SetFunction(PinFunction::I2c), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::UnsupportedFunction(_)));

        let after = store.get(4).await.unwrap();
        assert_eq!(after.function, before.function);
        assert!(rx.try_recv().is_err());
        assert!(audit.is_empty());
        assert!(adapter.journal().is_empty());
    }

    #[tokio::test]
    async fn test_level_on_input_pin_skips_hardware() {
        let (store, adapter, _audit) = store_with_adapter();
        let actor = ActorIdentity::anonymous();

        store
            .apply(17, PinMutation::SetMode(PinMode::In), &actor)
            .await
            .unwrap();
        let state = store
            .apply(17, PinMutation::SetLevel(Level::High), &actor)
            .await
            .unwrap();

        // Stored level updates, but no WriteLevel effect reached hardware.
        assert_eq!(state.level, Level::High);
        let journal = adapter.journal();
        assert!(journal
            .iter()
            .all(|(_, e)| !matches!(e, PinEffect::WriteLevel(_))));
    }

    #[tokio::test]
    async fn test_pwm_lifecycle_effects() {
        let (store, adapter, _audit) = store_with_adapter();
        let actor = ActorIdentity::anonymous();

        store
            .apply(13, PinMutation::SetFunction(PinFunction::Pwm), &actor)
            .await
            .unwrap();
        store
            .apply(
                13,
                PinMutation::SetPwm {
                    frequency_hz: Some(2000),
                    duty_cycle: Some(75.0),
                },
                &actor,
            )
            .await
            .unwrap();
        store
            .apply(13, PinMutation::SetFunction(PinFunction::Gpio), &actor)
            .await
            .unwrap();

        let journal = adapter.journal();
        let effects: Vec<&PinEffect> = journal.iter().map(|(_, e)| e).collect();
        assert!(effects.contains(&&PinEffect::StartPwm {
            frequency_hz: 1000,
            duty_cycle: 0.0
        }));
        assert!(effects.contains(&&PinEffect::ReconfigurePwm {
            frequency_hz: 2000,
            duty_cycle: 75.0
        }));
        // The waveform stops before the mux leaves PWM.
        let stop = effects
            .iter()
            .position(|e| matches!(e, PinEffect::StopPwm))
            .unwrap();
        let leave = effects
            .iter()
            .rposition(|e| matches!(e, PinEffect::SelectFunction(PinFunction::Gpio)))
            .unwrap();
        assert!(stop < leave);
    }

    #[tokio::test]
    async fn test_edge_trigger_updates_and_broadcasts_once() {
        let (store, _adapter, _audit) = store_with_adapter();
        let actor = ActorIdentity::anonymous();
        store
            .apply(17, PinMutation::SetMode(PinMode::In), &actor)
            .await
            .unwrap();
        store
            .apply(17, PinMutation::SetEdge(EdgeDetect::Rising), &actor)
            .await
            .unwrap();

        let mut rx = store.notifier().subscribe();
        let stamp = Utc::now();
        let state = store.edge_triggered(17, stamp).await.unwrap().unwrap();
        assert_eq!(state.last_trigger, Some(stamp));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.pin, 17);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edge_trigger_on_disarmed_pin_is_dropped() {
        let (store, _adapter, _audit) = store_with_adapter();
        let mut rx = store.notifier().subscribe();

        let outcome = store.edge_triggered(17, Utc::now()).await.unwrap();
        assert!(outcome.is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(store.get(17).await.unwrap().last_trigger, None);
    }

    #[tokio::test]
    async fn test_unknown_pin() {
        let (store, _adapter, _audit) = store_with_adapter();
        let actor = ActorIdentity::anonymous();
        let err = store
            .apply(99, PinMutation::SetLevel(Level::High), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::UnknownPin(99)));
        assert!(matches!(
            store.get(99).await,
            Err(PinError::UnknownPin(99))
        ));
    }
}
