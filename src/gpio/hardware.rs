//! Hardware adapter: the seam between accepted mutations and physical pins.
//!
//! Two backends implement the same contract: a Raspberry Pi backend using
//! rppal (behind the `gpio` cargo feature) and a simulated backend that
//! records effects and never fails. The backend is chosen once at startup,
//! not probed at runtime.

use crate::error::{PinError, Result};
use crate::gpio::state::{EdgeDetect, Level, PinFunction, PinMode, PullResistor, SlewRate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// How long a physical GPIO call may take before it surfaces
/// `HardwareFault` instead of blocking the pin lock.
pub const HARDWARE_TIMEOUT_MS: u64 = 250;

/// A physical effect mirroring an accepted mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PinEffect {
    /// Drive the output level
    WriteLevel(Level),
    /// Configure the pin direction
    SetDirection(PinMode),
    /// Mux the pin to a function
    SelectFunction(PinFunction),
    /// Begin waveform generation
    StartPwm { frequency_hz: u32, duty_cycle: f64 },
    /// Retune an active waveform
    ReconfigurePwm { frequency_hz: u32, duty_cycle: f64 },
    /// Stop waveform generation
    StopPwm,
    /// Configure the internal pull resistor
    SetPull(PullResistor),
    /// Arm edge interrupt reporting
    ArmInterrupt(EdgeDetect),
    /// Disarm edge interrupt reporting
    DisarmInterrupt,
    /// Pad electrical tuning
    Tune {
        drive_strength_ma: u8,
        slew_rate: SlewRate,
        hysteresis: bool,
    },
}

/// An asynchronous edge trigger reported by interrupt-capable hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub pin: u8,
    pub timestamp: DateTime<Utc>,
}

/// Create the channel edge events travel over, from the adapter into the
/// pin store's serialization domain.
pub fn edge_channel() -> (
    mpsc::UnboundedSender<EdgeEvent>,
    mpsc::UnboundedReceiver<EdgeEvent>,
) {
    mpsc::unbounded_channel()
}

/// Contract between the pin store and a hardware backend.
///
/// `write` is invoked only after validation accepted the mutation, while
/// the per-pin lock is held; it must complete (or fail) before the store
/// commits and broadcasts.
#[async_trait]
pub trait HardwareAdapter: Send + Sync {
    /// Apply one physical effect to a pin.
    async fn write(&self, pin: u8, effect: &PinEffect) -> Result<()>;
}

/// Simulated backend: records every effect and never fails.
///
/// Used for development off-device and as the default backend when the
/// `gpio` feature is not compiled in. Tests can inject edge events through
/// [`SimulatedAdapter::trigger_edge`].
pub struct SimulatedAdapter {
    journal: std::sync::Mutex<Vec<(u8, PinEffect)>>,
    edge_tx: mpsc::UnboundedSender<EdgeEvent>,
}

impl SimulatedAdapter {
    /// Create a simulated adapter reporting edge events on `edge_tx`.
    pub fn new(edge_tx: mpsc::UnboundedSender<EdgeEvent>) -> Self {
        Self {
            journal: std::sync::Mutex::new(Vec::new()),
            edge_tx,
        }
    }

    /// Simulate an edge interrupt firing on `pin` right now.
    pub fn trigger_edge(&self, pin: u8) {
        let event = EdgeEvent {
            pin,
            timestamp: Utc::now(),
        };
        // Receiver dropped means the server is shutting down; nothing to do.
        let _ = self.edge_tx.send(event);
    }

    /// Every effect written so far, in order.
    pub fn journal(&self) -> Vec<(u8, PinEffect)> {
        self.journal.lock().expect("journal lock poisoned").clone()
    }
}

#[async_trait]
impl HardwareAdapter for SimulatedAdapter {
    async fn write(&self, pin: u8, effect: &PinEffect) -> Result<()> {
        tracing::debug!("simulated write: pin {} {:?}", pin, effect);
        self.journal
            .lock()
            .expect("journal lock poisoned")
            .push((pin, effect.clone()));
        Ok(())
    }
}

#[cfg(feature = "gpio")]
mod raspberry_pi {
    use super::*;
    use rppal::gpio::{Gpio, InputPin, Mode, OutputPin, Trigger};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Raspberry Pi backend using rppal.
    ///
    /// Pins are claimed lazily and retained only while an interrupt or a
    /// waveform needs them; everything else is applied through short-lived
    /// handles with reset-on-drop disabled so settings persist. Physical
    /// calls run on the blocking pool so the write timeout can preempt
    /// them.
    pub struct RppalAdapter {
        inner: std::sync::Arc<Inner>,
    }

    struct Inner {
        gpio: Gpio,
        // Retained handles: armed inputs and active PWM outputs.
        armed: Mutex<HashMap<u8, InputPin>>,
        pwm: Mutex<HashMap<u8, OutputPin>>,
        edge_tx: mpsc::UnboundedSender<EdgeEvent>,
    }

    impl RppalAdapter {
        pub fn new(edge_tx: mpsc::UnboundedSender<EdgeEvent>) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| {
                PinError::hardware_fault(format!("failed to initialize GPIO: {}", e))
            })?;
            Ok(Self {
                inner: std::sync::Arc::new(Inner {
                    gpio,
                    armed: Mutex::new(HashMap::new()),
                    pwm: Mutex::new(HashMap::new()),
                    edge_tx,
                }),
            })
        }
    }

    impl Inner {
        fn output_pin(&self, pin: u8) -> Result<OutputPin> {
            let mut out = self
                .gpio
                .get(pin)
                .map_err(|e| PinError::hardware_fault(format!("pin {}: {}", pin, e)))?
                .into_output();
            out.set_reset_on_drop(false);
            Ok(out)
        }

        fn apply(&self, pin: u8, effect: &PinEffect) -> Result<()> {
            match effect {
                PinEffect::WriteLevel(level) => {
                    let mut out = self.output_pin(pin)?;
                    match level {
                        Level::High => out.set_high(),
                        Level::Low => out.set_low(),
                    }
                }
                PinEffect::SetDirection(mode) => {
                    let handle = self
                        .gpio
                        .get(pin)
                        .map_err(|e| PinError::hardware_fault(format!("pin {}: {}", pin, e)))?;
                    match mode {
                        PinMode::Out => {
                            let mut out = handle.into_output();
                            out.set_reset_on_drop(false);
                        }
                        PinMode::In => {
                            let mut input = handle.into_input();
                            input.set_reset_on_drop(false);
                        }
                    }
                }
                PinEffect::SelectFunction(function) => match function {
                    // Waveforms are handled by the PWM effects; plain GPIO
                    // by the direction effect.
                    PinFunction::Gpio | PinFunction::Pwm => {}
                    // ALT0 carries I2C1, SPI0 and UART0 on the pins the
                    // default board map exposes.
                    PinFunction::I2c | PinFunction::Spi | PinFunction::Uart => {
                        let handle = self
                            .gpio
                            .get(pin)
                            .map_err(|e| PinError::hardware_fault(format!("pin {}: {}", pin, e)))?;
                        let mut alt = handle.into_io(Mode::Alt0);
                        alt.set_reset_on_drop(false);
                    }
                },
                PinEffect::StartPwm {
                    frequency_hz,
                    duty_cycle,
                }
                | PinEffect::ReconfigurePwm {
                    frequency_hz,
                    duty_cycle,
                } => {
                    let mut pwm = self.pwm.lock().expect("pwm lock poisoned");
                    let mut out = match pwm.remove(&pin) {
                        Some(out) => out,
                        None => self.output_pin(pin)?,
                    };
                    out.set_pwm_frequency(f64::from(*frequency_hz), duty_cycle / 100.0)
                        .map_err(|e| {
                            PinError::hardware_fault(format!("pin {} pwm: {}", pin, e))
                        })?;
                    pwm.insert(pin, out);
                }
                PinEffect::StopPwm => {
                    let mut pwm = self.pwm.lock().expect("pwm lock poisoned");
                    if let Some(mut out) = pwm.remove(&pin) {
                        out.clear_pwm().map_err(|e| {
                            PinError::hardware_fault(format!("pin {} pwm stop: {}", pin, e))
                        })?;
                    }
                }
                PinEffect::SetPull(pull) => {
                    let handle = self
                        .gpio
                        .get(pin)
                        .map_err(|e| PinError::hardware_fault(format!("pin {}: {}", pin, e)))?;
                    let mut input = match pull {
                        PullResistor::Up => handle.into_input_pullup(),
                        PullResistor::Down => handle.into_input_pulldown(),
                        PullResistor::None => handle.into_input(),
                    };
                    input.set_reset_on_drop(false);
                }
                PinEffect::ArmInterrupt(edge) => {
                    let trigger = match edge {
                        EdgeDetect::Rising => Trigger::RisingEdge,
                        EdgeDetect::Falling => Trigger::FallingEdge,
                        EdgeDetect::Both => Trigger::Both,
                        EdgeDetect::None => Trigger::Disabled,
                    };
                    let mut input = self
                        .gpio
                        .get(pin)
                        .map_err(|e| PinError::hardware_fault(format!("pin {}: {}", pin, e)))?
                        .into_input();
                    input.set_reset_on_drop(false);
                    let tx = self.edge_tx.clone();
                    input
                        .set_async_interrupt(trigger, move |_level| {
                            let _ = tx.send(EdgeEvent {
                                pin,
                                timestamp: Utc::now(),
                            });
                        })
                        .map_err(|e| {
                            PinError::hardware_fault(format!("pin {} interrupt: {}", pin, e))
                        })?;
                    self.armed
                        .lock()
                        .expect("armed lock poisoned")
                        .insert(pin, input);
                }
                PinEffect::DisarmInterrupt => {
                    let mut armed = self.armed.lock().expect("armed lock poisoned");
                    if let Some(mut input) = armed.remove(&pin) {
                        input.clear_async_interrupt().map_err(|e| {
                            PinError::hardware_fault(format!("pin {} interrupt: {}", pin, e))
                        })?;
                    }
                }
                PinEffect::Tune { .. } => {
                    // Pad control (drive strength, slew, hysteresis) is not
                    // exposed by rppal; tracked in the store only.
                    tracing::warn!("pad tuning requested for pin {}; backend cannot apply it", pin);
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl HardwareAdapter for RppalAdapter {
        async fn write(&self, pin: u8, effect: &PinEffect) -> Result<()> {
            let inner = self.inner.clone();
            let effect = effect.clone();
            let task = tokio::task::spawn_blocking(move || inner.apply(pin, &effect));

            let deadline = Duration::from_millis(HARDWARE_TIMEOUT_MS);
            match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined.map_err(|e| {
                    PinError::hardware_fault(format!("pin {} worker failed: {}", pin, e))
                })?,
                Err(_) => Err(PinError::hardware_fault(format!(
                    "pin {} write timed out after {}ms",
                    pin, HARDWARE_TIMEOUT_MS
                ))),
            }
        }
    }
}

#[cfg(feature = "gpio")]
pub use raspberry_pi::RppalAdapter;

/// Build the backend for this process.
///
/// With the `gpio` feature compiled in, `simulated = false` selects the
/// physical backend; every other combination yields the simulated one.
pub fn default_adapter(
    simulated: bool,
    edge_tx: mpsc::UnboundedSender<EdgeEvent>,
) -> Result<std::sync::Arc<dyn HardwareAdapter>> {
    #[cfg(feature = "gpio")]
    {
        if !simulated {
            return Ok(std::sync::Arc::new(RppalAdapter::new(edge_tx)?));
        }
    }
    let _ = simulated;
    Ok(std::sync::Arc::new(SimulatedAdapter::new(edge_tx)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_adapter_records_effects() {
        let (tx, _rx) = edge_channel();
        let adapter = SimulatedAdapter::new(tx);
        adapter
            .write(17, &PinEffect::WriteLevel(Level::High))
            .await
            .unwrap();
        adapter
            .write(17, &PinEffect::SetDirection(PinMode::In))
            .await
            .unwrap();

        let journal = adapter.journal();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0], (17, PinEffect::WriteLevel(Level::High)));
    }

    #[tokio::test]
    async fn test_simulated_edge_events_arrive() {
        let (tx, mut rx) = edge_channel();
        let adapter = SimulatedAdapter::new(tx);
        adapter.trigger_edge(17);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.pin, 17);
    }
}
