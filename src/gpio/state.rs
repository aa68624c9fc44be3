//! Pin state data structures and the typed mutation vocabulary.

use crate::error::PinError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Electrical direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinMode {
    In,
    Out,
}

/// Logic level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    High,
}

/// The active electrical function of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinFunction {
    Gpio,
    Pwm,
    I2c,
    Spi,
    Uart,
}

/// Internal pull resistor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullResistor {
    None,
    Up,
    Down,
}

/// Edge detection mode. Only meaningful while the pin is an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeDetect {
    None,
    Rising,
    Falling,
    Both,
}

/// Output stage slew rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlewRate {
    Fast,
    Slow,
}

/// The discrete drive strengths the pad controller accepts, in milliamps.
pub const DRIVE_STRENGTHS_MA: [u8; 5] = [2, 4, 8, 12, 16];

macro_rules! enum_token {
    ($ty:ident { $($token:literal => $variant:ident),+ $(,)? }, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let token = match self {
                    $(Self::$variant => $token),+
                };
                f.write_str(token)
            }
        }

        impl FromStr for $ty {
            type Err = PinError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => Err(PinError::invalid_enum_value(format!(
                        "{} is not a valid {}",
                        other, $field
                    ))),
                }
            }
        }
    };
}

enum_token!(PinMode { "IN" => In, "OUT" => Out }, "mode");
enum_token!(Level { "LOW" => Low, "HIGH" => High }, "level");
enum_token!(
    PinFunction {
        "GPIO" => Gpio,
        "PWM" => Pwm,
        "I2C" => I2c,
        "SPI" => Spi,
        "UART" => Uart,
    },
    "function"
);
enum_token!(
    PullResistor { "NONE" => None, "UP" => Up, "DOWN" => Down },
    "pull setting"
);
enum_token!(
    EdgeDetect {
        "NONE" => None,
        "RISING" => Rising,
        "FALLING" => Falling,
        "BOTH" => Both,
    },
    "edge mode"
);
enum_token!(SlewRate { "FAST" => Fast, "SLOW" => Slow }, "slew rate");

/// The authoritative state of one managed pin.
///
/// Exactly one `PinState` exists per pin for the lifetime of the process;
/// it is created from capability defaults at startup and only ever mutated
/// through [`PinStore::apply`](crate::gpio::store::PinStore::apply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinState {
    /// Electrical direction
    pub mode: PinMode,
    /// Active function
    pub function: PinFunction,
    /// Logic level; meaningful while function is GPIO
    pub level: Level,
    /// PWM carrier frequency in Hz; meaningful while function is PWM
    pub pwm_frequency_hz: u32,
    /// PWM duty cycle in percent (0-100); meaningful while function is PWM
    pub pwm_duty_cycle: f64,
    /// Internal pull resistor
    pub pull: PullResistor,
    /// Edge detection mode; NONE unless the pin is an input
    pub edge_detect: EdgeDetect,
    /// Pad drive strength in milliamps
    pub drive_strength_ma: u8,
    /// Output slew rate limiting
    pub slew_rate: SlewRate,
    /// Input hysteresis
    pub hysteresis: bool,
    /// Free-text label
    pub label: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Timestamp of the last edge trigger, set only by edge events
    pub last_trigger: Option<DateTime<Utc>>,
}

impl Default for PinState {
    fn default() -> Self {
        // Pad defaults match the SoC power-on state: 8 mA drive, no slew
        // limiting, hysteresis on.
        Self {
            mode: PinMode::Out,
            function: PinFunction::Gpio,
            level: Level::Low,
            pwm_frequency_hz: 1000,
            pwm_duty_cycle: 0.0,
            pull: PullResistor::None,
            edge_detect: EdgeDetect::None,
            drive_strength_ma: 8,
            slew_rate: SlewRate::Fast,
            hysteresis: true,
            label: None,
            description: None,
            last_trigger: None,
        }
    }
}

/// A typed state change request for a single pin.
///
/// Each kind is validated independently by
/// [`validate`](crate::gpio::validate::validate) before it is allowed to
/// touch hardware or state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PinMutation {
    SetLevel(Level),
    SetMode(PinMode),
    SetFunction(PinFunction),
    SetPwm {
        frequency_hz: Option<u32>,
        duty_cycle: Option<f64>,
    },
    SetPull(PullResistor),
    SetEdge(EdgeDetect),
    SetAdvanced {
        drive_strength_ma: Option<u8>,
        slew_rate: Option<SlewRate>,
        hysteresis: Option<bool>,
    },
    SetMetadata {
        label: Option<String>,
        description: Option<String>,
    },
}

impl PinMutation {
    /// Stable action name for audit records.
    pub fn action_kind(&self) -> &'static str {
        match self {
            Self::SetLevel(_) => "set_level",
            Self::SetMode(_) => "set_mode",
            Self::SetFunction(_) => "set_function",
            Self::SetPwm { .. } => "set_pwm",
            Self::SetPull(_) => "set_pull",
            Self::SetEdge(_) => "set_edge",
            Self::SetAdvanced { .. } => "set_advanced",
            Self::SetMetadata { .. } => "set_metadata",
        }
    }
}

impl PinState {
    /// Apply a validated mutation to the in-memory state.
    ///
    /// Side effects follow the transition rules: a pull change forces the
    /// pin into input mode, and leaving input mode clears edge detection.
    pub fn apply(&mut self, mutation: &PinMutation) {
        match mutation {
            PinMutation::SetLevel(level) => {
                // The stored level is written unconditionally; the physical
                // write is gated on output mode by the effect planner.
                self.level = *level;
            }
            PinMutation::SetMode(mode) => {
                if *mode == PinMode::Out {
                    self.edge_detect = EdgeDetect::None;
                }
                self.mode = *mode;
            }
            PinMutation::SetFunction(function) => {
                self.function = *function;
            }
            PinMutation::SetPwm {
                frequency_hz,
                duty_cycle,
            } => {
                if let Some(freq) = frequency_hz {
                    self.pwm_frequency_hz = *freq;
                }
                if let Some(duty) = duty_cycle {
                    self.pwm_duty_cycle = *duty;
                }
            }
            PinMutation::SetPull(pull) => {
                self.pull = *pull;
                self.mode = PinMode::In;
            }
            PinMutation::SetEdge(edge) => {
                self.edge_detect = *edge;
            }
            PinMutation::SetAdvanced {
                drive_strength_ma,
                slew_rate,
                hysteresis,
            } => {
                if let Some(drive) = drive_strength_ma {
                    self.drive_strength_ma = *drive;
                }
                if let Some(slew) = slew_rate {
                    self.slew_rate = *slew;
                }
                if let Some(hyst) = hysteresis {
                    self.hysteresis = *hyst;
                }
            }
            PinMutation::SetMetadata { label, description } => {
                if let Some(label) = label {
                    self.label = Some(label.clone());
                }
                if let Some(description) = description {
                    self.description = Some(description.clone());
                }
            }
        }
    }
}
