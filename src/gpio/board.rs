//! Static pin capability table.
//!
//! The board map declares, per BCM pin number, which electrical roles a pin
//! may assume and which bus signal it carries when muxed to a peripheral.
//! It is built once at startup and never mutated, so it is shared freely
//! across request handlers without locking.

use crate::error::{PinError, Result};
use crate::gpio::state::PinFunction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An electrical role a pin may be muxed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinRole {
    /// Plain digital input/output
    #[serde(rename = "GPIO")]
    Gpio,
    /// Hardware PWM channel
    #[serde(rename = "PWM_HARDWARE")]
    PwmHardware,
    /// Software-timed PWM
    #[serde(rename = "PWM_SOFTWARE")]
    PwmSoftware,
    /// I2C bus signal
    #[serde(rename = "I2C")]
    I2c,
    /// SPI bus signal
    #[serde(rename = "SPI")]
    Spi,
    /// UART signal
    #[serde(rename = "UART")]
    Uart,
    /// PCM audio signal
    #[serde(rename = "PCM")]
    Pcm,
}

/// Which bus a peripheral-capable pin belongs to, and its signal within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusAssignment {
    /// Bus identifier, e.g. "I2C1" or "SPI0"
    pub bus: String,
    /// Signal role on that bus, e.g. "SDA" or "MOSI"
    pub signal: String,
}

/// Capabilities of a single pin. Read-only after initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinCapabilities {
    /// BCM pin number
    pub pin: u8,
    /// Roles this pin may assume
    pub roles: Vec<PinRole>,
    /// Bus membership, if the pin carries a peripheral signal
    pub bus: Option<BusAssignment>,
}

impl PinCapabilities {
    /// Create capabilities for a pin with the given roles.
    pub fn new(pin: u8, roles: &[PinRole]) -> Self {
        Self {
            pin,
            roles: roles.to_vec(),
            bus: None,
        }
    }

    /// Attach a bus assignment.
    pub fn with_bus(mut self, bus: impl Into<String>, signal: impl Into<String>) -> Self {
        self.bus = Some(BusAssignment {
            bus: bus.into(),
            signal: signal.into(),
        });
        self
    }

    /// Whether the pin may assume the given active function.
    ///
    /// GPIO is always allowed; PWM is satisfied by either a hardware or a
    /// software PWM role.
    pub fn supports(&self, function: PinFunction) -> bool {
        match function {
            PinFunction::Gpio => true,
            PinFunction::Pwm => {
                self.roles.contains(&PinRole::PwmHardware)
                    || self.roles.contains(&PinRole::PwmSoftware)
            }
            PinFunction::I2c => self.roles.contains(&PinRole::I2c),
            PinFunction::Spi => self.roles.contains(&PinRole::Spi),
            PinFunction::Uart => self.roles.contains(&PinRole::Uart),
        }
    }
}

/// The full capability table for a board.
///
/// Pin iteration order is the declaration order of the table; state
/// snapshots preserve it.
#[derive(Debug, Clone)]
pub struct BoardMap {
    entries: Vec<PinCapabilities>,
    index: HashMap<u8, usize>,
}

impl BoardMap {
    /// Build a board map from a list of pin capabilities.
    ///
    /// A duplicate pin number keeps the first declaration.
    pub fn new(entries: Vec<PinCapabilities>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.entry(entry.pin).or_insert(i);
        }
        Self { entries, index }
    }

    /// The default Raspberry Pi header map.
    ///
    /// I2C1 rides on 2/3, SPI0 on 9/10/11, UART0 on 14/15, hardware PWM on
    /// 12/13/18/19, and the PCM frame on 18-21.
    pub fn raspberry_pi() -> Self {
        use PinRole::*;
        Self::new(vec![
            PinCapabilities::new(2, &[Gpio, I2c]).with_bus("I2C1", "SDA"),
            PinCapabilities::new(3, &[Gpio, I2c]).with_bus("I2C1", "SCL"),
            PinCapabilities::new(4, &[Gpio]),
            PinCapabilities::new(17, &[Gpio]),
            PinCapabilities::new(27, &[Gpio]),
            PinCapabilities::new(22, &[Gpio]),
            PinCapabilities::new(10, &[Gpio, Spi]).with_bus("SPI0", "MOSI"),
            PinCapabilities::new(9, &[Gpio, Spi]).with_bus("SPI0", "MISO"),
            PinCapabilities::new(11, &[Gpio, Spi]).with_bus("SPI0", "SCLK"),
            PinCapabilities::new(5, &[Gpio]),
            PinCapabilities::new(6, &[Gpio]),
            PinCapabilities::new(12, &[Gpio, PwmHardware]).with_bus("PWM0", "OUT"),
            PinCapabilities::new(13, &[Gpio, PwmHardware]).with_bus("PWM1", "OUT"),
            PinCapabilities::new(19, &[Gpio, PwmHardware, Pcm]).with_bus("PCM", "FS"),
            PinCapabilities::new(26, &[Gpio]),
            PinCapabilities::new(14, &[Gpio, Uart]).with_bus("UART0", "TXD"),
            PinCapabilities::new(15, &[Gpio, Uart]).with_bus("UART0", "RXD"),
            PinCapabilities::new(18, &[Gpio, PwmHardware, Pcm]).with_bus("PCM", "CLK"),
            PinCapabilities::new(20, &[Gpio, Pcm]).with_bus("PCM", "DIN"),
            PinCapabilities::new(21, &[Gpio, Pcm]).with_bus("PCM", "DOUT"),
        ])
    }

    /// Look up the capabilities of a pin.
    pub fn capabilities_of(&self, pin: u8) -> Result<&PinCapabilities> {
        self.index
            .get(&pin)
            .map(|&i| &self.entries[i])
            .ok_or(PinError::UnknownPin(pin))
    }

    /// Whether the pin is part of this board's universe.
    pub fn contains(&self, pin: u8) -> bool {
        self.index.contains_key(&pin)
    }

    /// Pin numbers in table order.
    pub fn pins(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|e| e.pin)
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[PinCapabilities] {
        &self.entries
    }

    /// Number of managed pins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static::lazy_static! {
    /// Process-wide default board map (Raspberry Pi header).
    pub static ref DEFAULT_BOARD: BoardMap = BoardMap::raspberry_pi();
}
