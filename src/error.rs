//! Error handling for the pin_pilot crate.

/// A specialized `Result` type for pin_pilot operations.
pub type Result<T> = std::result::Result<T, PinError>;

/// The main error type for pin control operations.
///
/// The first five variants are validation failures detected before any
/// hardware or state mutation; callers can retry with corrected input.
/// `HardwareFault` is reported after validation passed; the in-memory pin
/// state keeps the attempted values (see the crate docs for the commit
/// policy).
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// The pin is not part of the board's capability table
    #[error("unknown pin {0}")]
    UnknownPin(u8),

    /// The pin cannot assume the requested electrical function
    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    /// The operation requires the pin to be in input mode
    #[error("pin is not in input mode: {0}")]
    NotInputMode(String),

    /// A request field is outside its enumerated domain
    #[error("invalid value: {0}")]
    InvalidEnumValue(String),

    /// A numeric request field is outside its allowed range
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Physical GPIO access failed or timed out
    #[error("hardware fault: {0}")]
    HardwareFault(String),

    /// The request carried no valid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("web server error: {0}")]
    WebServer(String),
}

impl PinError {
    /// Create a new unsupported-function error
    pub fn unsupported_function(msg: impl Into<String>) -> Self {
        Self::UnsupportedFunction(msg.into())
    }

    /// Create a new not-input-mode error
    pub fn not_input_mode(msg: impl Into<String>) -> Self {
        Self::NotInputMode(msg.into())
    }

    /// Create a new invalid-enum-value error
    pub fn invalid_enum_value(msg: impl Into<String>) -> Self {
        Self::InvalidEnumValue(msg.into())
    }

    /// Create a new out-of-range error
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Create a new hardware fault error
    pub fn hardware_fault(msg: impl Into<String>) -> Self {
        Self::HardwareFault(msg.into())
    }

    /// Create a new unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Machine-readable error kind for the HTTP error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPin(_) => "UNKNOWN_PIN",
            Self::UnsupportedFunction(_) => "UNSUPPORTED_FUNCTION",
            Self::NotInputMode(_) => "NOT_INPUT_MODE",
            Self::InvalidEnumValue(_) => "INVALID_ENUM_VALUE",
            Self::OutOfRange(_) => "OUT_OF_RANGE",
            Self::HardwareFault(_) => "HARDWARE_FAULT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Io(_) => "IO",
            Self::Config(_) => "CONFIG",
            Self::WebServer(_) => "WEB_SERVER",
        }
    }
}
