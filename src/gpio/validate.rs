//! Pure transition validation.
//!
//! `validate` is the single decision point between a requested mutation and
//! any effect on hardware or state. It is deterministic: identical inputs
//! always produce the identical verdict.

use crate::error::{PinError, Result};
use crate::gpio::board::PinCapabilities;
use crate::gpio::state::{PinFunction, PinMode, PinMutation, PinState, DRIVE_STRENGTHS_MA};

/// Check a requested mutation against the pin's capabilities and current
/// state. Returns `Ok(())` on acceptance; on rejection no hardware call or
/// state change may follow.
pub fn validate(state: &PinState, caps: &PinCapabilities, mutation: &PinMutation) -> Result<()> {
    match mutation {
        PinMutation::SetLevel(_) => {
            if state.function != PinFunction::Gpio {
                return Err(PinError::unsupported_function(format!(
                    "pin {} is muxed to {}, not GPIO",
                    caps.pin, state.function
                )));
            }
            Ok(())
        }
        PinMutation::SetMode(_) => Ok(()),
        PinMutation::SetFunction(target) => {
            if !caps.supports(*target) {
                return Err(PinError::unsupported_function(format!(
                    "pin {} does not support {}",
                    caps.pin, target
                )));
            }
            Ok(())
        }
        PinMutation::SetPwm {
            frequency_hz,
            duty_cycle,
        } => {
            if state.function != PinFunction::Pwm {
                return Err(PinError::unsupported_function(format!(
                    "pin {} is not in PWM function",
                    caps.pin
                )));
            }
            if let Some(freq) = frequency_hz {
                if *freq == 0 {
                    return Err(PinError::out_of_range(
                        "PWM frequency must be greater than zero",
                    ));
                }
            }
            if let Some(duty) = duty_cycle {
                if !(0.0..=100.0).contains(duty) {
                    return Err(PinError::out_of_range(format!(
                        "PWM duty cycle {} is outside 0-100",
                        duty
                    )));
                }
            }
            Ok(())
        }
        PinMutation::SetPull(_) => Ok(()),
        PinMutation::SetEdge(_) => {
            if state.mode != PinMode::In {
                return Err(PinError::not_input_mode(format!(
                    "pin {} must be an input to detect edges",
                    caps.pin
                )));
            }
            Ok(())
        }
        PinMutation::SetAdvanced {
            drive_strength_ma, ..
        } => {
            if let Some(drive) = drive_strength_ma {
                if !DRIVE_STRENGTHS_MA.contains(drive) {
                    return Err(PinError::invalid_enum_value(format!(
                        "drive strength {} mA is not one of {:?}",
                        drive, DRIVE_STRENGTHS_MA
                    )));
                }
            }
            Ok(())
        }
        PinMutation::SetMetadata { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::board::BoardMap;
    use crate::gpio::state::{EdgeDetect, Level, PullResistor};

    fn caps(pin: u8) -> PinCapabilities {
        BoardMap::raspberry_pi()
            .capabilities_of(pin)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_level_requires_gpio_function() {
        let state = PinState {
            function: PinFunction::Pwm,
            ..Default::default()
        };
        let verdict = validate(&state, &caps(13), &PinMutation::SetLevel(Level::High));
        assert!(matches!(verdict, Err(PinError::UnsupportedFunction(_))));
    }

    #[test]
    fn test_function_checked_against_capabilities() {
        let state = PinState::default();
        let verdict = validate(&state, &caps(4), &PinMutation::SetFunction(PinFunction::I2c));
        assert!(matches!(verdict, Err(PinError::UnsupportedFunction(_))));

        // GPIO is always allowed, even on bus pins.
        assert!(validate(&state, &caps(2), &PinMutation::SetFunction(PinFunction::Gpio)).is_ok());
    }

    #[test]
    fn test_pwm_params_require_pwm_function() {
        let state = PinState::default();
        let verdict = validate(
            &state,
            &caps(13),
            &PinMutation::SetPwm {
                frequency_hz: Some(500),
                duty_cycle: None,
            },
        );
        assert!(matches!(verdict, Err(PinError::UnsupportedFunction(_))));
    }

    #[test]
    fn test_pwm_ranges() {
        let state = PinState {
            function: PinFunction::Pwm,
            ..Default::default()
        };
        let zero_freq = PinMutation::SetPwm {
            frequency_hz: Some(0),
            duty_cycle: None,
        };
        assert!(matches!(
            validate(&state, &caps(13), &zero_freq),
            Err(PinError::OutOfRange(_))
        ));

        let over_duty = PinMutation::SetPwm {
            frequency_hz: None,
            duty_cycle: Some(100.5),
        };
        assert!(matches!(
            validate(&state, &caps(13), &over_duty),
            Err(PinError::OutOfRange(_))
        ));

        let ok = PinMutation::SetPwm {
            frequency_hz: Some(2000),
            duty_cycle: Some(75.0),
        };
        assert!(validate(&state, &caps(13), &ok).is_ok());
    }

    #[test]
    fn test_edge_requires_input_mode() {
        let state = PinState::default(); // defaults to OUT
        let verdict = validate(&state, &caps(17), &PinMutation::SetEdge(EdgeDetect::Rising));
        assert!(matches!(verdict, Err(PinError::NotInputMode(_))));

        let input = PinState {
            mode: PinMode::In,
            ..Default::default()
        };
        assert!(validate(&input, &caps(17), &PinMutation::SetEdge(EdgeDetect::Rising)).is_ok());
    }

    #[test]
    fn test_drive_strength_domain() {
        let state = PinState::default();
        let bad = PinMutation::SetAdvanced {
            drive_strength_ma: Some(5),
            slew_rate: None,
            hysteresis: None,
        };
        assert!(matches!(
            validate(&state, &caps(17), &bad),
            Err(PinError::InvalidEnumValue(_))
        ));

        let good = PinMutation::SetAdvanced {
            drive_strength_ma: Some(12),
            slew_rate: None,
            hysteresis: None,
        };
        assert!(validate(&state, &caps(17), &good).is_ok());
    }

    #[test]
    fn test_pull_and_metadata_always_legal() {
        let state = PinState {
            function: PinFunction::Spi,
            ..Default::default()
        };
        assert!(validate(&state, &caps(10), &PinMutation::SetPull(PullResistor::Down)).is_ok());
        assert!(validate(
            &state,
            &caps(10),
            &PinMutation::SetMetadata {
                label: Some("spare".into()),
                description: None
            }
        )
        .is_ok());
    }
}
