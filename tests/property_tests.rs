//! Property tests for the transition validator and pin state model.
//!
//! These operate on the pure layer (no store, no hardware): the validator
//! must be deterministic, and any sequence of accepted mutations must keep
//! every pin-state invariant intact.

use pin_pilot::gpio::state::DRIVE_STRENGTHS_MA;
use pin_pilot::{
    validate, BoardMap, EdgeDetect, Level, PinFunction, PinMode, PinMutation, PinState,
    PullResistor, SlewRate,
};
use proptest::prelude::*;

fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Low), Just(Level::High)]
}

fn arb_mode() -> impl Strategy<Value = PinMode> {
    prop_oneof![Just(PinMode::In), Just(PinMode::Out)]
}

fn arb_function() -> impl Strategy<Value = PinFunction> {
    prop_oneof![
        Just(PinFunction::Gpio),
        Just(PinFunction::Pwm),
        Just(PinFunction::I2c),
        Just(PinFunction::Spi),
        Just(PinFunction::Uart),
    ]
}

fn arb_pull() -> impl Strategy<Value = PullResistor> {
    prop_oneof![
        Just(PullResistor::None),
        Just(PullResistor::Up),
        Just(PullResistor::Down),
    ]
}

fn arb_edge() -> impl Strategy<Value = EdgeDetect> {
    prop_oneof![
        Just(EdgeDetect::None),
        Just(EdgeDetect::Rising),
        Just(EdgeDetect::Falling),
        Just(EdgeDetect::Both),
    ]
}

fn arb_slew() -> impl Strategy<Value = SlewRate> {
    prop_oneof![Just(SlewRate::Fast), Just(SlewRate::Slow)]
}

/// Any mutation, including out-of-domain numbers the validator must catch.
fn arb_mutation() -> impl Strategy<Value = PinMutation> {
    prop_oneof![
        arb_level().prop_map(PinMutation::SetLevel),
        arb_mode().prop_map(PinMutation::SetMode),
        arb_function().prop_map(PinMutation::SetFunction),
        (
            proptest::option::of(0u32..10_000),
            proptest::option::of(-20.0f64..140.0)
        )
            .prop_map(|(frequency_hz, duty_cycle)| PinMutation::SetPwm {
                frequency_hz,
                duty_cycle,
            }),
        arb_pull().prop_map(PinMutation::SetPull),
        arb_edge().prop_map(PinMutation::SetEdge),
        (
            proptest::option::of(0u8..24),
            proptest::option::of(arb_slew()),
            proptest::option::of(any::<bool>())
        )
            .prop_map(|(drive_strength_ma, slew_rate, hysteresis)| {
                PinMutation::SetAdvanced {
                    drive_strength_ma,
                    slew_rate,
                    hysteresis,
                }
            }),
        (
            proptest::option::of("[a-z ]{0,12}"),
            proptest::option::of("[a-z ]{0,12}")
        )
            .prop_map(|(label, description)| PinMutation::SetMetadata { label, description }),
    ]
}

fn arb_state() -> impl Strategy<Value = PinState> {
    (
        arb_mode(),
        arb_function(),
        arb_level(),
        1u32..10_000,
        0.0f64..=100.0,
        arb_pull(),
        arb_edge(),
    )
        .prop_map(
            |(mode, function, level, pwm_frequency_hz, pwm_duty_cycle, pull, edge_detect)| {
                PinState {
                    mode,
                    function,
                    level,
                    pwm_frequency_hz,
                    pwm_duty_cycle,
                    pull,
                    edge_detect,
                    ..Default::default()
                }
            },
        )
}

proptest! {
    /// Identical inputs always produce the identical verdict.
    #[test]
    fn validator_is_deterministic(
        state in arb_state(),
        pin_idx in 0usize..32,
        mutation in arb_mutation(),
    ) {
        let board = BoardMap::raspberry_pi();
        let pins: Vec<u8> = board.pins().collect();
        let caps = board.capabilities_of(pins[pin_idx % pins.len()]).unwrap();

        let first = validate(&state, caps, &mutation);
        let second = validate(&state, caps, &mutation);
        prop_assert_eq!(first.is_ok(), second.is_ok());
        if let (Err(a), Err(b)) = (first, second) {
            prop_assert_eq!(a.kind(), b.kind());
        }
    }

    /// A function outside the pin's capability set never passes validation.
    #[test]
    fn unsupported_function_always_rejects(
        pin_idx in 0usize..32,
        function in arb_function(),
    ) {
        let board = BoardMap::raspberry_pi();
        let pins: Vec<u8> = board.pins().collect();
        let caps = board.capabilities_of(pins[pin_idx % pins.len()]).unwrap();
        let state = PinState::default();

        let verdict = validate(&state, caps, &PinMutation::SetFunction(function));
        if caps.supports(function) {
            prop_assert!(verdict.is_ok());
        } else {
            let err = verdict.unwrap_err();
            prop_assert_eq!(err.kind(), "UNSUPPORTED_FUNCTION");
        }
    }

    /// Starting from defaults, any sequence of accepted mutations keeps
    /// every state invariant intact.
    #[test]
    fn accepted_mutations_preserve_invariants(
        pin_idx in 0usize..32,
        mutations in proptest::collection::vec(arb_mutation(), 1..40),
    ) {
        let board = BoardMap::raspberry_pi();
        let pins: Vec<u8> = board.pins().collect();
        let caps = board.capabilities_of(pins[pin_idx % pins.len()]).unwrap();
        let mut state = PinState::default();

        for mutation in &mutations {
            if validate(&state, caps, mutation).is_ok() {
                state.apply(mutation);
            }

            if state.edge_detect != EdgeDetect::None {
                prop_assert_eq!(state.mode, PinMode::In);
            }
            prop_assert!(caps.supports(state.function));
            prop_assert!(DRIVE_STRENGTHS_MA.contains(&state.drive_strength_ma));
            prop_assert!(state.pwm_frequency_hz > 0);
            prop_assert!((0.0..=100.0).contains(&state.pwm_duty_cycle));
        }
    }

    /// Rejected mutations never alter state when replayed through the
    /// validate-then-apply discipline.
    #[test]
    fn rejection_precedes_any_state_change(
        state in arb_state(),
        pin_idx in 0usize..32,
        mutation in arb_mutation(),
    ) {
        let board = BoardMap::raspberry_pi();
        let pins: Vec<u8> = board.pins().collect();
        let caps = board.capabilities_of(pins[pin_idx % pins.len()]).unwrap();

        let before = state.clone();
        let mut state = state;
        if validate(&state, caps, &mutation).is_err() {
            // The discipline skips apply entirely; state must be untouched.
            prop_assert_eq!(state, before);
        } else {
            state.apply(&mutation);
        }
    }
}
