//! Fuzz target: `PowerState` predicate and formatting.

#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_core::PowerState;

fuzz_target!(|bits: u32| {
    let state = PowerState::from_bits(bits);

    assert_eq!(state.is_powered_off(), bits & 0x2 != 0);

    let text = state.to_string();
    assert!(!text.is_empty(), "Display must never be empty");
    assert_eq!(format!("{state:x}"), format!("{bits:x}"));
});
