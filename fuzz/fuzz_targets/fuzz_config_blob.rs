//! Fuzz target: persisted configuration blob decoding.
//!
//! Arbitrary NVS blob contents must never panic the deserializer, and
//! anything that does decode must either pass validation or be rejected
//! with a named field — never silently accepted out of range.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;

use orbdock::config::DockConfig;
use orbdock::record::MAX_ENERGY;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = postcard::from_bytes::<DockConfig>(data) else {
        return;
    };

    match config.validate() {
        Ok(()) => {
            assert!(config.presence_poll_ms > 0);
            assert!(config.format_energy <= MAX_ENERGY);
            assert!(config.hall.baseline_samples > 0);
        }
        Err(msg) => assert!(!msg.is_empty()),
    }
});
