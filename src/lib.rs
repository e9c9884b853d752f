//! Orb dock controller library.
//!
//! Exposes the pure-logic modules (record layout, session lifecycle,
//! pattern engine) for integration testing and external inspection. All
//! ESP-IDF-specific code is guarded behind the `espidf` feature within
//! the driver modules.

#![deny(unused_must_use)]

pub mod comms;
pub mod config;
pub mod led;
pub mod ports;
pub mod presence;
pub mod record;
pub mod session;

pub mod error;
pub mod pins;

// Driver implementations are feature-guarded internally; host builds get
// the simulation shims.
pub mod drivers;
