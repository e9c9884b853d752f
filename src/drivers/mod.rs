//! Hardware drivers and peripheral shims.

pub mod gpio_out;
pub mod hall;
pub mod hw;
pub mod nvs;
pub mod reader;
pub mod ring;
