//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! mock ports. All tests run on the host with no real hardware required.

mod mock_hw;
mod pattern_tests;
mod session_tests;
