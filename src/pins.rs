//! GPIO / peripheral pin assignments for the dock controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers. All three board variants (tag-reader dock,
//! hall-sensor dock, comms dock) share one PCB; unpopulated sections just
//! leave their pins floating.

// ---------------------------------------------------------------------------
// LED ring (WS2812B, driven over SPI MOSI)
// ---------------------------------------------------------------------------

/// SPI MOSI carrying the WS2812 bitstream.
pub const RING_DATA_GPIO: i32 = 7;
/// SPI clock rate that stretches one WS2812 bit into three SPI bits.
pub const RING_SPI_HZ: u32 = 2_400_000;

// ---------------------------------------------------------------------------
// Tag reader (PN532 over I²C)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Hall-effect presence sensor — Analog (ADC1)
// ---------------------------------------------------------------------------

/// A1302 hall sensor output via divider. ADC1 channel 4 (GPIO 5).
pub const HALL_ADC_GPIO: i32 = 5;
pub const ADC1_CH_HALL: u32 = 4;

// ---------------------------------------------------------------------------
// State mirror outputs (comms variant)
// ---------------------------------------------------------------------------

/// Digital output: HIGH while an orb is docked.
pub const COMMS_PRESENT_GPIO: i32 = 10;
/// LEDC PWM: stored energy as duty.
pub const COMMS_ENERGY_GPIO: i32 = 11;
/// LEDC PWM: trait as a quantized duty band.
pub const COMMS_TRAIT_GPIO: i32 = 12;
/// Digital input (active HIGH, pulled down): downstream machine asking for
/// the docked orb's energy to be zeroed.
pub const COMMS_CLEAR_GPIO: i32 = 13;

pub const LEDC_CH_ENERGY: u32 = 0;
pub const LEDC_CH_TRAIT: u32 = 1;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits). 8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Mirror lines are RC-filtered on the receiving side; 1 kHz is plenty.
pub const COMMS_PWM_FREQ_HZ: u32 = 1_000;
