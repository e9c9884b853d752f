//! Mirror output lines: one digital presence pin, two LEDC duty channels.

use crate::drivers::hw;
use crate::pins;
use crate::ports::OutputPort;

/// [`OutputPort`] over the comms pins.
#[derive(Default)]
pub struct CommsLines;

impl OutputPort for CommsLines {
    fn set_present(&mut self, present: bool) {
        hw::gpio_write(pins::COMMS_PRESENT_GPIO, present);
    }

    fn set_energy_level(&mut self, level: u8) {
        hw::ledc_set(pins::LEDC_CH_ENERGY, level);
    }

    fn set_trait_level(&mut self, level: u8) {
        hw::ledc_set(pins::LEDC_CH_TRAIT, level);
    }
}
