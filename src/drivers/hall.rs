//! Hall sensor ADC adapter.

use crate::drivers::hw;
use crate::pins;
use crate::ports::AnalogPort;

/// [`AnalogPort`] over the board's hall-sensor ADC channel.
#[derive(Default)]
pub struct HallAdc;

impl AnalogPort for HallAdc {
    fn read_sample(&mut self) -> u16 {
        hw::adc1_read(pins::ADC1_CH_HALL)
    }
}

#[cfg(all(test, not(feature = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn reads_through_the_shim() {
        hw::sim::set_adc(777);
        let mut adc = HallAdc;
        assert_eq!(adc.read_sample(), 777);
    }
}
