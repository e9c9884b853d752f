//! WS2812B ring driver.
//!
//! On device the bitstream is generated over SPI: at 2.4 MHz every WS2812
//! bit becomes three SPI bits (`110` for one, `100` for zero), which lands
//! each bit period at 1.25 µs with the right high-time split. No RMT, no
//! interrupts, no timing-critical code.
//!
//! Host builds get a recording ring so the full render path can run in
//! integration tests.

use crate::led::color::{self, Rgb};
use crate::led::RING_LEDS;
use crate::ports::LedPort;

/// SPI bytes per LED: 24 color bits × 3 SPI bits.
const BYTES_PER_LED: usize = 9;
/// Trailing zero bytes holding the line low for the ≥50 µs reset latch.
const RESET_BYTES: usize = 18;
const STREAM_LEN: usize = RING_LEDS * BYTES_PER_LED + RESET_BYTES;

/// Staged pixel state shared by both backends.
struct Staged {
    pixels: [Rgb; RING_LEDS],
    brightness: u8,
}

impl Staged {
    fn new() -> Self {
        Self {
            pixels: [color::BLACK; RING_LEDS],
            brightness: 255,
        }
    }

    /// Encode the staged frame into the SPI bitstream, applying global
    /// brightness. WS2812 wants GRB, MSB first.
    fn encode(&self, stream: &mut [u8; STREAM_LEN]) {
        stream.fill(0);
        let mut bit_pos = 0usize;
        for px in &self.pixels {
            let (r, g, b) = color::scale(*px, self.brightness);
            for byte in [g, r, b] {
                for bit in (0..8).rev() {
                    let pattern: u8 = if byte >> bit & 1 == 1 { 0b110 } else { 0b100 };
                    for k in 0..3 {
                        if pattern >> (2 - k) & 1 == 1 {
                            stream[bit_pos / 8] |= 0x80 >> (bit_pos % 8);
                        }
                        bit_pos += 1;
                    }
                }
            }
        }
    }
}

#[cfg(feature = "espidf")]
pub use device::Ws2812Ring;

#[cfg(feature = "espidf")]
mod device {
    use esp_idf_hal::spi::{SpiBusDriver, SpiDriver};
    use log::warn;

    use super::{Staged, STREAM_LEN};
    use crate::ports::LedPort;

    /// SPI-backed WS2812 ring.
    pub struct Ws2812Ring<'d> {
        bus: SpiBusDriver<'d, SpiDriver<'d>>,
        staged: Staged,
        stream: [u8; STREAM_LEN],
    }

    impl<'d> Ws2812Ring<'d> {
        /// The bus must be configured at [`crate::pins::RING_SPI_HZ`];
        /// any other rate breaks the bit timing.
        pub fn new(bus: SpiBusDriver<'d, SpiDriver<'d>>) -> Self {
            Self {
                bus,
                staged: Staged::new(),
                stream: [0; STREAM_LEN],
            }
        }
    }

    impl LedPort for Ws2812Ring<'_> {
        fn set_pixel(&mut self, index: usize, r: u8, g: u8, b: u8) {
            if let Some(px) = self.staged.pixels.get_mut(index) {
                *px = (r, g, b);
            }
        }

        fn set_brightness(&mut self, level: u8) {
            self.staged.brightness = level;
        }

        fn show(&mut self) {
            self.staged.encode(&mut self.stream);
            if let Err(e) = self.bus.write(&self.stream) {
                // A dropped frame is invisible; the next show overwrites it.
                warn!("ring frame write failed: {e}");
            }
        }
    }
}

/// Recording ring for host builds and tests.
pub struct SimRing {
    staged: Staged,
    /// Frames latched by `show`, post-brightness.
    pub shown: std::vec::Vec<[Rgb; RING_LEDS]>,
}

impl Default for SimRing {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRing {
    pub fn new() -> Self {
        Self {
            staged: Staged::new(),
            shown: std::vec::Vec::new(),
        }
    }

    pub fn last_frame(&self) -> Option<&[Rgb; RING_LEDS]> {
        self.shown.last()
    }
}

impl LedPort for SimRing {
    fn set_pixel(&mut self, index: usize, r: u8, g: u8, b: u8) {
        if let Some(px) = self.staged.pixels.get_mut(index) {
            *px = (r, g, b);
        }
    }

    fn set_brightness(&mut self, level: u8) {
        self.staged.brightness = level;
    }

    fn show(&mut self) {
        let mut frame = [color::BLACK; RING_LEDS];
        for (out, px) in frame.iter_mut().zip(self.staged.pixels.iter()) {
            *out = color::scale(*px, self.staged.brightness);
        }
        self.shown.push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_stretches_each_bit_to_three() {
        let mut staged = Staged::new();
        staged.pixels[0] = (0, 255, 0); // pure green: first byte all ones
        let mut stream = [0u8; STREAM_LEN];
        staged.encode(&mut stream);

        // Eight 1-bits → eight `110` groups → 24 bits: 0b110110.. pattern.
        assert_eq!(stream[0], 0b1101_1011);
        assert_eq!(stream[1], 0b0110_1101);
        assert_eq!(stream[2], 0b1011_0110);
    }

    #[test]
    fn zero_bits_still_carry_the_leading_high() {
        let staged = Staged::new(); // all black
        let mut stream = [0u8; STREAM_LEN];
        staged.encode(&mut stream);
        // Eight 0-bits → `100100..`.
        assert_eq!(stream[0], 0b1001_0010);
    }

    #[test]
    fn reset_tail_is_low() {
        let mut staged = Staged::new();
        staged.pixels.fill((255, 255, 255));
        let mut stream = [0u8; STREAM_LEN];
        staged.encode(&mut stream);
        assert!(stream[STREAM_LEN - RESET_BYTES..].iter().all(|&b| b == 0));
    }

    #[test]
    fn sim_ring_applies_brightness_at_show() {
        let mut ring = SimRing::new();
        ring.set_pixel(3, 200, 100, 50);
        ring.set_brightness(128);
        ring.show();
        let frame = ring.last_frame().unwrap();
        assert_eq!(frame[3], color::scale((200, 100, 50), 128));
        assert_eq!(frame[0], color::BLACK);
    }
}
