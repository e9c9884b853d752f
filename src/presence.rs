//! Presence detection: polled boolean samples turned into dock/remove edges.
//!
//! Two detector variants feed the same edge logic:
//!
//! - **Discrete** — the tag-reader chip answers an identification request
//!   ([`MediumPort::tag_present`](crate::ports::MediumPort::tag_present));
//!   the session controller polls it directly since presence and page I/O
//!   share the chip.
//! - **Analog** — [`HallDetector`]: a hall-effect sensor compared against a
//!   baseline captured once at start-up. Baseline drift over a long
//!   exhibition day is an accepted limitation; the detector never
//!   re-baselines during operation.
//!
//! Edge detection raises an event only on a change from the previous polled
//! state, never once per poll.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::HallConfig;
use crate::ports::AnalogPort;

/// A presence state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    Docked,
    Removed,
}

/// Turns a stream of polled booleans into edges.
#[derive(Debug, Default)]
pub struct PresenceEdge {
    present: bool,
}

impl PresenceEdge {
    pub fn new() -> Self {
        Self { present: false }
    }

    /// Feed one polled sample; returns an event only on a change.
    pub fn update(&mut self, present: bool) -> Option<PresenceEvent> {
        if present == self.present {
            return None;
        }
        self.present = present;
        Some(if present {
            PresenceEvent::Docked
        } else {
            PresenceEvent::Removed
        })
    }

    pub fn is_present(&self) -> bool {
        self.present
    }
}

/// Analog-threshold presence detector with start-up baseline calibration.
pub struct HallDetector<A: AnalogPort> {
    adc: A,
    baseline: u16,
    margin: u16,
}

impl<A: AnalogPort> HallDetector<A> {
    /// Capture the baseline: average a fixed number of samples with a short
    /// settle delay between them, then hold it for the life of the process.
    pub fn calibrate(mut adc: A, cfg: &HallConfig, delay: &mut impl DelayNs) -> Self {
        let mut sum: u32 = 0;
        for _ in 0..cfg.baseline_samples {
            sum += u32::from(adc.read_sample());
            delay.delay_ms(cfg.settle_ms);
        }
        let baseline = (sum / u32::from(cfg.baseline_samples)) as u16;
        let margin = cfg.mount.margin();
        info!("hall baseline {baseline} (margin {margin}, {} samples)", cfg.baseline_samples);
        Self { adc, baseline, margin }
    }

    /// Construct with a known baseline (tests, or a persisted calibration).
    pub fn with_baseline(adc: A, baseline: u16, margin: u16) -> Self {
        Self { adc, baseline, margin }
    }

    /// One poll: present iff the instantaneous reading deviates from the
    /// baseline by more than the mount margin, in either field direction.
    pub fn sample(&mut self) -> bool {
        let reading = self.adc.read_sample();
        self.baseline.abs_diff(reading) > self.margin
    }

    pub fn baseline(&self) -> u16 {
        self.baseline
    }
}
