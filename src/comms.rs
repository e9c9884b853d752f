//! State mirror for docks wired to downstream electronics.
//!
//! Some stations embed the dock inside a larger machine whose own
//! controller has no tag reader. This delegate mirrors the session onto
//! three output lines: presence as a digital level, energy and trait as
//! PWM duty. The trait is quantized into bands wide enough for the reader
//! on the other end to decode through RC filtering and ADC noise.

use log::debug;

use crate::ports::OutputPort;
use crate::record::{OrbRecord, Trait, MAX_ENERGY};
use crate::session::DockDelegate;

/// Duty band centers, 40 counts apart. The decoder on the other side
/// accepts anything within ±20 of a center.
const TRAIT_LEVELS: [u8; Trait::COUNT] = [25, 65, 105, 145, 185, 225];

/// Trait → PWM duty band center.
pub const fn trait_to_level(t: Trait) -> u8 {
    TRAIT_LEVELS[t as usize]
}

/// PWM duty → trait, decoding by nearest band. `None` for levels outside
/// every band (below 5 or above 245).
pub fn level_to_trait(level: u8) -> Option<Trait> {
    for (i, center) in TRAIT_LEVELS.iter().enumerate() {
        if level.abs_diff(*center) <= 20 {
            // Index comes from the levels table, always in range.
            return Trait::try_from(i as u8).ok();
        }
    }
    None
}

/// Energy → PWM duty, full scale at the cap.
pub fn energy_to_level(energy: u8) -> u8 {
    ((u16::from(energy.min(MAX_ENERGY)) * 255) / u16::from(MAX_ENERGY)) as u8
}

/// Mirrors session state onto an [`OutputPort`].
pub struct StateMirror<O: OutputPort> {
    out: O,
}

impl<O: OutputPort> StateMirror<O> {
    pub fn new(mut out: O) -> Self {
        out.set_present(false);
        out.set_energy_level(0);
        out.set_trait_level(0);
        Self { out }
    }
}

impl<O: OutputPort> DockDelegate for StateMirror<O> {
    fn on_connected(&mut self, record: &OrbRecord) {
        debug!("mirror: present, trait {}", record.trait_id);
        self.out.set_trait_level(trait_to_level(record.trait_id));
        self.out.set_energy_level(energy_to_level(record.energy));
        self.out.set_present(true);
    }

    fn on_disconnected(&mut self) {
        debug!("mirror: absent");
        self.out.set_present(false);
        self.out.set_energy_level(0);
        self.out.set_trait_level(0);
    }

    fn on_energy_changed(&mut self, energy: u8) {
        self.out.set_energy_level(energy_to_level(energy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_trait_has_a_distinct_band() {
        for i in 0..Trait::COUNT as u8 {
            let t = Trait::try_from(i).unwrap();
            assert_eq!(level_to_trait(trait_to_level(t)), Some(t));
        }
    }

    #[test]
    fn band_edges_decode_and_gaps_do_not() {
        assert_eq!(level_to_trait(44), Some(Trait::None));
        assert_eq!(level_to_trait(46), Some(Trait::Ruminate));
        assert_eq!(level_to_trait(0), None);
        assert_eq!(level_to_trait(255), None);
    }

    #[test]
    fn energy_scaling_hits_the_endpoints() {
        assert_eq!(energy_to_level(0), 0);
        assert_eq!(energy_to_level(MAX_ENERGY), 255);
        assert!(energy_to_level(MAX_ENERGY / 2) > 120);
    }

    #[derive(Default)]
    struct RecordedOut {
        present: bool,
        energy: u8,
        trait_level: u8,
    }

    impl OutputPort for RecordedOut {
        fn set_present(&mut self, present: bool) {
            self.present = present;
        }
        fn set_energy_level(&mut self, level: u8) {
            self.energy = level;
        }
        fn set_trait_level(&mut self, level: u8) {
            self.trait_level = level;
        }
    }

    #[test]
    fn mirror_tracks_the_session() {
        let mut mirror = StateMirror::new(RecordedOut::default());

        let record = OrbRecord {
            trait_id: Trait::Doubt,
            energy: MAX_ENERGY,
            ..OrbRecord::default()
        };
        mirror.on_connected(&record);
        assert!(mirror.out.present);
        assert_eq!(mirror.out.trait_level, 145);
        assert_eq!(mirror.out.energy, 255);

        mirror.on_energy_changed(0);
        assert_eq!(mirror.out.energy, 0);

        mirror.on_disconnected();
        assert!(!mirror.out.present);
        assert_eq!(mirror.out.trait_level, 0);
    }
}
