//! Mock ports for integration tests.
//!
//! The medium records every page write so tests can assert on exactly
//! what reached the tag, and can be scripted to fail transport calls.

use std::collections::HashMap;

use orbdock::ports::MediumPort;
use orbdock::record::{
    byte_page, OrbRecord, Page, Station, Trait, ENERGY_PAGE, HEADER_PAGE, NUM_STATIONS,
    RECORD_HEADER, STATIONS_PAGE_BASE, TRAIT_PAGE,
};
use orbdock::session::DockDelegate;

// ── Scriptable tag medium ─────────────────────────────────────

pub struct MockMedium {
    pub pages: HashMap<u8, Page>,
    pub present: bool,
    /// Countdown of forced transport failures (reads and writes alike).
    pub fail_next: u32,
    pub reacquires: u32,
    /// Every successful page write, in order.
    pub writes: Vec<(u8, Page)>,
}

#[allow(dead_code)]
impl MockMedium {
    pub fn blank() -> Self {
        Self {
            pages: HashMap::new(),
            present: false,
            fail_next: 0,
            reacquires: 0,
            writes: Vec::new(),
        }
    }

    /// A medium carrying a valid record.
    pub fn formatted(trait_id: Trait, energy: u8) -> Self {
        let mut m = Self::blank();
        m.pages.insert(HEADER_PAGE, RECORD_HEADER);
        m.pages.insert(TRAIT_PAGE, byte_page(trait_id as u8));
        m.pages.insert(ENERGY_PAGE, byte_page(energy));
        for i in 0..NUM_STATIONS as u8 {
            m.pages
                .insert(STATIONS_PAGE_BASE + i, Station::default().to_page());
        }
        m
    }

    pub fn writes_to(&self, page: u8) -> usize {
        self.writes.iter().filter(|(p, _)| *p == page).count()
    }
}

impl MediumPort for MockMedium {
    fn tag_present(&mut self) -> bool {
        self.present
    }

    fn read_page(&mut self, page: u8, buf: &mut Page) -> bool {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return false;
        }
        *buf = self.pages.get(&page).copied().unwrap_or([0; 4]);
        true
    }

    fn write_page(&mut self, page: u8, data: &Page) -> bool {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return false;
        }
        self.pages.insert(page, *data);
        self.writes.push((page, *data));
        true
    }

    fn reacquire(&mut self) {
        self.reacquires += 1;
    }
}

// ── Recording delegate ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateEvent {
    Connected { trait_id: Trait, energy: u8 },
    Disconnected,
    Unformatted,
    Error,
    EnergyChanged(u8),
}

#[derive(Default)]
pub struct RecordingDelegate {
    pub events: Vec<DelegateEvent>,
}

#[allow(dead_code)]
impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: DelegateEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl DockDelegate for RecordingDelegate {
    fn on_connected(&mut self, record: &OrbRecord) {
        self.events.push(DelegateEvent::Connected {
            trait_id: record.trait_id,
            energy: record.energy,
        });
    }

    fn on_disconnected(&mut self) {
        self.events.push(DelegateEvent::Disconnected);
    }

    fn on_unformatted(&mut self) {
        self.events.push(DelegateEvent::Unformatted);
    }

    fn on_error(&mut self, _err: orbdock::error::Error) {
        self.events.push(DelegateEvent::Error);
    }

    fn on_energy_changed(&mut self, energy: u8) {
        self.events.push(DelegateEvent::EnergyChanged(energy));
    }
}
