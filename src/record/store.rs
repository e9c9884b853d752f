//! Bounded-retry page I/O and typed record operations over the medium.
//!
//! Every operation retries up to [`MEDIUM_RETRIES`](crate::config::MEDIUM_RETRIES)
//! times, re-establishing the low-level link between attempts. Exhausting
//! the retries surfaces an error to the caller — never silently ignored.
//!
//! Multi-page sequences (`write_all_stations`, the format sequence in the
//! session controller) are not transactional: a failure mid-sequence leaves
//! the record in a mixed state. Callers re-read and re-validate after any
//! failure instead of assuming either the old or the new contents.

use log::{debug, warn};

use crate::config::MEDIUM_RETRIES;
use crate::error::{Error, InvalidRecord, Result};
use crate::ports::MediumPort;

use super::{
    byte_page, OrbRecord, Page, Station, StationId, Trait, ENERGY_PAGE, HEADER_PAGE, NUM_STATIONS,
    RECORD_HEADER, STATIONS_PAGE_BASE, TRAIT_PAGE,
};

/// Page-level record access over a [`MediumPort`].
pub struct RecordStore<M: MediumPort> {
    medium: M,
}

impl<M: MediumPort> RecordStore<M> {
    pub fn new(medium: M) -> Self {
        Self { medium }
    }

    /// Direct access to the underlying medium (presence polling shares the
    /// same chip).
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    // ── Raw page I/O with bounded retry ───────────────────────

    /// Read one page, retrying with link re-establishment between attempts.
    pub fn read_page(&mut self, page: u8) -> Result<Page> {
        let mut buf = [0u8; 4];
        for attempt in 1..=MEDIUM_RETRIES {
            if self.medium.read_page(page, &mut buf) {
                return Ok(buf);
            }
            if attempt < MEDIUM_RETRIES {
                debug!("read page {page} failed (attempt {attempt}), relinking");
                self.medium.reacquire();
            }
        }
        warn!("read page {page} failed after {MEDIUM_RETRIES} attempts");
        Err(Error::MediumRead { page })
    }

    /// Write one page, retrying with link re-establishment between attempts.
    pub fn write_page(&mut self, page: u8, data: &Page) -> Result<()> {
        for attempt in 1..=MEDIUM_RETRIES {
            if self.medium.write_page(page, data) {
                return Ok(());
            }
            if attempt < MEDIUM_RETRIES {
                debug!("write page {page} failed (attempt {attempt}), relinking");
                self.medium.reacquire();
            }
        }
        warn!("write page {page} failed after {MEDIUM_RETRIES} attempts");
        Err(Error::MediumWrite { page })
    }

    // ── Typed record operations ───────────────────────────────

    /// Whether the medium carries the format magic. `Ok(false)` means the
    /// page was readable but unformatted; an unreadable page is `Err`.
    pub fn is_formatted(&mut self) -> Result<bool> {
        let page = self.read_page(HEADER_PAGE)?;
        Ok(page == RECORD_HEADER)
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.write_page(HEADER_PAGE, &RECORD_HEADER)
    }

    pub fn write_trait(&mut self, t: Trait) -> Result<()> {
        self.write_page(TRAIT_PAGE, &byte_page(t as u8))
    }

    pub fn write_energy(&mut self, energy: u8) -> Result<()> {
        self.write_page(ENERGY_PAGE, &byte_page(energy))
    }

    pub fn write_station(&mut self, id: StationId, entry: Station) -> Result<()> {
        self.write_page(id.page(), &entry.to_page())
    }

    /// Sweep all station pages. Aborts at the first failed page.
    pub fn write_all_stations(&mut self, stations: &[Station; NUM_STATIONS]) -> Result<()> {
        for (i, entry) in stations.iter().enumerate() {
            self.write_page(STATIONS_PAGE_BASE + i as u8, &entry.to_page())?;
        }
        Ok(())
    }

    /// Load the full record: all stations, then trait, then energy.
    ///
    /// The header must already have been verified via [`is_formatted`] —
    /// this reads field pages only. An undefined trait byte is
    /// [`InvalidRecord::UndefinedTrait`], never coerced.
    ///
    /// [`is_formatted`]: Self::is_formatted
    pub fn load_record(&mut self) -> Result<OrbRecord> {
        let mut record = OrbRecord::default();

        for i in 0..NUM_STATIONS {
            let page = self.read_page(STATIONS_PAGE_BASE + i as u8)?;
            record.stations[i] = Station::from_page(page);
        }

        let trait_page = self.read_page(TRAIT_PAGE)?;
        record.trait_id = Trait::try_from(trait_page[0]).map_err(Error::InvalidRecord)?;

        let energy_page = self.read_page(ENERGY_PAGE)?;
        record.energy = energy_page[0];

        Ok(record)
    }
}
