//! Session lifecycle: presence edges in, record operations and pattern
//! transitions out.
//!
//! ```text
//!            docked                    formatted
//!   NoTag ──────────▶ Checking ───────────────────▶ Connected
//!     ▲                  │                              │
//!     │                  │ header missing              │ removed
//!     │                  ▼                              │
//!     │             Unformatted ──── auto-format ──────▶│
//!     │                  │                              │
//!     └──────────────────┴──────────────────────────────┘
//!                       removed
//! ```
//!
//! `Checking` always resolves within the same poll — a read failure there
//! surfaces through the delegate and the controller falls back to `NoTag`
//! with the error pattern showing until the tag leaves the field.
//!
//! The controller is deliberately clock-free apart from the timestamps
//! handed to `poll`; it never sleeps, so the caller's loop can keep the
//! pattern engine stepping at frame rate while presence is polled at a
//! much slower cadence.

use log::{info, warn};

use crate::config::DockConfig;
use crate::error::{Error, Result};
use crate::led::color::{self, Rgb};
use crate::led::{PatternEngine, PatternId};
use crate::ports::{AnalogPort, MediumPort};
use crate::presence::{HallDetector, PresenceEdge, PresenceEvent};
use crate::record::store::RecordStore;
use crate::record::{OrbRecord, Station, Trait, MAX_ENERGY, NUM_STATIONS};

/// Where the controller is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockState {
    /// Nothing in the field.
    NoTag,
    /// A tag just appeared; its header is being verified.
    Checking,
    /// Formatted orb docked, record loaded.
    Connected,
    /// A tag is docked but carries no record header.
    Unformatted,
}

/// Hooks the embedding station implements to react to session events.
/// Every hook defaults to a no-op so a station only writes the ones it
/// cares about.
pub trait DockDelegate {
    fn on_connected(&mut self, _record: &OrbRecord) {}
    fn on_disconnected(&mut self) {}
    fn on_unformatted(&mut self) {}
    fn on_error(&mut self, _err: Error) {}
    fn on_energy_changed(&mut self, _energy: u8) {}
}

/// Delegate for stations with no extra electronics.
pub struct NullDelegate;

impl DockDelegate for NullDelegate {}

/// The tag-reader dock controller.
pub struct SessionController<M: MediumPort> {
    store: RecordStore<M>,
    config: DockConfig,
    edge: PresenceEdge,
    state: DockState,
    record: OrbRecord,
    last_poll_ms: Option<u64>,
}

impl<M: MediumPort> SessionController<M> {
    pub fn new(medium: M, config: DockConfig) -> Self {
        Self {
            store: RecordStore::new(medium),
            config,
            edge: PresenceEdge::new(),
            state: DockState::NoTag,
            record: OrbRecord::default(),
            last_poll_ms: None,
        }
    }

    pub fn state(&self) -> DockState {
        self.state
    }

    /// The cached record of the docked orb. Defaults while no orb is
    /// connected.
    pub fn record(&self) -> &OrbRecord {
        &self.record
    }

    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    /// Color the pattern engine should render with right now.
    pub fn trait_color(&self) -> Rgb {
        color::unpack(self.record.trait_id.color())
    }

    /// One presence poll. Gated internally to the configured cadence, so
    /// it is safe to call every loop iteration.
    pub fn poll(
        &mut self,
        now_ms: u64,
        engine: &mut PatternEngine,
        delegate: &mut impl DockDelegate,
    ) {
        if let Some(last) = self.last_poll_ms {
            if now_ms.saturating_sub(last) < u64::from(self.config.presence_poll_ms) {
                return;
            }
        }
        self.last_poll_ms = Some(now_ms);

        let present = self.store.medium_mut().tag_present();
        match self.edge.update(present) {
            Some(PresenceEvent::Docked) => self.handle_docked(engine, delegate),
            Some(PresenceEvent::Removed) => self.handle_removed(engine, delegate),
            None => {}
        }
    }

    fn handle_docked(&mut self, engine: &mut PatternEngine, delegate: &mut impl DockDelegate) {
        self.state = DockState::Checking;
        match self.store.is_formatted() {
            Ok(true) => self.connect(engine, delegate),
            Ok(false) => {
                info!("docked tag is unformatted");
                if self.config.auto_format {
                    let trait_id = self.config.format_trait;
                    let energy = self.config.format_energy;
                    match self.format(trait_id, energy) {
                        Ok(()) => self.connect(engine, delegate),
                        Err(e) => self.fail(e, engine, delegate),
                    }
                } else {
                    self.state = DockState::Unformatted;
                    engine.set_pattern(PatternId::Error);
                    delegate.on_unformatted();
                }
            }
            Err(e) => self.fail(e, engine, delegate),
        }
    }

    fn connect(&mut self, engine: &mut PatternEngine, delegate: &mut impl DockDelegate) {
        let mut record = match self.store.load_record() {
            Ok(r) => r,
            Err(e) => return self.fail(e, engine, delegate),
        };

        // Stamp this station's visit before anyone reads the record back.
        // An already-stamped record would get an identical page back, so
        // the write is skipped rather than repeated every docking.
        let entry = record.station_mut(self.config.station);
        if !entry.visited {
            entry.visited = true;
            if let Err(e) = self.store.write_station(self.config.station, *entry) {
                return self.fail(e, engine, delegate);
            }
        }

        info!(
            "orb connected: trait {} energy {}",
            record.trait_id, record.energy
        );
        self.record = record;
        self.state = DockState::Connected;
        engine.set_pattern(PatternId::Chase);
        delegate.on_connected(&self.record);
    }

    fn fail(&mut self, err: Error, engine: &mut PatternEngine, delegate: &mut impl DockDelegate) {
        warn!("session aborted: {err}");
        self.state = DockState::NoTag;
        self.record = OrbRecord::default();
        engine.set_pattern(PatternId::Error);
        delegate.on_error(err);
    }

    fn handle_removed(&mut self, engine: &mut PatternEngine, delegate: &mut impl DockDelegate) {
        // Unformatted tags leaving the field end the session too; only the
        // error path has already reset to NoTag and reported itself.
        let had_session = self.state != DockState::NoTag;
        self.state = DockState::NoTag;
        self.record = OrbRecord::default();
        engine.set_pattern(PatternId::Idle);
        if had_session {
            info!("orb removed");
            delegate.on_disconnected();
        }
    }

    // ── Record operations (require a connected orb) ───────────

    fn require_connected(&self) -> Result<()> {
        if self.state == DockState::Connected {
            Ok(())
        } else {
            Err(Error::NoSession)
        }
    }

    /// Add energy, saturating at the cap. Persists, notifies the delegate
    /// and plays the flash before resuming the chase.
    pub fn add_energy(
        &mut self,
        amount: u8,
        engine: &mut PatternEngine,
        delegate: &mut impl DockDelegate,
    ) -> Result<()> {
        let new = self.record.energy.saturating_add(amount).min(MAX_ENERGY);
        self.apply_energy(new, engine, delegate)
    }

    /// Remove energy, saturating at zero.
    pub fn remove_energy(
        &mut self,
        amount: u8,
        engine: &mut PatternEngine,
        delegate: &mut impl DockDelegate,
    ) -> Result<()> {
        let new = self.record.energy.saturating_sub(amount);
        self.apply_energy(new, engine, delegate)
    }

    /// Set energy to an absolute value, clamped to the cap.
    pub fn set_energy(
        &mut self,
        value: u8,
        engine: &mut PatternEngine,
        delegate: &mut impl DockDelegate,
    ) -> Result<()> {
        self.apply_energy(value.min(MAX_ENERGY), engine, delegate)
    }

    fn apply_energy(
        &mut self,
        new: u8,
        engine: &mut PatternEngine,
        delegate: &mut impl DockDelegate,
    ) -> Result<()> {
        self.require_connected()?;
        if new == self.record.energy {
            return Ok(());
        }
        self.store.write_energy(new)?;
        self.record.energy = new;
        info!("energy -> {new}");
        delegate.on_energy_changed(new);
        engine.set_pattern(PatternId::Flash);
        // set_pattern cleared the queue, so this cannot overflow.
        let _ = engine.queue_pattern(PatternId::Chase);
        Ok(())
    }

    /// Rewrite the stored trait.
    pub fn set_trait(&mut self, t: Trait) -> Result<()> {
        self.require_connected()?;
        self.store.write_trait(t)?;
        self.record.trait_id = t;
        Ok(())
    }

    /// Overwrite this station's visit flag, keeping its custom byte.
    pub fn set_visited(&mut self, visited: bool) -> Result<()> {
        self.require_connected()?;
        let mut entry = self.record.station(self.config.station);
        entry.visited = visited;
        self.store.write_station(self.config.station, entry)?;
        *self.record.station_mut(self.config.station) = entry;
        Ok(())
    }

    /// Write this station's custom byte (visited is implied).
    pub fn set_custom(&mut self, value: u8) -> Result<()> {
        self.require_connected()?;
        let entry = Station {
            visited: true,
            custom: value,
        };
        self.store.write_station(self.config.station, entry)?;
        *self.record.station_mut(self.config.station) = entry;
        Ok(())
    }

    /// Clear every station entry on the docked orb.
    pub fn reset_stations(&mut self) -> Result<()> {
        self.require_connected()?;
        let blank = [Station::default(); NUM_STATIONS];
        self.store.write_all_stations(&blank)?;
        self.record.stations = blank;
        Ok(())
    }

    /// Write a fresh record: header, trait, cleared stations, the trait
    /// again, then the starting energy. The doubled trait write papers
    /// over tags that drop the first page write after a bulk erase.
    pub fn format(&mut self, trait_id: Trait, energy: u8) -> Result<()> {
        info!("formatting medium: trait {trait_id} energy {energy}");
        self.store.write_header()?;
        self.store.write_trait(trait_id)?;
        let blank = [Station::default(); NUM_STATIONS];
        self.store.write_all_stations(&blank)?;
        self.store.write_trait(trait_id)?;
        self.store.write_energy(energy)?;

        self.record = OrbRecord {
            trait_id,
            energy,
            stations: blank,
        };
        Ok(())
    }

    /// Direct store access for host tooling and tests.
    pub fn store_mut(&mut self) -> &mut RecordStore<M> {
        &mut self.store
    }
}

// ── Hall-sensor variant ────────────────────────────────────────

/// Reduced dock for stations sensing the orb with a magnet instead of the
/// tag reader: presence drives the patterns, no record I/O at all.
pub struct HallDock<A: AnalogPort> {
    detector: HallDetector<A>,
    edge: PresenceEdge,
    poll_ms: u32,
    last_poll_ms: Option<u64>,
}

impl<A: AnalogPort> HallDock<A> {
    pub fn new(detector: HallDetector<A>, poll_ms: u32) -> Self {
        Self {
            detector,
            edge: PresenceEdge::new(),
            poll_ms,
            last_poll_ms: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.edge.is_present()
    }

    /// One presence poll; same internal gating as the full controller.
    pub fn poll(&mut self, now_ms: u64, engine: &mut PatternEngine) {
        if let Some(last) = self.last_poll_ms {
            if now_ms.saturating_sub(last) < u64::from(self.poll_ms) {
                return;
            }
        }
        self.last_poll_ms = Some(now_ms);

        match self.edge.update(self.detector.sample()) {
            Some(PresenceEvent::Docked) => {
                info!("orb sensed");
                engine.set_pattern(PatternId::Flash);
                let _ = engine.queue_pattern(PatternId::Chase);
            }
            Some(PresenceEvent::Removed) => {
                info!("orb gone");
                engine.set_pattern(PatternId::Idle);
            }
            None => {}
        }
    }
}
