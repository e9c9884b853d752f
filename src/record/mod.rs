//! The persistent orb record and its on-medium page layout.
//!
//! The medium is addressed in 4-byte pages. A formatted record occupies a
//! fixed window starting at [`HEADER_PAGE`]:
//!
//! ```text
//! page 4          "ORBS"                  format magic
//! page 5          trait, 0, 0, 0
//! page 6          energy, 0, 0, 0
//! page 7 + N      visited, custom, 0, 0   one page per station
//! ```
//!
//! The header is the sole formatting test: a medium without it is
//! "unformatted" and none of the other pages may be parsed as record fields.

pub mod store;

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::InvalidRecord;

// ── Page layout ───────────────────────────────────────────────

/// Pages on the medium are 4 bytes.
pub const PAGE_SIZE: usize = 4;

/// A single medium page.
pub type Page = [u8; PAGE_SIZE];

/// First user page on the medium (pages below are vendor-reserved).
pub const PAGE_OFFSET: u8 = 4;
/// Format magic lives here.
pub const HEADER_PAGE: u8 = PAGE_OFFSET;
/// Trait byte.
pub const TRAIT_PAGE: u8 = PAGE_OFFSET + 1;
/// Energy byte.
pub const ENERGY_PAGE: u8 = PAGE_OFFSET + 2;
/// Station entries start here, one page per station.
pub const STATIONS_PAGE_BASE: u8 = PAGE_OFFSET + 3;

/// ASCII magic marking a formatted record.
pub const RECORD_HEADER: Page = *b"ORBS";

/// Energy domain cap. Additive/subtractive updates saturate here.
pub const MAX_ENERGY: u8 = 250;
/// Energy written by `format`.
pub const INIT_ENERGY: u8 = 5;

// ── Traits ────────────────────────────────────────────────────

/// The enumerated attribute assigned to a record. Drives the visual
/// identity (color) of the connected-orb patterns.
///
/// An undefined byte on the medium is an error condition, never coerced —
/// see [`Trait::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Trait {
    None = 0,
    Ruminate = 1,
    Shame = 2,
    Doubt = 3,
    Discontent = 4,
    Hopeless = 5,
}

impl Trait {
    pub const COUNT: usize = 6;

    /// Display color as packed 0xRRGGBB.
    pub const fn color(self) -> u32 {
        match self {
            Self::None => 0xFF0000,
            Self::Ruminate => 0xFF2800,
            Self::Shame => 0xFF6000,
            Self::Doubt => 0x20FF00,
            Self::Discontent => 0xFF00D2,
            Self::Hopeless => 0x1400FF,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Ruminate => "RUMINATE",
            Self::Shame => "SHAME",
            Self::Doubt => "DOUBT",
            Self::Discontent => "DISCONTENT",
            Self::Hopeless => "HOPELESS",
        }
    }
}

impl TryFrom<u8> for Trait {
    type Error = InvalidRecord;

    fn try_from(value: u8) -> Result<Self, InvalidRecord> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Ruminate),
            2 => Ok(Self::Shame),
            3 => Ok(Self::Doubt),
            4 => Ok(Self::Discontent),
            5 => Ok(Self::Hopeless),
            other => Err(InvalidRecord::UndefinedTrait(other)),
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Stations ──────────────────────────────────────────────────

/// Identity of one physical dock in the installation. The record keeps one
/// [`Station`] entry per identity, indexed by discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StationId {
    Generic = 0,
    Configure = 1,
    Console = 2,
    Distiller = 3,
    Casino = 4,
    Jungle = 5,
    Alchemy = 6,
    Pipes = 7,
    Checker = 8,
    Slerp = 9,
    Retoxify = 10,
    Generator = 11,
    StringArt = 12,
    Chill = 13,
    Hunt = 14,
}

/// Number of stations in the installation, fixed at build time.
pub const NUM_STATIONS: usize = 15;

impl StationId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "GENERIC",
            Self::Configure => "CONFIGURE",
            Self::Console => "CONSOLE",
            Self::Distiller => "DISTILLER",
            Self::Casino => "CASINO",
            Self::Jungle => "JUNGLE",
            Self::Alchemy => "ALCHEMY",
            Self::Pipes => "PIPES",
            Self::Checker => "CHECKER",
            Self::Slerp => "SLERP",
            Self::Retoxify => "RETOXIFY",
            Self::Generator => "GENERATOR",
            Self::StringArt => "STRING",
            Self::Chill => "CHILL",
            Self::Hunt => "HUNT",
        }
    }

    /// Medium page holding this station's entry.
    pub const fn page(self) -> u8 {
        STATIONS_PAGE_BASE + self as u8
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-station record entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Station {
    pub visited: bool,
    pub custom: u8,
}

impl Station {
    pub const fn to_page(self) -> Page {
        [self.visited as u8, self.custom, 0, 0]
    }

    /// Decode from a raw page. Any non-zero first byte other than 1 counts
    /// as "not visited" — the original controller only ever writes 0 or 1.
    pub const fn from_page(page: Page) -> Self {
        Self {
            visited: page[0] == 1,
            custom: page[1],
        }
    }
}

// ── The record ────────────────────────────────────────────────

/// The structured data stored on the medium, as held in controller memory
/// while a tag is docked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbRecord {
    pub trait_id: Trait,
    pub energy: u8,
    pub stations: [Station; NUM_STATIONS],
}

impl Default for OrbRecord {
    fn default() -> Self {
        Self {
            trait_id: Trait::None,
            energy: 0,
            stations: [Station::default(); NUM_STATIONS],
        }
    }
}

impl OrbRecord {
    /// Entry for the given station.
    pub fn station(&self, id: StationId) -> Station {
        self.stations[id as usize]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[id as usize]
    }
}

/// Encode a single byte field (trait, energy) as a page.
pub const fn byte_page(value: u8) -> Page {
    [value, 0, 0, 0]
}
