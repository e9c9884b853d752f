//! Port traits — the boundary between the dock's control logic and the
//! outside world.
//!
//! ```text
//!   driver ──▶ port trait ──▶ SessionController / PatternEngine (domain)
//! ```
//!
//! Chip drivers (the tag-reader IC, the addressable-LED ring, the hall
//! sensor ADC) implement these traits. The domain core consumes them via
//! generics and never touches hardware directly, so the whole session and
//! pattern logic runs on the host under test.

use crate::config::DockConfig;
use crate::record::Page;

// ───────────────────────────────────────────────────────────────
// Tag medium (driven: domain ↔ tag-reader chip)
// ───────────────────────────────────────────────────────────────

/// Low-level access to the passive storage tag.
///
/// One physical chip provides both presence detection and page I/O, which
/// is why they share a port. A single `read_page`/`write_page` call is one
/// bus transaction; retry policy lives above this trait in
/// [`RecordStore`](crate::record::store::RecordStore).
pub trait MediumPort {
    /// Poll for a tag in the field. True iff an identification request was
    /// answered with an identifier of the expected length.
    fn tag_present(&mut self) -> bool;

    /// Read one 4-byte page. A `false` return is a transport failure, not
    /// an empty page.
    fn read_page(&mut self, page: u8, buf: &mut Page) -> bool;

    /// Write one 4-byte page.
    fn write_page(&mut self, page: u8, data: &Page) -> bool;

    /// Re-establish the low-level link to the tag. Called between retry
    /// attempts after a failed transaction.
    fn reacquire(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Analog presence sensor (driven: domain ← ADC)
// ───────────────────────────────────────────────────────────────

/// Raw analog sample source for the hall-effect presence variant.
pub trait AnalogPort {
    /// One instantaneous ADC sample.
    fn read_sample(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// LED ring (driven: domain → addressable LEDs)
// ───────────────────────────────────────────────────────────────

/// Frame sink for the addressable LED ring.
///
/// The pattern engine renders into its own buffer and pushes a full frame:
/// `set_pixel` for every index, `set_brightness`, then `show`.
pub trait LedPort {
    fn set_pixel(&mut self, index: usize, r: u8, g: u8, b: u8);

    /// Global brightness applied at `show` time (0–255).
    fn set_brightness(&mut self, level: u8);

    /// Latch the staged frame out to the LEDs.
    fn show(&mut self);
}

// ───────────────────────────────────────────────────────────────
// State mirror outputs (driven: domain → downstream electronics)
// ───────────────────────────────────────────────────────────────

/// Output lines mirroring session state for downstream electronics:
/// presence as a digital level, energy and trait as analog duty.
pub trait OutputPort {
    fn set_present(&mut self, present: bool);

    /// Energy mirrored as PWM duty (0–255).
    fn set_energy_level(&mut self, level: u8);

    /// Trait mirrored as a quantized PWM band (see [`crate::comms`]).
    fn set_trait_level(&mut self, level: u8);
}

// ───────────────────────────────────────────────────────────────
// Persisted configuration
// ───────────────────────────────────────────────────────────────

/// Loads and persists the dock configuration, plus the single variant byte
/// read once at boot to select the controller skin.
pub trait ConfigPort {
    /// Load configuration. Returns `DockConfig::default()` when nothing is
    /// stored yet (first boot).
    fn load(&self) -> Result<DockConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &DockConfig) -> Result<(), ConfigError>;

    /// The persisted controller-variant selector byte.
    fn variant_byte(&self) -> u8;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
