//! Dock configuration.
//!
//! All tunable parameters for one physical station. Values can be
//! overridden via the persisted NVS blob; the defaults are the constants
//! the installation has been running with.

use serde::{Deserialize, Serialize};

use crate::record::{StationId, Trait, INIT_ENERGY, MAX_ENERGY};

/// Bounded retry attempts for one medium page operation.
pub const MEDIUM_RETRIES: u8 = 4;

/// Controller skin selected by the persisted variant byte at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerVariant {
    /// Tag-reader dock running the full session lifecycle.
    Dock,
    /// Magnet-sensing dock: presence + patterns only, no medium.
    Hall,
    /// Tag-reader dock that also mirrors state onto GPIO lines.
    Comms,
}

impl ControllerVariant {
    /// Decode the persisted selector byte. Unknown values fall back to the
    /// plain dock so a corrupt byte can't brick a station.
    pub const fn from_byte(b: u8) -> Self {
        match b {
            1 => Self::Hall,
            2 => Self::Comms,
            _ => Self::Dock,
        }
    }
}

/// Physical mounting of the hall sensor. The presence margin depends on
/// how far the magnet sits from the sensor, so it is calibration data,
/// not a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MountProfile {
    /// Sensor flush under the dock surface — strong signal, tight margin.
    Flush,
    /// Sensor recessed behind material — weaker signal, noisier, needs a
    /// looser margin.
    Recessed,
}

impl MountProfile {
    /// Presence threshold: `|reading − baseline|` must exceed this.
    pub const fn margin(self) -> u16 {
        match self {
            Self::Flush => 30,
            Self::Recessed => 60,
        }
    }
}

/// Analog presence detector tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HallConfig {
    /// Samples averaged for the start-up baseline.
    pub baseline_samples: u8,
    /// Settle delay between baseline samples (milliseconds).
    pub settle_ms: u32,
    pub mount: MountProfile,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            baseline_samples: 16,
            settle_ms: 10,
            mount: MountProfile::Flush,
        }
    }
}

/// Core dock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockConfig {
    /// This controller's station identity. Only this station's record
    /// entry is ever written by this controller.
    pub station: StationId,

    // --- Presence / session ---
    /// Presence poll cadence (milliseconds). Deliberately slower than the
    /// LED frame cadence so medium I/O latency never limits visual
    /// smoothness.
    pub presence_poll_ms: u32,

    // --- Auto-format policy ---
    /// Format an unformatted medium in place instead of only reporting it.
    pub auto_format: bool,
    /// Trait written by auto-format.
    pub format_trait: Trait,
    /// Energy written after auto-format. Plain docks seed the starting
    /// allowance; comms stations are provisioned with a larger pool.
    pub format_energy: u8,

    // --- Hall variant ---
    pub hall: HallConfig,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            station: StationId::Generic,
            presence_poll_ms: 300,
            auto_format: false,
            format_trait: Trait::None,
            format_energy: INIT_ENERGY,
            hall: HallConfig::default(),
        }
    }
}

impl DockConfig {
    /// Range-check the config. Used by `ConfigPort::save` implementations
    /// so a corrupt provisioning channel can't persist nonsense.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.presence_poll_ms == 0 {
            return Err("presence_poll_ms must be non-zero");
        }
        if self.format_energy > MAX_ENERGY {
            return Err("format_energy above energy cap");
        }
        if self.hall.baseline_samples == 0 {
            return Err("baseline_samples must be non-zero");
        }
        Ok(())
    }
}
