//! Unified error types for the dock controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the session controller and delegate hooks without
//! allocation.

use core::fmt;

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A medium page read failed after retry exhaustion.
    MediumRead { page: u8 },
    /// A medium page write failed after retry exhaustion.
    MediumWrite { page: u8 },
    /// The record on the medium is not trustworthy: header missing or a
    /// field holds an undefined value.
    InvalidRecord(InvalidRecord),
    /// The pattern FIFO was full; the queued transition was dropped.
    QueueOverflow,
    /// A record operation was requested while no orb session is active.
    NoSession,
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediumRead { page } => write!(f, "medium read failed (page {page})"),
            Self::MediumWrite { page } => write!(f, "medium write failed (page {page})"),
            Self::InvalidRecord(e) => write!(f, "invalid record: {e}"),
            Self::QueueOverflow => write!(f, "pattern queue full, transition dropped"),
            Self::NoSession => write!(f, "no orb docked"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Why a loaded record cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRecord {
    /// The trait byte is outside the defined enum range.
    UndefinedTrait(u8),
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedTrait(v) => write!(f, "undefined trait value {v}"),
        }
    }
}

impl From<InvalidRecord> for Error {
    fn from(e: InvalidRecord) -> Self {
        Self::InvalidRecord(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
