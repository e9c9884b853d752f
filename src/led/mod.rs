//! Non-blocking LED pattern scheduler.
//!
//! ```text
//!   set_pattern / queue_pattern          step(now_ms, ...)
//!        │                                    │
//!        ▼                                    ▼
//!   ┌──────────┐   cycle complete   ┌──────────────────┐
//!   │ FIFO     │ ─────────────────▶ │ frame generator  │──▶ LedPort
//!   │ queue    │   pop & switch     │ (one per pattern)│
//!   └──────────┘                    └──────────────────┘
//! ```
//!
//! `step` is called every loop iteration and returns immediately when the
//! current pattern's frame interval has not elapsed; it never sleeps. When
//! the active generator reports its cycle complete and the queue holds a
//! pattern, the engine switches to it on the next step.

pub mod color;
pub mod patterns;

use heapless::Deque;
use log::debug;

use crate::error::{Error, Result};
use crate::ports::LedPort;

use color::Rgb;
use patterns::{
    ChaseState, ErrorState, FlashState, IdleState, LowEnergyState, RenderParams, SparkleMode,
    SparkleState,
};

/// Pixels on the ring.
pub const RING_LEDS: usize = 24;

/// One staged frame.
pub type Frame = [Rgb; RING_LEDS];

/// Pending patterns the engine can hold before dropping requests.
pub const PATTERN_QUEUE_DEPTH: usize = 10;

/// Every pattern the engine can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    /// Rainbow rotation; no orb docked.
    Idle,
    /// Trait-colored comet pair; orb docked.
    Chase,
    /// One-shot ramp-down; energy changed.
    Flash,
    /// Red/blue crossfade; medium failure or unformatted tag.
    Error,
    /// One-shot random sparkle fill.
    SparkleFill,
    /// One-shot sparkle spreading from a fixed origin.
    SparkleOutward,
    /// Red pulse; docked orb has zero energy.
    LowEnergy,
}

impl PatternId {
    pub const COUNT: usize = 7;

    const fn index(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Chase => 1,
            Self::Flash => 2,
            Self::Error => 3,
            Self::SparkleFill => 4,
            Self::SparkleOutward => 5,
            Self::LowEnergy => 6,
        }
    }
}

/// Per-pattern tuning, fixed at engine construction.
#[derive(Debug, Clone, Copy)]
pub struct PatternConfig {
    /// Global brightness pushed with each frame (0–255).
    pub brightness: u8,
    /// Minimum milliseconds between rendered frames.
    pub interval_ms: u32,
    /// Cycle progress advanced per second of wall time.
    pub speed: f32,
}

/// One config per [`PatternId`], indexed by `PatternId::index`.
pub type PatternTable = [PatternConfig; PatternId::COUNT];

/// Tuning for the tag-reader docks.
pub const DEFAULT_PATTERNS: PatternTable = [
    PatternConfig { brightness: 100, interval_ms: 30, speed: 0.10 }, // Idle
    PatternConfig { brightness: 255, interval_ms: 40, speed: 0.25 }, // Chase
    PatternConfig { brightness: 255, interval_ms: 20, speed: 1.00 }, // Flash
    PatternConfig { brightness: 160, interval_ms: 5, speed: 0.50 },  // Error
    PatternConfig { brightness: 255, interval_ms: 35, speed: 0.50 }, // SparkleFill
    PatternConfig { brightness: 255, interval_ms: 35, speed: 0.50 }, // SparkleOutward
    PatternConfig { brightness: 200, interval_ms: 30, speed: 0.40 }, // LowEnergy
];

/// Tuning for the hall-sensor docks: dimmer idle, calmer chase.
pub const HALL_PATTERNS: PatternTable = [
    PatternConfig { brightness: 60, interval_ms: 40, speed: 0.06 },  // Idle
    PatternConfig { brightness: 200, interval_ms: 50, speed: 0.20 }, // Chase
    PatternConfig { brightness: 255, interval_ms: 20, speed: 1.00 }, // Flash
    PatternConfig { brightness: 160, interval_ms: 5, speed: 0.50 },  // Error
    PatternConfig { brightness: 255, interval_ms: 35, speed: 0.50 }, // SparkleFill
    PatternConfig { brightness: 255, interval_ms: 35, speed: 0.50 }, // SparkleOutward
    PatternConfig { brightness: 200, interval_ms: 30, speed: 0.40 }, // LowEnergy
];

enum Generator {
    Idle(IdleState),
    Chase(ChaseState),
    Flash(FlashState),
    Error(ErrorState),
    Sparkle(SparkleState),
    LowEnergy(LowEnergyState),
}

impl Generator {
    fn for_pattern(id: PatternId, seed: u64) -> Self {
        match id {
            PatternId::Idle => Self::Idle(IdleState),
            PatternId::Chase => Self::Chase(ChaseState::default()),
            PatternId::Flash => Self::Flash(FlashState::default()),
            PatternId::Error => Self::Error(ErrorState::default()),
            PatternId::SparkleFill => Self::Sparkle(SparkleState::new(SparkleMode::Fill, seed)),
            PatternId::SparkleOutward => {
                Self::Sparkle(SparkleState::new(SparkleMode::Outward, seed))
            }
            PatternId::LowEnergy => Self::LowEnergy(LowEnergyState),
        }
    }

    fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        match self {
            Self::Idle(s) => s.render(frame, p),
            Self::Chase(s) => s.render(frame, p),
            Self::Flash(s) => s.render(frame, p),
            Self::Error(s) => s.render(frame, p),
            Self::Sparkle(s) => s.render(frame, p),
            Self::LowEnergy(s) => s.render(frame, p),
        }
    }
}

/// The pattern scheduler. Owns the current generator, the pending-pattern
/// queue and the staged frame; drives a [`LedPort`] from `step`.
pub struct PatternEngine {
    table: PatternTable,
    current: PatternId,
    generator: Generator,
    /// Separate generator for the zero-energy override so the chase state
    /// survives an energy top-up.
    override_pulse: LowEnergyState,
    queue: Deque<PatternId, PATTERN_QUEUE_DEPTH>,
    cycle_complete: bool,
    progress: f32,
    last_frame_ms: Option<u64>,
    frame: Frame,
    /// Sparkle seeding varies run to run but stays reproducible in tests.
    next_seed: u64,
}

impl PatternEngine {
    pub fn new(table: PatternTable) -> Self {
        Self {
            table,
            current: PatternId::Idle,
            generator: Generator::for_pattern(PatternId::Idle, 0),
            override_pulse: LowEnergyState,
            queue: Deque::new(),
            cycle_complete: false,
            progress: 0.0,
            last_frame_ms: None,
            frame: [color::BLACK; RING_LEDS],
            next_seed: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Switch immediately, resetting animation state and dropping any
    /// queued patterns.
    pub fn set_pattern(&mut self, id: PatternId) {
        debug!("pattern -> {id:?}");
        self.queue.clear();
        self.activate(id);
    }

    /// Append to the pending queue; the engine switches when the current
    /// cycle completes. Full queue is an error and the request is dropped.
    pub fn queue_pattern(&mut self, id: PatternId) -> Result<()> {
        self.queue.push_back(id).map_err(|_| Error::QueueOverflow)
    }

    pub fn current_pattern(&self) -> PatternId {
        self.current
    }

    /// True from the moment the active cycle finished until the next
    /// switch.
    pub fn cycle_complete(&self) -> bool {
        self.cycle_complete
    }

    /// Last staged frame (host inspection and tests).
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    fn activate(&mut self, id: PatternId) {
        self.next_seed = self.next_seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.current = id;
        self.generator = Generator::for_pattern(id, self.next_seed);
        self.cycle_complete = false;
        self.progress = 0.0;
        self.last_frame_ms = None;
    }

    /// Advance the scheduler. Renders at most one frame; returns without
    /// blocking when the frame interval has not elapsed.
    pub fn step(
        &mut self,
        now_ms: u64,
        color: Rgb,
        energy: u8,
        max_energy: u8,
        led: &mut impl LedPort,
    ) {
        if self.cycle_complete {
            if let Some(next) = self.queue.pop_front() {
                debug!("pattern cycle done, advancing to {next:?}");
                self.activate(next);
            }
        }

        let cfg = self.table[self.current.index()];
        let delta_ms = match self.last_frame_ms {
            None => 0,
            Some(last) => {
                let elapsed = now_ms.saturating_sub(last);
                if elapsed < u64::from(cfg.interval_ms) {
                    return;
                }
                elapsed
            }
        };
        self.last_frame_ms = Some(now_ms);
        self.progress = (self.progress + delta_ms as f32 / 1000.0 * cfg.speed).fract();

        let params = RenderParams {
            color,
            energy,
            max_energy,
            progress: self.progress,
        };

        // A drained orb overrides the chase with the low-energy pulse; the
        // scheduled pattern stays Chase so a top-up restores it untouched.
        let completed = if self.current == PatternId::Chase && energy == 0 {
            self.override_pulse.render(&mut self.frame, &params)
        } else {
            self.generator.render(&mut self.frame, &params)
        };
        if completed {
            self.cycle_complete = true;
        }

        for (i, &(r, g, b)) in self.frame.iter().enumerate() {
            led.set_pixel(i, r, g, b);
        }
        led.set_brightness(cfg.brightness);
        led.show();
    }
}
