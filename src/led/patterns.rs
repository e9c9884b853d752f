//! Frame generators, one per visual pattern.
//!
//! Each generator owns whatever animation state it needs and renders one
//! frame at a time into the engine's buffer. The `bool` it returns is the
//! cycle-complete signal: one-shot patterns (flash, the sparkle pair) turn
//! it on exactly once when their run finishes; ambient patterns never do.
//!
//! Generators never touch hardware and never look at the clock — the
//! engine decides when a frame is due and what the normalized progress is.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::color::{self, Rgb};
use super::{Frame, RING_LEDS};

/// Inputs for one rendered frame.
pub struct RenderParams {
    /// Session color (the docked orb's trait color, or a default).
    pub color: Rgb,
    pub energy: u8,
    pub max_energy: u8,
    /// Normalized cycle position in `[0, 1)`, advanced by the engine.
    pub progress: f32,
}

// ── Idle: rotating rainbow ────────────────────────────────────

/// Hue wheel rotating around the ring. Runs while no orb is docked.
#[derive(Default)]
pub struct IdleState;

impl IdleState {
    pub fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        for (i, px) in frame.iter_mut().enumerate() {
            let t = p.progress + i as f32 / RING_LEDS as f32;
            *px = color::wheel(t.fract());
        }
        false
    }
}

// ── Chase: two comets in the session color ────────────────────

const BREATH_MIN: i16 = 30;
const BREATH_MAX: i16 = 255;
const HUE_SWING: i16 = 40;

/// Two bright points on opposite sides of the ring, trailing a parabolic
/// falloff, with a slow brightness breath and a small hue oscillation.
/// The breath rate scales with stored energy so a full orb reads livelier
/// than a nearly drained one.
pub struct ChaseState {
    head: usize,
    breath: i16,
    breath_dir: i16,
    hue_offset: i16,
    hue_dir: i16,
}

impl Default for ChaseState {
    fn default() -> Self {
        Self {
            head: 0,
            breath: BREATH_MAX,
            breath_dir: -1,
            hue_offset: 0,
            hue_dir: 1,
        }
    }
}

impl ChaseState {
    pub fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        let base = color::shift_hue(p.color, self.hue_offset as f32);
        let half = RING_LEDS / 2;
        let quarter = RING_LEDS / 4;

        for (i, px) in frame.iter_mut().enumerate() {
            // Distance to the nearest of the two heads, folded into a
            // quarter ring.
            let d = (i + RING_LEDS - self.head) % half;
            let d = d.min(half - d) as f32;
            let fade = 1.0 - d / quarter as f32;
            let fade = (fade * fade).max(0.0);
            let level = (self.breath as f32 * fade) as u8;
            *px = color::scale(base, level);
        }

        self.head = (self.head + 1) % RING_LEDS;

        let breath_step = 3 + 12 * i16::from(p.energy) / i16::from(p.max_energy.max(1));
        self.breath += self.breath_dir * breath_step;
        if self.breath >= BREATH_MAX {
            self.breath = BREATH_MAX;
            self.breath_dir = -1;
        } else if self.breath <= BREATH_MIN {
            self.breath = BREATH_MIN;
            self.breath_dir = 1;
        }

        self.hue_offset += self.hue_dir;
        if self.hue_offset.abs() >= HUE_SWING {
            self.hue_dir = -self.hue_dir;
        }

        false
    }
}

// ── Flash: one-shot full-ring ramp-down ───────────────────────

const FLASH_START: i16 = 255;
const FLASH_FLOOR: i16 = 30;
const FLASH_STEP: i16 = 12;

/// Full-ring flash in the session color, ramping down from full intensity
/// to a floor. Completes when the floor is reached; queued as feedback for
/// an energy change.
pub struct FlashState {
    intensity: i16,
    done: bool,
}

impl Default for FlashState {
    fn default() -> Self {
        Self {
            intensity: FLASH_START,
            done: false,
        }
    }
}

impl FlashState {
    pub fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        let level = self.intensity.clamp(0, 255) as u8;
        frame.fill(color::scale(p.color, level));

        if self.done {
            // Holds the floor if the queue has nothing to advance to.
            return false;
        }
        if self.intensity <= FLASH_FLOOR {
            // The floor frame itself signals completion, so the held
            // frame matches the last ramp frame exactly.
            self.done = true;
            return true;
        }
        self.intensity = (self.intensity - FLASH_STEP).max(FLASH_FLOOR);
        false
    }
}

// ── Error: red/blue crossfade ─────────────────────────────────

/// Slow linear crossfade between red and blue. Ambient; shown for medium
/// failures and unformatted tags.
pub struct ErrorState {
    red: i16,
    rising: bool,
}

impl Default for ErrorState {
    fn default() -> Self {
        Self {
            red: 255,
            rising: false,
        }
    }
}

impl ErrorState {
    pub fn render(&mut self, frame: &mut Frame, _p: &RenderParams) -> bool {
        let r = self.red.clamp(0, 255) as u8;
        let b = 255 - r;
        frame.fill((r, 0, b));

        self.red += if self.rising { 1 } else { -1 };
        if self.red >= 255 {
            self.rising = false;
        } else if self.red <= 0 {
            self.rising = true;
        }
        false
    }
}

// ── Sparkle: one-shot seeded bright points ────────────────────

/// Where newly seeded sparks land on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkleMode {
    /// Random positions anywhere on the ring.
    Fill,
    /// Alternating steps outward from a fixed origin.
    Outward,
}

const SPARK_COUNT: usize = 12;
const SPARK_FADE: u8 = 24;
const SPARK_RESTING: u8 = 40;
const SPARKLE_ORIGIN: usize = 0;

struct Spark {
    pos: usize,
    level: u8,
}

/// Seeds one bright point per frame until the budget is spent, fading each
/// toward a dim resting glow. Completes once all sparks have settled.
pub struct SparkleState {
    mode: SparkleMode,
    rng: SmallRng,
    sparks: heapless::Vec<Spark, SPARK_COUNT>,
    seeded: usize,
    done: bool,
}

impl SparkleState {
    pub fn new(mode: SparkleMode, seed: u64) -> Self {
        Self {
            mode,
            rng: SmallRng::seed_from_u64(seed),
            sparks: heapless::Vec::new(),
            seeded: 0,
            done: false,
        }
    }

    fn next_position(&mut self) -> usize {
        match self.mode {
            SparkleMode::Fill => self.rng.random_range(0..RING_LEDS),
            SparkleMode::Outward => {
                // 0, +1, -1, +2, -2, ... from the origin.
                let n = self.seeded;
                let step = n.div_ceil(2);
                if n % 2 == 1 {
                    (SPARKLE_ORIGIN + step) % RING_LEDS
                } else {
                    (SPARKLE_ORIGIN + RING_LEDS - step % RING_LEDS) % RING_LEDS
                }
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        let resting = color::scale(p.color, SPARK_RESTING);
        frame.fill(resting);

        if self.seeded < SPARK_COUNT {
            let pos = self.next_position();
            // Capacity equals the seed budget, so this never overflows.
            let _ = self.sparks.push(Spark { pos, level: 255 });
            self.seeded += 1;
        }

        let mut all_settled = self.seeded == SPARK_COUNT;
        for spark in self.sparks.iter_mut() {
            if spark.level > SPARK_RESTING {
                frame[spark.pos] =
                    color::max_channel(frame[spark.pos], color::scale(p.color, spark.level));
                spark.level = spark.level.saturating_sub(SPARK_FADE).max(SPARK_RESTING);
                if spark.level > SPARK_RESTING {
                    all_settled = false;
                }
            }
        }

        if all_settled && !self.done {
            self.done = true;
            return true;
        }
        false
    }
}

// ── Low energy: red breathing pulse ───────────────────────────

/// Whole-ring red pulse. Ambient; overrides the chase while the docked
/// orb's energy is zero.
#[derive(Default)]
pub struct LowEnergyState;

impl LowEnergyState {
    pub fn render(&mut self, frame: &mut Frame, p: &RenderParams) -> bool {
        let phase = p.progress * core::f32::consts::TAU;
        let level = ((phase.sin() * 0.5 + 0.5) * 225.0 + 30.0) as u8;
        frame.fill(color::scale((255, 0, 0), level));
        false
    }
}
