//! Render-path scenarios: the engine driving a recording ring, including
//! the zero-energy override through a real docked session.

use orbdock::drivers::ring::SimRing;
use orbdock::led::{color, PatternEngine, PatternId, DEFAULT_PATTERNS, RING_LEDS};
use orbdock::record::{StationId, Trait, MAX_ENERGY};
use orbdock::session::SessionController;
use orbdock::config::DockConfig;

use crate::mock_hw::{MockMedium, RecordingDelegate};

const COLOR: (u8, u8, u8) = (0xFF, 0x60, 0x00);

#[test]
fn idle_pushes_distinct_hues_around_the_ring() {
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut ring = SimRing::new();

    engine.step(0, COLOR, 0, MAX_ENERGY, &mut ring);
    let frame = ring.last_frame().unwrap();

    let distinct: std::collections::HashSet<_> = frame.iter().collect();
    assert!(
        distinct.len() > RING_LEDS / 2,
        "a rainbow frame is not a flat fill ({} distinct)",
        distinct.len()
    );
}

#[test]
fn flash_ramps_down_monotonically() {
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut ring = SimRing::new();
    engine.set_pattern(PatternId::Flash);

    let mut now = 0;
    while !engine.cycle_complete() {
        engine.step(now, COLOR, 0, MAX_ENERGY, &mut ring);
        now += 50;
        assert!(now < 5_000, "flash must complete");
    }

    let reds: Vec<u8> = ring.shown.iter().map(|f| f[0].0).collect();
    assert!(reds.len() > 2);
    assert!(
        reds.windows(2).all(|w| w[1] <= w[0]),
        "ramp never brightens: {reds:?}"
    );
    assert!(reds[0] > reds[reds.len() - 1]);
}

#[test]
fn zero_energy_session_pulses_red_until_topped_up() {
    let mut medium = MockMedium::formatted(Trait::Doubt, 0);
    medium.present = true;
    let mut session = SessionController::new(medium, DockConfig {
        station: StationId::Generator,
        ..DockConfig::default()
    });
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut ring = SimRing::new();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    assert_eq!(engine.current_pattern(), PatternId::Chase);

    let mut now = 0;
    for _ in 0..10 {
        engine.step(now, session.trait_color(), session.record().energy, MAX_ENERGY, &mut ring);
        now += 50;
    }
    // Doubt is green (0x20FF00) but a drained orb renders the red pulse.
    let frame = ring.last_frame().unwrap();
    assert!(frame.iter().all(|px| px.1 == 0 && px.2 == 0));
    assert!(frame.iter().any(|px| px.0 > 0));

    // Top it up: the chase comes back in the trait color.
    session.add_energy(60, &mut engine, &mut delegate).unwrap();
    for _ in 0..60 {
        engine.step(now, session.trait_color(), session.record().energy, MAX_ENERGY, &mut ring);
        now += 50;
    }
    assert_eq!(engine.current_pattern(), PatternId::Chase);
    let frame = ring.last_frame().unwrap();
    assert!(
        frame.iter().any(|px| px.1 > px.0),
        "chase must render green-dominant pixels again"
    );
}

#[test]
fn brightness_scaling_reaches_the_ring() {
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut ring = SimRing::new();
    engine.set_pattern(PatternId::Error);
    engine.step(0, COLOR, 0, MAX_ENERGY, &mut ring);

    // Error starts fully red, table brightness 160.
    let expected = color::scale((255, 0, 0), 160);
    assert_eq!(ring.last_frame().unwrap()[0], expected);
}

#[test]
fn sparkle_settles_into_a_resting_glow() {
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut ring = SimRing::new();
    engine.set_pattern(PatternId::SparkleFill);

    let mut now = 0;
    while !engine.cycle_complete() {
        engine.step(now, COLOR, 0, MAX_ENERGY, &mut ring);
        now += 50;
        assert!(now < 10_000, "sparkle must settle");
    }
    let frame = ring.last_frame().unwrap();
    // Everything dim and uniform once settled; no pixel at full blast.
    assert!(frame.iter().all(|px| px.0 < 100));
}
