//! Session lifecycle scenarios: dock, remove, failures, formatting,
//! energy updates — all through the public controller surface.

use orbdock::config::{DockConfig, MEDIUM_RETRIES};
use orbdock::drivers::ring::SimRing;
use orbdock::error::Error;
use orbdock::led::{PatternEngine, PatternId, DEFAULT_PATTERNS};
use orbdock::record::{StationId, Trait, HEADER_PAGE, MAX_ENERGY, RECORD_HEADER};
use orbdock::session::{DockState, SessionController};

use crate::mock_hw::{DelegateEvent, MockMedium, RecordingDelegate};

const POLL_MS: u64 = 300;

fn station_config(station: StationId) -> DockConfig {
    DockConfig {
        station,
        ..DockConfig::default()
    }
}

fn engine() -> PatternEngine {
    PatternEngine::new(DEFAULT_PATTERNS)
}

/// Step the engine until its queue has drained into the given pattern.
fn run_engine(engine: &mut PatternEngine, session_color: (u8, u8, u8), from_ms: u64) -> u64 {
    let mut ring = SimRing::new();
    let mut now = from_ms;
    for _ in 0..100 {
        engine.step(now, session_color, 100, MAX_ENERGY, &mut ring);
        now += 50;
    }
    now
}

#[test]
fn docking_connects_and_stamps_the_station() {
    let mut medium = MockMedium::formatted(Trait::Shame, 17);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Casino));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::Connected);
    assert_eq!(engine.current_pattern(), PatternId::Chase);
    assert_eq!(
        delegate.events,
        vec![DelegateEvent::Connected {
            trait_id: Trait::Shame,
            energy: 17
        }]
    );
    assert!(session.record().station(StationId::Casino).visited);
    assert_eq!(
        session.store_mut().medium_mut().writes_to(StationId::Casino.page()),
        1
    );
}

#[test]
fn removal_ends_the_session_and_clears_the_cache() {
    let mut medium = MockMedium::formatted(Trait::Doubt, 99);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Jungle));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    assert_eq!(session.state(), DockState::Connected);

    session.store_mut().medium_mut().present = false;
    session.poll(POLL_MS, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::NoTag);
    assert_eq!(engine.current_pattern(), PatternId::Idle);
    assert_eq!(delegate.events.last(), Some(&DelegateEvent::Disconnected));
    assert_eq!(session.record().trait_id, Trait::None);
    assert_eq!(session.record().energy, 0);
    // Removal must never write to a tag that is no longer in the field.
    let header_writes = session.store_mut().medium_mut().writes_to(HEADER_PAGE);
    assert_eq!(header_writes, 0);
}

#[test]
fn presence_polling_respects_the_cadence() {
    let mut medium = MockMedium::formatted(Trait::Ruminate, 1);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    session.store_mut().medium_mut().present = false;

    // Too soon: the removal is not seen yet.
    session.poll(100, &mut engine, &mut delegate);
    assert_eq!(session.state(), DockState::Connected);

    session.poll(POLL_MS, &mut engine, &mut delegate);
    assert_eq!(session.state(), DockState::NoTag);
}

#[test]
fn header_read_failure_reports_once_and_aborts() {
    let mut medium = MockMedium::formatted(Trait::Shame, 5);
    medium.present = true;
    medium.fail_next = u32::MAX;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::NoTag);
    assert_eq!(engine.current_pattern(), PatternId::Error);
    assert_eq!(delegate.count(DelegateEvent::Error), 1);
    // The transport was given its full retry budget before giving up.
    assert_eq!(
        session.store_mut().medium_mut().reacquires,
        (MEDIUM_RETRIES - 1) as u32
    );

    // Subsequent polls with the tag still in the field stay quiet.
    session.store_mut().medium_mut().fail_next = 0;
    session.poll(POLL_MS, &mut engine, &mut delegate);
    session.poll(POLL_MS * 2, &mut engine, &mut delegate);
    assert_eq!(delegate.count(DelegateEvent::Error), 1);

    // No session was ever established, so removal reports nothing more.
    session.store_mut().medium_mut().present = false;
    session.poll(POLL_MS * 3, &mut engine, &mut delegate);
    assert_eq!(delegate.count(DelegateEvent::Disconnected), 0);
}

#[test]
fn unformatted_tag_reports_once_per_docking() {
    let mut medium = MockMedium::blank();
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    assert_eq!(session.state(), DockState::Unformatted);
    assert_eq!(engine.current_pattern(), PatternId::Error);
    assert_eq!(delegate.count(DelegateEvent::Unformatted), 1);

    // Still docked: no repeat reports.
    session.poll(POLL_MS, &mut engine, &mut delegate);
    session.poll(POLL_MS * 2, &mut engine, &mut delegate);
    assert_eq!(delegate.count(DelegateEvent::Unformatted), 1);

    // Remove and re-dock: the condition is reported again.
    session.store_mut().medium_mut().present = false;
    session.poll(POLL_MS * 3, &mut engine, &mut delegate);
    session.store_mut().medium_mut().present = true;
    session.poll(POLL_MS * 4, &mut engine, &mut delegate);
    assert_eq!(delegate.count(DelegateEvent::Unformatted), 2);
}

#[test]
fn removing_an_unformatted_tag_still_signals_departure() {
    let mut medium = MockMedium::blank();
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    assert_eq!(session.state(), DockState::Unformatted);

    session.store_mut().medium_mut().present = false;
    session.poll(POLL_MS, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::NoTag);
    assert_eq!(engine.current_pattern(), PatternId::Idle);
    assert_eq!(delegate.count(DelegateEvent::Disconnected), 1);
}

#[test]
fn auto_format_connects_in_the_same_poll() {
    let mut medium = MockMedium::blank();
    medium.present = true;
    let config = DockConfig {
        auto_format: true,
        format_trait: Trait::None,
        format_energy: 42,
        ..DockConfig::default()
    };
    let mut session = SessionController::new(medium, config);
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::Connected);
    assert_eq!(
        delegate.events.last(),
        Some(&DelegateEvent::Connected {
            trait_id: Trait::None,
            energy: 42
        })
    );
    assert_eq!(
        session.store_mut().medium_mut().pages[&HEADER_PAGE],
        RECORD_HEADER
    );
}

#[test]
fn energy_update_persists_flashes_and_resumes() {
    let mut medium = MockMedium::formatted(Trait::Discontent, 10);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();
    session.poll(0, &mut engine, &mut delegate);

    session
        .add_energy(30, &mut engine, &mut delegate)
        .unwrap();

    assert_eq!(session.record().energy, 40);
    assert_eq!(delegate.events.last(), Some(&DelegateEvent::EnergyChanged(40)));
    assert_eq!(engine.current_pattern(), PatternId::Flash);

    // The flash is a one-shot; the chase resumes on its own.
    run_engine(&mut engine, session.trait_color(), 1_000);
    assert_eq!(engine.current_pattern(), PatternId::Chase);
}

#[test]
fn energy_write_failure_leaves_the_cache_untouched() {
    let mut medium = MockMedium::formatted(Trait::Hopeless, 10);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Generic));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();
    session.poll(0, &mut engine, &mut delegate);

    session.store_mut().medium_mut().fail_next = u32::MAX;
    let result = session.add_energy(30, &mut engine, &mut delegate);

    assert!(matches!(result, Err(Error::MediumWrite { .. })));
    assert_eq!(session.record().energy, 10);
    assert_eq!(delegate.count(DelegateEvent::EnergyChanged(40)), 0);
}

#[test]
fn revisiting_a_station_does_not_rewrite_the_stamp() {
    let mut medium = MockMedium::formatted(Trait::Doubt, 50);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Chill));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();

    session.poll(0, &mut engine, &mut delegate);
    session.store_mut().medium_mut().present = false;
    session.poll(POLL_MS, &mut engine, &mut delegate);
    session.store_mut().medium_mut().present = true;
    session.poll(POLL_MS * 2, &mut engine, &mut delegate);

    assert_eq!(session.state(), DockState::Connected);
    assert_eq!(
        session.store_mut().medium_mut().writes_to(StationId::Chill.page()),
        1,
        "the visit stamp is written once, not per docking"
    );
}

#[test]
fn trait_rewrite_reaches_the_medium_and_the_color() {
    let mut medium = MockMedium::formatted(Trait::None, 5);
    medium.present = true;
    let mut session = SessionController::new(medium, station_config(StationId::Alchemy));
    let mut engine = engine();
    let mut delegate = RecordingDelegate::new();
    session.poll(0, &mut engine, &mut delegate);

    session.set_trait(Trait::Discontent).unwrap();
    assert_eq!(session.record().trait_id, Trait::Discontent);
    // 0xFF00D2
    assert_eq!(session.trait_color(), (0xFF, 0x00, 0xD2));

    let reloaded = session.store_mut().load_record().unwrap();
    assert_eq!(reloaded.trait_id, Trait::Discontent);
}
