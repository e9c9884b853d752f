//! Orb dock controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Drivers (outer ring)                     │
//! │                                                              │
//! │  Pn532Reader      Ws2812Ring      HallAdc      CommsLines    │
//! │  (MediumPort)     (LedPort)       (AnalogPort) (OutputPort)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ──────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │   SessionController / HallDock     PatternEngine   │      │
//! │  │   (pure logic, host-testable)                      │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One cooperative loop: presence is polled at its own slow cadence
//! inside the controller, the pattern engine steps every iteration, and
//! nothing ever blocks longer than one I²C transaction.

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiBusDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use orbdock::config::{ControllerVariant, DockConfig};
use orbdock::drivers::gpio_out::CommsLines;
use orbdock::drivers::hall::HallAdc;
use orbdock::drivers::hw;
use orbdock::drivers::nvs::NvsConfigStore;
use orbdock::drivers::reader::Pn532Reader;
use orbdock::drivers::ring::Ws2812Ring;
use orbdock::led::color;
use orbdock::led::{PatternEngine, PatternId, DEFAULT_PATTERNS, HALL_PATTERNS};
use orbdock::pins;
use orbdock::ports::{ConfigPort, LedPort, MediumPort};
use orbdock::presence::HallDetector;
use orbdock::record::{Trait, MAX_ENERGY};
use orbdock::session::{DockDelegate, DockState, HallDock, NullDelegate, SessionController};
use orbdock::comms::StateMirror;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("orbdock v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().context("peripherals already taken")?;

    // The ring comes up first so every later failure has a visual.
    let spi = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        None::<esp_idf_hal::gpio::AnyIOPin>,
        &SpiDriverConfig::new(),
    )
    .context("ring SPI driver")?;
    let bus = SpiBusDriver::new(spi, &SpiConfig::new().baudrate(Hertz(pins::RING_SPI_HZ)))
        .context("ring SPI bus")?;
    let mut ring = Ws2812Ring::new(bus);

    if let Err(e) = hw::init_peripherals() {
        error!("peripheral init failed: {e}");
        halt_with_error(&mut ring);
    }

    // ── Config + variant ──────────────────────────────────────
    let (config, variant) = match EspDefaultNvsPartition::take()
        .context("NVS partition")
        .and_then(|p| NvsConfigStore::new(p).map_err(Into::into))
    {
        Ok(store) => {
            let variant = ControllerVariant::from_byte(store.variant_byte());
            let config = match store.load() {
                Ok(c) => c,
                Err(e) => {
                    warn!("config load failed ({e}), using defaults");
                    DockConfig::default()
                }
            };
            (config, variant)
        }
        Err(e) => {
            warn!("NVS unavailable ({e}), defaults and plain dock variant");
            (DockConfig::default(), ControllerVariant::Dock)
        }
    };
    info!("station {} as {variant:?}", config.station);

    match variant {
        ControllerVariant::Hall => run_hall(config, ring),
        ControllerVariant::Dock => {
            let reader = init_reader(
                peripherals.i2c0,
                peripherals.pins.gpio14,
                peripherals.pins.gpio15,
                &mut ring,
            )?;
            run_dock(config, reader, ring, NullDelegate)
        }
        ControllerVariant::Comms => {
            let reader = init_reader(
                peripherals.i2c0,
                peripherals.pins.gpio14,
                peripherals.pins.gpio15,
                &mut ring,
            )?;
            run_comms(config, reader, ring)
        }
    }
}

fn init_reader<'d>(
    i2c0: esp_idf_hal::i2c::I2C0,
    sda: esp_idf_hal::gpio::Gpio14,
    scl: esp_idf_hal::gpio::Gpio15,
    ring: &mut Ws2812Ring<'_>,
) -> Result<Pn532Reader<'d>> {
    let i2c = I2cDriver::new(
        i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )
    .context("reader I2C driver")?;

    match Pn532Reader::new(i2c) {
        Ok(reader) => Ok(reader),
        Err(e) => {
            error!("tag reader init failed: {e}");
            halt_with_error(ring);
        }
    }
}

/// Full session dock: tag reader drives the lifecycle.
fn run_dock(
    config: DockConfig,
    reader: impl MediumPort,
    mut ring: impl LedPort,
    mut delegate: impl DockDelegate,
) -> ! {
    let mut session = SessionController::new(reader, config);
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);

    info!("entering dock loop");
    loop {
        let now = hw::uptime_ms();
        session.poll(now, &mut engine, &mut delegate);
        engine.step(
            now,
            session.trait_color(),
            session.record().energy,
            MAX_ENERGY,
            &mut ring,
        );
        FreeRtos::delay_ms(2);
    }
}

/// Comms dock: full session plus the GPIO state mirror and the
/// clear-energy request line from the downstream machine.
fn run_comms(config: DockConfig, reader: impl MediumPort, mut ring: impl LedPort) -> ! {
    let mut session = SessionController::new(reader, config);
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    let mut mirror = StateMirror::new(CommsLines);

    info!("entering comms loop");
    loop {
        let now = hw::uptime_ms();
        session.poll(now, &mut engine, &mut mirror);

        if session.state() == DockState::Connected
            && hw::gpio_read(pins::COMMS_CLEAR_GPIO)
        {
            if let Err(e) = session.set_energy(0, &mut engine, &mut mirror) {
                warn!("energy clear failed: {e}");
            }
        }

        engine.step(
            now,
            session.trait_color(),
            session.record().energy,
            MAX_ENERGY,
            &mut ring,
        );
        FreeRtos::delay_ms(2);
    }
}

/// Hall-sensor dock: presence and patterns only.
fn run_hall(config: DockConfig, mut ring: impl LedPort) -> ! {
    let detector = HallDetector::calibrate(HallAdc, &config.hall, &mut FreeRtos);
    let mut dock = HallDock::new(detector, config.presence_poll_ms);
    let mut engine = PatternEngine::new(HALL_PATTERNS);

    // No record to read a trait from; the hall docks glow the house color.
    let house = color::unpack(Trait::Hopeless.color());

    info!("entering hall loop");
    loop {
        let now = hw::uptime_ms();
        dock.poll(now, &mut engine);
        engine.step(now, house, MAX_ENERGY, MAX_ENERGY, &mut ring);
        FreeRtos::delay_ms(2);
    }
}

/// Terminal state: show the error pattern forever. A boot this broken
/// must be visible on the floor, not silently dark.
fn halt_with_error(ring: &mut impl LedPort) -> ! {
    let mut engine = PatternEngine::new(DEFAULT_PATTERNS);
    engine.set_pattern(PatternId::Error);
    let red = color::unpack(Trait::None.color());
    loop {
        engine.step(hw::uptime_ms(), red, 0, MAX_ENERGY, ring);
        FreeRtos::delay_ms(5);
    }
}
