//! End-to-end driver tests over mocked buses.
//!
//! Exercise the full stack from `TicStepper` through the transport adapters
//! down to the exact bytes on the wire.

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use embedded_hal_mock::eh1::serial::{Mock as SerialMock, Transaction as SerialTransaction};

use tic_motion::config::{Distance, LimitPolicy, Microsteps, MotorConfig, Rpm, RpmPerSec};
use tic_motion::{
    DriveState, Error, MotorDriver, TicI2c, TicSerial, TicStepper, TicStepperBuilder,
};

const ADDR: u8 = 0x0E;

fn make_config() -> MotorConfig {
    MotorConfig {
        name: heapless::String::try_from("stage").unwrap(),
        steps_per_revolution: 200,
        microsteps: Microsteps::FULL,
        distance_per_revolution: 1.0,
        min_speed: Rpm(0.1),
        max_speed: Rpm(600.0),
        max_accel: RpmPerSec(100.0),
        max_decel: RpmPerSec(100.0),
        limits: None,
    }
}

// 600 RPM at 200 steps/rev is 2000 steps/s, or 20,000,000 native.
const MAX_SPEED_LE: [u8; 4] = [0x00, 0x2D, 0x31, 0x01];

fn init_transactions() -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write(ADDR, vec![0xB0]),
        I2cTransaction::write(ADDR, vec![0x94, 0x00]),
        I2cTransaction::write(
            ADDR,
            vec![0xE6, MAX_SPEED_LE[0], MAX_SPEED_LE[1], MAX_SPEED_LE[2], MAX_SPEED_LE[3]],
        ),
    ]
}

#[test]
fn construction_resets_and_configures_over_i2c() {
    let mut i2c = I2cMock::new(&init_transactions());

    let driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    assert_eq!(driver.state(), DriveState::Disabled);

    i2c.done();
}

#[test]
fn enable_and_move_to_wire_bytes() {
    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0x85]),
        I2cTransaction::write(ADDR, vec![0x83]),
        // 100 steps, little-endian
        I2cTransaction::write(ADDR, vec![0xE0, 0x64, 0x00, 0x00, 0x00]),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    driver.enable().unwrap();
    driver.move_to(Distance(0.5)).unwrap();
    assert_eq!(driver.state(), DriveState::EnabledMoving);

    i2c.done();
}

#[test]
fn rejected_move_produces_no_traffic() {
    let mut config = make_config();
    config.limits = Some(tic_motion::config::SoftLimits::new(
        Distance(0.0),
        Distance(2.0),
        LimitPolicy::Reject,
    ));

    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0x85]),
        I2cTransaction::write(ADDR, vec![0x83]),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &config).unwrap();
    driver.enable().unwrap();
    assert!(driver.move_to(Distance(5.0)).is_err());

    // done() fails if the move had reached the bus.
    i2c.done();
}

#[test]
fn bus_error_latches_fault_and_blocks_further_traffic() {
    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0x85]),
        I2cTransaction::write(ADDR, vec![0x83]),
        I2cTransaction::write(ADDR, vec![0xE0, 0x64, 0x00, 0x00, 0x00])
            .with_error(ErrorKind::Other),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    driver.enable().unwrap();

    assert!(matches!(
        driver.move_to(Distance(0.5)).unwrap_err(),
        Error::Comm(_)
    ));
    assert_eq!(driver.state(), DriveState::Faulted);

    // Everything after the fault fails fast without bus traffic.
    assert!(driver.move_to(Distance(0.1)).is_err());
    assert!(driver.stop().is_err());
    assert!(driver.is_moving().is_err());

    i2c.done();
}

#[test]
fn is_moving_queries_current_velocity() {
    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0xA1, 0x26]),
        I2cTransaction::read(ADDR, vec![0x00, 0x00, 0x00, 0x00]),
        I2cTransaction::write(ADDR, vec![0xA1, 0x26]),
        I2cTransaction::read(ADDR, 2_000_000i32.to_le_bytes().to_vec()),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    assert!(!driver.is_moving().unwrap());
    assert!(driver.is_moving().unwrap());

    i2c.done();
}

#[test]
fn speed_decodes_native_velocity() {
    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0xA1, 0x26]),
        // 2,000,000 native is 200 steps/s is 60 RPM
        I2cTransaction::read(ADDR, 2_000_000i32.to_le_bytes().to_vec()),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    let speed = driver.speed().unwrap();
    assert!((speed.0 - 60.0).abs() < 0.001);

    i2c.done();
}

#[test]
fn shutdown_stops_and_returns_transport() {
    let mut transactions = init_transactions();
    transactions.extend([
        I2cTransaction::write(ADDR, vec![0x85]),
        I2cTransaction::write(ADDR, vec![0x83]),
        I2cTransaction::write(ADDR, vec![0x89]),
        I2cTransaction::write(ADDR, vec![0x8F]),
        I2cTransaction::write(ADDR, vec![0x86]),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    driver.enable().unwrap();

    let transport = driver.shutdown().unwrap();
    let _ = transport.release();

    i2c.done();
}

#[test]
fn builder_collects_parameters_and_initializes() {
    let mut i2c = I2cMock::new(&init_transactions());

    let driver = TicStepperBuilder::new(TicI2c::new(i2c.clone()))
        .name("stage")
        .steps_per_revolution(200)
        .distance_per_revolution(1.0)
        .max_speed(Rpm(600.0))
        .build()
        .unwrap();
    assert_eq!(driver.state(), DriveState::Disabled);

    i2c.done();
}

#[test]
fn builder_reports_missing_required_field() {
    let mut i2c = I2cMock::new(&[]);

    let err = TicStepperBuilder::new(TicI2c::new(i2c.clone()))
        .steps_per_revolution(200)
        .max_speed(Rpm(600.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    i2c.done();
}

#[test]
fn construction_over_serial_uses_seven_bit_encoding() {
    let transactions = [
        SerialTransaction::write_many([0xB0]),
        SerialTransaction::flush(),
        SerialTransaction::write_many([0x94, 0x00]),
        SerialTransaction::flush(),
        // 20,000,000 split into an MSbs byte plus four 7-bit bytes
        SerialTransaction::write_many([0xE6, 0x00, 0x00, 0x2D, 0x31, 0x01]),
        SerialTransaction::flush(),
    ];
    let mut uart = SerialMock::new(&transactions);

    let driver = TicStepper::new(
        TicSerial::new(uart.clone(), uart.clone()),
        &make_config(),
    )
    .unwrap();
    assert_eq!(driver.state(), DriveState::Disabled);

    uart.done();
}

#[test]
fn microstep_change_restates_accel_limit() {
    let mut transactions = init_transactions();
    transactions.extend([
        // 60 RPM/s is 200 steps/s^2, 20,000 native at full step
        I2cTransaction::write(ADDR, {
            let mut frame = vec![0xEA];
            frame.extend_from_slice(&20_000i32.to_le_bytes());
            frame
        }),
        I2cTransaction::write(ADDR, vec![0x94, 0x02]),
        I2cTransaction::write(ADDR, {
            let mut frame = vec![0xE6];
            frame.extend_from_slice(&80_000_000i32.to_le_bytes());
            frame
        }),
        // same physical accel limit, restated in quarter-step units
        I2cTransaction::write(ADDR, {
            let mut frame = vec![0xEA];
            frame.extend_from_slice(&80_000i32.to_le_bytes());
            frame
        }),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    driver.set_accel(RpmPerSec(60.0)).unwrap();
    driver.set_microsteps(4).unwrap();
    assert_eq!(driver.accel(), Some(RpmPerSec(60.0)));

    i2c.done();
}

#[test]
fn microstep_change_rescales_wire_values() {
    let mut transactions = init_transactions();
    transactions.extend([
        // step mode 1/4, then the speed cap re-sent at 4x native
        I2cTransaction::write(ADDR, vec![0x94, 0x02]),
        I2cTransaction::write(ADDR, {
            let mut frame = vec![0xE6];
            frame.extend_from_slice(&80_000_000i32.to_le_bytes());
            frame
        }),
        I2cTransaction::write(ADDR, vec![0x85]),
        I2cTransaction::write(ADDR, vec![0x83]),
        // 0.5 units is now 400 microsteps
        I2cTransaction::write(ADDR, {
            let mut frame = vec![0xE0];
            frame.extend_from_slice(&400i32.to_le_bytes());
            frame
        }),
    ]);
    let mut i2c = I2cMock::new(&transactions);

    let mut driver = TicStepper::new(TicI2c::new(i2c.clone()), &make_config()).unwrap();
    driver.set_microsteps(4).unwrap();
    driver.enable().unwrap();
    driver.move_to(Distance(0.5)).unwrap();

    i2c.done();
}
