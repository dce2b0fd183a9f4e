//! Drive a single motor through a full session: build, enable, move, poll,
//! stop, tear down.
//!
//! Runs against a fake I2C bus that acknowledges everything and reads back
//! zeros, so it works without hardware; swap in a real `embedded_hal::i2c::I2c`
//! handle to talk to an actual Tic.
//!
//! ```sh
//! cargo run --example basic_motor
//! ```

use core::convert::Infallible;

use embedded_hal::i2c::{ErrorType, I2c, Operation};

use tic_motion::config::{Distance, Rpm, RpmPerSec};
use tic_motion::{MotorDriver, TicI2c, TicStepperBuilder};

/// Accepts every transaction and answers reads with zeros.
struct FakeBus;

impl ErrorType for FakeBus {
    type Error = Infallible;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            if let Operation::Read(buf) = op {
                buf.fill(0);
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), tic_motion::Error> {
    let mut motor = TicStepperBuilder::new(TicI2c::new(FakeBus))
        .name("demo axis")
        .steps_per_revolution(200)
        .microsteps(tic_motion::config::Microsteps::QUARTER)
        .distance_per_revolution(2.0) // mm per revolution
        .max_speed(Rpm(300.0))
        .build()?;
    println!("driver up, state: {:?}", motor.state());

    motor.set_accel(RpmPerSec(100.0))?;
    motor.enable()?;

    motor.move_to(Distance(12.5))?;
    println!(
        "moving to 12.5 mm ({} microsteps)",
        motor.target_steps().value()
    );

    while motor.is_moving()? {
        motor.reset_command_timeout()?;
    }
    println!("arrived at {:.3} mm", motor.position()?.value());

    motor.stop()?;
    let bus = motor.shutdown().map_err(|(_, e)| e)?.release();
    let _ = bus;
    println!("motor de-energized, bus released");

    Ok(())
}
