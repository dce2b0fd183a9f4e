//! Build a driver from a TOML configuration instead of code.
//!
//! The configuration is inline here for self-containment; `load_config`
//! reads the same format from a file. Runs against a fake bus, so no
//! hardware is needed.
//!
//! ```sh
//! cargo run --example config_driven
//! ```

use core::convert::Infallible;

use embedded_hal::i2c::{ErrorType, I2c, Operation};

use tic_motion::config::Distance;
use tic_motion::{parse_config, MotorDriver, TicI2c, TicStepperBuilder};

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

const CONFIG: &str = r#"
[motors.stage]
name = "Linear Stage"
steps_per_revolution = 200
microsteps = 4
distance_per_revolution = 2.5
min_speed_rpm = 0.5
max_speed_rpm = 300.0
max_accel_rpm_per_sec = 50.0

[motors.stage.limits]
min_distance = 0.0
max_distance = 100.0
policy = "reject"
"#;

fn main() -> Result<(), tic_motion::Error> {
    let config = parse_config(CONFIG)?;
    for name in config.motor_names() {
        println!("configured motor: {}", name);
    }

    let mut stage = TicStepperBuilder::from_config(TicI2c::new(FakeBus), &config, "stage")?
        .build()?;

    stage.enable()?;
    stage.move_to(Distance(50.0))?;
    println!("target: {} microsteps", stage.target_steps().value());

    // The soft limits from the config reject this before any bus traffic.
    match stage.move_to(Distance(150.0)) {
        Err(e) => println!("rejected as expected: {}", e),
        Ok(()) => unreachable!(),
    }

    stage.shutdown().map_err(|(_, e)| e)?;
    Ok(())
}
