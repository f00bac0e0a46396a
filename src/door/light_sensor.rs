use std::{fmt::Debug, thread::sleep, time::Duration};

pub use config::LightSensorConfig;
use log::{debug, info};
#[cfg(feature = "arm")]
use rppal::i2c::I2c;

#[cfg(not(feature = "arm"))]
use crate::mock_rppal::i2c::I2c;
use crate::error::{DoorError, DoorResult};

mod config;

pub trait LightSensor: Debug + Send {
  /// Take a reading of the ambient light, in lux
  fn read_light_level(&mut self) -> DoorResult<f64>;
}

const POWER_ON: u8 = 0x01;
const RESET: u8 = 0x07;
const CONTINUOUS_HIGH_RES_MODE: u8 = 0x10;
/// Worst case conversion time in high resolution mode
const MEASUREMENT_TIME: Duration = Duration::from_millis(180);
/// Raw counts per lux at the default measurement time
const COUNTS_PER_LUX: f64 = 1.2;

/// BH1750 ambient light sensor on an I2C bus
#[derive(Debug)]
pub struct Bh1750 {
  i2c: I2c,
}

impl Bh1750 {
  pub fn new(config: &LightSensorConfig) -> DoorResult<Self> {
    let mut i2c = I2c::with_bus(config.bus)?;
    i2c.set_slave_address(config.address)?;

    let mut sensor = Bh1750 { i2c };
    sensor.command(POWER_ON)?;
    sensor.command(RESET)?;
    info!("BH1750 ready on bus {} at {:#04x}", config.bus, config.address);

    Ok(sensor)
  }

  fn command(&mut self, opcode: u8) -> DoorResult<()> {
    let written = self.i2c.write(&[opcode])?;
    if written != 1 {
      return Err(DoorError::HardwareFault(format!("BH1750 did not accept opcode {:#04x}", opcode)));
    }
    Ok(())
  }
}

impl LightSensor for Bh1750 {
  fn read_light_level(&mut self) -> DoorResult<f64> {
    self.command(CONTINUOUS_HIGH_RES_MODE)?;
    sleep(MEASUREMENT_TIME);

    let mut buffer = [0u8; 2];
    let read = self.i2c.read(&mut buffer)?;
    if read != buffer.len() {
      return Err(DoorError::HardwareFault(format!("BH1750 returned {} of 2 bytes", read)));
    }

    let lux = raw_to_lux(buffer);
    debug!("BH1750 read {:.2} lux", lux);
    Ok(lux)
  }
}

fn raw_to_lux(buffer: [u8; 2]) -> f64 {
  f64::from(u16::from_be_bytes(buffer)) / COUNTS_PER_LUX
}
