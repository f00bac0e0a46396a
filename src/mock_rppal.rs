//! Mimics the parts of rppal's API we use without the need to compile to ARM and use physical hardware

pub mod gpio {
  use std::{collections::BTreeMap, sync::Mutex};

  use thiserror::Error;

  /// Last level and PWM duty cycle driven on each output pin
  static PINS: Mutex<BTreeMap<u8, PinState>> = Mutex::new(BTreeMap::new());

  #[derive(Debug, Clone, Copy, Default, PartialEq)]
  #[cfg_attr(not(test), allow(dead_code))]
  pub(crate) struct PinState {
    pub high: bool,
    /// Set while software PWM is running
    pub duty_cycle: Option<f64>,
  }

  /// What was last driven on `pin`
  #[cfg(test)]
  pub(crate) fn pin_state(pin: u8) -> PinState {
    PINS.lock().map(|pins| pins.get(&pin).copied().unwrap_or_default()).unwrap_or_default()
  }

  fn update(pin: u8, change: impl FnOnce(&mut PinState)) {
    if let Ok(mut pins) = PINS.lock() {
      change(pins.entry(pin).or_default());
    }
  }

  #[derive(Debug, Error)]
  #[error("mock GPIO error")]
  pub struct Error;

  pub struct Gpio;

  impl Gpio {
    pub fn new() -> Result<Gpio, Error> {
      Ok(Gpio)
    }

    pub fn get(&self, pin: u8) -> Result<Pin, Error> {
      Ok(Pin(pin))
    }
  }

  #[derive(Debug)]
  pub struct Pin(u8);

  impl Pin {
    pub fn into_output(self) -> OutputPin {
      OutputPin(self.0)
    }
  }

  #[derive(Debug)]
  pub struct OutputPin(u8);

  impl OutputPin {
    pub fn set_high(&mut self) {
      log::trace!("{:?} set to high", self);
      update(self.0, |pin| pin.high = true);
    }

    pub fn set_low(&mut self) {
      log::trace!("{:?} set to low", self);
      update(self.0, |pin| pin.high = false);
    }

    pub fn set_pwm_frequency(&mut self, frequency: f64, duty_cycle: f64) -> Result<(), Error> {
      log::trace!("{:?} PWM at {}Hz, duty cycle {}", self, frequency, duty_cycle);
      update(self.0, |pin| pin.duty_cycle = Some(duty_cycle));
      Ok(())
    }

    pub fn clear_pwm(&mut self) -> Result<(), Error> {
      log::trace!("{:?} PWM cleared", self);
      update(self.0, |pin| pin.duty_cycle = None);
      Ok(())
    }
  }
}

pub mod i2c {
  use std::fs;

  use thiserror::Error;

  /// File the mock bus reads its lux reading from, e.g. `echo 1500 > light.lux`
  const LUX_FILE: &str = "light.lux";

  #[derive(Debug, Error)]
  #[error("mock I2C error")]
  pub struct Error;

  #[derive(Debug)]
  pub struct I2c {
    bus: u8,
    address: u16,
  }

  impl I2c {
    pub fn with_bus(bus: u8) -> Result<I2c, Error> {
      Ok(I2c { bus, address: 0 })
    }

    pub fn set_slave_address(&mut self, address: u16) -> Result<(), Error> {
      self.address = address;
      Ok(())
    }

    pub fn write(&mut self, buffer: &[u8]) -> Result<usize, Error> {
      log::trace!("{:?} write {:02x?}", self, buffer);
      Ok(buffer.len())
    }

    /// Fills the buffer with a big-endian raw BH1750 reading equivalent to the lux in `light.lux` (0 if missing)
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
      let lux = fs::read_to_string(LUX_FILE)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
      let raw = (lux * 1.2).round().clamp(0.0, u16::MAX as f64) as u16;
      let bytes = raw.to_be_bytes();
      let len = buffer.len().min(bytes.len());
      buffer[..len].copy_from_slice(&bytes[..len]);
      Ok(len)
    }
  }
}
