use std::{fmt::Debug, time::Duration};

pub use config::MotorConfig;
use log::{debug, error, info};
#[cfg(feature = "arm")]
use rppal::gpio::{Gpio, OutputPin};
use tokio::{select, sync::Notify, time};

use super::state::{Direction, Speed};
#[cfg(not(feature = "arm"))]
use crate::mock_rppal::gpio::{Gpio, OutputPin};
use crate::error::{DoorError, DoorResult};

mod config;

/// A motor that can wind the door's rope in either direction
pub trait Motor: Debug + Send {
  /// Start turning in `direction` at `speed`, returning immediately
  fn run(&mut self, direction: Direction, speed: Speed) -> DoorResult<()>;

  /// Cut drive to the motor
  fn stop(&mut self) -> DoorResult<()>;

  /// Release the underlying hardware. Must be safe to call more than once.
  fn shutdown(&mut self);
}

/// Stops the motor when dropped, so an abandoned drive never leaves it running
struct Energised<'a, M: Motor + ?Sized> {
  motor: Option<&'a mut M>,
}

impl<'a, M: Motor + ?Sized> Energised<'a, M> {
  fn stop(mut self) -> DoorResult<()> {
    match self.motor.take() {
      Some(motor) => motor.stop(),
      None => Ok(()),
    }
  }
}

impl<'a, M: Motor + ?Sized> Drop for Energised<'a, M> {
  fn drop(&mut self) {
    if let Some(motor) = self.motor.take() {
      if let Err(err) = motor.stop() {
        error!("Failed to stop abandoned motor: {}", err);
      }
    }
  }
}

/// Run the motor for `duration` then stop it.
///
/// Holds the caller for the full duration unless `stop_signal` is notified first, in which case the motor is stopped
/// straight away and `DoorError::Cancelled` is returned.
pub async fn drive<M: Motor + ?Sized>(
  motor: &mut M,
  direction: Direction,
  speed: Speed,
  duration: Duration,
  stop_signal: &Notify,
) -> DoorResult<()> {
  let stopped = stop_signal.notified();
  tokio::pin!(stopped);
  // register now so a stop arriving before the select is not missed
  stopped.as_mut().enable();

  if let Err(err) = motor.run(direction, speed) {
    if let Err(stop_err) = motor.stop() {
      error!("Failed to stop motor after a failed start: {}", stop_err);
    }
    return Err(err);
  }
  let energised = Energised { motor: Some(motor) };
  debug!("Motor running {} at {}% for {:?}", direction, speed.percent(), duration);

  let result = select! {
    _ = time::sleep(duration) => Ok(()),
    _ = &mut stopped => {
      info!("Motor stopped while moving {}", direction);
      Err(DoorError::Cancelled)
    }
  };

  energised.stop().and(result)
}

/// DC motor driven through an L298N H-bridge: two direction pins and a PWM enable pin
#[derive(Debug)]
pub struct L298nMotor {
  in1: OutputPin,
  in2: OutputPin,
  ena: OutputPin,
  pwm_frequency: f64,
  released: bool,
}

impl L298nMotor {
  pub fn new(config: &MotorConfig) -> DoorResult<Self> {
    let gpio = Gpio::new()?;
    let mut motor = L298nMotor {
      in1: gpio.get(config.in1)?.into_output(),
      in2: gpio.get(config.in2)?.into_output(),
      ena: gpio.get(config.ena)?.into_output(),
      pwm_frequency: config.pwm_frequency,
      released: false,
    };

    motor.in1.set_low();
    motor.in2.set_low();
    motor.ena.set_pwm_frequency(motor.pwm_frequency, 0.0)?;
    info!(
      "Motor ready on IN1={} IN2={} ENA={} ({}Hz)",
      config.in1, config.in2, config.ena, config.pwm_frequency
    );

    Ok(motor)
  }
}

impl Motor for L298nMotor {
  fn run(&mut self, direction: Direction, speed: Speed) -> DoorResult<()> {
    if self.released {
      return Err(DoorError::HardwareFault("motor has been shut down".into()));
    }

    match direction {
      // forward lets the rope out
      Direction::Close => {
        self.in1.set_high();
        self.in2.set_low();
      }
      Direction::Open => {
        self.in1.set_low();
        self.in2.set_high();
      }
    }
    self.ena.set_pwm_frequency(self.pwm_frequency, speed.duty_cycle())?;
    Ok(())
  }

  fn stop(&mut self) -> DoorResult<()> {
    self.in1.set_low();
    self.in2.set_low();
    if !self.released {
      self.ena.set_pwm_frequency(self.pwm_frequency, 0.0)?;
    }
    Ok(())
  }

  fn shutdown(&mut self) {
    if self.released {
      return;
    }
    if let Err(err) = self.stop() {
      error!("Failed to stop motor during shutdown: {}", err);
    }
    if let Err(err) = self.ena.clear_pwm() {
      error!("Failed to clear motor PWM: {}", err);
    }
    self.released = true;
    info!("Motor released");
  }
}

impl Drop for L298nMotor {
  fn drop(&mut self) {
    self.shutdown();
  }
}
