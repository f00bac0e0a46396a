use std::fmt;

pub use controller::PositionController;
pub use light_sensor::{Bh1750, LightSensor, LightSensorConfig};
pub use motor::{L298nMotor, Motor, MotorConfig};
pub use store::{DoorConfig, DoorStore};
use tokio::sync::Mutex;

use self::state::{Direction, DoorState, Status, StepOutcome};
use crate::error::DoorResult;

pub mod automation;
pub mod command;
pub mod controller;
pub mod light_sensor;
pub mod motion;
pub mod motor;
pub mod state;
pub mod store;

/// A rope driven door with a light sensor next to it.
///
/// This is the control surface shared by the automation loop and the front-end. Every move goes through the
/// [`PositionController`].
#[derive(Debug)]
pub struct Door<M: Motor, L: LightSensor> {
  controller: PositionController<M>,
  light_sensor: Mutex<L>,
}

impl<M: Motor, L: LightSensor> fmt::Display for Door<M, L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Door")
  }
}

impl<M: Motor, L: LightSensor> Door<M, L> {
  pub fn new(store: DoorStore, motor: M, light_sensor: L) -> Self {
    Door {
      controller: PositionController::new(store, motor),
      light_sensor: Mutex::new(light_sensor),
    }
  }

  pub fn controller(&self) -> &PositionController<M> {
    &self.controller
  }

  pub async fn read_light_level(&self) -> DoorResult<f64> {
    self.light_sensor.lock().await.read_light_level()
  }

  pub async fn config(&self) -> DoorConfig {
    self.controller.config().await
  }

  pub async fn status(&self) -> DoorResult<Status> {
    let light_level = self.read_light_level().await?;
    let config = self.config().await;

    Ok(Status {
      light_level,
      rope_length: config.position,
      door_state: config.state(),
    })
  }

  pub async fn open(&self) -> DoorResult<u32> {
    self.controller.move_to_state(DoorState::Open).await
  }

  pub async fn close(&self) -> DoorResult<u32> {
    self.controller.move_to_state(DoorState::Closed).await
  }

  pub fn stop(&self) {
    self.controller.stop()
  }

  pub async fn step_open(&self) -> DoorResult<StepOutcome> {
    self.controller.step(Direction::Open).await
  }

  pub async fn step_close(&self) -> DoorResult<StepOutcome> {
    self.controller.step(Direction::Close).await
  }

  pub async fn update_settings(&self, door_length: u32, min_light_level: u32) -> DoorResult<DoorConfig> {
    self.controller.update_settings(door_length, min_light_level).await
  }

  /// Release the hardware. Stops any move in progress first.
  pub async fn shutdown(&self) {
    self.controller.shutdown().await;
  }
}
