use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::time::sleep;

use super::{
  light_sensor::LightSensor,
  motor::Motor,
  state::DoorState,
  store::DoorConfig,
  Door,
};
use crate::error::{DoorError, DoorResult};

/// Decide which way the door should go for the given light level, if at all.
///
/// A closed door opens once it is brighter than the threshold and an open door closes once it is darker. A reading
/// exactly at the threshold never moves the door.
pub fn decide(config: &DoorConfig, light_level: f64) -> Option<DoorState> {
  let threshold = f64::from(config.light_threshold);
  match config.state() {
    DoorState::Closed if light_level > threshold => Some(DoorState::Open),
    DoorState::Open if light_level < threshold => Some(DoorState::Closed),
    _ => None,
  }
}

/// Opens and closes the door with the daylight, checking once per tick
#[derive(Debug)]
pub struct Automation<M: Motor, L: LightSensor> {
  door: Arc<Door<M, L>>,
  tick_interval: Duration,
}

impl<M: Motor, L: LightSensor> Automation<M, L> {
  pub fn new(door: Arc<Door<M, L>>, tick_interval: Duration) -> Self {
    Automation { door, tick_interval }
  }

  /// Run a single decision, returning the new rope length if the door moved.
  ///
  /// The config is reloaded every tick so edited settings apply straight away, and the decision is taken under the
  /// same lock as the move it leads to.
  pub async fn tick(&self) -> DoorResult<Option<u32>> {
    let light_level = self.door.read_light_level().await?;
    let moved = self
      .door
      .controller()
      .move_to_state_if(|config| {
        debug!(
          "Light level: {:.2} lux, rope length: {}, door is {}",
          light_level,
          config.position,
          config.state()
        );
        let target_state = decide(config, light_level);
        match target_state {
          Some(target_state) => info!(
            "Light level {:.2} crossed threshold {}, moving door {}",
            light_level, config.light_threshold, target_state
          ),
          None => debug!("No action needed"),
        }
        target_state
      })
      .await?;

    Ok(moved)
  }

  /// Tick forever.
  ///
  /// Rejected or stopped moves skip the tick. Anything else, such as a hardware fault, ends the loop without
  /// retrying the move.
  pub async fn run(self) -> DoorResult<()> {
    info!("Automation started, checking every {:?}", self.tick_interval);
    loop {
      match self.tick().await {
        Ok(_) => {}
        Err(err @ (DoorError::OutOfBounds { .. } | DoorError::Cancelled)) => {
          warn!("Skipping tick: {}", err);
        }
        Err(err) => return Err(err),
      }
      sleep(self.tick_interval).await;
    }
  }
}
