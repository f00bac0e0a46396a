use std::{
  cmp::Ordering,
  sync::atomic::{AtomicBool, Ordering as AtomicOrdering},
};

use log::{debug, info, warn};
use tokio::sync::{Mutex, MutexGuard, Notify};

use super::{
  motion::duration_for,
  motor::{self, Motor},
  state::{Direction, DoorState, Speed, StepOutcome},
  store::{DoorConfig, DoorStore},
};
use crate::error::{DoorError, DoorResult};

/// The only thing allowed to move the door or change its recorded rope length.
///
/// The store and motor sit behind a single lock, so loading the rope length, driving the motor and saving the new
/// rope length happen as one step. A second caller waits until the first has finished. Only [`stop`] bypasses the
/// lock.
///
/// [`stop`]: PositionController::stop
#[derive(Debug)]
pub struct PositionController<M: Motor> {
  state: Mutex<ControllerState<M>>,
  stop_signal: Notify,
  shutting_down: AtomicBool,
}

#[derive(Debug)]
struct ControllerState<M: Motor> {
  store: DoorStore,
  motor: M,
}

impl<M: Motor> PositionController<M> {
  pub fn new(store: DoorStore, motor: M) -> Self {
    PositionController {
      state: Mutex::new(ControllerState { store, motor }),
      stop_signal: Notify::new(),
      shutting_down: AtomicBool::new(false),
    }
  }

  /// Lock the motor and store for a move. Refused once shutdown has begun, so queued moves don't start.
  async fn lock_for_move(&self) -> DoorResult<MutexGuard<'_, ControllerState<M>>> {
    let state = self.state.lock().await;
    if self.shutting_down.load(AtomicOrdering::SeqCst) {
      return Err(DoorError::ShuttingDown);
    }
    Ok(state)
  }

  /// The persisted door config. Waits for any move in progress to finish.
  pub async fn config(&self) -> DoorConfig {
    self.state.lock().await.store.load()
  }

  /// Move the door to rope length `target`, returning the new rope length once it has been saved
  pub async fn move_to(&self, target: u32) -> DoorResult<u32> {
    let mut state = self.lock_for_move().await?;
    let config = state.store.load();
    state.move_to(&config, target, &self.stop_signal).await
  }

  /// Move the door fully open or fully closed
  pub async fn move_to_state(&self, target_state: DoorState) -> DoorResult<u32> {
    let mut state = self.lock_for_move().await?;
    let config = state.store.load();
    let target = rope_length_for(&config, target_state);
    state.move_to(&config, target, &self.stop_signal).await
  }

  /// Pick a state from the persisted config and move there, without letting another move in between.
  ///
  /// Returns `None` if `decide` leaves the door where it is.
  pub async fn move_to_state_if<F>(&self, decide: F) -> DoorResult<Option<u32>>
  where
    F: FnOnce(&DoorConfig) -> Option<DoorState>,
  {
    let mut state = self.lock_for_move().await?;
    let config = state.store.load();
    match decide(&config) {
      Some(target_state) => {
        let target = rope_length_for(&config, target_state);
        state.move_to(&config, target, &self.stop_signal).await.map(Some)
      }
      None => Ok(None),
    }
  }

  /// Move a single unit, unless the door is already at the end of its travel
  pub async fn step(&self, direction: Direction) -> DoorResult<StepOutcome> {
    let mut state = self.lock_for_move().await?;
    let config = state.store.load();
    let target = match direction {
      Direction::Open if config.position == 0 => return Ok(StepOutcome::AlreadyOpen),
      Direction::Close if config.position >= config.travel_length => return Ok(StepOutcome::AlreadyClosed),
      Direction::Open => config.position - 1,
      Direction::Close => config.position + 1,
    };
    state
      .move_to(&config, target, &self.stop_signal)
      .await
      .map(StepOutcome::Moved)
  }

  /// Replace the door length and light threshold. The rope length is left as it is.
  pub async fn update_settings(&self, travel_length: u32, light_threshold: u32) -> DoorResult<DoorConfig> {
    if travel_length == 0 {
      return Err(DoorError::InvalidSettings("door length must be greater than 0"));
    }
    let state = self.state.lock().await;
    state.store.save_settings(travel_length, light_threshold)?;
    info!(
      "Settings updated: door length {}, minimum light level {}",
      travel_length, light_threshold
    );
    Ok(state.store.load())
  }

  /// Halt the move in progress, if any.
  ///
  /// The interrupted move is not saved, so the recorded rope length stays at where the move started.
  pub fn stop(&self) {
    info!("Stop requested");
    self.stop_signal.notify_waiters();
  }

  /// Stop any move in progress and release the motor. Moves requested afterwards are refused.
  pub async fn shutdown(&self) {
    self.shutting_down.store(true, AtomicOrdering::SeqCst);
    self.stop();
    self.state.lock().await.motor.shutdown();
  }
}

fn rope_length_for(config: &DoorConfig, state: DoorState) -> u32 {
  match state {
    DoorState::Open => 0,
    DoorState::Closed => config.travel_length,
  }
}

impl<M: Motor> ControllerState<M> {
  async fn move_to(&mut self, config: &DoorConfig, target: u32, stop_signal: &Notify) -> DoorResult<u32> {
    if target > config.travel_length {
      return Err(DoorError::OutOfBounds {
        target,
        travel_length: config.travel_length,
      });
    }

    let current = config.position;
    let direction = match target.cmp(&current) {
      Ordering::Equal => {
        debug!("Door already at rope length {}", current);
        return Ok(current);
      }
      Ordering::Less => Direction::Open,
      Ordering::Greater => Direction::Close,
    };
    let distance = current.abs_diff(target);
    let duration = duration_for(distance);

    info!(
      "Moving door {} by {} (rope length {} -> {}), running motor for {:.1}s",
      direction,
      distance,
      current,
      target,
      duration.as_secs_f64()
    );
    if let Err(err) = motor::drive(&mut self.motor, direction, Speed::FULL, duration, stop_signal).await {
      warn!("Move to {} did not complete, rope length left at {}: {}", target, current, err);
      return Err(err);
    }

    self.store.save_position(target)?;
    info!("Door now at rope length {}", target);
    Ok(target)
  }
}
