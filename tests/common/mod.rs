#![allow(dead_code)]

use std::{
  fs,
  path::PathBuf,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};

use rope_door::{
  door::{
    state::{Direction, Speed},
    Door, DoorStore, LightSensor, Motor,
  },
  error::{DoorError, DoorResult},
};
use tempfile::TempDir;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct MotorLog {
  /// Every run command, with when it was issued
  pub runs: Vec<(Direction, Speed, Instant)>,
  pub stops: Vec<Instant>,
  pub running: Option<Direction>,
  /// Run commands issued while the motor was already running
  pub overlapping_runs: usize,
  pub shutdowns: usize,
}

/// Records what it was told to do instead of turning anything
#[derive(Debug, Clone, Default)]
pub struct FakeMotor {
  pub log: Arc<Mutex<MotorLog>>,
  pub fail: Arc<AtomicBool>,
}

impl FakeMotor {
  pub fn runs(&self) -> Vec<(Direction, Speed, Instant)> {
    self.log.lock().unwrap().runs.clone()
  }

  pub fn directions(&self) -> Vec<Direction> {
    self.runs().into_iter().map(|(direction, _, _)| direction).collect()
  }

  pub fn is_running(&self) -> bool {
    self.log.lock().unwrap().running.is_some()
  }

  pub fn overlapping_runs(&self) -> usize {
    self.log.lock().unwrap().overlapping_runs
  }

  pub fn shutdowns(&self) -> usize {
    self.log.lock().unwrap().shutdowns
  }

  /// How long each run lasted, pairing runs with the stop that followed them
  pub fn run_durations(&self) -> Vec<std::time::Duration> {
    let log = self.log.lock().unwrap();
    log
      .runs
      .iter()
      .zip(log.stops.iter())
      .map(|((_, _, started), stopped)| stopped.duration_since(*started))
      .collect()
  }
}

impl Motor for FakeMotor {
  fn run(&mut self, direction: Direction, speed: Speed) -> DoorResult<()> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(DoorError::HardwareFault("motor stalled".into()));
    }
    let mut log = self.log.lock().unwrap();
    if log.running.is_some() {
      log.overlapping_runs += 1;
    }
    log.running = Some(direction);
    log.runs.push((direction, speed, Instant::now()));
    Ok(())
  }

  fn stop(&mut self) -> DoorResult<()> {
    let mut log = self.log.lock().unwrap();
    if log.running.take().is_some() {
      log.stops.push(Instant::now());
    }
    Ok(())
  }

  fn shutdown(&mut self) {
    let mut log = self.log.lock().unwrap();
    log.running = None;
    log.shutdowns += 1;
  }
}

/// Reports whatever light level the test last set
#[derive(Debug, Clone)]
pub struct FakeLightSensor {
  pub level: Arc<Mutex<f64>>,
  pub fail: Arc<AtomicBool>,
}

impl FakeLightSensor {
  pub fn new(level: f64) -> Self {
    FakeLightSensor {
      level: Arc::new(Mutex::new(level)),
      fail: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn set(&self, level: f64) {
    *self.level.lock().unwrap() = level;
  }
}

impl LightSensor for FakeLightSensor {
  fn read_light_level(&mut self) -> DoorResult<f64> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(DoorError::HardwareFault("no response from light sensor".into()));
    }
    Ok(*self.level.lock().unwrap())
  }
}

/// A store in a fresh temporary directory, optionally seeded with file contents
pub struct TestStore {
  // keeps the directory alive for the test
  _dir: TempDir,
  pub path: PathBuf,
}

impl TestStore {
  pub fn new(contents: Option<&str>) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door_state.env");
    if let Some(contents) = contents {
      fs::write(&path, contents).unwrap();
    }
    TestStore { _dir: dir, path }
  }

  pub fn store(&self) -> DoorStore {
    DoorStore::new(&self.path)
  }

  pub fn contents(&self) -> String {
    fs::read_to_string(&self.path).unwrap_or_default()
  }
}

pub struct TestDoor {
  pub door: Arc<Door<FakeMotor, FakeLightSensor>>,
  pub motor: FakeMotor,
  pub light: FakeLightSensor,
  pub store: TestStore,
}

impl TestDoor {
  pub fn new(contents: Option<&str>, light_level: f64) -> Self {
    let store = TestStore::new(contents);
    let motor = FakeMotor::default();
    let light = FakeLightSensor::new(light_level);
    let door = Arc::new(Door::new(store.store(), motor.clone(), light.clone()));
    TestDoor {
      door,
      motor,
      light,
      store,
    }
  }

  pub fn position(&self) -> u32 {
    self.store.store().load().position
  }
}
