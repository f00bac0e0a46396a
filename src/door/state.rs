use std::{fmt, str::FromStr};

use serde::Serialize;

/// Whether the door is open or closed, derived from the rope length.
///
/// Anything short of the full travel length counts as open.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
  Open,
  Closed,
}

impl DoorState {
  pub fn from_rope_length(rope_length: u32, travel_length: u32) -> Self {
    if rope_length >= travel_length {
      DoorState::Closed
    }
    else {
      DoorState::Open
    }
  }
}

impl fmt::Display for DoorState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DoorState::Open => write!(f, "open"),
      DoorState::Closed => write!(f, "closed"),
    }
  }
}

/// The way the motor turns. Opening winds the rope in (towards 0), closing lets it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Open,
  Close,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::Open => write!(f, "open"),
      Direction::Close => write!(f, "close"),
    }
  }
}

/// Motor speed as a percentage of full duty cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(u8);

impl Speed {
  pub const FULL: Speed = Speed(100);

  pub fn percent(&self) -> u8 {
    self.0
  }

  /// The PWM duty cycle, between 0.0 and 1.0
  pub fn duty_cycle(&self) -> f64 {
    f64::from(self.0) / 100.0
  }
}

/// Result of a single-unit manual step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  Moved(u32),
  AlreadyOpen,
  AlreadyClosed,
}

impl StepOutcome {
  /// The status reported to the front-end, if the step was clamped
  pub fn status(&self) -> Option<&'static str> {
    match self {
      StepOutcome::Moved(_) => None,
      StepOutcome::AlreadyOpen => Some("already_open"),
      StepOutcome::AlreadyClosed => Some("already_closed"),
    }
  }
}

impl fmt::Display for StepOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StepOutcome::Moved(rope_length) => write!(f, "moved, new rope length: {}", rope_length),
      StepOutcome::AlreadyOpen => write!(f, "door is fully open"),
      StepOutcome::AlreadyClosed => write!(f, "door is fully closed"),
    }
  }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Status {
  pub light_level: f64,
  pub rope_length: u32,
  pub door_state: DoorState,
}

/// Commands accepted from the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Open,
  Close,
  Stop,
  StepOpen,
  StepClose,
  Status,
}

impl FromStr for Command {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "OPEN" => Ok(Command::Open),
      "CLOSE" => Ok(Command::Close),
      "STOP" => Ok(Command::Stop),
      "STEP_OPEN" => Ok(Command::StepOpen),
      "STEP_CLOSE" => Ok(Command::StepClose),
      "STATUS" => Ok(Command::Status),
      _ => Err(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closed_only_at_or_beyond_travel_length() {
    assert_eq!(DoorState::from_rope_length(15, 15), DoorState::Closed);
    assert_eq!(DoorState::from_rope_length(16, 15), DoorState::Closed);
    assert_eq!(DoorState::from_rope_length(14, 15), DoorState::Open);
    assert_eq!(DoorState::from_rope_length(0, 15), DoorState::Open);
  }

  #[test]
  fn full_speed_is_full_duty_cycle() {
    assert_eq!(Speed::FULL.percent(), 100);
    assert_eq!(Speed::FULL.duty_cycle(), 1.0);
  }

  #[test]
  fn status_serializes_door_state_lowercase() {
    let status = Status {
      light_level: 12.5,
      rope_length: 3,
      door_state: DoorState::Open,
    };
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["door_state"], "open");
    assert_eq!(json["rope_length"], 3);
  }

  #[test]
  fn parses_commands() {
    assert_eq!("STEP_OPEN".parse(), Ok(Command::StepOpen));
    assert_eq!("STOP\n".parse(), Ok(Command::Stop));
    assert_eq!("open".parse::<Command>(), Err(()));
  }
}
