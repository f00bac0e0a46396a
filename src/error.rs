use thiserror::Error;
use tokio::task::JoinError;

pub type DoorResult<T> = Result<T, DoorError>;

#[derive(Debug, Error)]
pub enum DoorError {
  #[error("target rope length {target} is outside of 0..={travel_length}")]
  OutOfBounds { target: u32, travel_length: u32 },
  #[error("invalid settings: {0}")]
  InvalidSettings(&'static str),
  #[error("the motor was stopped before the move completed")]
  Cancelled,
  #[error("the door is shutting down")]
  ShuttingDown,
  #[error("hardware fault: {0}")]
  HardwareFault(String),
  #[cfg(feature = "arm")]
  #[error(transparent)]
  Gpio(#[from] rppal::gpio::Error),
  #[cfg(not(feature = "arm"))]
  #[error(transparent)]
  Gpio(#[from] crate::mock_rppal::gpio::Error),
  #[cfg(feature = "arm")]
  #[error(transparent)]
  I2c(#[from] rppal::i2c::Error),
  #[cfg(not(feature = "arm"))]
  #[error(transparent)]
  I2c(#[from] crate::mock_rppal::i2c::Error),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  ConfigParse(#[from] toml::de::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error(transparent)]
  MqttClient(#[from] rumqttc::ClientError),
  #[error(transparent)]
  MqttConnection(#[from] rumqttc::ConnectionError),
  #[error("the MQTT client has been closed")]
  MqttClosed,
  #[error(transparent)]
  JoinError(#[from] JoinError),
}

impl DoorError {
  /// True if the error came from the motor or light sensor rather than from the request itself
  pub fn is_hardware_fault(&self) -> bool {
    matches!(self, DoorError::HardwareFault(_) | DoorError::Gpio(_) | DoorError::I2c(_))
  }
}
