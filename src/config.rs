use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};

use crate::{
  door::{LightSensorConfig, MotorConfig},
  error::DoorResult,
  mqtt_client::MqttClientConfig,
};

pub const CONFIG_FILE: &str = "door-config.toml";

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct Config {
  /// Where the door length, light threshold and rope length are persisted
  #[serde(default = "default_state_file")]
  pub state_file: PathBuf,

  #[serde_as(as = "DurationSeconds<u64>")]
  #[serde(default = "default_tick_interval")]
  /// How often the light level is checked
  pub tick_interval: Duration,

  #[serde_as(as = "DurationSeconds<u64>")]
  #[serde(default = "default_restart_delay")]
  /// How long to wait before restarting after an error, e.g. the MQTT broker going away
  pub restart_delay: Duration,

  #[serde(default)]
  pub motor: MotorConfig,

  #[serde(default)]
  pub light_sensor: LightSensorConfig,

  /// The MQTT front-end, if the door should be remotely controllable
  pub mqtt_client: Option<MqttClientConfig>,
}

impl Config {
  pub fn from_file(path: &str) -> DoorResult<Config> {
    let config = fs::read_to_string(path)?;
    Ok(toml::from_str(&config)?)
  }
}

fn default_state_file() -> PathBuf {
  PathBuf::from("door_state.env")
}

fn default_tick_interval() -> Duration {
  Duration::from_secs(1)
}

fn default_restart_delay() -> Duration {
  Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();

    assert_eq!(config.state_file, PathBuf::from("door_state.env"));
    assert_eq!(config.tick_interval, Duration::from_secs(1));
    assert_eq!(config.restart_delay, Duration::from_secs(5));
    assert_eq!((config.motor.in1, config.motor.in2, config.motor.ena), (17, 27, 22));
    assert_eq!(config.light_sensor.address, 0x23);
    assert!(config.mqtt_client.is_none());
  }

  #[test]
  fn parses_full_config() {
    let config: Config = toml::from_str(
      r#"
        state_file = "/var/lib/rope-door/state.env"
        tick_interval = 2

        [motor]
        in1 = 5
        in2 = 6
        ena = 13
        pwm_frequency = 200.0

        [light_sensor]
        bus = 0
        address = 0x5c

        [mqtt_client]
        host = "broker.local"
        command_topic = "coop/door/set"
        settings_topic = "coop/door/settings"
        status_topic = "coop/door/status"
        availability_topic = "coop/door/availability"
      "#,
    )
    .unwrap();

    assert_eq!(config.tick_interval, Duration::from_secs(2));
    assert_eq!(config.motor.ena, 13);
    assert_eq!(config.motor.pwm_frequency, 200.0);
    assert_eq!(config.light_sensor.address, 0x5c);
    let mqtt = config.mqtt_client.unwrap();
    assert_eq!(mqtt.port, 1883);
    assert_eq!(mqtt.online_availability, "online");
    assert_eq!(mqtt.command_topic, "coop/door/set");
  }
}
