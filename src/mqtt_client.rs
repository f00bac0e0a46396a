use rumqttc::{AsyncClient, LastWill, MqttOptions, QoS};
use serde::Deserialize;

pub use self::{
  receiver::{MqttReceiver, PublishReceiver},
  sender::MqttSender,
};

pub mod receiver;
pub mod sender;

/// How many outgoing requests can be queued before publishing waits on the event loop
const REQUEST_CAPACITY: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct MqttClientConfig {
  pub host: String,

  #[serde(default = "default_port")]
  pub port: u16,

  #[serde(default = "default_client_id")]
  pub client_id: String,

  /// Topic `OPEN`, `CLOSE`, `STOP`, `STEP_OPEN`, `STEP_CLOSE` and `STATUS` commands are received on
  pub command_topic: String,

  /// Topic JSON settings updates are received on
  pub settings_topic: String,

  /// Topic the door's status is published to after every command
  pub status_topic: String,

  pub availability_topic: String,

  #[serde(default = "default_online_availability")]
  pub online_availability: String,

  #[serde(default = "default_offline_availability")]
  pub offline_availability: String,
}

fn default_port() -> u16 {
  1883
}

fn default_client_id() -> String {
  "rope-door".into()
}

fn default_online_availability() -> String {
  "online".into()
}

fn default_offline_availability() -> String {
  "offline".into()
}

/// A message received from MQTT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttPublish {
  pub topic: String,
  pub payload: String,
}

pub struct MqttClient {
  pub receiver: MqttReceiver,
  pub sender: MqttSender,
}

impl MqttClient {
  pub fn with_config(config: &MqttClientConfig) -> MqttClient {
    let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
    options.set_last_will(LastWill::new(
      config.availability_topic.clone(),
      config.offline_availability.clone(),
      QoS::AtLeastOnce,
      true,
    ));

    let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

    MqttClient {
      receiver: MqttReceiver::new(client.clone(), event_loop),
      sender: MqttSender::new(client),
    }
  }
}
