use rumqttc::{AsyncClient, QoS};

use super::MqttClientConfig;
use crate::error::DoorResult;

#[derive(Clone)]
pub struct MqttSender {
  client: AsyncClient,
}

impl MqttSender {
  pub fn new(client: AsyncClient) -> Self {
    MqttSender { client }
  }

  pub async fn publish(&self, topic: &str, retain: bool, payload: String) -> DoorResult<()> {
    self
      .client
      .publish(topic, QoS::AtLeastOnce, retain, payload)
      .await
      .map_err(|err| err.into())
  }

  /// Announce our availability
  pub async fn announce(&self, config: &MqttClientConfig) -> DoorResult<()> {
    self
      .publish(&config.availability_topic, true, config.online_availability.clone())
      .await
  }
}
