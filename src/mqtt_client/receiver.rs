use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;

use super::MqttPublish;
use crate::error::DoorResult;

pub type PublishReceiver = mpsc::UnboundedReceiver<MqttPublish>;

/// Polls the MQTT connection, forwarding publishes to whoever subscribed to their topic
pub struct MqttReceiver {
  client: AsyncClient,
  event_loop: EventLoop,
  subscriptions: Vec<(String, mpsc::UnboundedSender<MqttPublish>)>,
}

impl MqttReceiver {
  pub fn new(client: AsyncClient, event_loop: EventLoop) -> Self {
    MqttReceiver {
      client,
      event_loop,
      subscriptions: Vec::new(),
    }
  }

  pub async fn subscribe(&mut self, topic: String) -> DoorResult<PublishReceiver> {
    log::debug!("Subscribing to '{}'", &topic);
    self.client.subscribe(topic.clone(), QoS::AtLeastOnce).await?;
    let (tx, rx) = mpsc::unbounded_channel();
    self.subscriptions.push((topic, tx));
    Ok(rx)
  }

  /// Runs until the connection fails
  pub async fn receive_messages(&mut self) -> DoorResult<()> {
    loop {
      if let Event::Incoming(Packet::Publish(publish)) = self.event_loop.poll().await? {
        let payload = String::from_utf8_lossy(&publish.payload).into_owned();
        self.dispatch(MqttPublish {
          topic: publish.topic,
          payload,
        });
      }
    }
  }

  fn dispatch(&mut self, publish: MqttPublish) {
    // drop subscribers that have gone away
    self.subscriptions.retain(|(_, tx)| !tx.is_closed());
    for (topic, tx) in &self.subscriptions {
      if topic == &publish.topic {
        let _ = tx.send(publish.clone());
      }
    }
  }
}
