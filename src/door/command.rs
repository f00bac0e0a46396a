use std::{future::Future, str::FromStr, sync::Arc};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::select;

use super::{
  light_sensor::LightSensor,
  motor::Motor,
  state::{Command, Status, StepOutcome},
  Door,
};
use crate::{
  error::{DoorError, DoorResult},
  mqtt_client::{MqttClient, MqttClientConfig, MqttSender, PublishReceiver},
};

/// Reply published on the status topic after each command
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
  pub message: String,
  /// Set when a step was refused because the door is at the end of its travel
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<&'static str>,
  #[serde(flatten)]
  pub door: Option<Status>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsPayload {
  pub door_length: u32,
  pub min_light_level: u32,
}

/// Carry out a front-end command against the door
pub async fn execute<M: Motor, L: LightSensor>(door: &Door<M, L>, command: Command) -> Report {
  let (message, status) = match command {
    Command::Open => (describe(door.open().await, "Door opened", "open"), None),
    Command::Close => (describe(door.close().await, "Door closed", "close"), None),
    Command::Stop => {
      door.stop();
      ("Motor stopped".to_owned(), None)
    }
    Command::StepOpen => match door.step_open().await {
      Ok(StepOutcome::Moved(rope_length)) => (format!("Moved up. New rope length: {}", rope_length), None),
      Ok(outcome) => ("Door is fully open".to_owned(), outcome.status()),
      Err(err) => (format!("Unable to move up: {}", err), None),
    },
    Command::StepClose => match door.step_close().await {
      Ok(StepOutcome::Moved(rope_length)) => (format!("Moved down. New rope length: {}", rope_length), None),
      Ok(outcome) => ("Door is fully closed".to_owned(), outcome.status()),
      Err(err) => (format!("Unable to move down: {}", err), None),
    },
    Command::Status => ("Status".to_owned(), None),
  };

  report(door, message, status).await
}

/// Apply a JSON settings payload
pub async fn update_settings<M: Motor, L: LightSensor>(door: &Door<M, L>, payload: &str) -> Report {
  let message = match serde_json::from_str::<SettingsPayload>(payload) {
    Ok(settings) => match door.update_settings(settings.door_length, settings.min_light_level).await {
      Ok(_) => format!(
        "Settings updated, DOOR_LENGTH={}, MIN_LIGHT_LEVEL={}",
        settings.door_length, settings.min_light_level
      ),
      Err(err) => format!("Unable to update settings: {}", err),
    },
    Err(err) => format!("Invalid settings payload: {}", err),
  };

  report(door, message, None).await
}

fn describe(result: DoorResult<u32>, success: &str, action: &str) -> String {
  match result {
    Ok(_) => success.to_owned(),
    Err(err) => format!("Unable to {} door: {}", action, err),
  }
}

async fn report<M: Motor, L: LightSensor>(door: &Door<M, L>, message: String, status: Option<&'static str>) -> Report {
  let door = match door.status().await {
    Ok(status) => Some(status),
    Err(err) => {
      error!("Unable to read door status: {}", err);
      None
    }
  };

  Report { message, status, door }
}

/// Handles front-end messages for a door, publishing a [`Report`] after each one
pub struct DoorCommands<M: Motor, L: LightSensor> {
  door: Arc<Door<M, L>>,
  sender: MqttSender,
  status_topic: Arc<str>,
}

impl<M: Motor + 'static, L: LightSensor + 'static> DoorCommands<M, L> {
  pub fn new(door: Arc<Door<M, L>>, sender: MqttSender, status_topic: String) -> Self {
    DoorCommands {
      door,
      sender,
      status_topic: status_topic.into(),
    }
  }

  /// Runs until either channel closes.
  ///
  /// Each request gets its own task so the channels keep being read while the door moves, letting a `STOP` through
  /// straight away. Moves still happen one at a time as they queue on the door's controller.
  pub async fn listen(self, mut commands: PublishReceiver, mut settings: PublishReceiver) -> DoorResult<()> {
    loop {
      select! {
        Some(publish) = commands.recv() => {
          match Command::from_str(&publish.payload) {
            Ok(command) => {
              debug!("{} was sent command {:?}", &self.door, command);
              if command == Command::Stop {
                // must happen before spawning, a deferred stop could cancel a move queued after it
                self.door.stop();
                self.spawn_reply(|door| async move { report(&door, "Motor stopped".to_owned(), None).await });
              }
              else {
                self.spawn_reply(move |door| async move { execute(&door, command).await });
              }
            }
            Err(()) => warn!("Ignoring unknown command {:?}", publish.payload),
          }
        }
        Some(publish) = settings.recv() => {
          self.spawn_reply(move |door| async move { update_settings(&door, &publish.payload).await });
        }
        else => return Err(DoorError::MqttClosed),
      }
    }
  }

  fn spawn_reply<F, Fut>(&self, handle: F)
  where
    F: FnOnce(Arc<Door<M, L>>) -> Fut + Send + 'static,
    Fut: Future<Output = Report> + Send + 'static,
  {
    let door = Arc::clone(&self.door);
    let sender = self.sender.clone();
    let status_topic = Arc::clone(&self.status_topic);
    tokio::spawn(async move {
      let report = handle(door).await;
      debug!("Reporting {:?}", report);
      let payload = match serde_json::to_string(&report) {
        Ok(payload) => payload,
        Err(err) => {
          error!("Unable to serialize report: {}", err);
          return;
        }
      };
      if let Err(err) = sender.publish(&status_topic, true, payload).await {
        error!("Unable to publish report: {}", err);
      }
    });
  }
}

/// Expose the door over MQTT until the connection fails
pub async fn serve<M: Motor + 'static, L: LightSensor + 'static>(
  config: &MqttClientConfig,
  door: Arc<Door<M, L>>,
) -> DoorResult<()> {
  let MqttClient { mut receiver, sender } = MqttClient::with_config(config);
  let commands = receiver.subscribe(config.command_topic.clone()).await?;
  let settings = receiver.subscribe(config.settings_topic.clone()).await?;
  sender.announce(config).await?;

  let listener = DoorCommands::new(door, sender, config.status_topic.clone());
  select! {
    result = receiver.receive_messages() => result,
    result = listener.listen(commands, settings) => result,
  }
}
