mod common;

use std::{sync::Arc, time::Duration};

use common::TestDoor;
use rope_door::door::{
  command::{execute, update_settings},
  state::{Command, DoorState},
};
use serde_json::json;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn status_reports_light_rope_length_and_state() {
  let door = TestDoor::new(Some("ROPE_LENGTH=3\n"), 742.5);

  let report = execute(&door.door, Command::Status).await;
  let status = report.door.unwrap();

  assert_eq!(status.light_level, 742.5);
  assert_eq!(status.rope_length, 3);
  assert_eq!(status.door_state, DoorState::Open);
  assert_eq!(
    serde_json::to_value(&report).unwrap(),
    json!({
      "message": "Status",
      "light_level": 742.5,
      "rope_length": 3,
      "door_state": "open",
    })
  );
}

#[tokio::test(start_paused = true)]
async fn open_and_close_travel_the_full_length() {
  let door = TestDoor::new(Some("DOOR_LENGTH=12\nROPE_LENGTH=5\n"), 0.0);

  let report = execute(&door.door, Command::Open).await;
  assert_eq!(report.message, "Door opened");
  assert_eq!(report.door.unwrap().rope_length, 0);

  let report = execute(&door.door, Command::Close).await;
  assert_eq!(report.message, "Door closed");
  assert_eq!(report.door.unwrap().door_state, DoorState::Closed);
  assert_eq!(door.position(), 12);
}

#[tokio::test(start_paused = true)]
async fn steps_report_when_already_at_the_limit() {
  let door = TestDoor::new(Some("ROPE_LENGTH=0\n"), 0.0);

  let report = execute(&door.door, Command::StepOpen).await;
  assert_eq!(report.status, Some("already_open"));
  assert_eq!(serde_json::to_value(&report).unwrap()["status"], "already_open");
  assert!(door.motor.runs().is_empty());

  let report = execute(&door.door, Command::StepClose).await;
  assert_eq!(report.message, "Moved down. New rope length: 1");
  assert_eq!(report.status, None);
  assert!(serde_json::to_value(&report).unwrap().get("status").is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_command_interrupts_a_move() {
  let door = TestDoor::new(None, 0.0);

  let opening = {
    let door = Arc::clone(&door.door);
    tokio::spawn(async move { execute(&door, Command::Open).await })
  };
  sleep(Duration::from_secs(2)).await;
  let stopped = execute(&door.door, Command::Stop).await;

  let report = opening.await.unwrap();
  assert!(report.message.starts_with("Unable to open door"), "{}", report.message);
  assert_eq!(stopped.message, "Motor stopped");
  assert_eq!(stopped.door.unwrap().rope_length, 15);
  assert!(!door.motor.is_running());
}

#[tokio::test(start_paused = true)]
async fn settings_payload_updates_door_length_and_threshold() {
  let door = TestDoor::new(Some("ROPE_LENGTH=6\n"), 0.0);

  let report = update_settings(&door.door, r#"{"door_length": 20, "min_light_level": 300}"#).await;

  assert_eq!(report.message, "Settings updated, DOOR_LENGTH=20, MIN_LIGHT_LEVEL=300");
  let config = door.door.config().await;
  assert_eq!((config.travel_length, config.light_threshold, config.position), (20, 300, 6));
}

#[tokio::test(start_paused = true)]
async fn bad_settings_are_rejected() {
  let door = TestDoor::new(None, 0.0);

  let report = update_settings(&door.door, r#"{"door_length": "long"}"#).await;
  assert!(report.message.starts_with("Invalid settings payload"), "{}", report.message);

  let report = update_settings(&door.door, r#"{"door_length": 0, "min_light_level": 300}"#).await;
  assert!(report.message.starts_with("Unable to update settings"), "{}", report.message);

  assert_eq!(door.door.config().await, Default::default());
}

#[tokio::test(start_paused = true)]
async fn unreadable_light_sensor_omits_status_fields() {
  let door = TestDoor::new(None, 0.0);
  door.light.fail.store(true, std::sync::atomic::Ordering::SeqCst);

  let report = execute(&door.door, Command::Status).await;

  assert!(report.door.is_none());
  assert_eq!(serde_json::to_value(&report).unwrap(), json!({ "message": "Status" }));
}
