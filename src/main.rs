#![warn(rust_2018_idioms)]

use std::{future, process, sync::Arc};

use rope_door::{
  config::{Config, CONFIG_FILE},
  door::{automation::Automation, command, Bh1750, Door, DoorStore, L298nMotor},
  error::{DoorError, DoorResult},
};
use simple_logger::SimpleLogger;
use tokio::{select, signal, time::sleep};

#[tokio::main]
async fn main() {
  SimpleLogger::new()
    .with_level(log::LevelFilter::Info)
    .with_module_level("rumqttc", log::LevelFilter::Warn)
    .env()
    .init()
    .unwrap();

  let config = match Config::from_file(CONFIG_FILE) {
    Ok(config) => config,
    Err(err) => {
      log::error!("Unable to load {}: {}", CONFIG_FILE, err);
      process::exit(1);
    }
  };

  loop {
    match run(&config).await {
      Ok(()) => return,
      Err(err) if err.is_hardware_fault() => {
        // a failed move is never retried, the rope length may no longer be trusted
        log::error!("Hardware fault, exiting: {}", err);
        process::exit(1);
      }
      Err(err) => {
        log::error!("Error occurred, restarting in {:?}: {:?}", config.restart_delay, err);
        sleep(config.restart_delay).await;
      }
    }
  }
}

/// Acquire the hardware and run the door until Ctrl-C or an error.
/// The hardware is released on the way out either way.
async fn run(config: &Config) -> DoorResult<()> {
  let motor = L298nMotor::new(&config.motor)?;
  let light_sensor = Bh1750::new(&config.light_sensor)?;
  let door = Arc::new(Door::new(DoorStore::new(&config.state_file), motor, light_sensor));
  log::info!("{} initialised with {:?}", &door, door.config().await);

  let mut automation = tokio::spawn(Automation::new(Arc::clone(&door), config.tick_interval).run());
  let front_end = async {
    match &config.mqtt_client {
      Some(mqtt_config) => command::serve(mqtt_config, Arc::clone(&door)).await,
      None => future::pending::<DoorResult<()>>().await,
    }
  };

  let result = select! {
    result = signal::ctrl_c() => {
      log::info!("Received Ctrl-C, shutting down");
      result.map_err(DoorError::from)
    }
    result = &mut automation => result.unwrap_or_else(|err| Err(DoorError::from(err))),
    result = front_end => result,
  };

  automation.abort();
  door.shutdown().await;
  result
}
