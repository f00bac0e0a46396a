use std::{
  collections::HashMap,
  fs::{self, File},
  io::{ErrorKind, Write},
  path::PathBuf,
};

use log::{debug, warn};

use super::state::DoorState;
use crate::error::DoorResult;

pub const DOOR_LENGTH_KEY: &str = "DOOR_LENGTH";
pub const MIN_LIGHT_LEVEL_KEY: &str = "MIN_LIGHT_LEVEL";
pub const ROPE_LENGTH_KEY: &str = "ROPE_LENGTH";

const DEFAULT_TRAVEL_LENGTH: u32 = 15;
const DEFAULT_LIGHT_THRESHOLD: u32 = 1000;
/// The door is assumed closed until told otherwise
const DEFAULT_POSITION: u32 = DEFAULT_TRAVEL_LENGTH;

/// The persisted state of the door, loaded fresh for every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorConfig {
  /// Rope length of a fully closed door
  pub travel_length: u32,
  /// Light level (lux) separating dark from bright
  pub light_threshold: u32,
  /// Current rope length, 0 being fully open
  pub position: u32,
}

impl Default for DoorConfig {
  fn default() -> Self {
    DoorConfig {
      travel_length: DEFAULT_TRAVEL_LENGTH,
      light_threshold: DEFAULT_LIGHT_THRESHOLD,
      position: DEFAULT_POSITION,
    }
  }
}

impl DoorConfig {
  pub fn state(&self) -> DoorState {
    DoorState::from_rope_length(self.position, self.travel_length)
  }

  pub fn is_closed(&self) -> bool {
    self.state() == DoorState::Closed
  }
}

/// Key-value file (`KEY=value` per line) holding the door's [`DoorConfig`].
///
/// Writes only replace the keys being written, any other lines are kept as-is.
#[derive(Debug, Clone)]
pub struct DoorStore {
  path: PathBuf,
}

impl DoorStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    DoorStore { path: path.into() }
  }

  /// Read the door config, falling back to the default for each field that is missing or corrupt
  pub fn load(&self) -> DoorConfig {
    let contents = match fs::read_to_string(&self.path) {
      Ok(contents) => contents,
      Err(err) => {
        if err.kind() != ErrorKind::NotFound {
          warn!("Unable to read {:?}, using defaults: {}", self.path, err);
        }
        String::new()
      }
    };
    let entries = parse_entries(&contents);

    let travel_length = match read_field(&entries, DOOR_LENGTH_KEY, DEFAULT_TRAVEL_LENGTH) {
      0 => {
        warn!("{} must be greater than 0, using {}", DOOR_LENGTH_KEY, DEFAULT_TRAVEL_LENGTH);
        DEFAULT_TRAVEL_LENGTH
      }
      travel_length => travel_length,
    };
    let light_threshold = read_field(&entries, MIN_LIGHT_LEVEL_KEY, DEFAULT_LIGHT_THRESHOLD);
    // a shortened door length leaves the rope fully let out, i.e. closed
    let position = read_field(&entries, ROPE_LENGTH_KEY, DEFAULT_POSITION).min(travel_length);

    let config = DoorConfig {
      travel_length,
      light_threshold,
      position,
    };
    debug!("Loaded {:?}", config);
    config
  }

  pub fn save_position(&self, position: u32) -> DoorResult<()> {
    self.write_fields(&[(ROPE_LENGTH_KEY, position)])
  }

  pub fn save_settings(&self, travel_length: u32, light_threshold: u32) -> DoorResult<()> {
    self.write_fields(&[(DOOR_LENGTH_KEY, travel_length), (MIN_LIGHT_LEVEL_KEY, light_threshold)])
  }

  /// Replace (or append) the given keys, writing through a temporary file so the store is never left half written.
  ///
  /// Every line holding one of the keys is rewritten, so a duplicated key can't shadow the new value on load.
  fn write_fields(&self, fields: &[(&str, u32)]) -> DoorResult<()> {
    let existing = match fs::read_to_string(&self.path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
      Err(err) => return Err(err.into()),
    };

    let mut written = vec![false; fields.len()];
    let mut lines: Vec<String> = existing
      .lines()
      .map(|line| {
        let key = line_key(line);
        match fields.iter().position(|(field, _)| Some(*field) == key) {
          Some(index) => {
            written[index] = true;
            let (field, value) = fields[index];
            format!("{}={}", field, value)
          }
          None => line.to_owned(),
        }
      })
      .collect();
    lines.extend(
      fields
        .iter()
        .zip(&written)
        .filter(|(_, written)| !**written)
        .map(|((field, value), _)| format!("{}={}", field, value)),
    );

    let mut contents = lines.join("\n");
    contents.push('\n');

    if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let mut temp_path = self.path.clone().into_os_string();
    temp_path.push(".tmp");
    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.sync_all()?;
    drop(temp_file);
    fs::rename(&temp_path, &self.path)?;

    debug!("Wrote {:?} to {:?}", fields, self.path);
    Ok(())
  }
}

/// The key of a `KEY=value` line, ignoring comments and an `export ` prefix
fn line_key(line: &str) -> Option<&str> {
  let line = line.trim_start();
  if line.starts_with('#') {
    return None;
  }
  let (key, _) = line.split_once('=')?;
  let key = key.trim();
  Some(key.strip_prefix("export ").map(str::trim).unwrap_or(key))
}

fn parse_entries(contents: &str) -> HashMap<&str, &str> {
  contents
    .lines()
    .filter_map(|line| {
      let key = line_key(line)?;
      let (_, value) = line.split_once('=')?;
      let value = value.trim();
      let value = value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|value| value.strip_suffix('\'')))
        .unwrap_or(value);
      Some((key, value))
    })
    .collect()
}

fn read_field(entries: &HashMap<&str, &str>, key: &str, default: u32) -> u32 {
  match entries.get(key) {
    Some(value) => value.parse().unwrap_or_else(|_| {
      warn!("{}={:?} is not a valid value, using {}", key, value, default);
      default
    }),
    None => default,
  }
}
