use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LightSensorConfig {
  /// The I2C bus the BH1750 is on, `/dev/i2c-<bus>`
  #[serde(default = "default_bus")]
  pub bus: u8,

  /// 0x23 with ADDR pulled low, 0x5c with it pulled high
  #[serde(default = "default_address")]
  pub address: u16,
}

impl Default for LightSensorConfig {
  fn default() -> Self {
    LightSensorConfig {
      bus: default_bus(),
      address: default_address(),
    }
  }
}

fn default_bus() -> u8 {
  1
}

fn default_address() -> u16 {
  0x23
}
