use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
  /// BCM pin wired to IN1 on the L298N (high when closing)
  #[serde(default = "default_in1")]
  pub in1: u8,

  /// BCM pin wired to IN2 on the L298N (high when opening)
  #[serde(default = "default_in2")]
  pub in2: u8,

  /// BCM pin wired to ENA on the L298N, driven with PWM to set the speed
  #[serde(default = "default_ena")]
  pub ena: u8,

  /// Frequency of the PWM signal on ENA, in Hz
  #[serde(default = "default_pwm_frequency")]
  pub pwm_frequency: f64,
}

impl Default for MotorConfig {
  fn default() -> Self {
    MotorConfig {
      in1: default_in1(),
      in2: default_in2(),
      ena: default_ena(),
      pwm_frequency: default_pwm_frequency(),
    }
  }
}

fn default_in1() -> u8 {
  17
}

fn default_in2() -> u8 {
  27
}

fn default_ena() -> u8 {
  22
}

fn default_pwm_frequency() -> f64 {
  100.0
}
