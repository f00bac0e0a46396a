use std::time::Duration;

/// Calibration of the winch at full speed: 10 seconds of drive moves the rope 9 units
const SECONDS_PER_UNIT: f64 = 10.0 / 9.0;

/// How long the motor must run at full speed to move the rope `distance` units
pub fn duration_for(distance: u32) -> Duration {
  Duration::from_secs_f64(f64::from(distance) * SECONDS_PER_UNIT)
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[test]
  fn no_distance_no_time() {
    assert_eq!(duration_for(0), Duration::ZERO);
  }

  #[test]
  fn nine_units_takes_ten_seconds() {
    assert!((duration_for(9).as_secs_f64() - 10.0).abs() < 1e-9);
  }

  #[test]
  fn full_default_travel() {
    assert!((duration_for(15).as_secs_f64() - 150.0 / 9.0).abs() < 1e-9);
  }

  proptest! {
    #[test]
    fn linear_in_distance(distance in 0u32..100_000) {
      let expected = f64::from(distance) * 10.0 / 9.0;
      prop_assert!((duration_for(distance).as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn monotonic(a in 0u32..100_000, b in 0u32..100_000) {
      let (short, long) = if a <= b { (a, b) } else { (b, a) };
      prop_assert!(duration_for(short) <= duration_for(long));
    }
  }
}
