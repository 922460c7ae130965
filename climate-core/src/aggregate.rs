//! Averaging of monthly readings.

/// Lowest reading accepted at the input boundary, in Celsius.
pub const MIN_CELSIUS: f64 = -50.0;
/// Highest reading accepted at the input boundary, in Celsius.
pub const MAX_CELSIUS: f64 = 50.0;

/// Arithmetic mean of `readings`, or `None` when there is nothing to average.
///
/// `None` stands for "no data" and is deliberately distinct from `0.0`,
/// which is a perfectly valid reading.
pub fn average(readings: &[f64]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }

    let sum: f64 = readings.iter().sum();
    Some(sum / readings.len() as f64)
}

/// Whether `celsius` may be stored as a reading.
pub fn is_valid_reading(celsius: f64) -> bool {
    (MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius)
}
