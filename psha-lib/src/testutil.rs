//! Shared assertions for the unit tests.

/// Absolute-difference comparison for test expectations.
pub(crate) fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Round `val` to `places` decimal places, for comparing against published
/// reference values quoted at fixed precision.
pub(crate) fn round_to(val: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (val * factor).round() / factor
}
