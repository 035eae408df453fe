//! Felt-condition ("discomfort") index.
//!
//! Simplified NOAA heat-index regression in Fahrenheit with a linear
//! wind-chill correction above 3 m/s. The result is floored at the air
//! temperature.

/// Discomfort index in °C, rounded to one decimal place.
///
/// Inputs are not clamped. A NaN humidity yields the air temperature, a NaN
/// wind speed disables the wind correction and a NaN temperature yields NaN.
pub fn discomfort(temp_c: f64, rh_pct: f64, wind_speed_mps: f64) -> f64 {
    let t_f = temp_c * 9.0 / 5.0 + 32.0;
    let r = rh_pct;

    let hi_f = -42.379 + 2.049 * t_f + 10.143 * r - 0.224 * t_f * r + 0.001 * t_f * r * r;
    let hi_c = (hi_f - 32.0) * 5.0 / 9.0;

    let excess_wind = wind_speed_mps - 3.0;
    let wind_factor = if excess_wind > 0.0 { excess_wind * 0.5 } else { 0.0 };

    let adjusted = hi_c - wind_factor;
    // Comparison form keeps the air temperature when `adjusted` is NaN.
    let felt = if adjusted > temp_c { adjusted } else { temp_c };

    round1(felt)
}

/// Round half away from zero to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
