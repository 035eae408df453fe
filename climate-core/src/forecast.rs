//! Selection of a single short-range forecast day for the target date.

use chrono::{Days, NaiveDate};

use crate::discomfort::discomfort;
use crate::error::ForecastUnavailable;
use crate::model::{ForecastDayRecord, RawForecastBundle};

/// Forecast provider's coverage, in days after today.
pub const DEFAULT_WINDOW_DAYS: u32 = 16;

pub const FORECAST_PROVIDER: &str = "open-meteo";

pub const TEMPERATURE_MAX: &str = "temperature_2m_max";
pub const HUMIDITY_MAX: &str = "relative_humidity_2m_max";
pub const WIND_SPEED_MAX: &str = "wind_speed_10m_max";
pub const PRECIPITATION_PROBABILITY_MAX: &str = "precipitation_probability_max";
pub const PRECIPITATION_SUM: &str = "precipitation_sum";
pub const UV_INDEX_MAX: &str = "uv_index_max";
pub const SURFACE_PRESSURE_MEAN: &str = "surface_pressure_mean";

/// Daily variables requested from, and required in, the forecast bundle.
pub const FORECAST_VARIABLES: &[&str] = &[
    TEMPERATURE_MAX,
    HUMIDITY_MAX,
    WIND_SPEED_MAX,
    PRECIPITATION_PROBABILITY_MAX,
    PRECIPITATION_SUM,
    UV_INDEX_MAX,
    SURFACE_PRESSURE_MEAN,
];

/// `today <= target <= today + window_days`.
pub fn in_coverage_window(target: NaiveDate, today: NaiveDate, window_days: u32) -> bool {
    match today.checked_add_days(Days::new(u64::from(window_days))) {
        Some(last) => target >= today && target <= last,
        None => false,
    }
}

/// Pulls the target day out of an aligned daily forecast.
pub fn blend_forecast(
    bundle: &RawForecastBundle,
    target: NaiveDate,
    today: NaiveDate,
    window_days: u32,
) -> Result<ForecastDayRecord, ForecastUnavailable> {
    if !in_coverage_window(target, today, window_days) {
        return Err(ForecastUnavailable::OutsideCoverage { window_days });
    }

    let key = target.format("%Y-%m-%d").to_string();
    let index = bundle
        .time
        .iter()
        .position(|t| *t == key)
        .ok_or(ForecastUnavailable::DateNotFound(key))?;

    let field = |name: &'static str| {
        bundle
            .series
            .get(name)
            .and_then(|values| values.get(index).copied().flatten())
            .ok_or(ForecastUnavailable::MissingField(name))
    };

    let tmax_c = field(TEMPERATURE_MAX)?;
    let humidity_pct = field(HUMIDITY_MAX)?;
    let wind_speed_mps = field(WIND_SPEED_MAX)?;

    Ok(ForecastDayRecord {
        provider: FORECAST_PROVIDER.to_string(),
        date: target,
        tmax_c,
        humidity_pct,
        wind_speed_mps,
        pressure_hpa: field(SURFACE_PRESSURE_MEAN)?,
        uv_index: field(UV_INDEX_MAX)?,
        precipitation_probability_pct: field(PRECIPITATION_PROBABILITY_MAX)?,
        precipitation_mm: field(PRECIPITATION_SUM)?,
        discomfort_index_c: discomfort(tmax_c, humidity_pct, wind_speed_mps),
    })
}
