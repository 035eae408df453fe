//! Same-calendar-day statistics over a multi-year daily record.

use chrono::{Datelike, NaiveDate};

use crate::discomfort::{discomfort, round1};
use crate::error::ClimatologyError;
use crate::model::{ClimatologicalMeans, ClimatologyResult, Probabilities, RiskLevel, Variable};
use crate::normalize::{DailyRecord, NormalizedRecord};

/// Daily precipitation above this (mm) counts as a rain day.
pub const RAIN_DAY_THRESHOLD_MM: f64 = 0.1;

/// Quantile of the full record used as the "extreme" threshold.
pub const EXTREME_QUANTILE: f64 = 0.90;

/// Means and exceedance probabilities for the target's month and day.
pub fn compute_climatology(
    record: &NormalizedRecord,
    target: NaiveDate,
) -> Result<ClimatologyResult, ClimatologyError> {
    if record.is_empty() {
        return Err(ClimatologyError::NoHistoricalData);
    }

    let (month, day) = (target.month(), target.day());
    let sample: Vec<&DailyRecord> = record.same_calendar_day(month, day).collect();
    if sample.is_empty() {
        return Err(ClimatologyError::NoSampleForDate { month, day });
    }

    let column_mean = |variable: Variable| mean(sample.iter().filter_map(|r| r.get(variable)));

    // Evaluated per row, then averaged.
    let avg_discomfort = mean(
        sample
            .iter()
            .map(|r| {
                discomfort(
                    r.get_or_nan(Variable::MaxTemperature),
                    r.get_or_nan(Variable::RelativeHumidity),
                    r.get_or_nan(Variable::WindSpeed),
                )
            })
            .filter(|v| !v.is_nan()),
    );

    let means = ClimatologicalMeans {
        avg_tmax_c: column_mean(Variable::MaxTemperature).map(round1),
        avg_tmin_c: column_mean(Variable::MinTemperature).map(round1),
        avg_humidity_pct: column_mean(Variable::RelativeHumidity).map(round1),
        avg_wind_speed_mps: column_mean(Variable::WindSpeed).map(round1),
        avg_pressure_kpa: column_mean(Variable::SurfacePressure).map(round1),
        avg_uv_index: column_mean(Variable::UvIndex).map(round1),
        avg_discomfort_index_c: avg_discomfort.map(round1),
    };

    let p_rain = round1(frequency_pct(&sample, Variable::Precipitation, RAIN_DAY_THRESHOLD_MM));
    let p_extreme_heat = round1(exceedance_pct(record, &sample, Variable::MaxTemperature));
    let p_extreme_wind = round1(exceedance_pct(record, &sample, Variable::WindSpeed));

    Ok(ClimatologyResult {
        month,
        day,
        sample_size: sample.len(),
        means,
        probabilities: Probabilities {
            p_rain_pct: p_rain,
            p_extreme_heat_pct: p_extreme_heat,
            p_extreme_wind_pct: p_extreme_wind,
            risk_level: RiskLevel::classify(p_rain, p_extreme_heat, p_extreme_wind),
        },
    })
}

/// Share of sample rows whose value exceeds the full record's 90th percentile.
fn exceedance_pct(record: &NormalizedRecord, sample: &[&DailyRecord], variable: Variable) -> f64 {
    match quantile(record.column(variable).flatten().collect(), EXTREME_QUANTILE) {
        Some(threshold) => frequency_pct(sample, variable, threshold),
        None => 0.0,
    }
}

/// Percentage of rows strictly above `threshold`. Absent values count as not exceeding.
fn frequency_pct(sample: &[&DailyRecord], variable: Variable, threshold: f64) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let hits = sample
        .iter()
        .filter(|r| r.get(variable).is_some_and(|v| v > threshold))
        .count();
    hits as f64 / sample.len() as f64 * 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Quantile with linear interpolation between closest ranks.
fn quantile(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let pos = q * (values.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(values[lower] + (values[upper] - values[lower]) * frac)
}
