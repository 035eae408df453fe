use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Missing-data placeholder used by the historical provider.
pub const MISSING_SENTINEL: f64 = -999.0;

/// Daily variables tracked from the historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    MaxTemperature,
    MinTemperature,
    Precipitation,
    WindSpeed,
    SurfacePressure,
    RelativeHumidity,
    UvIndex,
}

impl Variable {
    pub const COUNT: usize = 7;

    pub const fn all() -> &'static [Variable; Variable::COUNT] {
        &[
            Variable::MaxTemperature,
            Variable::MinTemperature,
            Variable::Precipitation,
            Variable::WindSpeed,
            Variable::SurfacePressure,
            Variable::RelativeHumidity,
            Variable::UvIndex,
        ]
    }

    /// Parameter name used by the NASA POWER daily API.
    pub fn key(&self) -> &'static str {
        match self {
            Variable::MaxTemperature => "T2M_MAX",
            Variable::MinTemperature => "T2M_MIN",
            Variable::Precipitation => "PRECTOTCORR",
            Variable::WindSpeed => "WS10M",
            Variable::SurfacePressure => "PS",
            Variable::RelativeHumidity => "RH2M",
            Variable::UvIndex => "ALLSKY_SFC_UV_INDEX",
        }
    }

    pub fn from_key(key: &str) -> Option<Variable> {
        Variable::all().iter().copied().find(|v| v.key() == key)
    }

    /// Slot of this variable inside a [`crate::normalize::DailyRecord`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Date key (`YYYYMMDD`) to value, as returned by the historical provider.
pub type RawVariableSeries = BTreeMap<String, f64>;

/// Provider variable name to its sparse daily series.
pub type RawHistoricalBundle = BTreeMap<String, RawVariableSeries>;

/// Aligned daily forecast arrays: `time[i]` is the date for `series[name][i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawForecastBundle {
    #[serde(default)]
    pub time: Vec<String>,

    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl RawForecastBundle {
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Inclusive range of calendar years requested from the historical provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub location: Location,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    /// Extreme rules take priority over the rain rule.
    pub fn classify(p_rain: f64, p_extreme_heat: f64, p_extreme_wind: f64) -> RiskLevel {
        if p_extreme_heat >= 15.0 || p_extreme_wind >= 15.0 {
            RiskLevel::High
        } else if p_rain >= 40.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::Low => "LOW",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Same-calendar-day means over all years. `None` when every sample value is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologicalMeans {
    pub avg_tmax_c: Option<f64>,
    pub avg_tmin_c: Option<f64>,
    pub avg_humidity_pct: Option<f64>,
    pub avg_wind_speed_mps: Option<f64>,
    pub avg_pressure_kpa: Option<f64>,
    pub avg_uv_index: Option<f64>,
    pub avg_discomfort_index_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub p_rain_pct: f64,
    pub p_extreme_heat_pct: f64,
    pub p_extreme_wind_pct: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyResult {
    pub month: u32,
    pub day: u32,
    /// Number of years that recorded this calendar day.
    pub sample_size: usize,
    pub means: ClimatologicalMeans,
    pub probabilities: Probabilities,
}

/// One day of short-range forecast, as selected for the target date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDayRecord {
    pub provider: String,
    pub date: NaiveDate,
    pub tmax_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub pressure_hpa: f64,
    pub uv_index: f64,
    /// Forecast confidence of precipitation, not a historical frequency.
    pub precipitation_probability_pct: f64,
    pub precipitation_mm: f64,
    pub discomfort_index_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySnapshot {
    pub pm2_5: f64,
    pub pm10: Option<f64>,
    pub observed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CurrentPrediction {
    Forecast(ForecastDayRecord),
    Climatology(ClimatologicalMeans),
}

impl CurrentPrediction {
    /// A produced forecast supersedes the climatological means.
    pub fn choose(forecast: Option<&ForecastDayRecord>, means: &ClimatologicalMeans) -> Self {
        match forecast {
            Some(record) => CurrentPrediction::Forecast(record.clone()),
            None => CurrentPrediction::Climatology(means.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub location: Location,
    pub target_date: NaiveDate,
    pub current_prediction: CurrentPrediction,
    pub climatology: ClimatologyResult,
    pub short_term_forecast: Option<ForecastDayRecord>,
    pub air_quality: Option<AirQualitySnapshot>,
    pub provenance: String,
    pub generated_at: DateTime<Utc>,
}
