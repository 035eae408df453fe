//! Core library for the `climate` CLI.
//!
//! This crate defines:
//! - Normalization of raw multi-year daily records
//! - The climatology engine (same-calendar-day means and exceedance probabilities)
//! - The felt-condition (discomfort) index
//! - Short-range forecast blending
//! - Abstractions over historical, forecast and air-quality providers
//! - Configuration handling
//!
//! It is used by `climate-cli`, but can also be reused by other binaries or services.

pub mod climatology;
pub mod config;
pub mod discomfort;
pub mod error;
pub mod forecast;
pub mod model;
pub mod normalize;
pub mod predict;
pub mod provider;

pub use climatology::compute_climatology;
pub use config::Config;
pub use discomfort::discomfort;
pub use error::{ClimatologyError, ForecastUnavailable};
pub use forecast::{blend_forecast, in_coverage_window};
pub use model::{
    AirQualitySnapshot, ClimatologyResult, CurrentPrediction, ForecastDayRecord, Location,
    PredictionRequest, PredictionResponse, RawForecastBundle, RawHistoricalBundle, RiskLevel,
    Variable, YearRange,
};
pub use normalize::{NormalizedRecord, normalize};
pub use predict::{Predictor, historical_error};
pub use provider::{AirQualityProvider, ForecastProvider, HistoricalProvider, providers_from_config};
