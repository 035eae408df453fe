use crate::{
    Config,
    model::{AirQualitySnapshot, Location, RawForecastBundle, RawHistoricalBundle, YearRange},
    predict::Predictor,
    provider::{
        nasa_power::NasaPowerProvider,
        open_meteo::{OpenMeteoAirQualityProvider, OpenMeteoForecastProvider},
    },
};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod nasa_power;
pub mod open_meteo;

/// Multi-decade daily records for a point.
#[async_trait]
pub trait HistoricalProvider: Send + Sync + Debug {
    async fn fetch_history(
        &self,
        location: Location,
        years: YearRange,
    ) -> anyhow::Result<RawHistoricalBundle>;
}

/// Aligned daily arrays covering the next couple of weeks.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, location: Location) -> anyhow::Result<RawForecastBundle>;
}

/// Latest particulate readings, `None` when the provider has no current value.
#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    async fn fetch_air_quality(
        &self,
        location: Location,
    ) -> anyhow::Result<Option<AirQualitySnapshot>>;
}

/// Construct the default NASA POWER + Open-Meteo provider set from config.
pub fn providers_from_config(config: &Config) -> Predictor {
    let http = Client::new();

    Predictor::new(
        Box::new(NasaPowerProvider::new(
            http.clone(),
            config.endpoints.history_url.clone(),
            config.timeouts.history(),
        )),
        Box::new(OpenMeteoForecastProvider::new(
            http.clone(),
            config.endpoints.forecast_url.clone(),
            config.timeouts.forecast(),
        )),
        Box::new(OpenMeteoAirQualityProvider::new(
            http,
            config.endpoints.air_quality_url.clone(),
            config.timeouts.air_quality(),
        )),
        config.clone(),
    )
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("rate limited"), "rate limited");
    }

    #[test]
    fn truncate_body_cuts_on_char_boundary() {
        let body = "é".repeat(300);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn providers_from_config_uses_configured_endpoints() {
        let mut cfg = Config::default();
        cfg.endpoints.forecast_url = "http://localhost:9/forecast".to_string();

        let predictor = providers_from_config(&cfg);
        let debug = format!("{predictor:?}");
        assert!(debug.contains("http://localhost:9/forecast"));
        assert!(debug.contains("power.larc.nasa.gov"));
    }
}
