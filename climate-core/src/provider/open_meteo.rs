use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::forecast::{DEFAULT_WINDOW_DAYS, FORECAST_VARIABLES};
use crate::model::{AirQualitySnapshot, Location, RawForecastBundle};

use super::{AirQualityProvider, ForecastProvider, truncate_body};

#[derive(Debug, Clone)]
pub struct OpenMeteoForecastProvider {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoForecastProvider {
    pub fn new(http: Client, base_url: String, timeout: Duration) -> Self {
        Self { http, base_url, timeout }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoAirQualityProvider {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoAirQualityProvider {
    pub fn new(http: Client, base_url: String, timeout: Duration) -> Self {
        Self { http, base_url, timeout }
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    daily: Option<RawForecastBundle>,
}

#[derive(Debug, Deserialize)]
struct OmAirQualityResponse {
    hourly: Option<OmAirQualityHourly>,
}

#[derive(Debug, Deserialize)]
struct OmAirQualityHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    pm10: Vec<Option<f64>>,
    #[serde(default)]
    pm2_5: Vec<Option<f64>>,
}

/// GET `url` with `query` and return the body, failing on non-success statuses.
async fn get_body(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
    timeout: Duration,
    what: &str,
) -> Result<String> {
    let res = http
        .get(url)
        .query(query)
        .timeout(timeout)
        .send()
        .await
        .with_context(|| format!("Failed to send request to Open-Meteo ({what})"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "Open-Meteo {} request failed with status {}: {}",
            what,
            status,
            truncate_body(&body),
        ));
    }

    Ok(body)
}

fn parse_forecast(body: &str) -> Result<RawForecastBundle> {
    let parsed: OmForecastResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo forecast JSON")?;
    Ok(parsed.daily.unwrap_or_default())
}

/// First hourly reading is the current one.
fn parse_air_quality(body: &str) -> Result<Option<AirQualitySnapshot>> {
    let parsed: OmAirQualityResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo air-quality JSON")?;

    let Some(hourly) = parsed.hourly else {
        return Ok(None);
    };

    let Some(pm2_5) = hourly.pm2_5.first().copied().flatten() else {
        return Ok(None);
    };

    Ok(Some(AirQualitySnapshot {
        pm2_5,
        pm10: hourly.pm10.first().copied().flatten(),
        observed_at: hourly.time.into_iter().next(),
    }))
}

fn coordinates(location: Location) -> [(&'static str, String); 2] {
    [
        ("latitude", location.latitude.to_string()),
        ("longitude", location.longitude.to_string()),
    ]
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecastProvider {
    async fn fetch_forecast(&self, location: Location) -> Result<RawForecastBundle> {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            "fetching Open-Meteo daily forecast"
        );

        let mut query = coordinates(location).to_vec();
        query.extend([
            ("daily", FORECAST_VARIABLES.join(",")),
            ("forecast_days", DEFAULT_WINDOW_DAYS.to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", "auto".to_string()),
        ]);

        let body = get_body(&self.http, &self.base_url, &query, self.timeout, "forecast").await?;
        parse_forecast(&body)
    }
}

#[async_trait]
impl AirQualityProvider for OpenMeteoAirQualityProvider {
    async fn fetch_air_quality(&self, location: Location) -> Result<Option<AirQualitySnapshot>> {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            "fetching Open-Meteo air quality"
        );

        let mut query = coordinates(location).to_vec();
        query.extend([
            ("hourly", "pm10,pm2_5".to_string()),
            ("forecast_days", "1".to_string()),
            ("timezone", "auto".to_string()),
        ]);

        let body =
            get_body(&self.http, &self.base_url, &query, self.timeout, "air quality").await?;
        parse_air_quality(&body)
    }
}
