use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::model::{Location, RawHistoricalBundle, Variable, YearRange};

use super::{HistoricalProvider, truncate_body};

/// NASA POWER daily point API (agroclimatology community).
#[derive(Debug, Clone)]
pub struct NasaPowerProvider {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl NasaPowerProvider {
    pub fn new(http: Client, base_url: String, timeout: Duration) -> Self {
        Self { http, base_url, timeout }
    }
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    #[serde(default)]
    parameter: RawHistoricalBundle,
}

/// Comma-separated parameter list for every tracked variable.
fn parameters() -> String {
    Variable::all().iter().map(|v| v.key()).collect::<Vec<_>>().join(",")
}

/// `YYYYMMDD` bounds for the request; the end never passes `today`.
fn date_bounds(years: YearRange, today: NaiveDate) -> (String, String) {
    let start = format!("{}0101", years.start);
    let end = match NaiveDate::from_ymd_opt(years.end, 12, 31) {
        Some(last) if last < today => last,
        _ => today,
    };
    (start, end.format("%Y%m%d").to_string())
}

fn parse_history(body: &str) -> Result<RawHistoricalBundle> {
    let parsed: PowerResponse =
        serde_json::from_str(body).context("Failed to parse NASA POWER daily JSON")?;
    Ok(parsed.properties.parameter)
}

#[async_trait]
impl HistoricalProvider for NasaPowerProvider {
    async fn fetch_history(
        &self,
        location: Location,
        years: YearRange,
    ) -> Result<RawHistoricalBundle> {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            %years,
            "fetching NASA POWER daily history"
        );

        let (start, end) = date_bounds(years, Local::now().date_naive());

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("parameters", parameters()),
                ("community", "AG".to_string()),
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("format", "JSON".to_string()),
                ("start", start),
                ("end", end),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to send request to NASA POWER (historical daily)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read NASA POWER response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "NASA POWER request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        parse_history(&body)
    }
}
