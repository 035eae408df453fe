//! Request-scoped pipeline: fetch, normalize, compute, blend, merge.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::climatology::compute_climatology;
use crate::config::Config;
use crate::error::ClimatologyError;
use crate::forecast::{FORECAST_PROVIDER, blend_forecast, in_coverage_window};
use crate::model::{
    AirQualitySnapshot, CurrentPrediction, ForecastDayRecord, Location, PredictionRequest,
    PredictionResponse, RawForecastBundle, RawHistoricalBundle, YearRange,
};
use crate::normalize::normalize;
use crate::provider::{AirQualityProvider, ForecastProvider, HistoricalProvider};

#[derive(Debug)]
pub struct Predictor {
    history: Box<dyn HistoricalProvider>,
    forecast: Box<dyn ForecastProvider>,
    air_quality: Box<dyn AirQualityProvider>,
    config: Config,
}

impl Predictor {
    pub fn new(
        history: Box<dyn HistoricalProvider>,
        forecast: Box<dyn ForecastProvider>,
        air_quality: Box<dyn AirQualityProvider>,
        config: Config,
    ) -> Self {
        Self { history, forecast, air_quality, config }
    }

    /// Full outlook for `request`, with "today" supplied by the caller.
    ///
    /// Only missing historical data fails the call; forecast and air-quality
    /// problems leave their fields empty.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
        today: NaiveDate,
    ) -> anyhow::Result<PredictionResponse> {
        let years = self.config.history.year_range(today)?;
        let location = request.location;
        let target = request.target_date;
        let window_days = self.config.forecast.window_days;

        let wants_forecast = in_coverage_window(target, today, window_days);
        let wants_air_quality = target == today;

        let (raw_history, raw_forecast, air_quality) = tokio::join!(
            self.fetch_history(location, years),
            async {
                if wants_forecast { self.fetch_forecast(location).await } else { None }
            },
            async {
                if wants_air_quality { self.fetch_air_quality(location).await } else { None }
            },
        );

        let record = normalize(&raw_history);
        let climatology = compute_climatology(&record, target)?;

        let short_term_forecast =
            raw_forecast.and_then(|bundle| select_forecast_day(&bundle, target, today, window_days));

        let current_prediction =
            CurrentPrediction::choose(short_term_forecast.as_ref(), &climatology.means);

        Ok(PredictionResponse {
            location,
            target_date: target,
            current_prediction,
            provenance: provenance_note(target, years, short_term_forecast.is_some()),
            climatology,
            short_term_forecast,
            air_quality,
            generated_at: Utc::now(),
        })
    }

    async fn fetch_history(&self, location: Location, years: YearRange) -> RawHistoricalBundle {
        match self.history.fetch_history(location, years).await {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!("historical fetch failed: {err:#}");
                RawHistoricalBundle::new()
            }
        }
    }

    async fn fetch_forecast(&self, location: Location) -> Option<RawForecastBundle> {
        match self.forecast.fetch_forecast(location).await {
            Ok(bundle) if bundle.is_empty() => {
                debug!("forecast provider returned no days");
                None
            }
            Ok(bundle) => Some(bundle),
            Err(err) => {
                warn!("forecast fetch failed: {err:#}");
                None
            }
        }
    }

    async fn fetch_air_quality(&self, location: Location) -> Option<AirQualitySnapshot> {
        match self.air_quality.fetch_air_quality(location).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("air-quality fetch failed: {err:#}");
                None
            }
        }
    }
}

fn select_forecast_day(
    bundle: &RawForecastBundle,
    target: NaiveDate,
    today: NaiveDate,
    window_days: u32,
) -> Option<ForecastDayRecord> {
    match blend_forecast(bundle, target, today, window_days) {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!(%reason, "short-range forecast unavailable");
            None
        }
    }
}

/// Human-readable note on where each block came from.
pub fn provenance_note(target: NaiveDate, years: YearRange, has_forecast: bool) -> String {
    let mut note = format!(
        "Climatology from NASA POWER daily records {} for day {}/{} across all years.",
        years,
        target.day(),
        target.month()
    );
    if has_forecast {
        note.push_str(&format!(" Current prediction from the {FORECAST_PROVIDER} daily forecast."));
    } else {
        note.push_str(" Current prediction falls back to climatological means.");
    }
    note
}

/// Whether an error returned by [`Predictor::predict`] is a historical-data failure.
pub fn historical_error(err: &anyhow::Error) -> Option<&ClimatologyError> {
    err.downcast_ref::<ClimatologyError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskLevel, Variable};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Days;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2026, 10, 14)
    }

    #[derive(Debug)]
    struct FakeHistory(anyhow::Result<RawHistoricalBundle>);

    #[async_trait]
    impl HistoricalProvider for FakeHistory {
        async fn fetch_history(
            &self,
            _location: Location,
            _years: YearRange,
        ) -> anyhow::Result<RawHistoricalBundle> {
            match &self.0 {
                Ok(bundle) => Ok(bundle.clone()),
                Err(err) => Err(anyhow!("{err}")),
            }
        }
    }

    #[derive(Debug)]
    struct FakeForecast {
        bundle: Option<RawForecastBundle>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ForecastProvider for FakeForecast {
        async fn fetch_forecast(&self, _location: Location) -> anyhow::Result<RawForecastBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bundle.clone().ok_or_else(|| anyhow!("connection timed out"))
        }
    }

    #[derive(Debug)]
    struct FakeAirQuality {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AirQualityProvider for FakeAirQuality {
        async fn fetch_air_quality(
            &self,
            _location: Location,
        ) -> anyhow::Result<Option<AirQualitySnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(AirQualitySnapshot {
                pm2_5: 12.0,
                pm10: Some(20.0),
                observed_at: Some("2026-10-14T00:00".into()),
            }))
        }
    }

    /// Thirty years of the same dates in October.
    fn history() -> RawHistoricalBundle {
        let mut raw = RawHistoricalBundle::new();
        for year in 1994..2024 {
            for day in 10..=20 {
                let key = format!("{year}10{day:02}");
                let rain = if year % 2 == 0 { 2.0 } else { 0.0 };
                for (variable, value) in [
                    (Variable::MaxTemperature, 28.0),
                    (Variable::MinTemperature, 19.0),
                    (Variable::Precipitation, rain),
                    (Variable::WindSpeed, 2.5),
                    (Variable::SurfacePressure, 100.9),
                    (Variable::RelativeHumidity, 75.0),
                    (Variable::UvIndex, 6.0),
                ] {
                    raw.entry(variable.key().to_string()).or_default().insert(key.clone(), value);
                }
            }
        }
        raw
    }

    fn forecast_bundle() -> RawForecastBundle {
        let mut bundle = RawForecastBundle::default();
        for i in 0..16 {
            let d = today().checked_add_days(Days::new(i)).unwrap();
            bundle.time.push(d.format("%Y-%m-%d").to_string());
        }
        for (name, value) in [
            ("temperature_2m_max", 31.0),
            ("relative_humidity_2m_max", 80.0),
            ("wind_speed_10m_max", 6.0),
            ("precipitation_probability_max", 70.0),
            ("precipitation_sum", 4.2),
            ("uv_index_max", 7.0),
            ("surface_pressure_mean", 1009.0),
        ] {
            bundle.series.insert(name.to_string(), vec![Some(value); 16]);
        }
        bundle
    }

    struct Harness {
        predictor: Predictor,
        forecast_calls: Arc<AtomicUsize>,
        air_quality_calls: Arc<AtomicUsize>,
    }

    fn harness(
        history: anyhow::Result<RawHistoricalBundle>,
        forecast: Option<RawForecastBundle>,
    ) -> Harness {
        let forecast_calls = Arc::new(AtomicUsize::new(0));
        let air_quality_calls = Arc::new(AtomicUsize::new(0));
        let predictor = Predictor::new(
            Box::new(FakeHistory(history)),
            Box::new(FakeForecast { bundle: forecast, calls: forecast_calls.clone() }),
            Box::new(FakeAirQuality { calls: air_quality_calls.clone() }),
            Config::default(),
        );
        Harness { predictor, forecast_calls, air_quality_calls }
    }

    fn request(target: NaiveDate) -> PredictionRequest {
        PredictionRequest {
            location: Location { latitude: 21.03, longitude: 105.85 },
            target_date: target,
        }
    }

    #[tokio::test]
    async fn today_uses_forecast_and_air_quality() {
        let h = harness(Ok(history()), Some(forecast_bundle()));

        let response = h.predictor.predict(&request(today()), today()).await.unwrap();

        let forecast = response.short_term_forecast.clone().expect("forecast expected");
        assert_eq!(forecast.tmax_c, 31.0);
        assert_eq!(forecast.precipitation_probability_pct, 70.0);
        assert_eq!(response.current_prediction, CurrentPrediction::Forecast(forecast));
        assert_eq!(response.air_quality.as_ref().map(|aq| aq.pm2_5), Some(12.0));
        assert_eq!(response.climatology.sample_size, 30);
        assert_eq!(response.climatology.probabilities.p_rain_pct, 50.0);
        assert_eq!(response.climatology.probabilities.risk_level, RiskLevel::Moderate);
        assert!(response.provenance.contains("1994-2026"));
        assert!(!response.provenance.contains("1985"));
        assert_eq!(h.forecast_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.air_quality_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn beyond_window_falls_back_to_climatology() {
        let target = today().checked_add_days(Days::new(17)).unwrap();
        assert_eq!(target, date(2026, 10, 31));

        let mut raw = history();
        for variable in Variable::all() {
            raw.get_mut(variable.key()).unwrap().insert("20201031".into(), 20.0);
        }
        let h = harness(Ok(raw), Some(forecast_bundle()));

        let response = h.predictor.predict(&request(target), today()).await.unwrap();

        assert!(response.short_term_forecast.is_none());
        assert!(response.air_quality.is_none());
        assert_eq!(
            response.current_prediction,
            CurrentPrediction::Climatology(response.climatology.means.clone())
        );
        assert_eq!(h.forecast_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.air_quality_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn last_day_of_window_attempts_forecast() {
        let target = today().checked_add_days(Days::new(16)).unwrap();
        assert_eq!(target, date(2026, 10, 30));

        let mut raw = history();
        raw.get_mut("T2M_MAX").unwrap().insert("20201030".into(), 21.0);
        let h = harness(Ok(raw), Some(forecast_bundle()));

        let response = h.predictor.predict(&request(target), today()).await.unwrap();

        // Attempted, but the 16-day bundle ends the day before.
        assert_eq!(h.forecast_calls.load(Ordering::SeqCst), 1);
        assert!(response.short_term_forecast.is_none());
    }

    #[tokio::test]
    async fn forecast_failure_is_not_fatal() {
        let h = harness(Ok(history()), None);
        let target = date(2026, 10, 16);

        let response = h.predictor.predict(&request(target), today()).await.unwrap();

        assert_eq!(h.forecast_calls.load(Ordering::SeqCst), 1);
        assert!(response.short_term_forecast.is_none());
        assert!(matches!(response.current_prediction, CurrentPrediction::Climatology(_)));
        assert!(response.provenance.contains("falls back"));
    }

    #[tokio::test]
    async fn failed_history_is_no_historical_data() {
        let h = harness(Err(anyhow!("timed out")), Some(forecast_bundle()));

        let err = h.predictor.predict(&request(today()), today()).await.unwrap_err();
        assert_eq!(historical_error(&err), Some(&ClimatologyError::NoHistoricalData));
    }

    #[tokio::test]
    async fn unrecorded_day_is_no_sample() {
        let h = harness(Ok(history()), Some(forecast_bundle()));

        let err = h.predictor.predict(&request(date(2026, 3, 1)), today()).await.unwrap_err();
        assert_eq!(
            historical_error(&err),
            Some(&ClimatologyError::NoSampleForDate { month: 3, day: 1 })
        );
    }

    #[tokio::test]
    async fn response_serializes_with_source_tag() {
        let h = harness(Ok(history()), Some(forecast_bundle()));
        let response = h.predictor.predict(&request(today()), today()).await.unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["current_prediction"]["source"], "forecast");
        assert_eq!(json["current_prediction"]["provider"], "open-meteo");
        assert_eq!(json["target_date"], "2026-10-14");
        assert_eq!(json["climatology"]["probabilities"]["risk_level"], "MODERATE");
    }

    #[test]
    fn provenance_names_actual_range() {
        let note = provenance_note(date(2026, 7, 4), YearRange { start: 2001, end: 2020 }, false);
        assert!(note.contains("2001-2020"));
        assert!(note.contains("4/7"));
    }
}
