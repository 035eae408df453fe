//! Sparse-to-dense reshape of the raw historical bundle.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::model::{MISSING_SENTINEL, RawHistoricalBundle, RawVariableSeries, Variable};

const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// One calendar day with a slot per tracked variable.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub values: [Option<f64>; Variable::COUNT],
}

impl DailyRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self { date, values: [None; Variable::COUNT] }
    }

    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.values[variable.index()]
    }

    /// Value as `f64`, NaN when absent.
    pub fn get_or_nan(&self, variable: Variable) -> f64 {
        self.get(variable).unwrap_or(f64::NAN)
    }
}

/// Gap-filled daily table sorted ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    rows: Vec<DailyRecord>,
}

impl NormalizedRecord {
    pub fn rows(&self) -> &[DailyRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Rows for the given month and day, across every year present.
    pub fn same_calendar_day(
        &self,
        month: u32,
        day: u32,
    ) -> impl Iterator<Item = &DailyRecord> + '_ {
        self.rows
            .iter()
            .filter(move |r| r.date.month() == month && r.date.day() == day)
    }

    pub fn column(&self, variable: Variable) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |r| r.get(variable))
    }

    /// Back to the provider's sparse shape, writing the sentinel for absent cells.
    pub fn to_raw_bundle(&self) -> RawHistoricalBundle {
        Variable::all()
            .iter()
            .map(|&variable| {
                let series: RawVariableSeries = self
                    .rows
                    .iter()
                    .map(|r| {
                        let key = r.date.format(DATE_KEY_FORMAT).to_string();
                        (key, r.get(variable).unwrap_or(MISSING_SENTINEL))
                    })
                    .collect();
                (variable.key().to_string(), series)
            })
            .collect()
    }
}

/// Builds a [`NormalizedRecord`] from the raw provider bundle.
///
/// Unparseable date keys are dropped, sentinel values become absent and
/// tracked variables missing from the input get an all-absent column.
pub fn normalize(raw: &RawHistoricalBundle) -> NormalizedRecord {
    let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();
    let mut missing = Vec::new();
    let mut dropped_keys = 0usize;

    for &variable in Variable::all() {
        let Some(series) = raw.get(variable.key()) else {
            missing.push(variable.key());
            continue;
        };

        for (key, &value) in series {
            let Some(date) = parse_date_key(key) else {
                dropped_keys += 1;
                continue;
            };

            let row = by_date.entry(date).or_insert_with(|| DailyRecord::empty(date));
            row.values[variable.index()] = clean_value(value);
        }
    }

    if missing.len() == Variable::COUNT {
        debug!("historical bundle has no tracked variables");
        return NormalizedRecord::default();
    }

    if !missing.is_empty() {
        warn!(missing = ?missing, "tracked variables absent from historical data, filled as missing");
    }

    if dropped_keys > 0 {
        debug!(dropped_keys, "dropped historical values with unparseable date keys");
    }

    NormalizedRecord { rows: by_date.into_values().collect() }
}

/// Strict `YYYYMMDD`: exactly eight ASCII digits forming a valid date.
fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

fn clean_value(value: f64) -> Option<f64> {
    if value == MISSING_SENTINEL || !value.is_finite() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(entries: &[(&str, f64)]) -> RawVariableSeries {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_bundle_gives_empty_record() {
        let record = normalize(&RawHistoricalBundle::new());
        assert!(record.is_empty());
    }

    #[test]
    fn bundle_without_tracked_variables_gives_empty_record() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert("T2M".into(), series(&[("20200101", 3.0)]));
        assert!(normalize(&raw).is_empty());
    }

    #[test]
    fn sentinel_values_become_absent() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert(
            "T2M_MAX".into(),
            series(&[("20200101", -999.0), ("20200102", 12.5), ("20200103", -999.0)]),
        );

        let record = normalize(&raw);
        let column: Vec<_> = record.column(Variable::MaxTemperature).collect();
        assert_eq!(column, vec![None, Some(12.5), None]);
    }

    #[test]
    fn near_sentinel_values_are_kept() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert("PS".into(), series(&[("20200101", -999.5)]));

        let record = normalize(&raw);
        assert_eq!(record.rows()[0].get(Variable::SurfacePressure), Some(-999.5));
    }

    #[test]
    fn missing_variables_get_absent_columns() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert("RH2M".into(), series(&[("19990704", 81.0)]));

        let record = normalize(&raw);
        assert_eq!(record.len(), 1);
        let row = &record.rows()[0];
        assert_eq!(row.get(Variable::RelativeHumidity), Some(81.0));
        for v in Variable::all().iter().filter(|v| **v != Variable::RelativeHumidity) {
            assert_eq!(row.get(*v), None, "{v} should be absent");
        }
    }

    #[test]
    fn unparseable_date_keys_are_dropped() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert(
            "WS10M".into(),
            series(&[
                ("20200101", 2.0),
                ("2020-01-02", 3.0),
                ("20200230", 4.0),
                ("202001", 5.0),
                ("+2020101", 6.0),
                ("ANN", 7.0),
            ]),
        );

        let record = normalize(&raw);
        assert_eq!(record.len(), 1);
        assert_eq!(record.rows()[0].date, date(2020, 1, 1));
    }

    #[test]
    fn rows_are_sorted_and_merged_across_variables() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert("T2M_MAX".into(), series(&[("20210301", 15.0), ("19950301", 11.0)]));
        raw.insert("T2M_MIN".into(), series(&[("20210301", 4.0), ("20000815", 18.0)]));

        let record = normalize(&raw);
        let dates: Vec<_> = record.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1995, 3, 1), date(2000, 8, 15), date(2021, 3, 1)]);

        let merged = record.get(date(2021, 3, 1)).unwrap();
        assert_eq!(merged.get(Variable::MaxTemperature), Some(15.0));
        assert_eq!(merged.get(Variable::MinTemperature), Some(4.0));
        assert!(record.get(date(2021, 3, 2)).is_none());
    }

    #[test]
    fn normalizing_is_idempotent() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert("T2M_MAX".into(), series(&[("20200101", 10.0), ("20200102", -999.0)]));
        raw.insert("PRECTOTCORR".into(), series(&[("20200102", 0.4), ("bad", 1.0)]));

        let once = normalize(&raw);
        let twice = normalize(&once.to_raw_bundle());
        assert_eq!(once, twice);
    }

    #[test]
    fn same_calendar_day_spans_years() {
        let mut raw = RawHistoricalBundle::new();
        raw.insert(
            "T2M_MAX".into(),
            series(&[("20190714", 30.0), ("20200714", 31.0), ("20200715", 29.0)]),
        );

        let record = normalize(&raw);
        let years: Vec<_> = record.same_calendar_day(7, 14).map(|r| r.date.year()).collect();
        assert_eq!(years, vec![2019, 2020]);
    }
}
