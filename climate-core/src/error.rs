use thiserror::Error;

/// Failures that abort a prediction: historical data is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClimatologyError {
    #[error("No historical data available to compute climatology")]
    NoHistoricalData,

    #[error("Historical data contains no records for day {day}/{month} in any year")]
    NoSampleForDate { month: u32, day: u32 },
}

/// Reasons a short-range forecast day could not be produced. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastUnavailable {
    #[error("target date is outside the {window_days}-day forecast window")]
    OutsideCoverage { window_days: u32 },

    #[error("forecast does not cover {0}")]
    DateNotFound(String),

    #[error("forecast is missing field '{0}'")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sample_error_names_the_day() {
        let err = ClimatologyError::NoSampleForDate { month: 2, day: 29 };
        assert!(err.to_string().contains("29/2"));
    }

    #[test]
    fn historical_errors_are_distinct() {
        assert_ne!(
            ClimatologyError::NoHistoricalData,
            ClimatologyError::NoSampleForDate { month: 1, day: 1 }
        );
    }
}
