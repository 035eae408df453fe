use climate_core::{CurrentPrediction, PredictionResponse};
use std::fmt;

fn opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "n/a".to_string(),
    }
}

/// Plain-text report of a prediction.
pub struct Report<'a>(pub &'a PredictionResponse);

impl fmt::Display for Report<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.0;
        let p = &response.climatology.probabilities;

        writeln!(
            out,
            "Outlook for {} at ({:.4}, {:.4})",
            response.target_date, response.location.latitude, response.location.longitude
        )?;
        writeln!(out)?;

        writeln!(out, "Current prediction")?;
        match &response.current_prediction {
            CurrentPrediction::Forecast(f) => {
                writeln!(out, "  source:                  {} forecast", f.provider)?;
                writeln!(out, "  max temperature:         {:.1} °C", f.tmax_c)?;
                writeln!(out, "  humidity:                {:.0} %", f.humidity_pct)?;
                writeln!(out, "  wind:                    {:.1} m/s", f.wind_speed_mps)?;
                writeln!(out, "  pressure:                {:.1} hPa", f.pressure_hpa)?;
                writeln!(out, "  UV index:                {:.1}", f.uv_index)?;
                writeln!(out, "  precipitation chance:    {:.0} %", f.precipitation_probability_pct)?;
                writeln!(out, "  precipitation:           {:.1} mm", f.precipitation_mm)?;
                writeln!(out, "  discomfort index:        {:.1} °C", f.discomfort_index_c)?;
            }
            CurrentPrediction::Climatology(m) => {
                writeln!(out, "  source:                  climatological means")?;
                writeln!(out, "  max temperature:         {}", opt(m.avg_tmax_c, " °C"))?;
                writeln!(out, "  min temperature:         {}", opt(m.avg_tmin_c, " °C"))?;
                writeln!(out, "  humidity:                {}", opt(m.avg_humidity_pct, " %"))?;
                writeln!(out, "  wind:                    {}", opt(m.avg_wind_speed_mps, " m/s"))?;
                writeln!(out, "  pressure:                {}", opt(m.avg_pressure_kpa, " kPa"))?;
                writeln!(out, "  UV index:                {}", opt(m.avg_uv_index, ""))?;
                writeln!(out, "  discomfort index:        {}", opt(m.avg_discomfort_index_c, " °C"))?;
            }
        }
        writeln!(out)?;

        writeln!(
            out,
            "Historical likelihood ({} years recorded this day)",
            response.climatology.sample_size
        )?;
        writeln!(out, "  rain day:                {:.1} %", p.p_rain_pct)?;
        writeln!(out, "  extreme heat:            {:.1} %", p.p_extreme_heat_pct)?;
        writeln!(out, "  extreme wind:            {:.1} %", p.p_extreme_wind_pct)?;
        writeln!(out, "  risk level:              {}", p.risk_level)?;

        if let Some(aq) = &response.air_quality {
            writeln!(out)?;
            writeln!(out, "Air quality")?;
            writeln!(out, "  PM2.5:                   {:.1} µg/m³", aq.pm2_5)?;
            writeln!(out, "  PM10:                    {}", opt(aq.pm10, " µg/m³"))?;
        }

        writeln!(out)?;
        writeln!(out, "{}", response.provenance)
    }
}
