use std::fmt;

use serde_json::{Value, json};
use wxboard_core::{
    BoardReport, CityCandidate, CurrentWeather, HistoricalDayPoint, HistorySummary,
    TomorrowForecast, WeatherSnapshot, weather_emoji,
    model::{HISTORICAL_DISCLAIMER, NO_FALLBACK_KEY_NOTE, RAIN_ALERT_THRESHOLD_PCT},
};

pub struct Candidates<'a>(pub &'a [CityCandidate]);

impl fmt::Display for Candidates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0 {
            writeln!(f, "{:<40} {}", c.display, c.search_token)?;
        }
        Ok(())
    }
}

/// Text view of a full report: current conditions, tomorrow, past week.
pub struct Report<'a>(pub &'a BoardReport);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write!(f, "{}", Current(&report.current))?;

        writeln!(f)?;
        match &report.forecast {
            Ok(forecast) => write!(f, "{}", Tomorrow(forecast))?,
            Err(err) => writeln!(f, "Tomorrow: {err}")?,
        }

        writeln!(f)?;
        if !report.history_enabled {
            return writeln!(f, "{NO_FALLBACK_KEY_NOTE}");
        }
        match report.history_summary() {
            Some(summary) => write!(f, "{}", History(&report.history, summary)),
            None => {
                writeln!(f, "Past week: no data available.")?;
                writeln!(f, "{HISTORICAL_DISCLAIMER}")
            }
        }
    }
}

struct Current<'a>(&'a CurrentWeather);

impl fmt::Display for Current<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.0;
        writeln!(
            f,
            "{} {}  ({})",
            weather_emoji(&w.condition, Some(&w.weather_code)),
            w.location_label(),
            w.source.provider().label()
        )?;
        writeln!(f, "  {}  {}°C, feels like {}°C", w.condition, w.temperature_c, w.feels_like_c)?;
        writeln!(f, "  Humidity      {}%", w.humidity_pct)?;
        writeln!(f, "  Wind          {} km/h {}", w.wind_speed_kmh, w.wind_direction)?;
        writeln!(f, "  Pressure      {} mb", w.pressure_mb)?;
        writeln!(f, "  Visibility    {} km", w.visibility_km)?;
        writeln!(f, "  UV index      {}", w.uv_index)?;
        writeln!(f, "  Precipitation {} mm", w.precipitation_mm)?;
        writeln!(f, "  Updated       {}", w.observed_at.format("%Y-%m-%d %H:%M"))
    }
}

struct Tomorrow<'a>(&'a TomorrowForecast);

impl fmt::Display for Tomorrow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.0;
        writeln!(
            f,
            "Tomorrow ({}): {} {}",
            day.date,
            weather_emoji(&day.condition, None),
            day.condition
        )?;
        writeln!(f, "  {}°C / {}°C, avg {}°C", day.max_temp_c, day.min_temp_c, day.avg_temp_c)?;
        writeln!(f, "  Sunrise {}  Sunset {}", day.sunrise, day.sunset)?;
        writeln!(f, "  Moon {} (rise {}, set {})", day.moon_phase, day.moonrise, day.moonset)?;
        writeln!(f, "  Sun {} h, snow {} cm, UV {}", day.sun_hours, day.total_snow_cm, day.uv_index)?;

        for h in &day.hourly {
            writeln!(
                f,
                "  {:>5}  {:>3}°C  rain {:>3}%  {}",
                hour_label(&h.time),
                h.temp_c,
                h.chance_of_rain_pct,
                h.condition
            )?;
        }

        if !day.rain_likely() {
            writeln!(
                f,
                "  Low chance of rain (at most {}%, threshold {RAIN_ALERT_THRESHOLD_PCT}%).",
                day.max_chance_of_rain()
            )?;
        }
        Ok(())
    }
}

struct History<'a>(&'a [HistoricalDayPoint], HistorySummary);

impl fmt::Display for History<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let History(points, summary) = self;
        writeln!(f, "Past {} days:", summary.days)?;
        for p in points.iter() {
            writeln!(
                f,
                "  {}  {:>3}°C  {:>3}%  {}",
                p.date, p.temperature_c, p.humidity_pct, p.condition
            )?;
        }
        writeln!(
            f,
            "  avg {:.1}°C, warmest {:.0}°C, coldest {:.0}°C, humidity {:.0}%",
            summary.avg_temp_c, summary.max_temp_c, summary.min_temp_c, summary.avg_humidity_pct
        )?;
        writeln!(f, "{HISTORICAL_DISCLAIMER}")
    }
}

/// `"0"` -> `"00:00"`, `"900"` -> `"09:00"`; anything else is shown as given.
fn hour_label(time: &str) -> String {
    match time.trim().parse::<u32>() {
        Ok(hhmm) if hhmm < 2400 && hhmm % 100 < 60 => {
            format!("{:02}:{:02}", hhmm / 100, hhmm % 100)
        }
        _ => time.to_string(),
    }
}

pub struct SnapshotLine<'a>(pub &'a WeatherSnapshot);

impl fmt::Display for SnapshotLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let field = |key: &str| snapshot.fields.get(key).and_then(Value::as_str).unwrap_or("-");

        if let Some(ts) = snapshot.timestamp {
            write!(f, "{}", ts.format("%a %H:%M"))?;
        }
        write!(f, "  {}°C  {}", field("temperature_c"), field("condition"))
    }
}

pub fn report_json(report: &BoardReport) -> Value {
    let forecast = match &report.forecast {
        Ok(forecast) => json!(forecast),
        Err(err) => json!({ "error": err.to_string() }),
    };

    json!({
        "current": report.current,
        "forecast": forecast,
        "history": report.history,
        "history_enabled": report.history_enabled,
    })
}
