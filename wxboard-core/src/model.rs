use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::ProviderId;

/// Forecast hours whose chance of rain exceeds this are worth a rain chart.
pub const RAIN_ALERT_THRESHOLD_PCT: u32 = 10;

/// Shown next to historical data: the free fallback tier has no time travel.
pub const HISTORICAL_DISCLAIMER: &str = "Note: true historical weather requires a paid \
OpenWeatherMap subscription. Each past day shows the current reading relabelled with that date.";

pub const NO_FALLBACK_KEY_NOTE: &str = "OpenWeatherMap API key not configured. Set \
OPENWEATHERMAP_API_KEY or run `wxboard configure openweather` to enable fallback and history.";

/// Local wall-clock time, the reference for every timestamp this crate writes.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A place suggestion produced by the city resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub display: String,
    /// Opaque token passed back into the weather service.
    pub search_token: String,
    pub city: String,
    pub country: String,
    pub country_code: String,
    pub state: String,
}

/// Which upstream answered a current-conditions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Primary,
    Fallback,
}

impl WeatherSource {
    pub fn provider(self) -> ProviderId {
        match self {
            WeatherSource::Primary => ProviderId::Wttr,
            WeatherSource::Fallback => ProviderId::OpenWeather,
        }
    }
}

/// Current conditions in the canonical schema.
///
/// Measurements are kept as the strings the primary provider reports
/// (metric units); the fallback path formats its converted values the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub country: String,
    pub region: String,
    pub temperature_c: String,
    pub feels_like_c: String,
    pub condition: String,
    pub humidity_pct: String,
    pub wind_speed_kmh: String,
    /// 16-point compass, e.g. `"NNE"`.
    pub wind_direction: String,
    pub pressure_mb: String,
    pub visibility_km: String,
    pub uv_index: String,
    pub precipitation_mm: String,
    pub weather_code: String,
    /// Local wall-clock time of the request.
    pub observed_at: NaiveDateTime,
    pub source: WeatherSource,
}

impl CurrentWeather {
    /// `"city, region, country"` when a region is known, else `"city, country"`.
    pub fn location_label(&self) -> String {
        if self.region.is_empty() {
            format!("{}, {}", self.city, self.country)
        } else {
            format!("{}, {}, {}", self.city, self.region, self.country)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Provider time-of-day, e.g. `"0"`, `"300"`, `"1200"`.
    pub time: String,
    pub temp_c: String,
    pub feels_like_c: String,
    pub condition: String,
    pub precipitation_mm: String,
    pub humidity_pct: String,
    pub wind_speed_kmh: String,
    pub chance_of_rain_pct: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomorrowForecast {
    pub date: String,
    pub max_temp_c: String,
    pub min_temp_c: String,
    pub avg_temp_c: String,
    /// Condition of the midday bucket.
    pub condition: String,
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub total_snow_cm: String,
    pub sun_hours: String,
    pub uv_index: String,
    pub hourly: Vec<HourlyPoint>,
}

impl TomorrowForecast {
    /// Highest chance of rain across the hourly buckets; unparsable values count as 0.
    pub fn max_chance_of_rain(&self) -> u32 {
        self.hourly
            .iter()
            .filter_map(|h| h.chance_of_rain_pct.trim().parse::<u32>().ok())
            .max()
            .unwrap_or(0)
    }

    pub fn rain_likely(&self) -> bool {
        self.max_chance_of_rain() > RAIN_ALERT_THRESHOLD_PCT
    }
}

/// One synthesized "past" day. See [`HISTORICAL_DISCLAIMER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDayPoint {
    pub city: String,
    pub country: String,
    pub temperature_c: String,
    pub humidity_pct: String,
    pub condition: String,
    pub observed_at: NaiveDateTime,
    pub date: NaiveDate,
}

/// Aggregates shown under the past-week chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub days: usize,
    pub avg_temp_c: f64,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_humidity_pct: f64,
}

impl HistorySummary {
    /// `None` when no point carries a numeric temperature.
    pub fn from_points(points: &[HistoricalDayPoint]) -> Option<Self> {
        let temps: Vec<f64> = points
            .iter()
            .filter_map(|p| p.temperature_c.trim().parse().ok())
            .collect();
        if temps.is_empty() {
            return None;
        }

        let humidity: Vec<f64> = points
            .iter()
            .filter_map(|p| p.humidity_pct.trim().parse().ok())
            .collect();

        Some(Self {
            days: points.len(),
            avg_temp_c: mean(&temps),
            max_temp_c: temps.iter().copied().fold(f64::MIN, f64::max),
            min_temp_c: temps.iter().copied().fold(f64::MAX, f64::min),
            avg_humidity_pct: if humidity.is_empty() { 0.0 } else { mean(&humidity) },
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// A persisted recent search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub city: String,
    #[serde(rename = "timestamp")]
    pub searched_at: NaiveDateTime,
}

/// A weather record kept in the per-city history file.
///
/// The record is an open JSON object; only `timestamp` has meaning to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl From<&CurrentWeather> for WeatherSnapshot {
    fn from(current: &CurrentWeather) -> Self {
        let mut fields = match serde_json::to_value(current) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.remove("observed_at");

        Self {
            timestamp: Some(current.observed_at),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(chance: &str) -> HourlyPoint {
        HourlyPoint {
            time: "1200".into(),
            temp_c: "20".into(),
            feels_like_c: "20".into(),
            condition: "Sunny".into(),
            precipitation_mm: "0.0".into(),
            humidity_pct: "40".into(),
            wind_speed_kmh: "10".into(),
            chance_of_rain_pct: chance.into(),
        }
    }

    fn forecast(hourly: Vec<HourlyPoint>) -> TomorrowForecast {
        TomorrowForecast {
            date: "2026-10-20".into(),
            max_temp_c: "22".into(),
            min_temp_c: "12".into(),
            avg_temp_c: "17".into(),
            condition: "Sunny".into(),
            sunrise: "07:01 AM".into(),
            sunset: "06:12 PM".into(),
            moonrise: "03:10 PM".into(),
            moonset: "01:02 AM".into(),
            moon_phase: "Waxing Gibbous".into(),
            total_snow_cm: "0.0".into(),
            sun_hours: "9.5".into(),
            uv_index: "3".into(),
            hourly,
        }
    }

    fn day(temp: &str, humidity: &str) -> HistoricalDayPoint {
        let observed_at = NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        HistoricalDayPoint {
            city: "Paris".into(),
            country: "FR".into(),
            temperature_c: temp.into(),
            humidity_pct: humidity.into(),
            condition: "Clear Sky".into(),
            observed_at,
            date: observed_at.date(),
        }
    }

    #[test]
    fn max_chance_of_rain_ignores_garbage() {
        let f = forecast(vec![hour("5"), hour("n/a"), hour("40"), hour("0")]);
        assert_eq!(f.max_chance_of_rain(), 40);
        assert!(f.rain_likely());
    }

    #[test]
    fn low_rain_is_not_likely() {
        let f = forecast(vec![hour("10"), hour("3")]);
        assert!(!f.rain_likely());
        assert_eq!(forecast(Vec::new()).max_chance_of_rain(), 0);
    }

    #[test]
    fn summary_over_days() {
        let summary = HistorySummary::from_points(&[day("10", "50"), day("14", "70"), day("12", "60")])
            .expect("summary");
        assert_eq!(summary.days, 3);
        assert_eq!(summary.avg_temp_c, 12.0);
        assert_eq!(summary.max_temp_c, 14.0);
        assert_eq!(summary.min_temp_c, 10.0);
        assert_eq!(summary.avg_humidity_pct, 60.0);
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(HistorySummary::from_points(&[]).is_none());
    }

    #[test]
    fn source_serializes_lowercase() {
        let json = serde_json::to_string(&WeatherSource::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        assert_eq!(WeatherSource::Primary.provider(), ProviderId::Wttr);
    }

    #[test]
    fn search_entry_uses_timestamp_key() {
        let entry: SearchHistoryEntry =
            serde_json::from_str(r#"{"city":"Paris,France","timestamp":"2026-10-19T09:30:00.123456"}"#)
                .expect("entry parses");
        assert_eq!(entry.city, "Paris,France");
        let back = serde_json::to_value(&entry).unwrap();
        assert!(back.get("timestamp").is_some());
    }
}
