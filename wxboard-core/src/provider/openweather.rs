use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    condition::{degrees_to_compass, title_case},
    error::ProviderError,
    model::{CurrentWeather, HistoricalDayPoint, WeatherSource, local_now},
};

use super::{ProviderId, WEATHER_TIMEOUT_SECS, WeatherProvider, get_json, http_client, send};

const USER_AGENT: &str = concat!("wxboard/", env!("CARGO_PKG_VERSION"));
const CONTEXT: &str = "OpenWeatherMap";
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

/// Upper bound on synthesized past days.
pub const MAX_HISTORY_DAYS: usize = 7;

/// Fallback provider: key-gated OpenWeatherMap 2.5 `/weather`.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: http_client(WEATHER_TIMEOUT_SECS, USER_AGENT)?,
        })
    }

    fn weather_url(&self) -> String {
        format!("{}/weather", self.base_url)
    }

    pub async fn fetch_current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        let request = self.http.get(self.weather_url()).query(&[
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let parsed: OwCurrentResponse =
            get_json(request, "OpenWeatherMap current weather").await?;

        map_current(parsed)
    }

    /// Resolve a city name to its reported name, country and coordinates.
    async fn locate(&self, city: &str) -> Result<OwLocated, ProviderError> {
        let request = self
            .http
            .get(self.weather_url())
            .query(&[("q", city), ("appid", self.api_key.as_str())]);

        get_json(request, "OpenWeatherMap location lookup").await
    }

    /// Current reading at coordinates; `None` when the service answers with a
    /// non-success status.
    async fn fetch_at_coords(
        &self,
        coord: &OwCoord,
    ) -> Result<Option<OwCurrentResponse>, ProviderError> {
        let request = self.http.get(self.weather_url()).query(&[
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let raw = send(request).await?;
        if !raw.status.is_success() {
            tracing::debug!(status = %raw.status, url = %raw.url, "skipping day without a reading");
            return Ok(None);
        }

        raw.parse("OpenWeatherMap coordinates weather").map(Some)
    }

    /// Pseudo-history: one present-moment reading per day offset `1..=min(days, 7)`,
    /// each labelled as noon of that past day.
    ///
    /// The free tier has no time-travel query, so every point carries the same
    /// reading. Days the service refuses are skipped; any other failure aborts.
    pub async fn fetch_history(
        &self,
        city: &str,
        days: usize,
        now: NaiveDateTime,
    ) -> Result<Vec<HistoricalDayPoint>, ProviderError> {
        let days = days.min(MAX_HISTORY_DAYS);
        if days == 0 {
            return Ok(Vec::new());
        }

        let located = self.locate(city).await?;
        let mut points = Vec::with_capacity(days);

        for offset in 1..=days {
            let observed_at = noon_days_ago(now, offset);

            let Some(reading) = self.fetch_at_coords(&located.coord).await? else {
                continue;
            };
            let condition = first_description(&reading)?;

            points.push(HistoricalDayPoint {
                city: located.name.clone(),
                country: located.sys.country.clone(),
                temperature_c: whole_degrees(reading.main.temp),
                humidity_pct: reading.main.humidity.to_string(),
                condition: title_case(&condition),
                observed_at,
                date: observed_at.date(),
            });
        }

        Ok(points)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        self.fetch_current(city).await
    }
}

fn map_current(parsed: OwCurrentResponse) -> Result<CurrentWeather, ProviderError> {
    let weather = parsed.weather.first().ok_or_else(|| missing("weather[0]"))?;
    let visibility_m = parsed.visibility.unwrap_or(DEFAULT_VISIBILITY_M);

    Ok(CurrentWeather {
        city: parsed.name.clone(),
        country: parsed.sys.country.clone(),
        region: String::new(),
        temperature_c: whole_degrees(parsed.main.temp),
        feels_like_c: whole_degrees(parsed.main.feels_like),
        condition: title_case(&weather.description),
        humidity_pct: parsed.main.humidity.to_string(),
        wind_speed_kmh: mps_to_kmh(parsed.wind.speed).to_string(),
        wind_direction: degrees_to_compass(parsed.wind.deg.unwrap_or(0.0)).to_string(),
        pressure_mb: parsed.main.pressure.to_string(),
        visibility_km: ((visibility_m as i64) / 1000).to_string(),
        // Not available from the free current-weather endpoint.
        uv_index: "0".to_string(),
        precipitation_mm: "0".to_string(),
        weather_code: weather.id.to_string(),
        observed_at: local_now(),
        source: WeatherSource::Fallback,
    })
}

/// m/s to km/h, rounded to the nearest integer.
pub fn mps_to_kmh(speed_mps: f64) -> i64 {
    (speed_mps * 3.6).round() as i64
}

/// Temperatures are shown as whole degrees, truncated toward zero.
fn whole_degrees(celsius: f64) -> String {
    (celsius.trunc() as i64).to_string()
}

fn noon_days_ago(now: NaiveDateTime, offset: usize) -> NaiveDateTime {
    let day = now.date() - Duration::days(offset as i64);
    day.and_hms_opt(12, 0, 0)
        .unwrap_or_else(|| day.and_time(NaiveTime::default()))
}

fn first_description(reading: &OwCurrentResponse) -> Result<String, ProviderError> {
    reading
        .weather
        .first()
        .map(|w| w.description.clone())
        .ok_or_else(|| missing("weather[0]"))
}

fn missing(field: &'static str) -> ProviderError {
    ProviderError::MissingField {
        context: CONTEXT.to_string(),
        field,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwLocated {
    name: String,
    coord: OwCoord,
    sys: OwSys,
}
