use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    condition::title_case,
    error::{ProviderError, WeatherError},
    model::{CurrentWeather, HourlyPoint, TomorrowForecast, WeatherSource, local_now},
};

use super::{ProviderId, WEATHER_TIMEOUT_SECS, WeatherProvider, get_json, http_client};

const USER_AGENT: &str = concat!("wxboard/", env!("CARGO_PKG_VERSION"));
const CONTEXT: &str = "wttr.in";

/// `weather[]` index of tomorrow; index 0 is today.
const TOMORROW: usize = 1;
/// `hourly[]` index of the 12:00 bucket in an 8 x 3-hour day.
const MIDDAY_BUCKET: usize = 4;

/// Primary provider: keyless `wttr.in` JSON (`format=j1`), metric units as strings.
#[derive(Debug, Clone)]
pub struct WttrProvider {
    base_url: String,
    http: Client,
}

impl WttrProvider {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: http_client(WEATHER_TIMEOUT_SECS, USER_AGENT)?,
        })
    }

    async fn fetch_document<T: serde::de::DeserializeOwned>(
        &self,
        city: &str,
        context: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, city);
        let request = self.http.get(url).query(&[("format", "j1")]);
        get_json(request, context).await
    }

    pub async fn fetch_current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        let doc: WtCurrentDocument = self.fetch_document(city, "wttr.in current conditions").await?;

        let current = doc
            .current_condition
            .first()
            .ok_or_else(|| missing("current_condition[0]"))?;
        let area = doc.nearest_area.first().ok_or_else(|| missing("nearest_area[0]"))?;

        let city_name = first_value(&area.area_name).unwrap_or_else(|| title_case(city));
        let country = first_value(&area.country).unwrap_or_else(|| "Unknown".to_string());
        let region = first_value(&area.region).unwrap_or_default();
        let condition =
            first_value(&current.weather_desc).ok_or_else(|| missing("weatherDesc[0]"))?;

        Ok(CurrentWeather {
            city: city_name,
            country,
            region,
            temperature_c: current.temp_c.clone(),
            feels_like_c: current.feels_like_c.clone(),
            condition,
            humidity_pct: current.humidity.clone(),
            wind_speed_kmh: current.windspeed_kmph.clone(),
            wind_direction: current.winddir_16_point.clone(),
            pressure_mb: current.pressure.clone(),
            visibility_km: current.visibility.clone(),
            uv_index: current.uv_index.clone(),
            precipitation_mm: current.precip_mm.clone(),
            weather_code: current.weather_code.clone(),
            observed_at: local_now(),
            source: WeatherSource::Primary,
        })
    }

    /// Tomorrow's daily block with its hourly buckets.
    pub async fn fetch_tomorrow(&self, city: &str) -> Result<TomorrowForecast, WeatherError> {
        let doc: WtForecastDocument = self
            .fetch_document(city, "wttr.in forecast")
            .await
            .map_err(WeatherError::from_forecast)?;

        let days = doc.weather.len();
        let Some(raw_day) = doc.weather.into_iter().nth(TOMORROW) else {
            return Err(WeatherError::ForecastUnavailable { days });
        };

        let day: WtDay = serde_json::from_value(raw_day).map_err(|source| {
            WeatherError::ForecastParse(ProviderError::Deserialize {
                context: "wttr.in forecast day".to_string(),
                source,
            })
        })?;

        map_tomorrow(day).map_err(WeatherError::ForecastParse)
    }
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wttr
    }

    async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        self.fetch_current(city).await
    }
}

fn map_tomorrow(day: WtDay) -> Result<TomorrowForecast, ProviderError> {
    let astronomy = day.astronomy.into_iter().next().ok_or_else(|| missing("astronomy[0]"))?;
    let midday = day.hourly.get(MIDDAY_BUCKET).ok_or_else(|| missing("hourly[4]"))?;
    let condition = first_value(&midday.weather_desc).ok_or_else(|| missing("weatherDesc[0]"))?;

    let hourly = day
        .hourly
        .iter()
        .map(|hour| {
            Ok(HourlyPoint {
                time: hour.time.clone(),
                temp_c: hour.temp_c.clone(),
                feels_like_c: hour.feels_like_c.clone(),
                condition: first_value(&hour.weather_desc)
                    .ok_or_else(|| missing("weatherDesc[0]"))?,
                precipitation_mm: hour.precip_mm.clone(),
                humidity_pct: hour.humidity.clone(),
                wind_speed_kmh: hour.windspeed_kmph.clone(),
                chance_of_rain_pct: hour.chance_of_rain.clone(),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(TomorrowForecast {
        date: day.date,
        max_temp_c: day.max_temp_c,
        min_temp_c: day.min_temp_c,
        avg_temp_c: day.avg_temp_c,
        condition,
        sunrise: astronomy.sunrise,
        sunset: astronomy.sunset,
        moonrise: astronomy.moonrise,
        moonset: astronomy.moonset,
        moon_phase: astronomy.moon_phase,
        total_snow_cm: day.total_snow_cm,
        sun_hours: day.sun_hour,
        uv_index: day.uv_index,
        hourly,
    })
}

fn missing(field: &'static str) -> ProviderError {
    ProviderError::MissingField {
        context: CONTEXT.to_string(),
        field,
    }
}

fn first_value(values: &[WtValue]) -> Option<String> {
    values.first().map(|v| v.value.clone())
}

#[derive(Debug, Deserialize)]
struct WtValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct WtCurrent {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WtValue>,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "winddir16Point")]
    winddir_16_point: String,
    pressure: String,
    visibility: String,
    #[serde(rename = "uvIndex")]
    uv_index: String,
    #[serde(rename = "precipMM")]
    precip_mm: String,
    #[serde(rename = "weatherCode")]
    weather_code: String,
}

#[derive(Debug, Deserialize)]
struct WtArea {
    #[serde(rename = "areaName", default)]
    area_name: Vec<WtValue>,
    #[serde(default)]
    country: Vec<WtValue>,
    #[serde(default)]
    region: Vec<WtValue>,
}

#[derive(Debug, Deserialize)]
struct WtCurrentDocument {
    current_condition: Vec<WtCurrent>,
    nearest_area: Vec<WtArea>,
}

#[derive(Debug, Deserialize)]
struct WtForecastDocument {
    /// Kept raw so a short array is reported as unavailable, not malformed.
    weather: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WtAstronomy {
    sunrise: String,
    sunset: String,
    moonrise: String,
    moonset: String,
    moon_phase: String,
}

#[derive(Debug, Deserialize)]
struct WtHour {
    time: String,
    #[serde(rename = "tempC")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WtValue>,
    #[serde(rename = "precipMM")]
    precip_mm: String,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "chanceofrain")]
    chance_of_rain: String,
}

#[derive(Debug, Deserialize)]
struct WtDay {
    date: String,
    #[serde(rename = "maxtempC")]
    max_temp_c: String,
    #[serde(rename = "mintempC")]
    min_temp_c: String,
    #[serde(rename = "avgtempC")]
    avg_temp_c: String,
    #[serde(rename = "totalSnow_cm")]
    total_snow_cm: String,
    #[serde(rename = "sunHour")]
    sun_hour: String,
    #[serde(rename = "uvIndex")]
    uv_index: String,
    astronomy: Vec<WtAstronomy>,
    hourly: Vec<WtHour>,
}
