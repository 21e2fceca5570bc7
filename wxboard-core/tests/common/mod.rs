#![allow(dead_code)]

use serde_json::{Value, json};
use wxboard_core::{Config, ProviderId};

/// Config with every endpoint on `base` and, optionally, an OpenWeatherMap key.
pub fn config_for(base: &str, owm_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.endpoints.wttr = base.to_string();
    config.endpoints.openweather = base.to_string();
    config.endpoints.nominatim = format!("{base}/search");
    if let Some(key) = owm_key {
        config.upsert_provider_api_key(ProviderId::OpenWeather, key.to_string());
    }
    config
}

fn hour(time: &str, desc: &str, chance: &str) -> Value {
    json!({
        "time": time, "tempC": "11", "FeelsLikeC": "9",
        "weatherDesc": [{"value": desc}], "precipMM": "0.1", "humidity": "76",
        "windspeedKmph": "12", "chanceofrain": chance
    })
}

pub fn wttr_day(date: &str) -> Value {
    let hourly: Vec<Value> = ["0", "300", "600", "900", "1200", "1500", "1800", "2100"]
        .iter()
        .map(|t| {
            if *t == "1200" {
                hour(t, "Patchy rain nearby", "64")
            } else {
                hour(t, "Overcast", "5")
            }
        })
        .collect();

    json!({
        "date": date, "maxtempC": "13", "mintempC": "6", "avgtempC": "10",
        "totalSnow_cm": "0.0", "sunHour": "4.2", "uvIndex": "1",
        "astronomy": [{
            "sunrise": "08:01 AM", "sunset": "05:52 PM", "moonrise": "03:40 PM",
            "moonset": "01:15 AM", "moon_phase": "Waxing Gibbous"
        }],
        "hourly": hourly
    })
}

/// A `format=j1` document with `days` daily blocks.
pub fn wttr_document(days: usize) -> Value {
    let weather: Vec<Value> = ["2026-10-19", "2026-10-20", "2026-10-21"]
        .iter()
        .take(days)
        .map(|d| wttr_day(d))
        .collect();

    json!({
        "current_condition": [{
            "temp_C": "10", "FeelsLikeC": "8", "weatherDesc": [{"value": "Light rain"}],
            "humidity": "87", "windspeedKmph": "10", "winddir16Point": "SW",
            "pressure": "1002", "visibility": "9", "uvIndex": "0", "precipMM": "0.4",
            "weatherCode": "296"
        }],
        "nearest_area": [{
            "areaName": [{"value": "Oslo"}],
            "country": [{"value": "Norway"}],
            "region": [{"value": "Oslo"}]
        }],
        "weather": weather
    })
}

pub fn owm_current() -> Value {
    json!({
        "name": "Oslo",
        "coord": {"lat": 59.91, "lon": 10.75},
        "main": {"temp": 9.6, "feels_like": 7.2, "humidity": 81, "pressure": 1003},
        "weather": [{"id": 500, "description": "light rain"}],
        "wind": {"speed": 5.0, "deg": 225},
        "visibility": 9000,
        "sys": {"country": "NO"}
    })
}
