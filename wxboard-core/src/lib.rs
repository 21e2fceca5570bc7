//! Core library for the `wxboard` weather dashboard.
//!
//! This crate defines:
//! - City autocomplete against Nominatim, cached and rate limited
//! - Current / tomorrow / past-week weather from wttr.in with an
//!   OpenWeatherMap fallback
//! - Flat-file search and weather history
//! - Configuration & credentials handling
//!
//! It is used by `wxboard-cli`, but can also be reused by other front ends.

pub mod board;
pub mod condition;
pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;
mod rate_limit;
pub mod service;
pub mod store;

pub use board::{BoardReport, WeatherBoard};
pub use condition::weather_emoji;
pub use config::{Config, ProviderConfig};
pub use error::{FallbackOutcome, ProviderError, WeatherError};
pub use geocode::{CityResolver, top_cities};
pub use model::{
    CityCandidate, CurrentWeather, HistoricalDayPoint, HistorySummary, HourlyPoint,
    SearchHistoryEntry, TomorrowForecast, WeatherSnapshot, WeatherSource,
};
pub use provider::{ProviderId, WeatherProvider};
pub use service::WeatherService;
pub use store::LocalStore;
