use std::path::Path;

use anyhow::Context;

use crate::{
    config::Config,
    error::WeatherError,
    geocode::CityResolver,
    model::{CurrentWeather, HistoricalDayPoint, HistorySummary, TomorrowForecast, WeatherSnapshot},
    provider::openweather::MAX_HISTORY_DAYS,
    service::WeatherService,
    store::LocalStore,
};

/// Owns the resolver, the weather service and the local store for one session.
#[derive(Debug)]
pub struct WeatherBoard {
    resolver: CityResolver,
    service: WeatherService,
    store: LocalStore,
}

/// Everything the presentation layer needs to render one city.
#[derive(Debug)]
pub struct BoardReport {
    pub current: CurrentWeather,
    /// Fails on its own without affecting `current`.
    pub forecast: Result<TomorrowForecast, WeatherError>,
    pub history: Vec<HistoricalDayPoint>,
    /// `false` when no fallback key is configured, so `history` is always empty.
    pub history_enabled: bool,
}

impl BoardReport {
    pub fn history_summary(&self) -> Option<HistorySummary> {
        HistorySummary::from_points(&self.history)
    }
}

impl WeatherBoard {
    pub fn new(resolver: CityResolver, service: WeatherService, store: LocalStore) -> Self {
        Self {
            resolver,
            service,
            store,
        }
    }

    /// Wire everything from config, opening the store in the configured data dir.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        Self::from_config_in(config, &data_dir)
    }

    /// Like [`WeatherBoard::from_config`] with an explicit store location.
    pub fn from_config_in(config: &Config, data_dir: &Path) -> anyhow::Result<Self> {
        let resolver = CityResolver::new(config.endpoints.nominatim.as_str())
            .context("Failed to build Nominatim client")?;
        let service = WeatherService::from_config(config)?;
        let store = LocalStore::open(data_dir)?;

        Ok(Self::new(resolver, service, store))
    }

    pub fn resolver(&self) -> &CityResolver {
        &self.resolver
    }

    pub fn service(&self) -> &WeatherService {
        &self.service
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Fetch the full report for a search token.
    ///
    /// Only a current-conditions failure is returned as an error. A successful
    /// lookup records `city` in the search history before the forecast and
    /// history are fetched.
    pub async fn report(&self, city: &str) -> Result<BoardReport, WeatherError> {
        let current = self.service.current_weather(city).await?;

        if let Err(err) = self.store.record_search(city) {
            tracing::warn!(city, error = %err, "failed to record search");
        }

        let forecast = self.service.tomorrow_forecast(city).await;
        if let Err(err) = &forecast {
            tracing::warn!(city, error = %err, "tomorrow's forecast unavailable");
        }

        let history = self.service.historical_weather(city, MAX_HISTORY_DAYS).await;

        Ok(BoardReport {
            current,
            forecast,
            history,
            history_enabled: self.service.has_fallback(),
        })
    }

    /// Keep the current conditions in this week's snapshot history.
    pub fn save_snapshot(&self, city: &str, current: &CurrentWeather) -> anyhow::Result<()> {
        self.store
            .save_weather_snapshot(city, WeatherSnapshot::from(current))
    }
}
