use anyhow::Context;

use crate::{
    config::Config,
    error::{FallbackOutcome, WeatherError},
    model::{CurrentWeather, HistoricalDayPoint, TomorrowForecast, local_now},
    provider::{
        ProviderId, WeatherProvider, openweather::OpenWeatherProvider, wttr::WttrProvider,
    },
};

/// Weather source adapter: wttr.in first, OpenWeatherMap when a key is configured.
#[derive(Debug)]
pub struct WeatherService {
    primary: WttrProvider,
    fallback: Option<OpenWeatherProvider>,
}

impl WeatherService {
    pub fn new(primary: WttrProvider, fallback: Option<OpenWeatherProvider>) -> Self {
        Self { primary, fallback }
    }

    /// Build both providers from config. A missing fallback key just disables the fallback.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let primary = WttrProvider::new(config.endpoints.wttr.as_str())
            .context("Failed to build wttr.in client")?;

        let fallback = match config.provider_api_key(ProviderId::OpenWeather) {
            Some(key) => Some(
                OpenWeatherProvider::new(key.to_owned(), config.endpoints.openweather.as_str())
                    .context("Failed to build OpenWeatherMap client")?,
            ),
            None => None,
        };

        Ok(Self::new(primary, fallback))
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Current conditions from whichever source answers first.
    pub async fn current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let fallback = self.fallback.as_ref().map(|p| p as &dyn WeatherProvider);
        first_available(&self.primary, fallback, city).await
    }

    /// Tomorrow's forecast from the primary source only.
    pub async fn tomorrow_forecast(&self, city: &str) -> Result<TomorrowForecast, WeatherError> {
        self.primary.fetch_tomorrow(city).await
    }

    /// Up to `min(days, 7)` pseudo-historical points; empty without a fallback
    /// key or on any failure.
    pub async fn historical_weather(&self, city: &str, days: usize) -> Vec<HistoricalDayPoint> {
        let Some(fallback) = &self.fallback else {
            return Vec::new();
        };

        match fallback.fetch_history(city, days, local_now()).await {
            Ok(points) => points,
            Err(err) => {
                tracing::warn!(city, error = %err, "historical weather unavailable");
                Vec::new()
            }
        }
    }
}

/// Ask `primary`, then `fallback` if there is one. Fails with both reasons.
pub async fn first_available(
    primary: &dyn WeatherProvider,
    fallback: Option<&dyn WeatherProvider>,
    city: &str,
) -> Result<CurrentWeather, WeatherError> {
    let primary_err = match primary.current_weather(city).await {
        Ok(weather) => return Ok(weather),
        Err(err) => err,
    };

    let Some(fallback) = fallback else {
        return Err(WeatherError::SourceUnavailable {
            primary: primary_err,
            fallback: FallbackOutcome::NotConfigured,
        });
    };

    tracing::info!(
        city,
        primary = %primary.id(),
        fallback = %fallback.id(),
        error = %primary_err,
        "primary weather source failed, trying fallback"
    );

    fallback
        .current_weather(city)
        .await
        .map_err(|fallback_err| WeatherError::SourceUnavailable {
            primary: primary_err,
            fallback: FallbackOutcome::Failed(fallback_err),
        })
}
