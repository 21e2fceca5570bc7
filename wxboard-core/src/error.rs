use std::fmt;

use thiserror::Error;

/// Failure of a single call to one upstream service.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context} response is missing {field}")]
    MissingField {
        context: String,
        field: &'static str,
    },
}

impl ProviderError {
    /// `true` when the upstream could not be reached or answered with a
    /// non-success status, as opposed to answering with a malformed document.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Http(_) | ProviderError::UnexpectedStatus { .. })
    }
}

/// What happened when the fallback source was consulted.
#[derive(Debug)]
pub enum FallbackOutcome {
    NotConfigured,
    Failed(ProviderError),
}

impl fmt::Display for FallbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackOutcome::NotConfigured => f.write_str("no API key configured"),
            FallbackOutcome::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Errors surfaced by the weather source adapter.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Every current-conditions source failed, or the primary failed and no
    /// fallback is configured.
    #[error("weather sources unavailable - wttr.in: {primary}; OpenWeatherMap: {fallback}")]
    SourceUnavailable {
        #[source]
        primary: ProviderError,
        fallback: FallbackOutcome,
    },

    #[error("tomorrow's forecast not available (response contained {days} day(s))")]
    ForecastUnavailable { days: usize },

    #[error("failed to fetch forecast data: {0}")]
    Transport(#[source] ProviderError),

    #[error("failed to parse forecast data: {0}")]
    ForecastParse(#[source] ProviderError),
}

impl WeatherError {
    /// Classify a forecast fetch failure into transport vs parse.
    pub(crate) fn from_forecast(err: ProviderError) -> Self {
        if err.is_transport() {
            WeatherError::Transport(err)
        } else {
            WeatherError::ForecastParse(err)
        }
    }
}
