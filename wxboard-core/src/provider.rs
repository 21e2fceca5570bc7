use crate::{error::ProviderError, model::CurrentWeather};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openweather;
pub mod wttr;

/// Per-call timeout for the weather providers.
pub(crate) const WEATHER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Wttr,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Wttr => "wttr",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// Human-readable source name shown alongside results.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderId::Wttr => "wttr.in",
            ProviderId::OpenWeather => "OpenWeatherMap",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Wttr, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "wttr" | "wttr.in" => Ok(ProviderId::Wttr),
            "openweather" | "openweathermap" => Ok(ProviderId::OpenWeather),
            _ => {
                let supported: Vec<&str> = ProviderId::all().iter().map(ProviderId::as_str).collect();
                Err(anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    supported.join(", ")
                ))
            }
        }
    }
}

/// A source of current conditions, normalized to [`CurrentWeather`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ProviderError>;
}

pub(crate) fn http_client(timeout_secs: u64, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
}

/// A fully read response.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) url: String,
    pub(crate) body: String,
}

impl RawResponse {
    pub(crate) fn ensure_success(&self) -> Result<(), ProviderError> {
        if self.status.is_success() {
            return Ok(());
        }
        Err(ProviderError::UnexpectedStatus {
            status: self.status.as_u16(),
            url: self.url.clone(),
            body: truncate_body(&self.body),
        })
    }

    pub(crate) fn parse<T: DeserializeOwned>(&self, context: &str) -> Result<T, ProviderError> {
        serde_json::from_str(&self.body).map_err(|source| ProviderError::Deserialize {
            context: context.to_string(),
            source,
        })
    }
}

pub(crate) async fn send(request: RequestBuilder) -> Result<RawResponse, ProviderError> {
    let res = request.send().await?;

    let status = res.status();
    let url = res.url().to_string();
    let body = res.text().await?;

    Ok(RawResponse { status, url, body })
}

/// Send, require a 2xx status, and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> Result<T, ProviderError> {
    let raw = send(request).await?;
    raw.ensure_success()?;
    raw.parse(context)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_accepts_labels() {
        assert_eq!(ProviderId::try_from("OpenWeatherMap").unwrap(), ProviderId::OpenWeather);
        assert_eq!(ProviderId::try_from("wttr.in").unwrap(), ProviderId::Wttr);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("weatherapi").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn only_fallback_needs_a_key() {
        assert!(ProviderId::OpenWeather.requires_api_key());
        assert!(!ProviderId::Wttr.requires_api_key());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "not found";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn non_success_status_is_an_error() {
        let raw = RawResponse {
            status: StatusCode::NOT_FOUND,
            url: "https://wttr.in/Nowhere".to_string(),
            body: "Unknown location".to_string(),
        };
        let err = raw.ensure_success().unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedStatus { status: 404, .. }));
    }
}
