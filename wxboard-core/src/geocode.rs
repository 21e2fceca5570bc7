use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, PoisonError},
    time::Duration,
};

use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::CityCandidate,
    provider::{get_json, http_client},
    rate_limit::RequestSpacing,
};

/// Nominatim rejects requests without an identifying user agent.
const USER_AGENT: &str = concat!("wxboard/", env!("CARGO_PKG_VERSION"), " (city autocomplete)");
const REQUEST_TIMEOUT_SECS: u64 = 5;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

pub const MIN_QUERY_CHARS: usize = 2;

const UNITED_STATES: &str = "United States";

type CacheKey = (String, usize);

/// City autocomplete backed by Nominatim.
///
/// Lookups are cached per `(lowercased query, limit)` for the life of the
/// resolver and spaced at least one second apart. Failures are logged and read
/// as "no suggestions".
#[derive(Debug)]
pub struct CityResolver {
    base_url: String,
    http: Client,
    cache: Mutex<HashMap<CacheKey, Vec<CityCandidate>>>,
    spacing: RequestSpacing,
}

impl CityResolver {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            http: http_client(REQUEST_TIMEOUT_SECS, USER_AGENT)?,
            cache: Mutex::new(HashMap::new()),
            spacing: RequestSpacing::new(MIN_REQUEST_INTERVAL),
        })
    }

    /// City suggestions for `query`, at most `limit` before de-duplication.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<CityCandidate> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let key = (query.to_lowercase(), limit);
        if let Some(hit) = self.cached(&key) {
            tracing::debug!(query, limit, "city search cache hit");
            return hit;
        }

        match self.fetch_candidates(query, limit).await {
            Ok(candidates) => {
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, candidates.clone());
                candidates
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "city search failed");
                Vec::new()
            }
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<CityCandidate>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn fetch_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CityCandidate>, ProviderError> {
        self.spacing.wait_turn().await;

        let request = self.http.get(&self.base_url).query(&[
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", limit.to_string()),
            ("featuretype", "city".to_string()),
            ("addressdetails", "1".to_string()),
        ]);

        let places: Vec<NominatimPlace> = get_json(request, "Nominatim search").await?;

        Ok(unique_by_display(places.iter().filter_map(candidate_from_place)))
    }
}

/// Fixed quick-access list; no network.
pub fn top_cities() -> Vec<CityCandidate> {
    // (display, search token, city, country, country code)
    const TOP: [(&str, &str, &str, &str, &str); 10] = [
        ("London, United Kingdom", "London,UK", "London", "United Kingdom", "GB"),
        ("New York, United States", "New York,USA", "New York", "United States", "US"),
        ("Tokyo, Japan", "Tokyo,Japan", "Tokyo", "Japan", "JP"),
        ("Paris, France", "Paris,France", "Paris", "France", "FR"),
        ("Dubai, United Arab Emirates", "Dubai,UAE", "Dubai", "UAE", "AE"),
        ("Riyadh, Saudi Arabia", "Riyadh,Saudi Arabia", "Riyadh", "Saudi Arabia", "SA"),
        ("Singapore, Singapore", "Singapore,Singapore", "Singapore", "Singapore", "SG"),
        ("Sydney, Australia", "Sydney,Australia", "Sydney", "Australia", "AU"),
        ("Berlin, Germany", "Berlin,Germany", "Berlin", "Germany", "DE"),
        ("Toronto, Canada", "Toronto,Canada", "Toronto", "Canada", "CA"),
    ];

    TOP.iter()
        .map(|&(display, token, city, country, code)| CityCandidate {
            display: display.to_string(),
            search_token: token.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            country_code: code.to_string(),
            state: String::new(),
        })
        .collect()
}

type NameRule = fn(&NominatimPlace) -> Option<&str>;

/// Where the place name comes from, in order of preference.
const CITY_NAME_RULES: [NameRule; 5] = [
    address_city,
    address_town,
    address_village,
    address_municipality,
    place_name,
];

fn address_city(p: &NominatimPlace) -> Option<&str> {
    p.address.city.as_deref()
}

fn address_town(p: &NominatimPlace) -> Option<&str> {
    p.address.town.as_deref()
}

fn address_village(p: &NominatimPlace) -> Option<&str> {
    p.address.village.as_deref()
}

fn address_municipality(p: &NominatimPlace) -> Option<&str> {
    p.address.municipality.as_deref()
}

fn place_name(p: &NominatimPlace) -> Option<&str> {
    p.name.as_deref()
}

fn city_name(place: &NominatimPlace) -> Option<&str> {
    CITY_NAME_RULES
        .iter()
        .filter_map(|rule| rule(place))
        .find(|name| !name.is_empty())
}

fn candidate_from_place(place: &NominatimPlace) -> Option<CityCandidate> {
    let city = city_name(place)?;
    let address = &place.address;

    let country = address.country.as_deref().unwrap_or("Unknown");
    if country.is_empty() {
        return None;
    }
    let country_code = address.country_code.as_deref().unwrap_or_default().to_uppercase();
    let state = address.state.as_deref().unwrap_or_default();

    let (display, search_token) = if !state.is_empty() && country == UNITED_STATES {
        (
            format!("{city}, {state}, {country_code}"),
            format!("{city},{state},{country}"),
        )
    } else {
        (format!("{city}, {country}"), format!("{city},{country}"))
    };

    Some(CityCandidate {
        display,
        search_token,
        city: city.to_string(),
        country: country.to_string(),
        country_code,
        state: state.to_string(),
    })
}

/// Keep the first candidate for each display string, preserving order.
fn unique_by_display(candidates: impl IntoIterator<Item = CityCandidate>) -> Vec<CityCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.display.clone()))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    name: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(value: serde_json::Value) -> NominatimPlace {
        serde_json::from_value(value).expect("place parses")
    }

    #[test]
    fn city_name_rules_are_ordered() {
        let p = place(json!({
            "name": "Raw",
            "address": {"town": "Town", "village": "Village", "country": "France"}
        }));
        assert_eq!(city_name(&p), Some("Town"));

        let p = place(json!({"name": "Raw", "address": {"city": "", "country": "France"}}));
        assert_eq!(city_name(&p), Some("Raw"));
    }

    #[test]
    fn us_places_include_state() {
        let p = place(json!({
            "name": "Birmingham",
            "address": {
                "city": "Birmingham", "state": "Alabama",
                "country": "United States", "country_code": "us"
            }
        }));
        let c = candidate_from_place(&p).unwrap();

        assert_eq!(c.display, "Birmingham, Alabama, US");
        assert_eq!(c.search_token, "Birmingham,Alabama,United States");
        assert_eq!(c.country_code, "US");
        assert_eq!(c.state, "Alabama");
    }

    #[test]
    fn non_us_places_skip_state() {
        let p = place(json!({
            "name": "Birmingham",
            "address": {
                "city": "Birmingham", "state": "England",
                "country": "United Kingdom", "country_code": "gb"
            }
        }));
        let c = candidate_from_place(&p).unwrap();

        assert_eq!(c.display, "Birmingham, United Kingdom");
        assert_eq!(c.search_token, "Birmingham,United Kingdom");
    }

    #[test]
    fn missing_country_defaults_to_unknown() {
        let c = candidate_from_place(&place(json!({"name": "Atlantis"}))).unwrap();
        assert_eq!(c.country, "Unknown");
        assert_eq!(c.display, "Atlantis, Unknown");
        assert_eq!(c.country_code, "");
    }

    #[test]
    fn places_without_a_name_are_skipped() {
        assert!(candidate_from_place(&place(json!({"address": {"country": "France"}}))).is_none());
        assert!(
            candidate_from_place(&place(json!({"name": "X", "address": {"country": ""}}))).is_none()
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = candidate_from_place(&place(json!({"name": "Paris", "address": {"country": "France", "state": "IDF"}}))).unwrap();
        let b = candidate_from_place(&place(json!({"name": "Paris", "address": {"country": "France", "state": "Other"}}))).unwrap();
        let unique = unique_by_display([a.clone(), b]);
        assert_eq!(unique, vec![a]);
    }

    #[test]
    fn top_cities_are_fixed() {
        let top = top_cities();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].search_token, "London,UK");
        assert_eq!(top[4].display, "Dubai, United Arab Emirates");
        assert_eq!(top[9].city, "Toronto");
    }

    #[tokio::test]
    async fn short_queries_return_nothing() {
        // Nothing listens on port 9; a request would come back as an empty result too,
        // so this only shows the early return path.
        let resolver = CityResolver::new("http://127.0.0.1:9/search").unwrap();
        assert!(resolver.search("", 8).await.is_empty());
        assert!(resolver.search("a", 8).await.is_empty());
    }
}
