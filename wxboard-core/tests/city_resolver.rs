use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wxboard_core::CityResolver;

fn resolver(server: &MockServer) -> CityResolver {
    CityResolver::new(format!("{}/search", server.uri())).expect("failed to build test resolver")
}

fn places() -> serde_json::Value {
    json!([
        {"name": "Springfield", "address": {
            "city": "Springfield", "state": "Illinois",
            "country": "United States", "country_code": "us"}},
        {"name": "Springfield", "address": {
            "city": "Springfield", "state": "Illinois",
            "country": "United States", "country_code": "us"}},
        {"name": "Springfield", "address": {
            "town": "Springfield", "state": "Ontario",
            "country": "Canada", "country_code": "ca"}},
        {"name": "Nowhere", "address": {"country": ""}}
    ])
}

#[tokio::test]
async fn search_maps_dedups_and_sends_nominatim_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Springfield"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "5"))
        .and(query_param("featuretype", "city"))
        .and(query_param("addressdetails", "1"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places()))
        .expect(1)
        .mount(&server)
        .await;

    let found = resolver(&server).search("Springfield", 5).await;

    let displays: Vec<&str> = found.iter().map(|c| c.display.as_str()).collect();
    assert_eq!(displays, ["Springfield, Illinois, US", "Springfield, Canada"]);
    assert_eq!(found[0].search_token, "Springfield,Illinois,United States");
    assert_eq!(found[1].search_token, "Springfield,Canada");
    assert_eq!(found[1].country_code, "CA");
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places()))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    let first = resolver.search("Springfield", 5).await;
    let second = resolver.search("SPRINGFIELD", 5).await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn different_limit_is_a_different_cache_entry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places()))
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    resolver.search("Springfield", 5).await;
    resolver.search("Springfield", 8).await;
}

#[tokio::test]
async fn consecutive_lookups_are_spaced_one_second_apart() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    let started = Instant::now();
    resolver.search("Oslo", 5).await;
    resolver.search("Bergen", 5).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn upstream_failure_reads_as_no_suggestions_and_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    assert!(resolver.search("Paris", 5).await.is_empty());
    assert!(resolver.search("Paris", 5).await.is_empty());
}

#[tokio::test]
async fn malformed_body_reads_as_no_suggestions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    assert!(resolver(&server).search("Paris", 5).await.is_empty());
}

#[tokio::test]
async fn short_query_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    assert!(resolver(&server).search("P", 5).await.is_empty());
}
