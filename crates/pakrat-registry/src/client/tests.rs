//! Unit tests for registry client

use super::*;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn record(name: &str, version: &str, depends: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "Name": name,
        "PackageBase": name,
        "Version": version,
        "Depends": depends,
        "NumVotes": 1,
        "Popularity": 0.5,
        "LastModified": 1700000000,
        "OutOfDate": null,
        "URLPath": format!("/cgit/aur.git/snapshot/{}.tar.gz", name)
    })
}

fn multiinfo(results: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "version": 5,
        "type": "multiinfo",
        "resultcount": results.len(),
        "results": results
    })
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn test_client(server: &MockServer) -> RegistryClient {
    let config = ClientConfig {
        retry: RetryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            ..RetryConfig::default()
        },
        ..ClientConfig::default()
    }
    .with_base_url(server.uri());
    RegistryClient::with_config(config).unwrap()
}

/// Answer with one record per `arg[]` parameter, except the excluded names
fn echo_records(exclude: &'static [&'static str]) -> impl Fn(&Request) -> ResponseTemplate {
    move |request: &Request| {
        let results = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "arg[]")
            .filter(|(_, value)| !exclude.contains(&&**value))
            .map(|(_, value)| record(&value, "1.0-1", &[]))
            .collect();
        ResponseTemplate::new(200).set_body_json(multiinfo(results))
    }
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.base_url(), DEFAULT_REGISTRY_URL);
    assert_eq!(client.retry_config.max_retries, 3);
    assert_eq!(client.max_names_per_request, DEFAULT_MAX_NAMES_PER_REQUEST);
}

#[tokio::test]
async fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert_eq!(config.multiplier, 2.0);
}

#[tokio::test]
async fn test_info_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .and(query_param("v", "5"))
        .and(query_param("type", "info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(multiinfo(vec![
            record("yay", "12.3.5-1", &["pacman>6.1", "git"]),
        ])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.info(&names(&["yay"])).await.unwrap();

    assert!(result.missing.is_empty());
    assert_eq!(result.packages.len(), 1);
    assert_eq!(result.packages[0].name, "yay");
    assert_eq!(result.packages[0].depends, vec!["pacman>6.1", "git"]);
    assert!(result.packages[0].origin.is_registry());
}

#[tokio::test]
async fn test_info_partial_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(echo_records(&["ghost"]))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client
        .info(&names(&["foo", "ghost", "bar", "foo"]))
        .await
        .unwrap();

    let found: Vec<_> = result.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(found, vec!["foo", "bar"]);
    assert_eq!(result.missing, vec!["ghost"]);
}

#[tokio::test]
async fn test_info_chunks_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(echo_records(&[]))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ClientConfig {
        max_names_per_request: 2,
        ..ClientConfig::default()
    }
    .with_base_url(mock_server.uri());
    let client = RegistryClient::with_config(config).unwrap();

    let requested = names(&["a", "b", "c", "d", "e"]);
    let result = client.info(&requested).await.unwrap();

    let found: Vec<_> = result.packages.iter().map(|p| p.name.clone()).collect();
    assert_eq!(found, requested);
    assert!(result.missing.is_empty());
}

#[tokio::test]
async fn test_info_uses_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(echo_records(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.info(&names(&["yay"])).await.unwrap();
    let again = client.info(&names(&["yay"])).await.unwrap();

    assert_eq!(again.packages.len(), 1);
    assert!(client.cache().get("yay").is_some());
}

#[tokio::test]
async fn test_info_registry_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": 5,
            "type": "error",
            "resultcount": 0,
            "results": [],
            "error": "Incorrect request type specified."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.info(&names(&["yay"])).await;

    match result.unwrap_err() {
        PakratError::Registry { message } => {
            assert_eq!(message, "Incorrect request type specified.");
        },
        other => panic!("Expected Registry error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_info_server_error_is_retried_then_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.info(&names(&["yay"])).await;

    assert!(matches!(result, Err(PakratError::Network { .. })));
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    async fn lookup<R: RegistryQuery>(registry: &R) -> InfoResult {
        registry.info(&names(&["yay"])).await.unwrap()
    }

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .respond_with(echo_records(&[]))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert_eq!(lookup(&client).await.packages.len(), 1);
}
