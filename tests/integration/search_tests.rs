//! Web-search fallback against a mock search endpoint

use sitescout::config::SearchConfig;
use sitescout::search::{SearchClient, SearchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig {
        api_key: Some("test-key".to_string()),
        engine_id: Some("test-cx".to_string()),
        endpoint: format!("{}/customsearch/v1", server.uri()),
        max_results: 10,
    }
}

#[tokio::test]
async fn test_search_returns_crawlable_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "test-cx"))
        .and(query_param("q", "acme robotics"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"title": "Acme Robotics", "link": "https://acme-robotics.test/", "snippet": "Warehouse robots"},
                {"title": "Acme on a list", "link": "https://directory.test/acme"},
                {"title": "Duplicate", "link": "https://acme-robotics.test/"},
                {"title": "Not a site", "link": "ftp://files.test/acme"}
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = SearchClient::from_config(&search_config(&server)).unwrap();

    let hits = client.search("acme robotics").await.unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].title, "Acme Robotics");
    assert_eq!(hits[0].snippet, "Warehouse robots");
    assert!(hits[1].snippet.is_empty());

    let targets = client.search_targets("acme robotics").await.unwrap();
    assert_eq!(
        targets,
        vec!["https://acme-robotics.test/", "https://directory.test/acme"]
    );
}

#[tokio::test]
async fn test_search_without_items_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"kind": "customsearch#search"})),
        )
        .mount(&server)
        .await;

    let client = SearchClient::from_config(&search_config(&server)).unwrap();
    assert!(client.search_targets("nothing here").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_http_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = SearchClient::from_config(&search_config(&server)).unwrap();
    let err = client.search("acme").await.unwrap_err();
    assert!(matches!(err, SearchError::Status(403)));
}
