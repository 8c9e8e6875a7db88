//! End-to-end marketplace fetch pipeline against a mock HTTP server.

use std::sync::Arc;

use skillscout_core::auth::NoSessionProvider;
use skillscout_core::config::MarketplaceConfig;
use skillscout_core::marketplace::model::GroupItem;
use skillscout_core::marketplace::{FetchOptions, GroupKey, MarketplaceClient};
use skillscout_core::storage::MemoryCacheStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(urls: Vec<String>) -> MarketplaceClient {
    let config = MarketplaceConfig {
        marketplaces: urls,
        request_timeout_secs: 5,
        ..MarketplaceConfig::default()
    };
    MarketplaceClient::new(&config, Arc::new(NoSessionProvider), Some(Arc::new(MemoryCacheStore::new())))
        .expect("client")
}

async fn mount_manifest(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/market/.claude-plugin/marketplace.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolves_through_derived_candidates_and_normalizes() {
    let server = MockServer::start().await;
    mount_manifest(
        &server,
        serde_json::json!({
            "plugins": [
                {"id": "beta", "name": "Beta"},
                {"id": "alpha", "name": "Alpha", "version": "1.2.0",
                 "skills": ["https://example.com/skills/writer.md"]},
                {"description": "entry without identity"},
            ]
        }),
    )
    .await;

    let client = client_for(vec![format!("{}/market", server.uri())]);
    let fetch = client
        .fetch_all_marketplaces(FetchOptions::default())
        .await;

    assert!(fetch.errors.is_empty(), "errors: {:?}", fetch.errors);
    // one warning for the skipped entry, one per candidate probed before
    // the manifest convention answered
    assert!(fetch.warnings.iter().any(|w| w.contains("id, slug, or name")));
    assert!(fetch.warnings.iter().any(|w| w.contains("/market")));

    let names: Vec<&str> = fetch.plugins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    let alpha = &fetch.plugins[0];
    assert_eq!(alpha.version, "1.2.0");
    assert_eq!(alpha.groups.len(), 1);
    assert_eq!(alpha.groups[0].key, GroupKey::Skills);
    assert!(!fetch.from_cache);
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/market/.claude-plugin/marketplace.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            serde_json::json!({"plugins": [{"id": "a"}]}).to_string(),
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(vec![format!("{}/market", server.uri())]);
    let first = client.fetch_all_marketplaces(FetchOptions::default()).await;
    assert!(!first.from_cache);

    let second = client.fetch_all_marketplaces(FetchOptions::default()).await;
    assert!(second.from_cache);
    assert!(!second.refreshing);
    assert_eq!(second.plugins.len(), 1);
}

#[tokio::test]
async fn clearing_the_cache_forces_a_refetch() {
    let server = MockServer::start().await;
    mount_manifest(&server, serde_json::json!({"plugins": [{"id": "a"}]})).await;

    let client = client_for(vec![format!("{}/market", server.uri())]);
    client.fetch_all_marketplaces(FetchOptions::default()).await;
    client.clear_all_cache();
    let fetch = client.fetch_all_marketplaces(FetchOptions::default()).await;
    assert!(!fetch.from_cache);
}

#[tokio::test]
async fn unreachable_marketplace_does_not_fail_the_others() {
    let server = MockServer::start().await;
    mount_manifest(&server, serde_json::json!({"plugins": [{"id": "good"}]})).await;

    let client = client_for(vec![
        format!("{}/market", server.uri()),
        format!("{}/missing", server.uri()),
    ]);
    let fetch = client.fetch_all_marketplaces(FetchOptions::default()).await;

    assert_eq!(fetch.plugins.len(), 1);
    assert_eq!(fetch.plugins[0].id, "good");
    assert_eq!(fetch.errors.len(), 1);
    assert!(fetch.errors[0].contains("/missing"));
}

#[tokio::test]
async fn invalid_json_document_is_a_marketplace_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/market/.claude-plugin/marketplace.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let client = client_for(vec![format!("{}/market", server.uri())]);
    let fetch = client.fetch_all_marketplaces(FetchOptions::default()).await;
    assert!(fetch.plugins.is_empty());
    assert_eq!(fetch.errors.len(), 1);
    assert!(fetch.errors[0].contains("invalid JSON"));
}

#[tokio::test]
async fn item_content_falls_back_through_candidate_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/skills/writer/SKILL.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/skills/writer/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "---\ndescription: Writes prose\n---\n\n# Writer\n",
            "text/markdown",
        ))
        .mount(&server)
        .await;

    let client = client_for(Vec::new());
    let item = GroupItem {
        name: "writer".to_string(),
        metadata_url: Some(format!("{}/skills/writer/SKILL.md", server.uri())),
        metadata_fallback_urls: vec![format!("{}/skills/writer/README.md", server.uri())],
        ..GroupItem::default()
    };

    let content = client.fetch_group_item_content(&item).await.expect("content");
    assert!(content.url.ends_with("README.md"));
    assert!(content.content.contains("Writes prose"));

    let description = client.fetch_group_item_description(&item).await;
    assert_eq!(description.as_deref(), Some("Writes prose"));
}

#[tokio::test]
async fn inline_description_short_circuits_the_fetch() {
    let client = client_for(Vec::new());
    let item = GroupItem {
        name: "writer".to_string(),
        description: Some("Already known".to_string()),
        metadata_url: Some("http://127.0.0.1:1/unreachable".to_string()),
        ..GroupItem::default()
    };
    let description = client.fetch_group_item_description(&item).await;
    assert_eq!(description.as_deref(), Some("Already known"));
}
