//! Content-walker and hydration behavior against a mock contents API.

use std::sync::Arc;
use std::time::Duration;

use skillscout_core::auth::NoSessionProvider;
use skillscout_core::http::AuthenticatedClient;
use skillscout_core::marketplace::model::{GroupKey, MarketplacePlugin};
use skillscout_core::marketplace::walker::{ContentWalker, hydrate_plugins};
use skillscout_core::repo::RepoContext;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo_for(server: &MockServer) -> RepoContext {
    RepoContext {
        owner: "acme".to_string(),
        repo: "toolkit".to_string(),
        branch: "main".to_string(),
        raw_base_url: format!("{}/raw", server.uri()),
        blob_base_url: format!("{}/blob", server.uri()),
        api_base_url: format!("{}/api", server.uri()),
    }
}

fn http_client() -> AuthenticatedClient {
    AuthenticatedClient::new(Arc::new(NoSessionProvider), Duration::from_secs(5)).expect("client")
}

fn bare_plugin(raw: serde_json::Value) -> MarketplacePlugin {
    MarketplacePlugin {
        id: "toolkit".to_string(),
        name: "Toolkit".to_string(),
        description: None,
        version: "unknown".to_string(),
        download_url: None,
        groups: Vec::new(),
        source_url: "https://example.com/acme/toolkit".to_string(),
        marketplace_document_url: "https://example.com/doc.json".to_string(),
        raw,
    }
}

async fn mount_listing(server: &MockServer, dir: &str, entries: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/{dir}")))
        .and(query_param("ref", "main"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(entries.to_string(), "application/json"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn directory_entries_become_one_item_each() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "skills",
        serde_json::json!([
            {"type": "dir", "name": "writer", "path": "skills/writer"},
            {"type": "dir", "name": "editor", "path": "skills/editor"},
            {"type": "file", "name": "README.md", "path": "skills/README.md"},
        ]),
    )
    .await;

    let http = http_client();
    let repo = repo_for(&server);
    let walker = ContentWalker::new(&http, &repo);
    let items = walker
        .expand_group_dir("skills", GroupKey::Skills)
        .await
        .expect("items");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "writer");
    assert_eq!(
        items[0].metadata_url.as_deref(),
        Some(format!("{}/raw/skills/writer/SKILL.md", server.uri()).as_str())
    );
    assert_eq!(
        items[0].metadata_fallback_urls,
        vec![format!("{}/raw/skills/writer/README.md", server.uri())]
    );
    assert_eq!(
        items[0].doc_url.as_deref(),
        Some(format!("{}/blob/skills/writer", server.uri()).as_str())
    );
}

#[tokio::test]
async fn flat_markdown_directory_expands_to_files() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "commands",
        serde_json::json!([
            {"type": "file", "name": "deploy.md", "path": "commands/deploy.md"},
            {"type": "file", "name": "helper.sh", "path": "commands/helper.sh"},
            {"type": "file", "name": "release.md", "path": "commands/release.md"},
        ]),
    )
    .await;

    let http = http_client();
    let repo = repo_for(&server);
    let walker = ContentWalker::new(&http, &repo);
    let items = walker
        .expand_group_dir("commands", GroupKey::Commands)
        .await
        .expect("items");

    let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["deploy.md", "release.md"]);
    assert_eq!(
        items[0].metadata_url.as_deref(),
        Some(format!("{}/raw/commands/deploy.md", server.uri()).as_str())
    );
    assert!(items[0].metadata_fallback_urls.is_empty());
}

#[tokio::test]
async fn expansion_is_idempotent_for_an_unchanged_directory() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "skills",
        serde_json::json!([
            {"type": "dir", "name": "writer", "path": "skills/writer"},
            {"type": "dir", "name": "editor", "path": "skills/editor"},
        ]),
    )
    .await;

    let http = http_client();
    let repo = repo_for(&server);
    let walker = ContentWalker::new(&http, &repo);
    let first = walker.expand_group_dir("skills", GroupKey::Skills).await;
    let second = walker.expand_group_dir("skills", GroupKey::Skills).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn unavailable_or_unusable_listings_are_none() {
    let server = MockServer::start().await;
    mount_listing(&server, "tools", serde_json::json!([
        {"type": "file", "name": "notes.txt", "path": "tools/notes.txt"},
    ]))
    .await;
    // "prompts" is not mounted at all and answers 404.

    let http = http_client();
    let repo = repo_for(&server);
    let walker = ContentWalker::new(&http, &repo);

    assert!(walker.expand_group_dir("tools", GroupKey::Tools).await.is_none());
    assert!(walker.expand_group_dir("prompts", GroupKey::Prompts).await.is_none());
}

#[tokio::test]
async fn hydration_discovers_conventional_directories() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "skills",
        serde_json::json!([
            {"type": "dir", "name": "writer", "path": "skills/writer"},
            {"type": "dir", "name": "editor", "path": "skills/editor"},
        ]),
    )
    .await;

    let http = http_client();
    let repo = repo_for(&server);
    let mut plugins = vec![bare_plugin(serde_json::json!({"id": "toolkit"}))];
    let mut warnings = Vec::new();
    hydrate_plugins(&http, Some(&repo), &mut plugins, &mut warnings).await;

    assert_eq!(plugins[0].groups.len(), 1);
    let group = &plugins[0].groups[0];
    assert_eq!(group.key, GroupKey::Skills);
    let names: Vec<&str> = group.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["writer", "editor"]);
}

#[tokio::test]
async fn hydration_prefers_the_plugin_sub_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw/.claude-plugin/plugin.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            serde_json::json!({"skills": ["writer"]}).to_string(),
            "application/json",
        ))
        .mount(&server)
        .await;
    // The auto-discovery probes for the other categories all answer 404.

    let http = http_client();
    let repo = repo_for(&server);
    let mut plugins = vec![bare_plugin(serde_json::json!({"id": "toolkit"}))];
    let mut warnings = Vec::new();
    hydrate_plugins(&http, Some(&repo), &mut plugins, &mut warnings).await;

    assert_eq!(plugins[0].groups.len(), 1);
    let group = &plugins[0].groups[0];
    assert_eq!(group.key, GroupKey::Skills);
    assert_eq!(group.items.len(), 1);
    assert_eq!(group.items[0].name, "writer");
}

#[tokio::test]
async fn hydration_skips_plugins_that_already_have_groups_and_non_repo_sources() {
    let server = MockServer::start().await;
    let http = http_client();

    // Without a repository context nothing is probed or changed.
    let mut plugins = vec![bare_plugin(serde_json::json!({"id": "toolkit"}))];
    let mut warnings = Vec::new();
    hydrate_plugins(&http, None, &mut plugins, &mut warnings).await;
    assert!(plugins[0].groups.is_empty());
    assert!(warnings.is_empty());
    drop(server);
}

#[tokio::test]
async fn hydration_scopes_probes_to_the_declared_source_directory() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "plugins/toolkit/agents",
        serde_json::json!([
            {"type": "dir", "name": "reviewer", "path": "plugins/toolkit/agents/reviewer"},
        ]),
    )
    .await;

    let http = http_client();
    let repo = repo_for(&server);
    let mut plugins = vec![bare_plugin(
        serde_json::json!({"id": "toolkit", "source": "./plugins/toolkit"}),
    )];
    let mut warnings = Vec::new();
    hydrate_plugins(&http, Some(&repo), &mut plugins, &mut warnings).await;

    assert_eq!(plugins[0].groups.len(), 1);
    assert_eq!(plugins[0].groups[0].key, GroupKey::Agents);
    assert_eq!(plugins[0].groups[0].items[0].name, "reviewer");
}
