//! Concurrent marketplace aggregation.
//!
//! Fans the resolve + fetch + normalize + hydrate pipeline out across all
//! configured marketplace URLs. One unreachable marketplace never fails the
//! others: each result settles independently and failures become entries in
//! the aggregate `errors` list.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use super::model::{FetchOptions, MarketplaceFetch, MarketplaceSnapshot};
use super::normalize::normalize_manifest;
use super::resolver::{ResolveOutcome, resolve_marketplace_document};
use super::walker::hydrate_plugins;
use crate::cache::{FetchedValue, RefreshedValue, TtlCache};
use crate::error::MarketplaceError;
use crate::http::AuthenticatedClient;
use crate::repo::RepoContext;

/// Resolve, fetch, normalize, and hydrate one marketplace URL.
pub(crate) async fn fetch_marketplace(
    http: &AuthenticatedClient,
    source_url: &str,
) -> Result<FetchedValue<MarketplaceSnapshot>> {
    let resolved = match resolve_marketplace_document(http, source_url).await {
        ResolveOutcome::Resolved(resolved) => resolved,
        ResolveOutcome::Failed { warnings, error } => {
            for warning in &warnings {
                debug!(%source_url, %warning, "candidate probe failed");
            }
            return Err(error.into());
        }
    };
    let document: Value =
        serde_json::from_str(&resolved.body).map_err(|source| MarketplaceError::InvalidDocument {
            url: resolved.document_url.clone(),
            source,
        })?;
    let mut normalized = normalize_manifest(&document, source_url, &resolved.document_url);
    let repo = RepoContext::from_document_url(&resolved.document_url);
    hydrate_plugins(http, repo.as_ref(), &mut normalized.plugins, &mut normalized.warnings).await;

    let mut warnings = resolved.warnings;
    warnings.extend(normalized.warnings);
    Ok(FetchedValue {
        data: MarketplaceSnapshot {
            source_url: source_url.to_string(),
            document_url: resolved.document_url,
            plugins: normalized.plugins,
            warnings,
        },
        etag: resolved.etag,
    })
}

/// Fan out across every configured URL concurrently and merge the settled
/// results.
pub(crate) async fn fetch_all(
    http: &Arc<AuthenticatedClient>,
    cache: &Arc<TtlCache<MarketplaceSnapshot>>,
    urls: &[String],
    options: FetchOptions,
) -> MarketplaceFetch {
    let tasks = urls.iter().map(|url| {
        let http = Arc::clone(http);
        let cache = Arc::clone(cache);
        let url = url.clone();
        async move {
            let fetch_url = url.clone();
            let result = cache
                .get_with_refresh(&url, options.force_refresh, move || async move {
                    fetch_marketplace(&http, &fetch_url).await
                })
                .await;
            (url, result)
        }
    });
    merge_results(join_all(tasks).await)
}

/// Concatenate per-source results, deduplicate plugins by `(id, source_url)`
/// first-seen, and sort by display name.
fn merge_results(
    results: Vec<(String, Result<RefreshedValue<MarketplaceSnapshot>>)>,
) -> MarketplaceFetch {
    let mut fetch = MarketplaceFetch {
        from_cache: true,
        ..MarketplaceFetch::default()
    };
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut any_success = false;
    for (url, result) in results {
        match result {
            Ok(refreshed) => {
                any_success = true;
                if !refreshed.from_cache {
                    fetch.from_cache = false;
                }
                if refreshed.refreshing {
                    fetch.refreshing = true;
                }
                fetch.warnings.extend(refreshed.data.warnings);
                for plugin in refreshed.data.plugins {
                    let identity = (plugin.id.clone(), plugin.source_url.clone());
                    if seen.insert(identity) {
                        fetch.plugins.push(plugin);
                    }
                }
            }
            Err(err) => {
                debug!(%url, err = %format!("{err:#}"), "marketplace fetch failed");
                fetch.errors.push(format!("{err:#}"));
            }
        }
    }
    if !any_success {
        fetch.from_cache = false;
    }
    fetch
        .plugins
        .sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
    fetch
}
