//! Marketplace discovery, normalization, caching, and preview.
//!
//! The entry point is [`MarketplaceClient`], which wires the resolver,
//! authenticated HTTP wrapper, content walker, normalizer, and cache
//! together behind the interface the presentation layer consumes. All
//! collaborators are constructor-injected; there is no process-wide state.

pub mod aggregate;
pub mod describe;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod walker;

pub use model::{
    FetchOptions, GroupItem, GroupKey, ItemContent, MarketplaceFetch, MarketplacePlugin,
    MarketplaceSnapshot, NormalizedManifest, PluginGroup,
};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::trace;

use crate::auth::SessionProvider;
use crate::cache::TtlCache;
use crate::config::MarketplaceConfig;
use crate::http::AuthenticatedClient;
use crate::storage::CacheStore;

/// Storage key under which the marketplace cache snapshot persists.
pub const CACHE_STORE_KEY: &str = "marketplace-cache-v1";

pub struct MarketplaceClient {
    http: Arc<AuthenticatedClient>,
    cache: Arc<TtlCache<MarketplaceSnapshot>>,
    urls: Vec<String>,
}

impl MarketplaceClient {
    pub fn new(
        config: &MarketplaceConfig,
        sessions: Arc<dyn SessionProvider>,
        store: Option<Arc<dyn CacheStore>>,
    ) -> Result<Self> {
        let http = Arc::new(AuthenticatedClient::new(
            sessions,
            Duration::from_secs(config.request_timeout_secs),
        )?);
        let fresh_ttl = Duration::from_secs(config.fresh_ttl_secs);
        let stale_ttl = Duration::from_secs(config.stale_ttl_secs);
        let cache = Arc::new(match store {
            Some(store) => TtlCache::with_store(fresh_ttl, stale_ttl, store, CACHE_STORE_KEY),
            None => TtlCache::new(fresh_ttl, stale_ttl),
        });
        Ok(Self {
            http,
            cache,
            urls: config.marketplaces.clone(),
        })
    }

    /// Reload the persisted cache snapshot. Entries already past the stale
    /// threshold are dropped at load time.
    pub async fn load_cache(&self) {
        self.cache.load_persisted().await;
    }

    /// Resolve, fetch, normalize, and hydrate every configured marketplace,
    /// serving cached data per the stale-while-revalidate policy.
    pub async fn fetch_all_marketplaces(&self, options: FetchOptions) -> MarketplaceFetch {
        aggregate::fetch_all(&self.http, &self.cache, &self.urls, options).await
    }

    /// Lazy single-item summary: the inline description when present, else
    /// a descriptor fetch with frontmatter extraction.
    pub async fn fetch_group_item_description(&self, item: &GroupItem) -> Option<String> {
        if let Some(description) = &item.description {
            return Some(description.clone());
        }
        let content = self.fetch_group_item_content(item).await?;
        describe::extract_summary(&content.content)
    }

    /// Raw descriptor text for full preview: primary URL first, then each
    /// fallback in order.
    pub async fn fetch_group_item_content(&self, item: &GroupItem) -> Option<ItemContent> {
        let urls = item
            .metadata_url
            .iter()
            .chain(item.metadata_fallback_urls.iter());
        for url in urls {
            match self.http.get_text(url).await {
                Ok(fetched) => {
                    return Some(ItemContent {
                        content: fetched.body,
                        url: url.clone(),
                    });
                }
                Err(err) => trace!(%url, %err, "descriptor fetch failed; trying fallback"),
            }
        }
        None
    }

    pub fn clear_all_cache(&self) {
        self.cache.clear();
    }

    pub fn http(&self) -> &Arc<AuthenticatedClient> {
        &self.http
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}
