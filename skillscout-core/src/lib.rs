//! Core library for skillscout, a client for plugin marketplaces hosted in
//! source-control repositories.
//!
//! The pipeline: input URLs pass through the candidate resolver
//! ([`marketplace::resolver`]) and the authenticated fetch wrapper
//! ([`http`]), raw JSON is shaped by the normalizer
//! ([`marketplace::normalize`]) with hydration from the repository content
//! walker ([`marketplace::walker`]), results are cached with
//! stale-while-revalidate semantics ([`cache`]), aggregated across sources
//! ([`marketplace::aggregate`]), and selected items are materialized to
//! disk ([`install`]).

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod install;
pub mod marketplace;
pub mod repo;
pub mod storage;

pub use auth::{EnvSessionProvider, NoSessionProvider, Session, SessionProvider};
pub use cache::{CacheEntry, CachedValue, FetchedValue, RefreshedValue, TtlCache};
pub use config::MarketplaceConfig;
pub use error::{MarketplaceError, MarketplaceResult};
pub use http::AuthenticatedClient;
pub use install::{InstallReport, Installer};
pub use marketplace::{
    FetchOptions, GroupItem, GroupKey, MarketplaceClient, MarketplaceFetch, MarketplacePlugin,
};
pub use repo::{RepoContext, RepoUrlKind};
pub use storage::{CacheStore, FileCacheStore, MemoryCacheStore};
