//! Remote repository content walking and plugin hydration.
//!
//! Lists directories through the repository contents API and expands them
//! into concrete group items. Listing failures are expected (private repos,
//! missing conventional folders) and are logged at trace level only; the
//! caller falls through to the next fallback tier.

use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::model::{GroupItem, GroupKey, MarketplacePlugin, PluginGroup};
use super::normalize::extract_groups;
use crate::http::AuthenticatedClient;
use crate::repo::{RepoContext, join_rel};

/// Per-plugin configuration locations probed relative to a plugin's source
/// directory, stopping at the first that parses as a JSON object.
pub const PLUGIN_MANIFEST_PATHS: &[&str] = &[
    ".claude-plugin/plugin.json",
    ".claude/plugin.json",
    "plugin.json",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoEntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One directory-listing entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    #[serde(rename = "type")]
    pub kind: RepoEntryKind,
    pub name: String,
    pub path: String,
}

pub struct ContentWalker<'a> {
    http: &'a AuthenticatedClient,
    repo: &'a RepoContext,
}

impl<'a> ContentWalker<'a> {
    pub fn new(http: &'a AuthenticatedClient, repo: &'a RepoContext) -> Self {
        Self { http, repo }
    }

    /// List a repository directory. `None` means unavailable.
    pub async fn list_dir(&self, rel: &str) -> Option<Vec<RepoEntry>> {
        let url = self.repo.contents_url(rel);
        let fetched = match self.http.get_text(&url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                trace!(%url, %err, "directory listing unavailable");
                return None;
            }
        };
        match serde_json::from_str(&fetched.body) {
            Ok(entries) => Some(entries),
            Err(err) => {
                trace!(%url, %err, "directory listing is not an entry list");
                None
            }
        }
    }

    /// Expand a directory into group items: sub-directories become one item
    /// each; failing that, markdown files become one item each; anything
    /// else is not expandable and the caller keeps the path opaque.
    pub async fn expand_group_dir(&self, rel: &str, key: GroupKey) -> Option<Vec<GroupItem>> {
        let entries = self.list_dir(rel).await?;
        let subdirs: Vec<&RepoEntry> = entries
            .iter()
            .filter(|entry| entry.kind == RepoEntryKind::Dir)
            .collect();
        if !subdirs.is_empty() {
            return Some(
                subdirs
                    .into_iter()
                    .map(|entry| self.item_for_dir(entry, key))
                    .collect(),
            );
        }
        let files: Vec<&RepoEntry> = entries
            .iter()
            .filter(|entry| entry.kind == RepoEntryKind::File && entry.name.ends_with(".md"))
            .collect();
        if files.is_empty() {
            return None;
        }
        Some(files.into_iter().map(|entry| self.item_for_file(entry)).collect())
    }

    /// Probe the conventional `<base>/<category>/` directory for a category
    /// the manifest omitted.
    pub async fn auto_discover(&self, base: &str, key: GroupKey) -> Option<Vec<GroupItem>> {
        self.expand_group_dir(&join_rel(base, key.as_str()), key).await
    }

    /// Fetch the per-plugin configuration file, trying each convention in
    /// order.
    pub async fn load_plugin_manifest(&self, base: &str) -> Option<Value> {
        for candidate in PLUGIN_MANIFEST_PATHS {
            let url = self.repo.raw_url(&join_rel(base, candidate));
            let Ok(fetched) = self.http.get_text(&url).await else {
                trace!(%url, "plugin manifest candidate unavailable");
                continue;
            };
            match serde_json::from_str::<Value>(&fetched.body) {
                Ok(value) if value.is_object() => return Some(value),
                _ => trace!(%url, "plugin manifest candidate is not a JSON object"),
            }
        }
        None
    }

    fn item_for_dir(&self, entry: &RepoEntry, key: GroupKey) -> GroupItem {
        let mut descriptors = key
            .descriptor_candidates()
            .iter()
            .map(|file| self.repo.raw_url(&join_rel(&entry.path, file)));
        GroupItem {
            name: entry.name.clone(),
            path: Some(entry.path.clone()),
            metadata_url: descriptors.next(),
            metadata_fallback_urls: descriptors.collect(),
            doc_url: Some(self.repo.blob_url(&entry.path)),
            description: None,
        }
    }

    fn item_for_file(&self, entry: &RepoEntry) -> GroupItem {
        GroupItem {
            name: entry.name.clone(),
            path: Some(entry.path.clone()),
            metadata_url: Some(self.repo.raw_url(&entry.path)),
            metadata_fallback_urls: Vec::new(),
            doc_url: Some(self.repo.blob_url(&entry.path)),
            description: None,
        }
    }
}

/// Fill in groups for plugins whose manifest declared no categories at all.
///
/// Two fallback tiers: the plugin sub-manifest first, then conventional
/// category directories under the plugin's declared `source` (default
/// `"./"`). Non-repository marketplaces are left untouched. Category
/// probes for one plugin run concurrently; they are independent.
pub async fn hydrate_plugins(
    http: &AuthenticatedClient,
    repo: Option<&RepoContext>,
    plugins: &mut [MarketplacePlugin],
    warnings: &mut Vec<String>,
) {
    let Some(repo) = repo else {
        return;
    };
    let walker = ContentWalker::new(http, repo);
    for plugin in plugins.iter_mut().filter(|plugin| plugin.groups.is_empty()) {
        let base = plugin
            .raw
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("./")
            .to_string();

        let mut groups = match walker.load_plugin_manifest(&base).await {
            Some(manifest) => extract_groups(&manifest, &base, Some(repo), warnings),
            None => Vec::new(),
        };

        let missing: Vec<GroupKey> = GroupKey::ALL
            .into_iter()
            .filter(|key| !groups.iter().any(|group| group.key == *key))
            .collect();
        let probes = missing.iter().map(|key| walker.auto_discover(&base, *key));
        for (key, items) in missing.iter().zip(join_all(probes).await) {
            if let Some(items) = items {
                if !items.is_empty() {
                    groups.push(PluginGroup::new(*key, items));
                }
            }
        }

        groups.sort_by_key(|group| {
            GroupKey::ALL
                .iter()
                .position(|key| *key == group.key)
                .unwrap_or(GroupKey::ALL.len())
        });
        plugin.groups = groups;
    }
}
