//! Typed marketplace data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed set of content categories a plugin may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Skills,
    Agents,
    Commands,
    Tools,
    Prompts,
    Workflows,
}

impl GroupKey {
    pub const ALL: [GroupKey; 6] = [
        GroupKey::Skills,
        GroupKey::Agents,
        GroupKey::Commands,
        GroupKey::Tools,
        GroupKey::Prompts,
        GroupKey::Workflows,
    ];

    /// The manifest key and conventional directory name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Skills => "skills",
            GroupKey::Agents => "agents",
            GroupKey::Commands => "commands",
            GroupKey::Tools => "tools",
            GroupKey::Prompts => "prompts",
            GroupKey::Workflows => "workflows",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GroupKey::Skills => "Skills",
            GroupKey::Agents => "Agents",
            GroupKey::Commands => "Commands",
            GroupKey::Tools => "Tools",
            GroupKey::Prompts => "Prompts",
            GroupKey::Workflows => "Workflows",
        }
    }

    /// Descriptor filenames probed for an item directory, in order.
    pub fn descriptor_candidates(&self) -> &'static [&'static str] {
        match self {
            GroupKey::Skills => &["SKILL.md", "README.md"],
            GroupKey::Agents => &["AGENT.md", "AGENTS.md", "README.md"],
            _ => &["README.md"],
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown content category: {s}"))
    }
}

/// One leaf content unit inside a group (a single skill, agent, command...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    /// Display identity, also the case-insensitive dedup key when merging
    /// item lists.
    pub name: String,
    /// Repository-relative path, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Primary URL to fetch descriptor content from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    /// Secondary candidates, tried in order if the primary fails.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_fallback_urls: Vec<String>,
    /// Human-browsable URL, never used for fetching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One category of content within a plugin. Groups with zero items are
/// omitted entirely, so `items` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginGroup {
    pub key: GroupKey,
    pub name: String,
    pub items: Vec<GroupItem>,
}

impl PluginGroup {
    pub fn new(key: GroupKey, items: Vec<GroupItem>) -> Self {
        Self {
            key,
            name: key.display_name().to_string(),
            items,
        }
    }
}

/// One installable unit from a marketplace document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplacePlugin {
    /// Stable identity within a source, used for dedup and install
    /// targeting.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// One group per recognized category present, in canonical order.
    pub groups: Vec<PluginGroup>,
    /// The original input URL supplied by the user.
    pub source_url: String,
    /// The concrete resolved manifest URL.
    pub marketplace_document_url: String,
    /// Original manifest entry, retained for nested lookups.
    pub raw: Value,
}

/// Normalization output for one document. Malformed input never aborts
/// sibling entries; problems surface here as warnings.
#[derive(Debug, Clone, Default)]
pub struct NormalizedManifest {
    pub plugins: Vec<MarketplacePlugin>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Cached per-source result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSnapshot {
    pub source_url: String,
    pub document_url: String,
    pub plugins: Vec<MarketplacePlugin>,
    pub warnings: Vec<String>,
}

/// Aggregated result across all configured marketplaces.
#[derive(Debug, Clone, Default)]
pub struct MarketplaceFetch {
    pub plugins: Vec<MarketplacePlugin>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Every successful source was served from cache.
    pub from_cache: bool,
    /// At least one source has a background refresh underway.
    pub refreshing: bool,
}

/// Raw descriptor text for a single item, with the URL that produced it.
#[derive(Debug, Clone)]
pub struct ItemContent {
    pub content: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub force_refresh: bool,
}
