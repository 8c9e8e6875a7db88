//! Manifest normalization.
//!
//! Converts an arbitrary decoded JSON document into typed plugins. Never
//! fails on malformed input: every problem becomes a warning attached to
//! the offending entry, and sibling entries keep processing.

use serde_json::Value;

use super::model::{GroupItem, GroupKey, MarketplacePlugin, NormalizedManifest, PluginGroup};
use crate::repo::{RepoContext, join_rel};

/// Top-level fields searched, in order, for the plugin list when the
/// document itself is not a list.
const PLUGIN_LIST_KEYS: &[&str] = &["plugins", "items", "extensions"];

/// Identity fields, in priority order.
const IDENTITY_KEYS: &[&str] = &["id", "slug", "name"];

/// Fields naming an item's fetchable location.
const ITEM_PATH_KEYS: &[&str] = &["path", "source", "url"];

/// Fields naming an item when no location is present.
const ITEM_LABEL_KEYS: &[&str] = &["name", "id", "slug", "title"];

/// Increasingly nested locations a plugin version may live at.
const VERSION_PATHS: &[&[&str]] = &[
    &["version"],
    &["manifest", "version"],
    &["metadata", "version"],
    &["manifest", "metadata", "version"],
];

/// Normalize one marketplace document.
pub fn normalize_manifest(
    document: &Value,
    source_url: &str,
    document_url: &str,
) -> NormalizedManifest {
    let repo = RepoContext::from_document_url(document_url);
    let mut result = NormalizedManifest::default();
    let Some(entries) = plugin_entries(document) else {
        result
            .warnings
            .push(format!("no plugin entries found in {source_url}"));
        return result;
    };
    for entry in entries {
        if !entry.is_object() {
            result
                .warnings
                .push(format!("skipping non-object plugin entry in {source_url}"));
            continue;
        }
        let Some(id) = string_field(entry, IDENTITY_KEYS) else {
            result.warnings.push(format!(
                "skipping plugin entry without id, slug, or name in {source_url}"
            ));
            continue;
        };
        let base = string_field(entry, &["source"]).unwrap_or("./");
        let groups = extract_groups(entry, base, repo.as_ref(), &mut result.warnings);
        result.plugins.push(MarketplacePlugin {
            id: id.to_string(),
            name: string_field(entry, &["name"]).unwrap_or(id).to_string(),
            description: string_field(entry, &["description"]).map(str::to_string),
            version: resolve_version(entry),
            download_url: string_field(entry, &["downloadUrl", "download_url"])
                .map(str::to_string),
            groups,
            source_url: source_url.to_string(),
            marketplace_document_url: document_url.to_string(),
            raw: entry.clone(),
        });
    }
    result
}

/// Locate the plugin list: the document itself if it is a list, else the
/// first present array-valued field among the recognized keys.
fn plugin_entries(document: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(entries) = document {
        return Some(entries);
    }
    let object = document.as_object()?;
    PLUGIN_LIST_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
}

/// First string value among an ordered list of accessor attempts.
fn string_field<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| entry.get(key).and_then(Value::as_str))
}

fn lookup_path<'a>(entry: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(entry, |value, key| value.get(key))
}

fn resolve_version(entry: &Value) -> String {
    for path in VERSION_PATHS {
        if let Some(version) = lookup_path(entry, path).and_then(Value::as_str) {
            return version.to_string();
        }
    }
    "unknown".to_string()
}

/// Extract one group per recognized category, reading both the top-level
/// key and the same key under a nested `manifest` object, merged with the
/// top level winning on case-insensitive name conflicts.
pub(crate) fn extract_groups(
    entry: &Value,
    base: &str,
    repo: Option<&RepoContext>,
    warnings: &mut Vec<String>,
) -> Vec<PluginGroup> {
    let mut groups = Vec::new();
    for key in GroupKey::ALL {
        let mut items = entry
            .get(key.as_str())
            .map(|value| group_value_items(value, key, base, repo, warnings))
            .unwrap_or_default();
        if let Some(nested) = entry.get("manifest").and_then(|m| m.get(key.as_str())) {
            merge_items(&mut items, group_value_items(nested, key, base, repo, warnings));
        }
        if !items.is_empty() {
            groups.push(PluginGroup::new(key, items));
        }
    }
    groups
}

/// Append secondary items whose names are not already present,
/// case-insensitively, preserving first-seen order.
fn merge_items(primary: &mut Vec<GroupItem>, secondary: Vec<GroupItem>) {
    for item in secondary {
        let name = item.name.to_lowercase();
        if !primary
            .iter()
            .any(|existing| existing.name.to_lowercase() == name)
        {
            primary.push(item);
        }
    }
}

/// Convert one category's raw value into items. The value may be a single
/// string, an array of strings and/or objects, or an object map whose keys
/// serve as fallback names.
pub(crate) fn group_value_items(
    value: &Value,
    key: GroupKey,
    base: &str,
    repo: Option<&RepoContext>,
    warnings: &mut Vec<String>,
) -> Vec<GroupItem> {
    match value {
        Value::String(path) => vec![item_from_path(path, key, base, repo)],
        Value::Array(elements) => elements
            .iter()
            .filter_map(|element| {
                let item = item_from_entry(element, key, base, repo);
                if item.is_none() {
                    warnings.push(format!("unrecognized {key} entry: {element}"));
                }
                item
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(name, element)| {
                item_from_entry(element, key, base, repo).unwrap_or_else(|| GroupItem {
                    name: name.clone(),
                    ..GroupItem::default()
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// One array element or map value. `None` means the element carries neither
/// a location nor a label.
fn item_from_entry(
    element: &Value,
    key: GroupKey,
    base: &str,
    repo: Option<&RepoContext>,
) -> Option<GroupItem> {
    match element {
        Value::String(path) => Some(item_from_path(path, key, base, repo)),
        Value::Object(_) => {
            let description = string_field(element, &["description"]).map(str::to_string);
            if let Some(path) = string_field(element, ITEM_PATH_KEYS) {
                let mut item = item_from_path(path, key, base, repo);
                if let Some(label) = string_field(element, ITEM_LABEL_KEYS) {
                    item.name = label.to_string();
                }
                item.description = description;
                Some(item)
            } else {
                string_field(element, ITEM_LABEL_KEYS).map(|label| GroupItem {
                    name: label.to_string(),
                    description,
                    ..GroupItem::default()
                })
            }
        }
        _ => None,
    }
}

/// Derive an item from a path string.
///
/// - absolute http(s) URLs stay opaque;
/// - paths ending in `.md` are direct file references;
/// - any other path is a directory expanded via the category's descriptor
///   convention.
fn item_from_path(
    path: &str,
    key: GroupKey,
    base: &str,
    repo: Option<&RepoContext>,
) -> GroupItem {
    let mut item = GroupItem {
        name: path.to_string(),
        ..GroupItem::default()
    };
    if path.starts_with("http://") || path.starts_with("https://") {
        item.metadata_url = Some(path.to_string());
        item.doc_url = Some(path.to_string());
        return item;
    }
    let rel = join_rel(base, path);
    item.path = Some(rel.clone());
    let Some(repo) = repo else {
        return item;
    };
    if rel.ends_with(".md") {
        item.metadata_url = Some(repo.raw_url(&rel));
    } else {
        let mut descriptors = key
            .descriptor_candidates()
            .iter()
            .map(|file| repo.raw_url(&join_rel(&rel, file)));
        item.metadata_url = descriptors.next();
        item.metadata_fallback_urls = descriptors.collect();
    }
    item.doc_url = Some(repo.blob_url(&rel));
    item
}
