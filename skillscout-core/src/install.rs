//! Materializes selected marketplace items into a local directory layout.
//!
//! Install is an idempotent overwrite of a fixed destination path. The copy
//! is best-effort: individual item failures are logged and skipped, only
//! structural failures (destination not writable) fail the operation.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::http::AuthenticatedClient;
use crate::marketplace::model::{GroupItem, GroupKey, MarketplacePlugin};

/// Result of one install operation.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub success: bool,
    pub error: Option<String>,
    /// Items whose descriptor content was written.
    pub installed: usize,
    /// Items skipped because no descriptor could be fetched.
    pub skipped: usize,
}

impl InstallReport {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            installed: 0,
            skipped: 0,
        }
    }
}

pub struct Installer<'a> {
    http: &'a AuthenticatedClient,
    dest: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(http: &'a AuthenticatedClient, dest: impl Into<PathBuf>) -> Self {
        Self {
            http,
            dest: dest.into(),
        }
    }

    /// Copy descriptor content for every item of the plugin (optionally one
    /// group) into `<dest>/<plugin-id>/<category>/<item>/<file>`.
    pub async fn install_plugin(
        &self,
        plugin: &MarketplacePlugin,
        only_group: Option<GroupKey>,
    ) -> InstallReport {
        let plugin_dir = self.dest.join(sanitize_component(&plugin.id));
        if let Err(err) = fs::create_dir_all(&plugin_dir).await {
            return InstallReport::failure(format!(
                "failed to create {}: {err}",
                plugin_dir.display()
            ));
        }
        let mut report = InstallReport {
            success: true,
            error: None,
            installed: 0,
            skipped: 0,
        };
        let groups = plugin
            .groups
            .iter()
            .filter(|group| only_group.is_none_or(|key| key == group.key));
        for group in groups {
            let group_dir = plugin_dir.join(group.key.as_str());
            if let Err(err) = fs::create_dir_all(&group_dir).await {
                return InstallReport::failure(format!(
                    "failed to create {}: {err}",
                    group_dir.display()
                ));
            }
            for item in &group.items {
                match self.install_item(&group_dir, item).await {
                    Ok(true) => report.installed += 1,
                    Ok(false) => {
                        debug!(item = %item.name, "no descriptor content to install");
                        report.skipped += 1;
                    }
                    Err(err) => {
                        warn!(item = %item.name, err = %format!("{err:#}"), "item install failed");
                        report.skipped += 1;
                    }
                }
            }
        }
        report
    }

    /// Fetch the item's descriptor (primary URL, then fallbacks) and write
    /// it under the group directory. Returns false when nothing was
    /// fetchable.
    async fn install_item(&self, group_dir: &Path, item: &GroupItem) -> anyhow::Result<bool> {
        let urls = item
            .metadata_url
            .iter()
            .chain(item.metadata_fallback_urls.iter());
        for url in urls {
            let Ok(fetched) = self.http.get_text(url).await else {
                continue;
            };
            let item_dir = group_dir.join(sanitize_component(&item.name));
            fs::create_dir_all(&item_dir).await?;
            let file_name = url
                .rsplit('/')
                .next()
                .filter(|name| name.ends_with(".md"))
                .unwrap_or("README.md");
            fs::write(item_dir.join(file_name), &fetched.body).await?;
            debug!(item = %item.name, %url, "installed descriptor");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Flatten an item or plugin name into a single safe path component.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['-', '.']).to_string();
    if cleaned.is_empty() {
        "item".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_separators() {
        assert_eq!(sanitize_component("foo/SKILL.md"), "foo-SKILL.md");
        assert_eq!(sanitize_component("../escape"), "escape");
        assert_eq!(sanitize_component("simple-name"), "simple-name");
        assert_eq!(sanitize_component("///"), "item");
    }
}
