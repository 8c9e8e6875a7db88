//! CLI argument definitions and command handlers.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use skillscout_core::install::Installer;
use skillscout_core::marketplace::{
    FetchOptions, GroupKey, MarketplaceClient, MarketplaceFetch, MarketplacePlugin,
};

#[derive(Debug, Parser)]
#[command(name = "skillscout", version, about = "Discover and install plugins from repository-hosted marketplaces")]
pub struct Cli {
    /// Path to a skillscout.toml config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Additional marketplace URL(s) for this run
    #[arg(long = "marketplace", value_name = "URL", global = true)]
    pub marketplaces: Vec<String>,

    /// Bypass the cache and fetch fresh data
    #[arg(long, global = true)]
    pub force_refresh: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List plugins across all configured marketplaces
    List,
    /// Show one plugin's content groups and items
    Show { plugin_id: String },
    /// Print the summary for one item of a plugin
    Describe { plugin_id: String, item: String },
    /// Install a plugin's content into a local directory
    Install {
        plugin_id: String,
        /// Destination directory (defaults to the configured install dir)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Restrict the install to one category
        #[arg(long)]
        group: Option<GroupKey>,
    },
    /// Drop all cached marketplace data
    ClearCache,
}

async fn fetch(client: &MarketplaceClient, force_refresh: bool) -> MarketplaceFetch {
    let fetch = client
        .fetch_all_marketplaces(FetchOptions { force_refresh })
        .await;
    for warning in &fetch.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &fetch.errors {
        eprintln!("error: {error}");
    }
    if fetch.refreshing {
        eprintln!("showing cached data, updating in the background...");
    }
    fetch
}

fn find_plugin<'a>(
    fetch: &'a MarketplaceFetch,
    plugin_id: &str,
) -> Result<&'a MarketplacePlugin> {
    match fetch.plugins.iter().find(|plugin| plugin.id == plugin_id) {
        Some(plugin) => Ok(plugin),
        None => bail!("plugin '{plugin_id}' not found in any configured marketplace"),
    }
}

pub async fn handle_list(client: &MarketplaceClient, force_refresh: bool) -> Result<()> {
    let fetch = fetch(client, force_refresh).await;
    if fetch.plugins.is_empty() {
        println!("no plugins found; configure marketplaces in skillscout.toml or pass --marketplace");
        return Ok(());
    }
    for plugin in &fetch.plugins {
        let groups: Vec<&str> = plugin
            .groups
            .iter()
            .map(|group| group.name.as_str())
            .collect();
        println!(
            "{:<24} {:<10} {:<28} {}",
            plugin.name,
            plugin.version,
            groups.join(", "),
            plugin.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn handle_show(
    client: &MarketplaceClient,
    force_refresh: bool,
    plugin_id: &str,
) -> Result<()> {
    let fetch = fetch(client, force_refresh).await;
    let plugin = find_plugin(&fetch, plugin_id)?;
    println!("{} ({})", plugin.name, plugin.version);
    if let Some(description) = &plugin.description {
        println!("{description}");
    }
    println!("source: {}", plugin.source_url);
    for group in &plugin.groups {
        println!("\n{}:", group.name);
        for item in &group.items {
            match &item.doc_url {
                Some(doc_url) => println!("  {:<32} {doc_url}", item.name),
                None => println!("  {}", item.name),
            }
        }
    }
    Ok(())
}

pub async fn handle_describe(
    client: &MarketplaceClient,
    force_refresh: bool,
    plugin_id: &str,
    item_name: &str,
) -> Result<()> {
    let fetch = fetch(client, force_refresh).await;
    let plugin = find_plugin(&fetch, plugin_id)?;
    let item = plugin
        .groups
        .iter()
        .flat_map(|group| group.items.iter())
        .find(|item| item.name.eq_ignore_ascii_case(item_name));
    let Some(item) = item else {
        bail!("item '{item_name}' not found in plugin '{plugin_id}'");
    };
    match client.fetch_group_item_description(item).await {
        Some(description) => println!("{description}"),
        None => println!("no description available for '{item_name}'"),
    }
    Ok(())
}

pub async fn handle_install(
    client: &MarketplaceClient,
    force_refresh: bool,
    plugin_id: &str,
    dest: PathBuf,
    group: Option<GroupKey>,
) -> Result<()> {
    let fetch = fetch(client, force_refresh).await;
    let plugin = find_plugin(&fetch, plugin_id)?;
    let installer = Installer::new(client.http(), &dest);
    let report = installer.install_plugin(plugin, group).await;
    if !report.success {
        bail!(
            "install failed: {}",
            report.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    println!(
        "installed {} item(s) to {} ({} skipped)",
        report.installed,
        dest.display(),
        report.skipped
    );
    Ok(())
}

pub fn handle_clear_cache(client: &MarketplaceClient) {
    client.clear_all_cache();
    println!("marketplace cache cleared");
}
