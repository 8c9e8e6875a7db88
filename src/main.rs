//! skillscout - marketplace discovery and install CLI.
//!
//! Thin binary entry point that delegates to the handlers in `cli`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skillscout_core::auth::EnvSessionProvider;
use skillscout_core::config::MarketplaceConfig;
use skillscout_core::marketplace::MarketplaceClient;
use skillscout_core::storage::{CacheStore, FileCacheStore};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let mut config = MarketplaceConfig::load_or_default(args.config.as_deref())
        .context("failed to load configuration")?;
    config.marketplaces.extend(args.marketplaces);

    let store: Option<Arc<dyn CacheStore>> = config
        .resolved_cache_dir()
        .map(|dir| Arc::new(FileCacheStore::new(dir)) as Arc<dyn CacheStore>);
    let client = MarketplaceClient::new(&config, Arc::new(EnvSessionProvider), store)
        .context("failed to build marketplace client")?;
    client.load_cache().await;

    match args.command {
        Commands::List => cli::handle_list(&client, args.force_refresh).await,
        Commands::Show { plugin_id } => {
            cli::handle_show(&client, args.force_refresh, &plugin_id).await
        }
        Commands::Describe { plugin_id, item } => {
            cli::handle_describe(&client, args.force_refresh, &plugin_id, &item).await
        }
        Commands::Install {
            plugin_id,
            dest,
            group,
        } => {
            let dest = dest.unwrap_or_else(|| config.resolved_install_dir());
            cli::handle_install(&client, args.force_refresh, &plugin_id, dest, group).await
        }
        Commands::ClearCache => {
            cli::handle_clear_cache(&client);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
