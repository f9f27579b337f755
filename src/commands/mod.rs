//! CLI command definitions and dispatch.

pub mod migrate;
pub mod resource;
pub mod storage;

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use sono_core::config::AppConfig;
use sono_core::types::ListRequest;
use sono_database::DatabasePool;
use sono_service::{ResourceService, StorageLocks, StorageService};

use crate::output::{self, OutputFormat};

/// Sono: per-user storage and resource tree administration
#[derive(Debug, Parser)]
#[command(name = "sono", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay, loaded from config/<ENV>.toml
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Storage management
    Storage(storage::StorageArgs),
    /// Resource tree operations
    Resource(resource::ResourceArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> anyhow::Result<()> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Storage(args) => storage::execute(args, &config, self.format).await,
            Commands::Resource(args) => resource::execute(args, &config, self.format).await,
        }
    }
}

/// Paging, sorting and filtering flags shared by list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<i64>,
    /// Items per page
    #[arg(long)]
    pub page_size: Option<i64>,
    /// Property to sort by
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort order: asc or desc
    #[arg(long)]
    pub order: Option<String>,
    /// Equality filter as property=value, repeatable
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

impl ListArgs {
    /// The unvalidated list request these flags describe.
    pub fn to_request(&self) -> ListRequest {
        ListRequest {
            page: self.page,
            page_size: self.page_size,
            sort_property: self.sort.clone(),
            sort_order: self.order.clone(),
            filters: self.filters.clone(),
        }
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected property=value, got '{raw}'"))
}

/// Services wired against the configured database.
pub struct Services {
    /// Storage lifecycle service.
    pub storages: StorageService,
    /// Resource tree engine.
    pub resources: ResourceService,
}

/// Helper: connect to the database and build the services
pub async fn connect(config: &AppConfig) -> anyhow::Result<Services> {
    let pool = DatabasePool::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    let (storage_repo, resource_repo) = pool.repositories();
    let locks = Arc::new(StorageLocks::new());

    Ok(Services {
        storages: StorageService::new(
            storage_repo.clone(),
            resource_repo.clone(),
            locks.clone(),
            config.storage.clone(),
            config.listing.clone(),
        ),
        resources: ResourceService::new(
            storage_repo,
            resource_repo,
            locks,
            config.storage.clone(),
            config.listing.clone(),
        ),
    })
}

/// Helper: ask before a destructive action unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> anyhow::Result<bool> {
    if force {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")?;
    if !confirmed {
        output::print_warning("Cancelled.");
    }
    Ok(confirmed)
}
