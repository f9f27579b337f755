//! Storage management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use sono_core::config::AppConfig;
use sono_entity::storage::Storage;

use super::ListArgs;
use crate::output::{self, OutputFormat};

/// Arguments for storage commands
#[derive(Debug, Args)]
pub struct StorageArgs {
    /// Storage subcommand
    #[command(subcommand)]
    pub command: StorageCommand,
}

/// Storage subcommands
#[derive(Debug, Subcommand)]
pub enum StorageCommand {
    /// Create the storage of a user
    Create {
        /// User ID (USER.<uuid>)
        #[arg(short, long)]
        user_id: String,
    },
    /// Show a storage by ID or by owner
    Get {
        /// Storage ID
        #[arg(required_unless_present = "user_id")]
        id: Option<String>,
        /// Owner's user ID
        #[arg(short, long, conflicts_with = "id")]
        user_id: Option<String>,
    },
    /// List storages
    List(ListArgs),
    /// Delete a storage with all its resources
    Remove {
        /// Storage ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Compare a storage directory with its records
    Verify {
        /// Storage ID
        id: String,
    },
    /// Empty the temporary directory of a storage
    ClearTemp {
        /// Storage ID
        id: String,
    },
}

/// Storage display row
#[derive(Debug, Serialize, Tabled)]
struct StorageRow {
    /// Storage ID
    id: String,
    /// Owner
    user_id: String,
    /// Directory
    path: String,
    /// Version
    version: i32,
    /// Created at
    created_at: String,
}

impl From<&Storage> for StorageRow {
    fn from(storage: &Storage) -> Self {
        Self {
            id: storage.id.to_string(),
            user_id: storage.user_id.to_string(),
            path: storage.path.clone(),
            version: storage.version,
            created_at: storage.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute storage commands
pub async fn execute(
    args: &StorageArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let services = super::connect(config).await?;
    let storages = &services.storages;

    match &args.command {
        StorageCommand::Create { user_id } => {
            let storage = storages.create_storage(user_id).await?;
            output::print_success(&format!(
                "Storage {} created at {}",
                storage.id, storage.path
            ));
        }
        StorageCommand::Get { id, user_id } => {
            let storage = match (id, user_id) {
                (_, Some(user_id)) => storages.get_storage_by_user(user_id).await?,
                (Some(id), None) => storages.get_storage(id).await?,
                (None, None) => anyhow::bail!("either a storage ID or --user-id is required"),
            };
            output::print_item(&storage, format);
        }
        StorageCommand::List(list) => {
            let page = storages.list_storages(&list.to_request()).await?;
            output::print_page(&page, format, |s| StorageRow::from(s));
        }
        StorageCommand::Remove { id, force } => {
            let prompt = format!("Delete storage {id} and every resource in it?");
            if super::confirm(&prompt, *force)? {
                storages.remove_storage(id).await?;
                output::print_success(&format!("Storage {id} removed"));
            }
        }
        StorageCommand::Verify { id } => {
            let report = storages.verify_storage(id).await?;
            if format == OutputFormat::Json {
                output::print_item(&report, format);
            } else if report.is_consistent() {
                output::print_success(&format!(
                    "{} resources checked, no divergence",
                    report.checked_resources
                ));
            } else {
                output::print_warning("Storage diverges from its records");
                for id in &report.missing_on_disk {
                    output::print_kv("Missing on disk", &id.to_string());
                }
                for path in &report.untracked_paths {
                    output::print_kv("Untracked", &path.display().to_string());
                }
            }
        }
        StorageCommand::ClearTemp { id } => {
            let removed = storages.clear_temporary(id).await?;
            output::print_success(&format!("Removed {removed} temporary entries"));
        }
    }

    Ok(())
}
