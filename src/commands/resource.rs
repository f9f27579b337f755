//! Resource tree CLI commands.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tokio_util::io::StreamReader;
use tracing::warn;

use sono_core::config::AppConfig;
use sono_entity::resource::Resource;
use sono_service::CreateResourceRequest;

use super::ListArgs;
use crate::output::{self, OutputFormat};

/// Arguments for resource commands
#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Resource subcommand
    #[command(subcommand)]
    pub command: ResourceCommand,
}

/// Resource subcommands
#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// Create a directory, or upload a local file
    Create {
        /// Parent storage or directory ID
        #[arg(short, long)]
        parent_id: String,
        /// Owner's user ID
        #[arg(short, long)]
        user_id: String,
        /// Name of the new resource (defaults to the uploaded file's name)
        #[arg(short, long, required_unless_present = "file")]
        name: Option<String>,
        /// Local file to upload; omit to create a directory
        #[arg(long)]
        file: Option<PathBuf>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a resource
    Get {
        /// Resource ID
        id: String,
    },
    /// List resources
    List(ListArgs),
    /// Delete a resource and everything below it
    Remove {
        /// Resource ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Move a resource to the trash
    Trash {
        /// Resource ID
        id: String,
    },
    /// Bring a resource back from the trash
    Restore {
        /// Resource ID
        id: String,
    },
    /// Duplicate a resource next to itself
    Copy {
        /// Resource ID
        id: String,
    },
    /// Move a resource under another parent
    Move {
        /// Resource ID
        id: String,
        /// New parent storage or directory ID
        #[arg(short, long)]
        parent_id: String,
    },
    /// Rename a resource
    Rename {
        /// Resource ID
        id: String,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Zip resources into a new file
    Compress {
        /// Resource IDs to include
        #[arg(required = true)]
        ids: Vec<String>,
        /// Parent storage or directory of the archive
        #[arg(short, long)]
        parent_id: String,
        /// Archive name
        #[arg(short, long)]
        name: String,
    },
    /// Unpack a zip file resource
    Extract {
        /// Archive resource ID
        id: String,
        /// Parent storage or directory to extract into
        #[arg(short, long)]
        parent_id: String,
    },
    /// Set or clear a description
    Describe {
        /// Resource ID
        id: String,
        /// New description; omit to clear
        description: Option<String>,
    },
    /// Write a resource's bytes to a local file (directories are zipped)
    Export {
        /// Resource ID
        id: String,
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Resource display row
#[derive(Debug, Serialize, Tabled)]
struct ResourceRow {
    /// Resource ID
    id: String,
    /// Name
    name: String,
    /// File or directory
    kind: String,
    /// Size in bytes
    bytes: i64,
    /// Trashed flag
    trashed: bool,
    /// Path on disk
    path: String,
}

impl From<&Resource> for ResourceRow {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.to_string(),
            name: resource.name.clone(),
            kind: if resource.is_directory { "dir" } else { "file" }.to_string(),
            bytes: resource.bytes_count,
            trashed: resource.is_trashed,
            path: resource.path.clone(),
        }
    }
}

/// Execute resource commands
pub async fn execute(
    args: &ResourceArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let services = super::connect(config).await?;
    let resources = &services.resources;

    match &args.command {
        ResourceCommand::Create {
            parent_id,
            user_id,
            name,
            file,
            description,
        } => {
            let name = match (name, file) {
                (Some(name), _) => name.clone(),
                (None, Some(file)) => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("the uploaded file has no name")?,
                (None, None) => anyhow::bail!("--name is required to create a directory"),
            };
            let content = match file {
                Some(path) => {
                    let local = tokio::fs::File::open(path)
                        .await
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    Some(sono_storage::stream_file(local))
                }
                None => None,
            };
            let request = CreateResourceRequest {
                parent_id: parent_id.clone(),
                user_id: user_id.clone(),
                name,
                is_directory: file.is_none(),
                description: description.clone(),
            };
            let resource = resources.create_resource(request, content).await?;
            output::print_item(&resource, format);
        }
        ResourceCommand::Get { id } => {
            output::print_item(&resources.get_resource(id).await?, format);
        }
        ResourceCommand::List(list) => {
            let page = resources.list_resources(&list.to_request()).await?;
            output::print_page(&page, format, |r| ResourceRow::from(r));
        }
        ResourceCommand::Remove { id, force } => {
            let prompt = format!("Delete resource {id} and everything below it?");
            if super::confirm(&prompt, *force)? {
                resources.remove_resource(id).await?;
                output::print_success(&format!("Resource {id} removed"));
            }
        }
        ResourceCommand::Trash { id } => {
            let resource = resources.trash_resource(id).await?;
            output::print_success(&format!("'{}' moved to the trash", resource.name));
        }
        ResourceCommand::Restore { id } => {
            let resource = resources.restore_resource(id).await?;
            output::print_success(&format!("'{}' restored to {}", resource.name, resource.path));
        }
        ResourceCommand::Copy { id } => {
            let copy = resources.copy_resource(id).await?;
            output::print_success(&format!("Copied as '{}' (id: {})", copy.name, copy.id));
        }
        ResourceCommand::Move { id, parent_id } => {
            let resource = resources.move_resource(id, parent_id).await?;
            output::print_success(&format!("Moved to {}", resource.path));
        }
        ResourceCommand::Rename { id, name } => {
            let resource = resources.rename_resource(id, name).await?;
            output::print_success(&format!("Renamed to '{}'", resource.name));
        }
        ResourceCommand::Compress {
            ids,
            parent_id,
            name,
        } => {
            let archive = resources.compress_resources(ids, parent_id, name).await?;
            output::print_item(&archive, format);
        }
        ResourceCommand::Extract { id, parent_id } => {
            let extracted = resources.extract_resource(id, parent_id).await?;
            let rows: Vec<ResourceRow> = extracted.iter().map(ResourceRow::from).collect();
            output::print_list(&rows, format);
        }
        ResourceCommand::Describe { id, description } => {
            let resource = resources
                .update_description(id, description.clone())
                .await?;
            output::print_item(&resource, format);
        }
        ResourceCommand::Export { id, output: target } => {
            let content = resources.open_content(id).await?;
            let mut reader = StreamReader::new(content.stream().await?);
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(target)
                .await
                .with_context(|| format!("Failed to create {}", target.display()))?;
            let written = tokio::io::copy(&mut reader, &mut file)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;

            if content.temporary {
                if let Err(e) = tokio::fs::remove_file(&content.path).await {
                    warn!(path = %content.path.display(), error = %e, "Failed to remove temporary archive");
                }
            }
            output::print_success(&format!(
                "Wrote {written} bytes of '{}' to {}",
                content.name,
                target.display()
            ));
        }
    }

    Ok(())
}
