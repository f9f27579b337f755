//! Database migration management commands.

use anyhow::Context;
use clap::{Args, Subcommand};

use sono_core::config::AppConfig;
use sono_database::DatabasePool;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show applied migrations
    Status,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> anyhow::Result<()> {
    let mut database = config.database.clone();
    database.run_migrations = false;
    let pool = DatabasePool::connect(&database)
        .await
        .context("Failed to connect to the database")?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            sono_database::migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let applied = sono_database::migration::applied_migrations(pool.pool()).await?;
            if applied.is_empty() {
                output::print_warning("No migrations applied yet.");
            }
            for (version, description) in &applied {
                output::print_kv(&version.to_string(), description);
            }
        }
    }

    pool.close().await;
    Ok(())
}
