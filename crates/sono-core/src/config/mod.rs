//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod listing;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::listing::ListingConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Physical storage layout.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Paging defaults and bounds for list operations.
    #[serde(default)]
    pub listing: ListingConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the file at `config_path`, an optional `config/<env>.toml`
    /// overlay, and environment variables prefixed with `SONO__`
    /// (e.g. `SONO__STORAGE__ROOT_PATH`).
    pub fn load(config_path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SONO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_applies_section_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[database]\nurl = \"postgres://sono@localhost/sono\"\n\n[storage]\nroot_path = \"/srv/sono\"\n"
        )
        .expect("write");

        let path = file.path().to_str().expect("utf-8 path");
        let config = AppConfig::load(path, None).expect("load");

        assert_eq!(config.database.url, "postgres://sono@localhost/sono");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.storage.root_path, "/srv/sono");
        assert_eq!(config.storage.trash_directory, "trash");
        assert_eq!(config.storage.temporary_directory, "temporary");
        assert_eq!(config.listing.default_page_size, 100);
        assert_eq!(config.listing.max_page_size, 1000);
        assert_eq!(config.logging.level, "info");
    }
}
