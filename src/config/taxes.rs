//! Default tax rule loading from config.toml
//!
//! The `[[taxes]]` tables of the configuration file describe rules that must exist on
//! startup. Seeding only inserts rules whose name is not taken yet, so operator edits
//! made after the first run are never overwritten.

use crate::{
    core::tax::{self, NewTaxConfig},
    entities::tax_config,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::{env, path::Path};
use tracing::{debug, info, instrument};

/// Default location of the seed file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct TaxSeedConfig {
    /// Rules to seed
    #[serde(default)]
    pub taxes: Vec<NewTaxConfig>,
}

/// Loads tax rule configuration from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or an enum value is unknown
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TaxSeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the seed file named by `TAX_CONFIG_PATH` (default `./config.toml`).
/// A missing file yields an empty configuration.
pub fn load_default_config() -> Result<TaxSeedConfig> {
    let path = env::var("TAX_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No tax config at {path}, skipping seed");
        return Ok(TaxSeedConfig::default());
    }
    debug!("Loading tax config from {path}");
    load_config(path)
}

/// Creates every configured rule whose name is not in the store yet.
/// Returns the rules that were created.
#[instrument(skip(db, config), fields(configured = config.taxes.len()))]
pub async fn seed_taxes(
    db: &DatabaseConnection,
    config: &TaxSeedConfig,
) -> Result<Vec<tax_config::Model>> {
    let mut created = Vec::new();
    for new_tax in &config.taxes {
        if tax::find_tax_by_name(db, new_tax.name.trim()).await?.is_some() {
            debug!("Tax {} already exists, skipping", new_tax.name);
            continue;
        }
        created.push(tax::create_tax(db, new_tax.clone()).await?);
    }

    info!("Seeded {} tax rules", created.len());
    Ok(created)
}
