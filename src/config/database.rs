//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint the entity macros
//! cannot express, the composite uniqueness of tax bindings, is added as an explicit index.

use crate::entities::{
    Category, EntityTaxConfig, OrderTax, Product, TaxConfig, Zone, entity_tax_config,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/tax_buddy.sqlite?mode=rwc";

/// Name of the unique index over (`tax_id`, `entity_type`, `entity_id`).
pub const UNIQUE_BINDING_INDEX: &str = "idx_entity_tax_configs_tax_entity";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file under `data/` if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) plus the unique binding index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Zone).await?;
    create_table(db, &schema, TaxConfig).await?;
    create_table(db, &schema, EntityTaxConfig).await?;
    create_table(db, &schema, OrderTax).await?;

    let unique_binding = Index::create()
        .name(UNIQUE_BINDING_INDEX)
        .table(EntityTaxConfig)
        .col(entity_tax_config::Column::TaxId)
        .col(entity_tax_config::Column::EntityType)
        .col(entity_tax_config::Column::EntityId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&unique_binding)).await?;

    info!("Database schema is up to date");
    Ok(())
}
