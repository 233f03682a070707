//! Shared test utilities for `TaxBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test rules and catalog entities with sensible defaults.

use crate::{
    core::{
        lookup::{EntityLookup, EntityRef},
        tax::{self, NewTaxConfig},
    },
    entities::{self, EntityType, RateType, TaxType},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test tax rule with sensible defaults.
///
/// # Defaults
/// * `rate_type`: PERCENTAGE
/// * `charge_rate`: 0.1
/// * active, excluded, before VAT, `sort_order` 0
pub async fn create_test_tax(
    db: &DatabaseConnection,
    name: &str,
    tax_type: TaxType,
) -> Result<entities::tax_config::Model> {
    tax::create_tax(db, NewTaxConfig::new(tax_type, name, RateType::Percentage, 0.1)).await
}

/// Creates a zone.
pub async fn create_test_zone(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::zone::Model> {
    let now = chrono::Utc::now().naive_utc();
    let zone = entities::zone::ActiveModel {
        name: Set(name.to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    zone.insert(db).await.map_err(Into::into)
}

/// Soft-deletes a zone.
pub async fn delete_test_zone(db: &DatabaseConnection, zone_id: i64) -> Result<()> {
    let zone = entities::zone::ActiveModel {
        id: Set(zone_id),
        is_deleted: Set(true),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    zone.update(db).await?;
    Ok(())
}

/// Soft-deletes a product.
pub async fn delete_test_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let product = entities::product::ActiveModel {
        id: Set(product_id),
        is_deleted: Set(true),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    product.update(db).await?;
    Ok(())
}

/// Creates a category.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    let now = chrono::Utc::now().naive_utc();
    let category = entities::category::ActiveModel {
        name: Set(name.to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Creates a product, optionally inside a category.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    category_id: Option<i64>,
) -> Result<entities::product::Model> {
    let now = chrono::Utc::now().naive_utc();
    let product = entities::product::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(category_id),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// One of each bindable entity; the product sits in the category.
pub struct Catalog {
    /// "Main Hall"
    pub zone: entities::zone::Model,
    /// "Drinks"
    pub category: entities::category::Model,
    /// "Lemonade", in `category`
    pub product: entities::product::Model,
}

/// Sets up a test database with a zone, a category and a product in that category.
pub async fn setup_with_catalog() -> Result<(DatabaseConnection, Catalog)> {
    let db = setup_test_db().await?;
    let zone = create_test_zone(&db, "Main Hall").await?;
    let category = create_test_category(&db, "Drinks").await?;
    let product = create_test_product(&db, "Lemonade", Some(category.id)).await?;
    Ok((
        db,
        Catalog {
            zone,
            category,
            product,
        },
    ))
}

/// Lookup over a fixed set of entities, for tests that bypass the catalog tables.
#[derive(Debug, Default)]
pub struct InMemoryLookup {
    entities: Vec<(EntityType, i64)>,
}

impl InMemoryLookup {
    /// Lookup that knows exactly `entities`.
    pub fn with_entities(entities: &[(EntityType, i64)]) -> Self {
        Self {
            entities: entities.to_vec(),
        }
    }
}

#[async_trait]
impl EntityLookup for InMemoryLookup {
    async fn find(&self, entity_type: EntityType, entity_id: i64) -> Result<Option<EntityRef>> {
        Ok(self
            .entities
            .contains(&(entity_type, entity_id))
            .then(|| EntityRef {
                entity_type,
                id: entity_id,
                name: format!("{entity_type} {entity_id}"),
            }))
    }
}

/// Lookup whose backing store is always down.
pub struct FailingLookup;

#[async_trait]
impl EntityLookup for FailingLookup {
    async fn find(&self, _entity_type: EntityType, _entity_id: i64) -> Result<Option<EntityRef>> {
        Err(Error::Database(DbErr::Custom("catalog unavailable".to_string())))
    }
}
