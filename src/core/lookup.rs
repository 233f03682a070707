//! Existence lookups for the entities taxes can be bound to.
//!
//! The bulk association service only needs to know whether a zone, product or category
//! exists. That question goes through [`EntityLookup`] so the catalog can live anywhere;
//! the crate ships an implementation over its own catalog tables on
//! [`DatabaseConnection`].

use crate::{
    entities::{Category, EntityType, Product, Zone, category, product, zone},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::prelude::*;

/// A resolved association target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Kind of the entity
    pub entity_type: EntityType,
    /// Entity id
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Finds zones, products and categories by id.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Returns the entity, or `None` when it does not exist (or was deleted).
    async fn find(&self, entity_type: EntityType, entity_id: i64) -> Result<Option<EntityRef>>;
}

#[async_trait]
impl EntityLookup for DatabaseConnection {
    async fn find(&self, entity_type: EntityType, entity_id: i64) -> Result<Option<EntityRef>> {
        let name = match entity_type {
            EntityType::Zone => Zone::find_by_id(entity_id)
                .filter(zone::Column::IsDeleted.eq(false))
                .one(self)
                .await?
                .map(|found| found.name),
            EntityType::Product => Product::find_by_id(entity_id)
                .filter(product::Column::IsDeleted.eq(false))
                .one(self)
                .await?
                .map(|found| found.name),
            EntityType::Category => Category::find_by_id(entity_id)
                .filter(category::Column::IsDeleted.eq(false))
                .one(self)
                .await?
                .map(|found| found.name),
        };

        Ok(name.map(|name| EntityRef {
            entity_type,
            id: entity_id,
            name,
        }))
    }
}

/// Resolves an entity or fails with the matching `ZoneNotFound`/`ProductNotFound`/
/// `CategoryNotFound` error.
pub async fn ensure_entity_exists<L>(
    lookup: &L,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<EntityRef>
where
    L: EntityLookup + ?Sized,
{
    lookup
        .find(entity_type, entity_id)
        .await?
        .ok_or_else(|| Error::entity_not_found(entity_type, entity_id))
}
