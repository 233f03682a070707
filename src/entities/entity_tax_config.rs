//! Entity tax config - Binds one tax rule to one zone, product or category.
//!
//! The triple (`tax_id`, `entity_type`, `entity_id`) is unique; the index enforcing it is
//! created alongside the table in `config::database::create_tables`. The entity reference
//! is weak: nothing cascades when the zone/product/category goes away.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of business entity a rule can be bound to
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// A seating zone
    #[sea_orm(string_value = "ZONE")]
    Zone,
    /// A sellable product
    #[sea_orm(string_value = "PRODUCT")]
    Product,
    /// A product category
    #[sea_orm(string_value = "CATEGORY")]
    Category,
}

impl EntityType {
    /// Wire/database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zone => "ZONE",
            Self::Product => "PRODUCT",
            Self::Category => "CATEGORY",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entity_tax_configs")]
pub struct Model {
    /// Unique identifier for the binding
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning tax rule
    pub tax_id: i64,
    /// ID of the bound zone/product/category
    pub entity_id: i64,
    /// Kind of the bound entity
    pub entity_type: EntityType,
    /// Inactive bindings are ignored when pricing
    pub is_active: bool,
    /// Optional free-text note
    pub note: Option<String>,
    /// When the binding was created
    pub created_at: DateTime,
    /// When the binding was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `EntityTaxConfig` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each binding belongs to one tax rule
    #[sea_orm(
        belongs_to = "super::tax_config::Entity",
        from = "Column::TaxId",
        to = "super::tax_config::Column::Id"
    )]
    TaxConfig,
}

impl Related<super::tax_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
