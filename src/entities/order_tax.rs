//! Order tax entity - A computed tax line attached to an order or order item.
//!
//! Name and rate are snapshotted when the line is written so later rule edits never
//! rewrite history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order tax database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_taxes")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Rule that produced the line
    pub tax_id: i64,
    /// Order the line belongs to
    pub order_id: i64,
    /// Order item, when the tax was computed per item
    pub order_item_id: Option<i64>,
    /// Rule name at computation time
    pub tax_name: String,
    /// Rule charge rate at computation time
    pub tax_rate: f64,
    /// Amount the rate was applied to
    pub taxable_base: f64,
    /// Computed tax
    pub tax_amount: f64,
    /// Units charged for fixed-amount rules
    pub quantity: Option<i32>,
    /// When the line was written
    pub created_at: DateTime,
}

/// Defines relationships between `OrderTax` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line references the rule it was computed from
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
