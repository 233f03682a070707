//! Tax config entity - A named, rated tax rule (VAT, service charge, ...).
//!
//! Rules are never physically removed: historical order tax lines reference them, so
//! deletion only flips `is_deleted` and stamps `deleted_at`. The rule `name` is unique
//! across all rows, soft-deleted ones included.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of tax a rule represents. Drives which entities the rule may be bound to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxType {
    /// Value added tax, always applied globally
    #[sea_orm(string_value = "VAT")]
    Vat,
    /// Service charge, scoped to zones
    #[sea_orm(string_value = "SERVICE_CHARGE")]
    ServiceCharge,
    /// Environmental protection tax
    #[sea_orm(string_value = "ENVIRONMENTAL")]
    Environmental,
}

impl TaxType {
    /// Wire/database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vat => "VAT",
            Self::ServiceCharge => "SERVICE_CHARGE",
            Self::Environmental => "ENVIRONMENTAL",
        }
    }
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `charge_rate` is interpreted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    /// `charge_rate` is a fraction of the taxable base (0.10 = 10%)
    #[sea_orm(string_value = "PERCENTAGE")]
    Percentage,
    /// `charge_rate` is a currency amount charged per unit
    #[sea_orm(string_value = "FIXED_AMOUNT")]
    FixedAmount,
}

impl RateType {
    /// Wire/database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::FixedAmount => "FIXED_AMOUNT",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tax config database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_configs")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Kind of tax
    pub tax_type: TaxType,
    /// Unique, human-referenced name (e.g., "VAT", "Service Charge")
    #[sea_orm(unique)]
    pub name: String,
    /// Label shown on receipts
    pub display_name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Whether `charge_rate` is a fraction or a fixed amount
    pub rate_type: RateType,
    /// Non-negative rate or amount, see [`RateType`]
    pub charge_rate: f64,
    /// Inactive rules are never applied
    pub is_active: bool,
    /// Whether the tax is already embedded in displayed prices
    pub is_included: bool,
    /// Whether the taxable base includes taxes applied before VAT
    pub apply_after_vat: bool,
    /// Application order within the before/after VAT partitions
    pub sort_order: i32,
    /// Soft delete flag - if true, rule is hidden but history is preserved
    pub is_deleted: bool,
    /// When the rule was soft-deleted
    pub deleted_at: Option<DateTime>,
    /// When the rule was created
    pub created_at: DateTime,
    /// When the rule was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `TaxConfig` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One rule is bound to many entities
    #[sea_orm(has_many = "super::entity_tax_config::Entity")]
    EntityTaxConfigs,
    /// One rule appears on many historical order tax lines
    #[sea_orm(has_many = "super::order_tax::Entity")]
    OrderTaxes,
}

impl Related<super::entity_tax_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntityTaxConfigs.def()
    }
}

impl Related<super::order_tax::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderTaxes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
