//! Zone entity - A seating area (terrace, VIP room, ...). Service charges bind here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Zone database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "zones")]
pub struct Model {
    /// Unique identifier for the zone
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Zone name
    pub name: String,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the zone was created
    pub created_at: DateTime,
    /// When the zone was last modified
    pub updated_at: DateTime,
}

/// Zone has no relationships managed by this crate
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
