//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod entity_tax_config;
pub mod order_tax;
pub mod product;
pub mod tax_config;
pub mod zone;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use entity_tax_config::{
    Column as EntityTaxConfigColumn, Entity as EntityTaxConfig, EntityType,
    Model as EntityTaxConfigModel,
};
pub use order_tax::{Column as OrderTaxColumn, Entity as OrderTax, Model as OrderTaxModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use tax_config::{
    Column as TaxConfigColumn, Entity as TaxConfig, Model as TaxConfigModel, RateType, TaxType,
};
pub use zone::{Column as ZoneColumn, Entity as Zone, Model as ZoneModel};
