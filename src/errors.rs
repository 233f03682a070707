//! Unified error type for the tax engine.
//!
//! Every fallible operation returns [`Result`]. Variants that describe a problem with a
//! single batch item (missing entity, duplicate binding, incompatible rule) are reported
//! back to bulk callers as failure records instead of aborting the batch; see
//! [`Error::is_item_failure`].

use crate::entities::{EntityType, TaxType};
use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying store failure (connection lost, malformed query, ...)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Filesystem error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Generic input validation failure
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Charge rate is negative or not a finite number
    #[error("Invalid charge rate: {rate}")]
    InvalidRate {
        /// The rejected rate
        rate: f64,
    },

    /// Taxable base handed to the resolver is negative
    #[error("Invalid taxable base: {amount}")]
    InvalidTaxableBase {
        /// The rejected amount
        amount: Decimal,
    },

    /// A computed tax amount does not fit the decimal range
    #[error("Tax amount for {tax_name} is out of range")]
    AmountOutOfRange {
        /// Rule whose amount overflowed
        tax_name: String,
    },

    /// Batch is empty or larger than the allowed maximum
    #[error("Batch must contain between 1 and {max} items, got {size}")]
    InvalidBatchSize {
        /// Number of items submitted
        size: usize,
        /// Largest accepted batch
        max: usize,
    },

    /// Tax rule does not exist (or was soft-deleted)
    #[error("Tax with ID {id} not found")]
    TaxNotFound {
        /// Requested tax id
        id: i64,
    },

    /// Another rule already uses this name
    #[error("Tax with name '{name}' already exists")]
    DuplicateTaxName {
        /// The conflicting name
        name: String,
    },

    /// Zone referenced by an association item does not exist
    #[error("Zone with ID {id} not found")]
    ZoneNotFound {
        /// Requested zone id
        id: i64,
    },

    /// Product referenced by an association item does not exist
    #[error("Product with ID {id} not found")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// Category referenced by an association item does not exist
    #[error("Category with ID {id} not found")]
    CategoryNotFound {
        /// Requested category id
        id: i64,
    },

    /// Binding does not exist
    #[error("Association with ID {id} not found")]
    AssociationNotFound {
        /// Requested association id
        id: i64,
    },

    /// Delete statement matched no rows
    #[error("Failed to delete association with ID {id}")]
    AssociationNotDeleted {
        /// Association id that could not be removed
        id: i64,
    },

    /// Rule is already bound to this entity
    #[error("Association already exists for {entity_type} with ID {entity_id}")]
    AlreadyAssociated {
        /// Kind of the target entity
        entity_type: EntityType,
        /// Target entity id
        entity_id: i64,
    },

    /// Business policy forbids binding this kind of rule to this kind of entity
    #[error("Invalid combination: {tax_type} cannot be associated with {entity_type}")]
    IncompatibleCombination {
        /// Type of the tax rule
        tax_type: TaxType,
        /// Kind of the target entity
        entity_type: EntityType,
    },
}

impl Error {
    /// Builds the entity-specific not-found error for a missing association target.
    #[must_use]
    pub const fn entity_not_found(entity_type: EntityType, id: i64) -> Self {
        match entity_type {
            EntityType::Zone => Self::ZoneNotFound { id },
            EntityType::Product => Self::ProductNotFound { id },
            EntityType::Category => Self::CategoryNotFound { id },
        }
    }

    /// Whether a bulk operation should record this error against the current item and
    /// keep going. Everything else aborts the whole call.
    #[must_use]
    pub const fn is_item_failure(&self) -> bool {
        matches!(
            self,
            Self::ZoneNotFound { .. }
                | Self::ProductNotFound { .. }
                | Self::CategoryNotFound { .. }
                | Self::AssociationNotFound { .. }
                | Self::AssociationNotDeleted { .. }
                | Self::AlreadyAssociated { .. }
                | Self::IncompatibleCombination { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
