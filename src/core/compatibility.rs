//! Tax/entity compatibility policy.
//!
//! VAT is global and can never be scoped to a single entity. Service charges belong to
//! zones. Every other tax type may be bound to anything until policy narrows it in
//! [`allowed_entity_types`].

use crate::{
    entities::{EntityType, TaxType},
    errors::{Error, Result},
};

const ALL_ENTITY_TYPES: &[EntityType] =
    &[EntityType::Zone, EntityType::Product, EntityType::Category];

/// Entity types a rule of `tax_type` may be bound to.
#[must_use]
pub const fn allowed_entity_types(tax_type: TaxType) -> &'static [EntityType] {
    match tax_type {
        TaxType::Vat => &[],
        TaxType::ServiceCharge => &[EntityType::Zone],
        TaxType::Environmental => ALL_ENTITY_TYPES,
    }
}

/// Whether `tax_type` may be bound to `entity_type`.
#[must_use]
pub fn is_compatible(tax_type: TaxType, entity_type: EntityType) -> bool {
    allowed_entity_types(tax_type).contains(&entity_type)
}

/// Checks a binding against policy, failing with `IncompatibleCombination`.
pub fn validate(tax_type: TaxType, entity_type: EntityType) -> Result<()> {
    if is_compatible(tax_type, entity_type) {
        Ok(())
    } else {
        Err(Error::IncompatibleCombination {
            tax_type,
            entity_type,
        })
    }
}
