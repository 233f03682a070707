//! Tax binding business logic - best-effort bulk association, update and removal of
//! entity tax bindings, plus the binding queries.
//!
//! Each item of a batch is its own database write; there is no transaction around the
//! batch, so a partially failed call leaves the successful items persisted. Items are
//! processed sequentially and reported in input order.

use crate::{
    core::{
        bulk::{BulkOutcome, validate_batch_size},
        compatibility,
        lookup::{EntityLookup, ensure_entity_exists},
        tax::find_tax_by_id,
    },
    entities::{EntityTaxConfig, EntityType, entity_tax_config, tax_config},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// One entity to bind in [`associate_entities`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssociationItem {
    /// Kind of the target entity
    pub entity_type: EntityType,
    /// Target entity id
    pub entity_id: i64,
    /// Defaults to true
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Free text kept with the binding
    #[serde(default)]
    pub note: Option<String>,
}

impl AssociationItem {
    /// Active binding without a note.
    #[must_use]
    pub const fn new(entity_type: EntityType, entity_id: i64) -> Self {
        Self {
            entity_type,
            entity_id,
            is_active: None,
            note: None,
        }
    }
}

/// Partial update of one binding in [`update_associations`]. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssociationUpdate {
    /// Binding to change
    pub id: i64,
    /// New active flag
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Replacement note
    #[serde(default)]
    pub note: Option<String>,
}

/// Finds the binding of `tax_id` to the given entity, if any.
pub async fn find_binding(
    db: &DatabaseConnection,
    tax_id: i64,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<Option<entity_tax_config::Model>> {
    EntityTaxConfig::find()
        .filter(entity_tax_config::Column::TaxId.eq(tax_id))
        .filter(entity_tax_config::Column::EntityType.eq(entity_type))
        .filter(entity_tax_config::Column::EntityId.eq(entity_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a binding by id, failing with `AssociationNotFound`.
pub async fn get_association_by_id(
    db: &DatabaseConnection,
    association_id: i64,
) -> Result<entity_tax_config::Model> {
    EntityTaxConfig::find_by_id(association_id)
        .one(db)
        .await?
        .ok_or(Error::AssociationNotFound { id: association_id })
}

/// All bindings of a rule, newest first.
pub async fn get_associations_for_tax(
    db: &DatabaseConnection,
    tax_id: i64,
) -> Result<Vec<entity_tax_config::Model>> {
    EntityTaxConfig::find()
        .filter(entity_tax_config::Column::TaxId.eq(tax_id))
        .order_by_desc(entity_tax_config::Column::CreatedAt)
        .order_by_desc(entity_tax_config::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All bindings targeting one entity, newest first.
pub async fn get_associations_for_entity(
    db: &DatabaseConnection,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<Vec<entity_tax_config::Model>> {
    EntityTaxConfig::find()
        .filter(entity_tax_config::Column::EntityType.eq(entity_type))
        .filter(entity_tax_config::Column::EntityId.eq(entity_id))
        .order_by_desc(entity_tax_config::Column::CreatedAt)
        .order_by_desc(entity_tax_config::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Binds a rule to up to [`MAX_BATCH_SIZE`](crate::core::bulk::MAX_BATCH_SIZE) entities.
///
/// The rule must exist and not be soft-deleted, otherwise nothing is processed. Each
/// item is then checked in order for entity existence, an existing binding and
/// tax/entity compatibility before it is written; a failing item is recorded and the
/// next one is processed.
///
/// # Errors
/// Returns an error if the batch is empty or too large, the rule is missing or deleted,
/// or the store fails.
#[instrument(skip(db, lookup, items), fields(items = items.len()))]
pub async fn associate_entities<L>(
    db: &DatabaseConnection,
    lookup: &L,
    tax_id: i64,
    items: &[AssociationItem],
) -> Result<BulkOutcome<entity_tax_config::Model>>
where
    L: EntityLookup + ?Sized,
{
    validate_batch_size(items.len())?;

    let tax = find_tax_by_id(db, tax_id)
        .await?
        .filter(|tax| !tax.is_deleted)
        .ok_or(Error::TaxNotFound { id: tax_id })?;

    let mut outcome = BulkOutcome::with_capacity(items.len());
    for item in items {
        let result = associate_one(db, lookup, &tax, item).await;
        outcome.record(item.entity_id, Some(item.entity_type), result)?;
    }

    info!(
        succeeded = outcome.success_count(),
        failed = outcome.failed_count(),
        "Associated tax {} with entities",
        tax.name
    );
    Ok(outcome)
}

async fn associate_one<L>(
    db: &DatabaseConnection,
    lookup: &L,
    tax: &tax_config::Model,
    item: &AssociationItem,
) -> Result<entity_tax_config::Model>
where
    L: EntityLookup + ?Sized,
{
    ensure_entity_exists(lookup, item.entity_type, item.entity_id).await?;

    if find_binding(db, tax.id, item.entity_type, item.entity_id)
        .await?
        .is_some()
    {
        return Err(Error::AlreadyAssociated {
            entity_type: item.entity_type,
            entity_id: item.entity_id,
        });
    }

    compatibility::validate(tax.tax_type, item.entity_type)?;

    insert_binding(db, tax.id, item).await
}

/// Inserts a binding of `tax_id` to the item's entity. The composite unique index
/// turns a duplicate into [`Error::AlreadyAssociated`].
async fn insert_binding(
    db: &DatabaseConnection,
    tax_id: i64,
    item: &AssociationItem,
) -> Result<entity_tax_config::Model> {
    let now = chrono::Utc::now().naive_utc();
    let binding = entity_tax_config::ActiveModel {
        tax_id: Set(tax_id),
        entity_id: Set(item.entity_id),
        entity_type: Set(item.entity_type),
        is_active: Set(item.is_active.unwrap_or(true)),
        note: Set(item.note.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // A concurrent writer can win the race between the duplicate check and the insert.
    binding.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::AlreadyAssociated {
            entity_type: item.entity_type,
            entity_id: item.entity_id,
        },
        _ => Error::Database(err),
    })
}

/// Applies partial updates (`is_active`, `note`) to up to
/// [`MAX_BATCH_SIZE`](crate::core::bulk::MAX_BATCH_SIZE) bindings.
///
/// # Errors
/// Returns an error if the batch is empty or too large, or the store fails.
#[instrument(skip(db, updates), fields(items = updates.len()))]
pub async fn update_associations(
    db: &DatabaseConnection,
    updates: &[AssociationUpdate],
) -> Result<BulkOutcome<entity_tax_config::Model>> {
    validate_batch_size(updates.len())?;

    let mut outcome = BulkOutcome::with_capacity(updates.len());
    for update in updates {
        let result = update_one(db, update).await;
        outcome.record(update.id, None, result)?;
    }

    info!(
        succeeded = outcome.success_count(),
        failed = outcome.failed_count(),
        "Updated tax associations"
    );
    Ok(outcome)
}

async fn update_one(
    db: &DatabaseConnection,
    update: &AssociationUpdate,
) -> Result<entity_tax_config::Model> {
    let mut binding: entity_tax_config::ActiveModel =
        get_association_by_id(db, update.id).await?.into();

    if let Some(is_active) = update.is_active {
        binding.is_active = Set(is_active);
    }
    if let Some(note) = &update.note {
        binding.note = Set(Some(note.clone()));
    }
    binding.updated_at = Set(chrono::Utc::now().naive_utc());

    // The row can vanish between the read and the write.
    binding.update(db).await.map_err(|err| match err {
        DbErr::RecordNotUpdated => Error::AssociationNotFound { id: update.id },
        other => Error::Database(other),
    })
}

/// Deletes up to [`MAX_BATCH_SIZE`](crate::core::bulk::MAX_BATCH_SIZE) bindings by id.
/// An id only counts as removed when the delete actually affected a row.
///
/// # Errors
/// Returns an error if the batch is empty or too large, or the store fails.
#[instrument(skip(db, ids), fields(items = ids.len()))]
pub async fn remove_associations(db: &DatabaseConnection, ids: &[i64]) -> Result<BulkOutcome<i64>> {
    validate_batch_size(ids.len())?;

    let mut outcome = BulkOutcome::with_capacity(ids.len());
    for &id in ids {
        let result = remove_one(db, id).await;
        outcome.record(id, None, result)?;
    }

    info!(
        succeeded = outcome.success_count(),
        failed = outcome.failed_count(),
        "Removed tax associations"
    );
    Ok(outcome)
}

async fn remove_one(db: &DatabaseConnection, association_id: i64) -> Result<i64> {
    get_association_by_id(db, association_id).await?;

    let deleted = EntityTaxConfig::delete_by_id(association_id)
        .exec(db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(Error::AssociationNotDeleted { id: association_id });
    }

    debug!(association_id, "Removed tax association");
    Ok(association_id)
}
