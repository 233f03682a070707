//! Tax rule business logic - creation, lookup, partial update, soft delete and listing.
//!
//! Rules are identified by a unique name. Soft-deleted rules keep their name reserved
//! and stay readable by id (order history points at them), but they are skipped by
//! every listing of applicable rules and can no longer be updated or bound.

use crate::{
    core::resolver::to_decimal,
    entities::{RateType, TaxConfig, TaxType, tax_config},
    errors::{Error, Result},
};
use sea_orm::{Condition, Order, PaginatorTrait, QueryOrder, Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Default page size for [`list_taxes`]
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page size accepted by [`list_taxes`]
pub const MAX_PAGE_SIZE: u64 = 100;

const fn default_true() -> bool {
    true
}

/// Input for creating a tax rule. Also the shape of a `[[taxes]]` entry in config.toml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTaxConfig {
    /// Kind of tax
    #[serde(rename = "type")]
    pub tax_type: TaxType,
    /// Unique name
    pub name: String,
    /// Receipt label
    pub display_name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Interpretation of `charge_rate`
    pub rate_type: RateType,
    /// Fraction (percentage rules) or amount (fixed rules), must be >= 0
    pub charge_rate: f64,
    /// Defaults to true
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Defaults to false
    #[serde(default)]
    pub is_included: bool,
    /// Defaults to false
    #[serde(default)]
    pub apply_after_vat: bool,
    /// Defaults to 0
    #[serde(default)]
    pub sort_order: i32,
}

impl NewTaxConfig {
    /// Active, excluded, before-VAT rule with `display_name` equal to `name`.
    #[must_use]
    pub fn new(tax_type: TaxType, name: &str, rate_type: RateType, charge_rate: f64) -> Self {
        Self {
            tax_type,
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
            rate_type,
            charge_rate,
            is_active: true,
            is_included: false,
            apply_after_vat: false,
            sort_order: 0,
        }
    }
}

/// Partial update of a tax rule. `None` leaves the field untouched;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxConfigPatch {
    /// New kind; existing bindings are not re-validated
    pub tax_type: Option<TaxType>,
    /// New unique name
    pub name: Option<String>,
    /// New receipt label
    pub display_name: Option<String>,
    /// New description, or `Some(None)` to clear it
    pub description: Option<Option<String>>,
    /// New rate interpretation
    pub rate_type: Option<RateType>,
    /// New rate, must be >= 0
    pub charge_rate: Option<f64>,
    /// New active flag
    pub is_active: Option<bool>,
    /// New included flag
    pub is_included: Option<bool>,
    /// New VAT ordering
    pub apply_after_vat: Option<bool>,
    /// New position among rules
    pub sort_order: Option<i32>,
}

/// Filters for [`list_taxes`]. Empty type lists mean "any type".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxFilter {
    /// Case-insensitive substring over name, display name and description
    pub query: Option<String>,
    /// Rule must have one of these types
    pub tax_types: Vec<TaxType>,
    /// Rule must have one of these rate types
    pub rate_types: Vec<RateType>,
    /// Match on the active flag
    pub is_active: Option<bool>,
    /// Match on the included flag
    pub is_included: Option<bool>,
    /// Match on the VAT ordering flag
    pub apply_after_vat: Option<bool>,
    /// Soft-deleted rules are hidden unless this is set
    pub include_deleted: bool,
}

/// Sortable columns for [`list_taxes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxSortField {
    /// `charge_rate`
    ChargeRate,
    /// `name`
    Name,
    /// `sort_order`
    SortOrder,
    /// `created_at`
    CreatedAt,
    /// `updated_at`
    UpdatedAt,
}

impl TaxSortField {
    const fn column(self) -> tax_config::Column {
        match self {
            Self::ChargeRate => tax_config::Column::ChargeRate,
            Self::Name => tax_config::Column::Name,
            Self::SortOrder => tax_config::Column::SortOrder,
            Self::CreatedAt => tax_config::Column::CreatedAt,
            Self::UpdatedAt => tax_config::Column::UpdatedAt,
        }
    }
}

/// Sort direction for [`TaxSortField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Paging, filtering and sorting parameters for [`list_taxes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxQuery {
    /// 1-based page number, defaults to 1
    pub page: Option<u64>,
    /// Defaults to [`DEFAULT_PAGE_SIZE`]
    pub page_size: Option<u64>,
    /// Which rules to include
    pub filter: TaxFilter,
    /// Applied in order; defaults to `sort_order` then `name`, ascending
    pub order_by: Vec<(TaxSortField, SortDirection)>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Rows of this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    /// Requested page size
    pub page_size: u64,
    /// Rows matching the filter across all pages
    pub total: u64,
    /// Number of pages at this page size
    pub total_pages: u64,
}

/// Rejects negative charge rates and rates that cannot be computed with, i.e. NaN,
/// infinities and values outside the `Decimal` range.
pub fn validate_rate(rate: f64) -> Result<()> {
    if rate < 0.0 {
        return Err(Error::InvalidRate { rate });
    }
    to_decimal(rate).map(|_| ())
}

fn required_text(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{label} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn duplicate_name_or_db(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateTaxName {
            name: name.to_string(),
        },
        _ => Error::Database(err),
    }
}

/// Finds a rule by id, soft-deleted or not.
pub async fn find_tax_by_id<C>(db: &C, tax_id: i64) -> Result<Option<tax_config::Model>>
where
    C: ConnectionTrait,
{
    TaxConfig::find_by_id(tax_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a rule by id, failing with `TaxNotFound` if it does not exist.
pub async fn get_tax_by_id(db: &DatabaseConnection, tax_id: i64) -> Result<tax_config::Model> {
    find_tax_by_id(db, tax_id)
        .await?
        .ok_or(Error::TaxNotFound { id: tax_id })
}

/// Finds a rule by its exact name, soft-deleted ones included (names are never reused).
pub async fn find_tax_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<tax_config::Model>> {
    TaxConfig::find()
        .filter(tax_config::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new tax rule.
///
/// # Errors
/// Returns an error if:
/// - The name or display name is empty or whitespace-only
/// - The charge rate is negative or not finite
/// - Another rule (deleted or not) already uses the name
/// - The database insert fails
#[instrument(skip(db, new_tax), fields(name = %new_tax.name))]
pub async fn create_tax(
    db: &DatabaseConnection,
    new_tax: NewTaxConfig,
) -> Result<tax_config::Model> {
    validate_rate(new_tax.charge_rate)?;
    let name = required_text("Tax name", &new_tax.name)?;
    let display_name = required_text("Tax display name", &new_tax.display_name)?;

    if find_tax_by_name(db, &name).await?.is_some() {
        return Err(Error::DuplicateTaxName { name });
    }

    let now = chrono::Utc::now().naive_utc();
    let tax = tax_config::ActiveModel {
        tax_type: Set(new_tax.tax_type),
        name: Set(name.clone()),
        display_name: Set(display_name),
        description: Set(new_tax.description),
        rate_type: Set(new_tax.rate_type),
        charge_rate: Set(new_tax.charge_rate),
        is_active: Set(new_tax.is_active),
        is_included: Set(new_tax.is_included),
        apply_after_vat: Set(new_tax.apply_after_vat),
        sort_order: Set(new_tax.sort_order),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = tax
        .insert(db)
        .await
        .map_err(|err| duplicate_name_or_db(err, &name))?;
    info!(tax_id = created.id, "Created tax {}", created.name);
    Ok(created)
}

/// Merges the provided fields into an existing rule and refreshes `updated_at`.
///
/// # Errors
/// Returns an error if:
/// - A provided charge rate is negative or not finite, or a provided name is blank
/// - The rule does not exist or is soft-deleted
/// - The new name is already used by another rule
/// - The database update fails
#[instrument(skip(db, patch))]
pub async fn update_tax(
    db: &DatabaseConnection,
    tax_id: i64,
    patch: TaxConfigPatch,
) -> Result<tax_config::Model> {
    if let Some(rate) = patch.charge_rate {
        validate_rate(rate)?;
    }
    let new_name = patch
        .name
        .as_deref()
        .map(|name| required_text("Tax name", name))
        .transpose()?;
    let new_display_name = patch
        .display_name
        .as_deref()
        .map(|name| required_text("Tax display name", name))
        .transpose()?;

    let existing = find_tax_by_id(db, tax_id)
        .await?
        .filter(|tax| !tax.is_deleted)
        .ok_or(Error::TaxNotFound { id: tax_id })?;

    if let Some(name) = new_name.as_deref().filter(|name| *name != existing.name) {
        if find_tax_by_name(db, name).await?.is_some() {
            return Err(Error::DuplicateTaxName {
                name: name.to_string(),
            });
        }
    }

    let checked_name = new_name.clone().unwrap_or_else(|| existing.name.clone());
    let mut tax: tax_config::ActiveModel = existing.into();

    if let Some(tax_type) = patch.tax_type {
        tax.tax_type = Set(tax_type);
    }
    if let Some(name) = new_name {
        tax.name = Set(name);
    }
    if let Some(display_name) = new_display_name {
        tax.display_name = Set(display_name);
    }
    if let Some(description) = patch.description {
        tax.description = Set(description);
    }
    if let Some(rate_type) = patch.rate_type {
        tax.rate_type = Set(rate_type);
    }
    if let Some(rate) = patch.charge_rate {
        tax.charge_rate = Set(rate);
    }
    if let Some(is_active) = patch.is_active {
        tax.is_active = Set(is_active);
    }
    if let Some(is_included) = patch.is_included {
        tax.is_included = Set(is_included);
    }
    if let Some(apply_after_vat) = patch.apply_after_vat {
        tax.apply_after_vat = Set(apply_after_vat);
    }
    if let Some(sort_order) = patch.sort_order {
        tax.sort_order = Set(sort_order);
    }
    tax.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = tax
        .update(db)
        .await
        .map_err(|err| duplicate_name_or_db(err, &checked_name))?;
    debug!("Updated tax {}", updated.name);
    Ok(updated)
}

/// Soft deletes a rule, preserving it for historical order tax lines.
///
/// # Errors
/// Returns an error if the rule does not exist or is already deleted, or if the
/// database update fails.
#[instrument(skip(db))]
pub async fn soft_delete_tax(db: &DatabaseConnection, tax_id: i64) -> Result<tax_config::Model> {
    let existing = find_tax_by_id(db, tax_id)
        .await?
        .filter(|tax| !tax.is_deleted)
        .ok_or(Error::TaxNotFound { id: tax_id })?;

    let now = chrono::Utc::now().naive_utc();
    let mut tax: tax_config::ActiveModel = existing.into();
    tax.is_deleted = Set(true);
    tax.deleted_at = Set(Some(now));
    tax.updated_at = Set(now);

    let deleted = tax.update(db).await?;
    info!("Soft-deleted tax {}", deleted.name);
    Ok(deleted)
}

/// Retrieves one page of rules matching `query`.
///
/// # Errors
/// Returns an error if the page number is 0, the page size is outside
/// `1..=MAX_PAGE_SIZE`, or the database query fails.
pub async fn list_taxes(
    db: &DatabaseConnection,
    query: &TaxQuery,
) -> Result<Page<tax_config::Model>> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
        return Err(Error::Validation {
            message: "Page number starts at 1".to_string(),
        });
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::Validation {
            message: format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
        });
    }

    let filter = &query.filter;
    let mut select = TaxConfig::find();

    if !filter.include_deleted {
        select = select.filter(tax_config::Column::IsDeleted.eq(false));
    }
    if let Some(text) = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        select = select.filter(
            Condition::any()
                .add(tax_config::Column::Name.contains(text))
                .add(tax_config::Column::DisplayName.contains(text))
                .add(tax_config::Column::Description.contains(text)),
        );
    }
    if !filter.tax_types.is_empty() {
        select = select.filter(tax_config::Column::TaxType.is_in(filter.tax_types.clone()));
    }
    if !filter.rate_types.is_empty() {
        select = select.filter(tax_config::Column::RateType.is_in(filter.rate_types.clone()));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(tax_config::Column::IsActive.eq(is_active));
    }
    if let Some(is_included) = filter.is_included {
        select = select.filter(tax_config::Column::IsIncluded.eq(is_included));
    }
    if let Some(apply_after_vat) = filter.apply_after_vat {
        select = select.filter(tax_config::Column::ApplyAfterVat.eq(apply_after_vat));
    }

    if query.order_by.is_empty() {
        select = select
            .order_by_asc(tax_config::Column::SortOrder)
            .order_by_asc(tax_config::Column::Name);
    } else {
        for (field, direction) in &query.order_by {
            let order = match direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            select = select.order_by(field.column(), order);
        }
    }
    // Stable paging when the requested keys tie
    select = select.order_by_asc(tax_config::Column::Id);

    let paginator = select.paginate(db, page_size);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        page_size,
        total,
        total_pages: total.div_ceil(page_size),
    })
}

/// All active, non-deleted rules ordered by `sort_order`, ties broken by name.
pub async fn list_active_taxes<C>(db: &C) -> Result<Vec<tax_config::Model>>
where
    C: ConnectionTrait,
{
    TaxConfig::find()
        .filter(tax_config::Column::IsActive.eq(true))
        .filter(tax_config::Column::IsDeleted.eq(false))
        .order_by_asc(tax_config::Column::SortOrder)
        .order_by_asc(tax_config::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_tax_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Negative rate
        let result = create_tax(
            &db,
            NewTaxConfig::new(TaxType::Vat, "VAT", RateType::Percentage, -0.1),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidRate { rate: _ }));

        // NaN rate
        let result = create_tax(
            &db,
            NewTaxConfig::new(TaxType::Vat, "VAT", RateType::Percentage, f64::NAN),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidRate { rate: _ }));

        // Beyond what tax computation can represent
        let result = create_tax(
            &db,
            NewTaxConfig::new(TaxType::Environmental, "Huge", RateType::FixedAmount, 1e30),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidRate { rate } if rate == 1e30));

        // Whitespace-only name
        let result = create_tax(
            &db,
            NewTaxConfig::new(TaxType::Vat, "   ", RateType::Percentage, 0.1),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tax_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let mut new_tax = NewTaxConfig::new(
            TaxType::ServiceCharge,
            "  Service Charge ",
            RateType::Percentage,
            0.05,
        );
        new_tax.apply_after_vat = true;
        new_tax.sort_order = 2;
        let tax = create_tax(&db, new_tax).await?;

        assert_eq!(tax.name, "Service Charge");
        assert_eq!(tax.tax_type, TaxType::ServiceCharge);
        assert_eq!(tax.charge_rate, 0.05);
        assert!(tax.is_active);
        assert!(!tax.is_included);
        assert!(tax.apply_after_vat);
        assert!(!tax.is_deleted);
        assert!(tax.deleted_at.is_none());

        let fetched = get_tax_by_id(&db, tax.id).await?;
        assert_eq!(fetched, tax);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tax_zero_rate_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let tax = create_tax(
            &db,
            NewTaxConfig::new(TaxType::Environmental, "Eco", RateType::FixedAmount, 0.0),
        )
        .await?;
        assert_eq!(tax.charge_rate, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tax_duplicate_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_tax(&db, "VAT", TaxType::Vat).await?;

        let result = create_test_tax(&db, "VAT", TaxType::Environmental).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateTaxName { name } if name == "VAT"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_soft_deleted_name_is_not_reusable() -> Result<()> {
        let db = setup_test_db().await?;
        let tax = create_test_tax(&db, "Eco", TaxType::Environmental).await?;
        soft_delete_tax(&db, tax.id).await?;

        let result = create_test_tax(&db, "Eco", TaxType::Environmental).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateTaxName { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_tax_by_id_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_tax_by_id(&db, 42).await;
        assert!(matches!(result.unwrap_err(), Error::TaxNotFound { id: 42 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_tax_partial_patch() -> Result<()> {
        let db = setup_test_db().await?;
        let tax = create_test_tax(&db, "Eco", TaxType::Environmental).await?;

        let updated = update_tax(
            &db,
            tax.id,
            TaxConfigPatch {
                charge_rate: Some(0.2),
                description: Some(Some("Plastic packaging".to_string())),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.charge_rate, 0.2);
        assert_eq!(updated.description.as_deref(), Some("Plastic packaging"));
        // Untouched fields keep their values
        assert_eq!(updated.name, "Eco");
        assert_eq!(updated.tax_type, TaxType::Environmental);
        assert_eq!(updated.sort_order, tax.sort_order);
        assert!(updated.updated_at >= tax.updated_at);

        // Clearing the description
        let cleared = update_tax(
            &db,
            tax.id,
            TaxConfigPatch {
                description: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert!(cleared.description.is_none());
        assert_eq!(cleared.charge_rate, 0.2);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_tax_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = update_tax(
            &db,
            1,
            TaxConfigPatch {
                charge_rate: Some(-1.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidRate { rate } if rate == -1.0));

        let result = update_tax(
            &db,
            1,
            TaxConfigPatch {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_tax_rename_collision() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_tax(&db, "VAT", TaxType::Vat).await?;
        let eco = create_test_tax(&db, "Eco", TaxType::Environmental).await?;

        let result = update_tax(
            &db,
            eco.id,
            TaxConfigPatch {
                name: Some("VAT".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateTaxName { .. }));

        // Renaming to its own name is not a collision
        let same = update_tax(
            &db,
            eco.id,
            TaxConfigPatch {
                name: Some("Eco".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(same.name, "Eco");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_or_deleted_tax() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_tax(&db, 999, TaxConfigPatch::default()).await;
        assert!(matches!(result.unwrap_err(), Error::TaxNotFound { id: 999 }));

        let tax = create_test_tax(&db, "Eco", TaxType::Environmental).await?;
        soft_delete_tax(&db, tax.id).await?;
        let result = update_tax(
            &db,
            tax.id,
            TaxConfigPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::TaxNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_tax() -> Result<()> {
        let db = setup_test_db().await?;
        let tax = create_test_tax(&db, "VAT", TaxType::Vat).await?;

        let deleted = soft_delete_tax(&db, tax.id).await?;
        assert!(deleted.is_deleted);
        assert!(deleted.deleted_at.is_some());

        // Row is still there for history
        let still_there = get_tax_by_id(&db, tax.id).await?;
        assert!(still_there.is_deleted);

        // Deleting twice fails
        let result = soft_delete_tax(&db, tax.id).await;
        assert!(matches!(result.unwrap_err(), Error::TaxNotFound { .. }));

        // Missing id fails
        let result = soft_delete_tax(&db, 12345).await;
        assert!(matches!(result.unwrap_err(), Error::TaxNotFound { id: 12345 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_active_taxes_ordering() -> Result<()> {
        let db = setup_test_db().await?;

        let mut zeta =
            NewTaxConfig::new(TaxType::Environmental, "Zeta", RateType::FixedAmount, 1.0);
        zeta.sort_order = 1;
        let mut alpha =
            NewTaxConfig::new(TaxType::Environmental, "Alpha", RateType::FixedAmount, 1.0);
        alpha.sort_order = 1;
        let mut first = NewTaxConfig::new(TaxType::Vat, "VAT", RateType::Percentage, 0.1);
        first.sort_order = 0;
        let mut inactive =
            NewTaxConfig::new(TaxType::Environmental, "Off", RateType::FixedAmount, 1.0);
        inactive.is_active = false;

        create_tax(&db, zeta).await?;
        create_tax(&db, alpha).await?;
        create_tax(&db, first).await?;
        create_tax(&db, inactive).await?;
        let deleted = create_test_tax(&db, "Gone", TaxType::Environmental).await?;
        soft_delete_tax(&db, deleted.id).await?;

        let names: Vec<String> = list_active_taxes(&db)
            .await?
            .into_iter()
            .map(|tax| tax.name)
            .collect();
        assert_eq!(names, vec!["VAT", "Alpha", "Zeta"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_taxes_filters_and_paging() -> Result<()> {
        let db = setup_test_db().await?;

        for index in 0..5 {
            let mut tax = NewTaxConfig::new(
                TaxType::Environmental,
                &format!("Eco {index}"),
                RateType::FixedAmount,
                f64::from(index),
            );
            tax.sort_order = index;
            create_tax(&db, tax).await?;
        }
        let mut vat = NewTaxConfig::new(TaxType::Vat, "VAT", RateType::Percentage, 0.1);
        vat.description = Some("Value added tax".to_string());
        vat.sort_order = 10;
        let vat = create_tax(&db, vat).await?;
        let deleted = create_test_tax(&db, "Retired", TaxType::Environmental).await?;
        soft_delete_tax(&db, deleted.id).await?;

        // Defaults: deleted hidden, page 1 of size 10
        let page = list_taxes(&db, &TaxQuery::default()).await?;
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 6);
        assert_eq!(page.items[0].name, "Eco 0");

        // Paging
        let page = list_taxes(
            &db,
            &TaxQuery {
                page: Some(2),
                page_size: Some(4),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id, vat.id);

        // Type filter
        let page = list_taxes(
            &db,
            &TaxQuery {
                filter: TaxFilter {
                    tax_types: vec![TaxType::Vat],
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 1);

        // Text search hits the description
        let page = list_taxes(
            &db,
            &TaxQuery {
                filter: TaxFilter {
                    query: Some("added".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "VAT");

        // Include deleted, sorted by rate descending
        let page = list_taxes(
            &db,
            &TaxQuery {
                filter: TaxFilter {
                    include_deleted: true,
                    ..Default::default()
                },
                order_by: vec![(TaxSortField::ChargeRate, SortDirection::Desc)],
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 7);
        assert_eq!(page.items[0].name, "Eco 4");

        Ok(())
    }

    #[tokio::test]
    async fn test_list_taxes_rejects_bad_paging() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = list_taxes(
            &db,
            &TaxQuery {
                page: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = list_taxes(
            &db,
            &TaxQuery {
                page_size: Some(MAX_PAGE_SIZE + 1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }
}
