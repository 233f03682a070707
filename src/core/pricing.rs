//! Order pricing adapter - selects the rules that apply to an order line, runs the
//! resolver and stores the resulting tax lines against the order.

use crate::{
    core::{
        compatibility,
        lookup::EntityLookup,
        resolver::{TaxBreakdown, resolve_taxes, to_f64},
        tax::list_active_taxes,
    },
    entities::{
        EntityTaxConfig, EntityType, OrderTax, Product, TaxType, entity_tax_config, order_tax,
        product, tax_config,
    },
    errors::{Error, Result},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// The catalog entities an order line belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityScope {
    /// Zone the order is served in
    pub zone_id: Option<i64>,
    /// Product being sold
    pub product_id: Option<i64>,
    /// Derived from the product when not given
    pub category_id: Option<i64>,
    /// Units for fixed-amount rules, defaults to 1
    pub quantity: Option<i32>,
}

/// Live entities of `scope`. Deleted or unknown ids are dropped so their leftover
/// bindings never match.
async fn scope_targets(
    db: &DatabaseConnection,
    scope: &EntityScope,
) -> Result<Vec<(EntityType, i64)>> {
    let mut category_id = scope.category_id;
    if category_id.is_none() {
        if let Some(product_id) = scope.product_id {
            category_id = Product::find_by_id(product_id)
                .filter(product::Column::IsDeleted.eq(false))
                .one(db)
                .await?
                .and_then(|product| product.category_id);
        }
    }

    let candidates = [
        scope.zone_id.map(|id| (EntityType::Zone, id)),
        scope.product_id.map(|id| (EntityType::Product, id)),
        category_id.map(|id| (EntityType::Category, id)),
    ];

    let mut targets = Vec::with_capacity(candidates.len());
    for (entity_type, entity_id) in candidates.into_iter().flatten() {
        if EntityLookup::find(db, entity_type, entity_id).await?.is_some() {
            targets.push((entity_type, entity_id));
        }
    }
    Ok(targets)
}

/// Active, non-deleted rules applying to `scope`, in `sort_order`/name order.
///
/// VAT always applies. Any other rule applies only when one of its active bindings
/// targets an entity of the scope and is still compatible with the rule's current type.
pub async fn applicable_taxes(
    db: &DatabaseConnection,
    scope: &EntityScope,
) -> Result<Vec<tax_config::Model>> {
    let rules = list_active_taxes(db).await?;
    if rules.is_empty() {
        return Ok(rules);
    }

    let rule_ids: Vec<i64> = rules.iter().map(|rule| rule.id).collect();
    let bindings = EntityTaxConfig::find()
        .filter(entity_tax_config::Column::TaxId.is_in(rule_ids))
        .all(db)
        .await?;
    let mut bindings_by_tax: HashMap<i64, Vec<entity_tax_config::Model>> = HashMap::new();
    for binding in bindings {
        bindings_by_tax
            .entry(binding.tax_id)
            .or_default()
            .push(binding);
    }

    let targets = scope_targets(db, scope).await?;

    Ok(rules
        .into_iter()
        .filter(|rule| {
            if rule.tax_type == TaxType::Vat {
                return true;
            }
            bindings_by_tax.get(&rule.id).is_some_and(|bindings| {
                bindings.iter().any(|binding| {
                    binding.is_active
                        && targets.contains(&(binding.entity_type, binding.entity_id))
                        && compatibility::is_compatible(rule.tax_type, binding.entity_type)
                })
            })
        })
        .collect())
}

/// Computes the taxes for one order line of `taxable_base` within `scope`.
///
/// # Errors
/// Returns an error if the base is negative, the quantity is below 1, a tax amount
/// overflows, or the store fails.
#[instrument(skip(db))]
pub async fn compute_applicable_taxes(
    db: &DatabaseConnection,
    taxable_base: Decimal,
    scope: &EntityScope,
) -> Result<TaxBreakdown> {
    if taxable_base < Decimal::ZERO {
        return Err(Error::InvalidTaxableBase {
            amount: taxable_base,
        });
    }
    if let Some(quantity) = scope.quantity.filter(|quantity| *quantity < 1) {
        return Err(Error::Validation {
            message: format!("Quantity must be at least 1, got {quantity}"),
        });
    }

    let rules = applicable_taxes(db, scope).await?;
    let breakdown = resolve_taxes(&rules, taxable_base, scope.quantity)?;
    debug!(
        lines = breakdown.lines.len(),
        total_tax = %breakdown.total_tax,
        "Computed applicable taxes"
    );
    Ok(breakdown)
}

/// Stores every line of `breakdown` against an order, all or nothing.
///
/// Name and rate are copied from the line, so later edits to the rule leave the stored
/// history alone. Amounts are rounded to 2 decimal places.
#[instrument(skip(db, breakdown), fields(lines = breakdown.lines.len()))]
pub async fn record_order_taxes(
    db: &DatabaseConnection,
    order_id: i64,
    order_item_id: Option<i64>,
    breakdown: &TaxBreakdown,
) -> Result<Vec<order_tax::Model>> {
    let txn = db.begin().await?;

    let now = chrono::Utc::now().naive_utc();
    let mut recorded = Vec::with_capacity(breakdown.lines.len());
    for line in &breakdown.lines {
        let order_tax = order_tax::ActiveModel {
            tax_id: Set(line.tax_id),
            order_id: Set(order_id),
            order_item_id: Set(order_item_id),
            tax_name: Set(line.tax_name.clone()),
            tax_rate: Set(line.rate_snapshot.to_f64().unwrap_or_default()),
            taxable_base: Set(to_f64(line.taxable_base)),
            tax_amount: Set(to_f64(line.tax_amount)),
            quantity: Set(line.quantity),
            created_at: Set(now),
            ..Default::default()
        };
        recorded.push(order_tax.insert(&txn).await?);
    }

    txn.commit().await?;

    info!(order_id, "Recorded {} order tax lines", recorded.len());
    Ok(recorded)
}

/// Stored tax lines of an order in the order they were written.
pub async fn get_order_taxes(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<order_tax::Model>> {
    OrderTax::find()
        .filter(order_tax::Column::OrderId.eq(order_id))
        .order_by_asc(order_tax::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
