//! Ordered tax computation.
//!
//! Pure functions over already-selected rules: no store access. Money is computed in
//! [`Decimal`] with checked arithmetic and only converted back to `f64` when it is
//! persisted.

use crate::{
    entities::{RateType, TaxType, tax_config},
    errors::{Error, Result},
};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// Stored money precision
const DECIMAL_PLACES: u32 = 2;

/// Converts a stored rate to `Decimal`.
///
/// # Errors
/// Returns `InvalidRate` for NaN, infinities and values outside the `Decimal` range.
pub fn to_decimal(rate: f64) -> Result<Decimal> {
    Decimal::from_f64(rate).ok_or(Error::InvalidRate { rate })
}

/// Converts back to `f64` for storage, rounded to 2 places, half away from zero.
#[inline]
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// One applied rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxLine {
    /// Rule that produced the line
    pub tax_id: i64,
    /// Rule name at computation time
    pub tax_name: String,
    /// Rule type at computation time
    pub tax_type: TaxType,
    /// How `rate_snapshot` was applied
    pub rate_type: RateType,
    /// Charge rate at computation time
    pub rate_snapshot: Decimal,
    /// Amount a percentage rate was applied to
    pub taxable_base: Decimal,
    /// Units charged, fixed-amount rules only
    pub quantity: Option<i32>,
    /// Computed tax, unrounded
    pub tax_amount: Decimal,
    /// Already contained in the price; not part of `total_tax`
    pub is_included: bool,
}

/// Result of [`resolve_taxes`], lines in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    /// Applied rules in application order
    pub lines: Vec<TaxLine>,
    /// Tax payable on top of the base
    pub total_tax: Decimal,
    /// Tax already contained in the base
    pub included_tax: Decimal,
}

impl TaxBreakdown {
    /// Base plus payable tax, `None` on overflow.
    #[must_use]
    pub fn total_with_tax(&self, taxable_base: Decimal) -> Option<Decimal> {
        taxable_base.checked_add(self.total_tax)
    }

    fn push(&mut self, line: TaxLine) -> Result<()> {
        let total = if line.is_included {
            &mut self.included_tax
        } else {
            &mut self.total_tax
        };
        *total = total
            .checked_add(line.tax_amount)
            .ok_or_else(|| Error::AmountOutOfRange {
                tax_name: line.tax_name.clone(),
            })?;
        self.lines.push(line);
        Ok(())
    }
}

fn application_order(a: &tax_config::Model, b: &tax_config::Model) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

fn apply(rule: &tax_config::Model, base: Decimal, quantity: Option<i32>) -> Result<TaxLine> {
    let rate = to_decimal(rule.charge_rate)?;
    let out_of_range = || Error::AmountOutOfRange {
        tax_name: rule.name.clone(),
    };
    let (tax_amount, quantity) = match rule.rate_type {
        RateType::Percentage => (base.checked_mul(rate).ok_or_else(out_of_range)?, None),
        RateType::FixedAmount => {
            let units = quantity.unwrap_or(1);
            let amount = rate
                .checked_mul(Decimal::from(units))
                .ok_or_else(out_of_range)?;
            (amount, Some(units))
        }
    };

    Ok(TaxLine {
        tax_id: rule.id,
        tax_name: rule.name.clone(),
        tax_type: rule.tax_type,
        rate_type: rule.rate_type,
        rate_snapshot: rate,
        taxable_base: base,
        quantity,
        tax_amount,
        is_included: rule.is_included,
    })
}

/// Applies `rules` to `taxable_base`.
///
/// Before-VAT rules (`apply_after_vat == false`) come first and are all computed on
/// the original base. After-VAT rules are computed on the base plus every payable
/// before-VAT amount. Within each group rules run by `sort_order`, then name, then id.
/// Fixed-amount rules charge their rate once per unit of `quantity` (default 1).
///
/// # Errors
/// Returns `InvalidRate` for a rate `Decimal` cannot hold and `AmountOutOfRange` when
/// an amount or total overflows.
pub fn resolve_taxes(
    rules: &[tax_config::Model],
    taxable_base: Decimal,
    quantity: Option<i32>,
) -> Result<TaxBreakdown> {
    let (mut before_vat, mut after_vat): (Vec<&tax_config::Model>, Vec<&tax_config::Model>) =
        rules.iter().partition(|rule| !rule.apply_after_vat);
    before_vat.sort_by(|a, b| application_order(a, b));
    after_vat.sort_by(|a, b| application_order(a, b));

    let mut breakdown = TaxBreakdown::default();
    let mut compounded_base = taxable_base;
    for rule in before_vat {
        let line = apply(rule, taxable_base, quantity)?;
        if !line.is_included {
            compounded_base = compounded_base
                .checked_add(line.tax_amount)
                .ok_or_else(|| Error::AmountOutOfRange {
                    tax_name: line.tax_name.clone(),
                })?;
        }
        breakdown.push(line)?;
    }
    for rule in after_vat {
        breakdown.push(apply(rule, compounded_base, quantity)?)?;
    }

    Ok(breakdown)
}
