//! Pricing rules.
//!
//! Every amount the storefront shows or stores is computed here:
//!
//! - [`unit_price`]: base price plus the surcharge of each filled-in area
//! - [`line_total`]: unit price times quantity
//! - [`cart_subtotal`]: sum of line totals
//! - [`OrderTotals::compute`]: subtotal, tax, flat shipping and grand total
//!
//! All results are rounded to whole cents, half-up.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AreaId, CustomizableArea, CustomizationError, CustomizationSet, Price};

/// Largest difference between a client-displayed total and the server total
/// that is still treated as the same amount.
pub const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest base price or area surcharge a catalog product may carry.
pub const MAX_CATALOG_PRICE: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 2);

/// Largest amount the order ledger can store (`NUMERIC(10, 2)`).
#[must_use]
pub fn max_order_amount() -> Price {
    Price::from_cents(9_999_999_999)
}

/// Tax and shipping settings applied to every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPolicy {
    /// Fraction of the subtotal charged as tax (0.07 = 7%).
    pub tax_rate: Decimal,
    /// Shipping fee charged once per order.
    pub shipping_flat: Price,
}

impl TaxPolicy {
    /// 7% tax, $5.99 shipping.
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);
    pub const DEFAULT_SHIPPING_CENTS: i64 = 599;
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Self::DEFAULT_TAX_RATE,
            shipping_flat: Price::from_cents(Self::DEFAULT_SHIPPING_CENTS),
        }
    }
}

/// Compute the price of one unit of a customized product.
///
/// The surcharge of an area is added once if the set holds a non-blank
/// value for it. Blank values never reach a [`CustomizationSet`], so every
/// entry counts.
///
/// # Errors
///
/// Returns `CustomizationError::UnknownArea` if a customization names an
/// area the product does not have, or `CustomizationError::KindMismatch` if
/// the customization kind differs from the area kind.
pub fn unit_price(
    base_price: Price,
    areas: &[CustomizableArea],
    customizations: &CustomizationSet,
) -> Result<Price, CustomizationError> {
    let by_id: HashMap<AreaId, &CustomizableArea> =
        areas.iter().map(|area| (area.id, area)).collect();

    let mut price = base_price;
    for customization in customizations {
        let area_id = customization.area_id();
        let area = by_id
            .get(&area_id)
            .ok_or(CustomizationError::UnknownArea { area_id })?;
        if area.kind != customization.kind() {
            return Err(CustomizationError::KindMismatch {
                area_id,
                expected: area.kind,
                found: customization.kind(),
            });
        }
        price = price + area.surcharge();
    }

    Ok(price.rounded())
}

/// `unit_price * quantity`, rounded to cents.
#[must_use]
pub fn line_total(unit_price: Price, quantity: u32) -> Price {
    unit_price.times(quantity)
}

/// Sum of `(unit_price, quantity)` lines.
pub fn cart_subtotal<I>(lines: I) -> Price
where
    I: IntoIterator<Item = (Price, u32)>,
{
    lines
        .into_iter()
        .map(|(unit, quantity)| line_total(unit, quantity))
        .sum()
}

/// The money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Apply tax and shipping to a subtotal.
    #[must_use]
    pub fn compute(subtotal: Price, policy: &TaxPolicy) -> Self {
        let subtotal = subtotal.rounded();
        let tax = subtotal.scaled_by(policy.tax_rate);
        let shipping = policy.shipping_flat.rounded();
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    /// Whether every amount fits the order ledger. The total bounds the rest.
    #[must_use]
    pub fn fits_ledger(&self) -> bool {
        self.total <= max_order_amount()
    }

    /// Whether a client-supplied total agrees with this one within a cent.
    #[must_use]
    pub fn matches(&self, client_total: Decimal) -> bool {
        (self.total.amount() - client_total).abs() <= TOTAL_TOLERANCE
    }
}
