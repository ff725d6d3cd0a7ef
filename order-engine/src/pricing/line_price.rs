//! Line item price calculation

use super::calculator::try_unit_price;
use crate::order_money::{DEFAULT_VAT_RATE, round_money};
use rust_decimal::prelude::*;
use shared::models::{Material, ProductSpec};

/// How VAT is applied to line prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VatPolicy {
    /// VAT rate as a fraction (0.16 = 16%)
    pub rate: Decimal,
    /// Whether unit prices are shown VAT-inclusive
    pub apply: bool,
}

impl Default for VatPolicy {
    fn default() -> Self {
        Self {
            rate: DEFAULT_VAT_RATE,
            apply: true,
        }
    }
}

impl VatPolicy {
    pub fn new(rate: Decimal, apply: bool) -> Self {
        Self { rate, apply }
    }
}

/// Derived prices for one line, each rounded to 2 dp
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinePrice {
    pub unit_price_ex_vat: Decimal,
    pub unit_price_inc_vat: Decimal,
    pub line_subtotal: Decimal,
}

/// Calculate the prices of a line item, `None` on overflow
///
/// - CELOFAN: unit price from the geometric formulas
/// - POLIETILENO: the price per kilogram itself
///
/// An unresolved product (`None`) or a non-positive quantity yields all
/// zeros.
pub fn try_line_price(
    spec: Option<&ProductSpec>,
    quantity: Decimal,
    price_per_kg: Decimal,
    vat: VatPolicy,
) -> Option<LinePrice> {
    let Some(spec) = spec else {
        return Some(LinePrice::default());
    };
    if quantity <= Decimal::ZERO {
        return Some(LinePrice::default());
    }

    let unit = match spec.material {
        Material::Celofan => try_unit_price(spec, price_per_kg)?,
        Material::Polietileno => price_per_kg.max(Decimal::ZERO),
    };

    let unit_price_ex_vat = round_money(unit);
    let unit_price_inc_vat = if vat.apply {
        round_money(unit_price_ex_vat.checked_mul(Decimal::ONE.checked_add(vat.rate)?)?)
    } else {
        unit_price_ex_vat
    };
    let line_subtotal = round_money(unit_price_inc_vat.checked_mul(quantity)?);

    Some(LinePrice {
        unit_price_ex_vat,
        unit_price_inc_vat,
        line_subtotal,
    })
}

/// Calculate the prices of a line item
///
/// Same as [`try_line_price`] but an overflow also yields all zeros. This
/// never fails; rejecting the action is the caller's job.
pub fn compute_line_price(
    spec: Option<&ProductSpec>,
    quantity: Decimal,
    price_per_kg: Decimal,
    vat: VatPolicy,
) -> LinePrice {
    try_line_price(spec, quantity, price_per_kg, vat).unwrap_or_default()
}
