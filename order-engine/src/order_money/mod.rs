//! Money calculation utilities using rust_decimal for precision
//!
//! Order-level aggregation lives here: subtotal, VAT, total and amount due
//! are recomputed from line items on every mutation. All arithmetic is done
//! in `Decimal`; stored values are rounded to 2 decimal places, half away
//! from zero.
//!
//! Inputs are bounded by the `MAX_*` limits before they reach the formulas.
//! The `try_*` functions use checked arithmetic and return `None` on
//! overflow; their plain counterparts return zero instead of panicking.

use rust_decimal::prelude::*;
use shared::order::{LineItem, OrderTotals, PaymentRecord};

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Default VAT rate (16%)
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum quantity per line (thousands of sheets or kilograms)
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Maximum product width, length (cm) or gauge (microns)
pub const MAX_DIMENSION: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Maximum price per kilogram, discount, abono or payment amount
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Round a monetary value to 2 decimal places
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Sum of line subtotals, `None` on overflow
pub fn try_sum_line_subtotals(lines: &[LineItem]) -> Option<Decimal> {
    checked_sum(lines.iter().map(|l| l.line_subtotal))
}

/// Sum of line subtotals (zero on overflow)
pub fn sum_line_subtotals(lines: &[LineItem]) -> Decimal {
    try_sum_line_subtotals(lines).unwrap_or(Decimal::ZERO)
}

/// Recalculate order totals from line items, `None` on overflow
///
/// - subtotal = Σ line_subtotal
/// - vat = subtotal × vat_rate
/// - total = subtotal + vat − discount
///
/// The total is not clamped; callers reject a non-positive total.
pub fn try_calculate_totals(
    lines: &[LineItem],
    discount: Decimal,
    vat_rate: Decimal,
) -> Option<OrderTotals> {
    let subtotal = round_money(try_sum_line_subtotals(lines)?);
    let vat = round_money(subtotal.checked_mul(vat_rate)?);
    let total = round_money(subtotal.checked_add(vat)?.checked_sub(discount)?);

    Some(OrderTotals {
        subtotal,
        vat,
        total,
    })
}

/// Recalculate order totals for display (all zeros on overflow)
pub fn calculate_totals(lines: &[LineItem], discount: Decimal, vat_rate: Decimal) -> OrderTotals {
    try_calculate_totals(lines, discount, vat_rate).unwrap_or_default()
}

/// Sum payment amounts (zero on overflow)
pub fn sum_payments(payments: &[PaymentRecord]) -> Decimal {
    checked_sum(payments.iter().map(|p| p.amount))
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

/// Outstanding balance: total − Σ payments (zero on overflow)
pub fn amount_due(totals: &OrderTotals, payments: &[PaymentRecord]) -> Decimal {
    totals
        .total
        .checked_sub(sum_payments(payments))
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() < MONEY_TOLERANCE)
}

/// Format an amount for display: `$1,234.57` (es-MX grouping)
///
/// Presentation only; stored values keep full precision.
pub fn format_money(value: Decimal) -> String {
    let rounded = round_money(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}
