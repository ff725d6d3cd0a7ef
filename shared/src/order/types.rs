//! Shared types for orders (sales notes)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Line Items
// ============================================================================

/// One product line inside an order
///
/// Prices are derived by the pricing engine, never typed in by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product reference
    pub product_id: i64,
    /// Product name at the time the line was entered
    pub display_name: String,
    /// Millares for CELOFAN, kilograms for POLIETILENO
    pub quantity: Decimal,
    pub unit_price_ex_vat: Decimal,
    pub unit_price_inc_vat: Decimal,
    /// `unit_price_inc_vat * quantity`, rounded to 2 dp
    pub line_subtotal: Decimal,
    /// Kilograms per thousand sheets (informational, CELOFAN only)
    #[serde(default)]
    pub weight_per_thousand: Decimal,
}

// ============================================================================
// Order Header
// ============================================================================

/// Order-level totals, recomputed on every line mutation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line subtotals
    pub subtotal: Decimal,
    /// `subtotal * vat_rate`
    pub vat: Decimal,
    /// `subtotal + vat - discount`
    pub total: Decimal,
}

/// Persisted sales note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub id: i64,
    pub date: NaiveDate,
    pub client_id: i64,
    pub seller_id: i64,
    /// Subtracted after tax
    #[serde(default)]
    pub discount: Decimal,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Sales note about to be inserted (no id yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub date: NaiveDate,
    pub client_id: i64,
    pub seller_id: i64,
    pub discount: Decimal,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

impl NewOrder {
    /// Attach the id assigned by the store
    pub fn into_header(self, id: i64) -> OrderHeader {
        OrderHeader {
            id,
            date: self.date,
            client_id: self.client_id,
            seller_id: self.seller_id,
            discount: self.discount,
            totals: self.totals,
        }
    }
}

// ============================================================================
// Payments
// ============================================================================

/// Partial payment (abono) recorded against an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
}

// ============================================================================
// Input Types
// ============================================================================

/// Header fields of the "new order" form
///
/// Required fields are optional here so that a half-filled form can be
/// represented and rejected with a precise validation error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderForm {
    pub date: Option<NaiveDate>,
    pub client_id: Option<i64>,
    pub seller_id: Option<i64>,
    #[serde(default)]
    pub discount: Decimal,
    /// Deposit paid when the order is created
    #[serde(default)]
    pub abono: Decimal,
}
