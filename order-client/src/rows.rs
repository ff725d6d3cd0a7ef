//! Backend row shapes and their mapping to domain types

use crate::{ClientError, ClientResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{ManufacturingType, Material, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub nombre: String,
    pub material: String,
    #[serde(default)]
    pub tipo_fabricacion: Option<String>,
    #[serde(default)]
    pub ancho: Option<Decimal>,
    #[serde(default)]
    pub largo: Option<Decimal>,
    #[serde(default)]
    pub micraje: Option<Decimal>,
}

impl TryFrom<ProductRow> for ProductSpec {
    type Error = ClientError;

    fn try_from(row: ProductRow) -> ClientResult<Self> {
        let material: Material = row.material.parse().map_err(|e| {
            ClientError::InvalidResponse(format!("product {}: {}", row.id, e))
        })?;
        Ok(ProductSpec {
            id: row.id,
            name: row.nombre,
            material,
            manufacturing_type: row.tipo_fabricacion.as_deref().and_then(ManufacturingType::parse),
            width_cm: row.ancho,
            length_cm: row.largo,
            gauge_microns: row.micraje,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LineItemRow {
    pub pedido_id: i64,
    pub producto_id: i64,
    pub nombre: String,
    pub cantidad: Decimal,
    pub precio_sin_iva: Decimal,
    pub precio_con_iva: Decimal,
    pub subtotal: Decimal,
    #[serde(default)]
    pub peso_millar: Decimal,
}

impl LineItemRow {
    pub fn from_line(order_id: i64, line: &LineItem) -> Self {
        Self {
            pedido_id: order_id,
            producto_id: line.product_id,
            nombre: line.display_name.clone(),
            cantidad: line.quantity,
            precio_sin_iva: line.unit_price_ex_vat,
            precio_con_iva: line.unit_price_inc_vat,
            subtotal: line.line_subtotal,
            peso_millar: line.weight_per_thousand,
        }
    }
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        LineItem {
            product_id: row.producto_id,
            display_name: row.nombre,
            quantity: row.cantidad,
            unit_price_ex_vat: row.precio_sin_iva,
            unit_price_inc_vat: row.precio_con_iva,
            line_subtotal: row.subtotal,
            weight_per_thousand: row.peso_millar,
        }
    }
}

/// Totals columns, also the body of a totals update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TotalsRow {
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
}

impl From<&OrderTotals> for TotalsRow {
    fn from(totals: &OrderTotals) -> Self {
        Self {
            subtotal: totals.subtotal,
            iva: totals.vat,
            total: totals.total,
        }
    }
}

impl From<TotalsRow> for OrderTotals {
    fn from(row: TotalsRow) -> Self {
        OrderTotals {
            subtotal: row.subtotal,
            vat: row.iva,
            total: row.total,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub fecha: NaiveDate,
    pub cliente_id: i64,
    pub vendedor_id: i64,
    #[serde(default)]
    pub descuento: Decimal,
    #[serde(flatten)]
    pub totals: TotalsRow,
}

impl From<OrderRow> for OrderHeader {
    fn from(row: OrderRow) -> Self {
        OrderHeader {
            id: row.id,
            date: row.fecha,
            client_id: row.cliente_id,
            seller_id: row.vendedor_id,
            discount: row.descuento,
            totals: row.totals.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewOrderRow {
    pub fecha: NaiveDate,
    pub cliente_id: i64,
    pub vendedor_id: i64,
    pub descuento: Decimal,
    #[serde(flatten)]
    pub totals: TotalsRow,
}

impl From<&NewOrder> for NewOrderRow {
    fn from(order: &NewOrder) -> Self {
        Self {
            fecha: order.date,
            cliente_id: order.client_id,
            vendedor_id: order.seller_id,
            descuento: order.discount,
            totals: (&order.totals).into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PaymentRow {
    pub pedido_id: i64,
    pub monto: Decimal,
    pub fecha: NaiveDate,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        PaymentRecord {
            order_id: row.pedido_id,
            amount: row.monto,
            date: row.fecha,
        }
    }
}

/// Row returned by an insert with `return=representation`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdRow {
    pub id: i64,
}
