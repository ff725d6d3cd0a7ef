//! Line list operations shared by edit sessions and new-order drafts

use super::error::ValidationError;
use crate::order_money::{MAX_AMOUNT, MAX_DIMENSION, MAX_QUANTITY};
use crate::pricing::{PriceList, VatPolicy, compute_weight_per_thousand, try_line_price};
use rust_decimal::Decimal;
use shared::models::{Material, ProductSpec};
use shared::order::LineItem;
use std::collections::HashMap;

/// Products available for selection, keyed by id
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<i64, ProductSpec>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = ProductSpec>) -> Self {
        products.into_iter().collect()
    }

    pub fn get(&self, product_id: i64) -> Option<&ProductSpec> {
        self.products.get(&product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products of one material, sorted by name
    pub fn by_material(&self, material: Material) -> Vec<&ProductSpec> {
        let mut products: Vec<_> = self
            .products
            .values()
            .filter(|p| p.material == material)
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }
}

impl FromIterator<ProductSpec> for ProductCatalog {
    fn from_iter<I: IntoIterator<Item = ProductSpec>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

/// Everything needed to turn a product selection into a priced line
#[derive(Debug, Clone, Copy)]
pub struct LinePricer<'a> {
    pub catalog: &'a ProductCatalog,
    pub prices: &'a PriceList,
    pub vat: VatPolicy,
}

impl<'a> LinePricer<'a> {
    pub fn new(catalog: &'a ProductCatalog, prices: &'a PriceList, vat: VatPolicy) -> Self {
        Self {
            catalog,
            prices,
            vat,
        }
    }

    /// Build a priced line for a product selection
    ///
    /// Quantity, dimensions and price per kilogram are checked against the
    /// `MAX_*` limits before any arithmetic.
    pub fn price(&self, product_id: i64, quantity: Decimal) -> Result<LineItem, ValidationError> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }
        if quantity > MAX_QUANTITY {
            return Err(ValidationError::QuantityTooLarge {
                value: quantity,
                max: MAX_QUANTITY,
            });
        }
        let spec = self
            .catalog
            .get(product_id)
            .ok_or(ValidationError::UnknownProduct(product_id))?;
        if [spec.width(), spec.length(), spec.gauge()]
            .iter()
            .any(|d| *d > MAX_DIMENSION)
        {
            return Err(ValidationError::DimensionsOutOfRange {
                product_id,
                max: MAX_DIMENSION,
            });
        }
        let price_per_kg = self
            .prices
            .price_for(spec.material)
            .ok_or(ValidationError::PriceNotConfigured(spec.material))?;
        if price_per_kg > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge {
                field: "price_per_kg",
                value: price_per_kg,
                max: MAX_AMOUNT,
            });
        }

        let price = try_line_price(Some(spec), quantity, price_per_kg, self.vat)
            .ok_or(ValidationError::Overflow("line price"))?;

        Ok(LineItem {
            product_id,
            display_name: spec.name.clone(),
            quantity,
            unit_price_ex_vat: price.unit_price_ex_vat,
            unit_price_inc_vat: price.unit_price_inc_vat,
            line_subtotal: price.line_subtotal,
            weight_per_thousand: compute_weight_per_thousand(spec),
        })
    }
}

/// Mark a line for modification by the next upsert
pub(crate) fn select_line(
    lines: &[LineItem],
    editing_index: &mut Option<usize>,
    index: usize,
) -> Result<(), ValidationError> {
    if index >= lines.len() {
        return Err(ValidationError::LineIndexOutOfRange {
            index,
            len: lines.len(),
        });
    }
    *editing_index = Some(index);
    Ok(())
}

/// Replace the selected line, or append a new one
///
/// A product may appear only once: when replacing, only the other lines
/// are checked. Nothing changes on error.
pub(crate) fn upsert_line(
    lines: &mut Vec<LineItem>,
    editing_index: &mut Option<usize>,
    line: LineItem,
) -> Result<(), ValidationError> {
    match *editing_index {
        Some(index) if index < lines.len() => {
            let duplicate = lines
                .iter()
                .enumerate()
                .any(|(i, l)| i != index && l.product_id == line.product_id);
            if duplicate {
                return Err(ValidationError::DuplicateProduct(line.product_id));
            }
            lines[index] = line;
        }
        _ => {
            if lines.iter().any(|l| l.product_id == line.product_id) {
                return Err(ValidationError::DuplicateProduct(line.product_id));
            }
            lines.push(line);
        }
    }
    *editing_index = None;
    Ok(())
}

/// Remove a line, keeping the selection pointed at the same line
pub(crate) fn remove_line(
    lines: &mut Vec<LineItem>,
    editing_index: &mut Option<usize>,
    index: usize,
) -> Result<LineItem, ValidationError> {
    if index >= lines.len() {
        return Err(ValidationError::LineIndexOutOfRange {
            index,
            len: lines.len(),
        });
    }
    let removed = lines.remove(index);
    *editing_index = match *editing_index {
        Some(selected) if selected == index => None,
        Some(selected) if selected > index => Some(selected - 1),
        other => other,
    };
    Ok(removed)
}
