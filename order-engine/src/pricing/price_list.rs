//! Configured price per kilogram for each material
//!
//! Values come from configuration (see [`crate::core::Config`]). A material
//! without a price cannot be priced.

use rust_decimal::Decimal;
use shared::models::Material;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceList {
    per_kg: HashMap<Material, Decimal>,
}

impl PriceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price per kilogram of a material
    pub fn with_price(mut self, material: Material, price_per_kg: Decimal) -> Self {
        self.per_kg.insert(material, price_per_kg);
        self
    }

    pub fn set_price(&mut self, material: Material, price_per_kg: Decimal) {
        self.per_kg.insert(material, price_per_kg);
    }

    pub fn price_for(&self, material: Material) -> Option<Decimal> {
        self.per_kg.get(&material).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.per_kg.is_empty()
    }
}
