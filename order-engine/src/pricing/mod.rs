//! Pricing Engine Module
//!
//! Pure functions mapping a product's physical specification and a price
//! per kilogram to unit prices, line prices and sheet weight.

mod calculator;
mod line_price;
mod price_list;

pub use calculator::*;
pub use line_price::*;
pub use price_list::*;
