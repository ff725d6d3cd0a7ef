//! Shared types for the packaging order system
//!
//! Domain value types used by the order engine and its store clients,
//! plus the unified error code system.

pub mod error;
pub mod models;
pub mod order;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{ManufacturingType, Material, ProductSpec};
pub use order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};
pub use serde::{Deserialize, Serialize};
