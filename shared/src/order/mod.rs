//! Order value types
//!
//! - Line items attached to a sales note
//! - Sales note header and its derived totals
//! - Payments (abonos) recorded against an order
//! - The form a new order is created from

pub mod types;

// Re-exports
pub use types::*;
