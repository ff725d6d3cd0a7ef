//! Orders ("Pedidos") line-item workflow
//!
//! - **lines**: product catalog, line pricing and the shared list rules
//! - **session**: staged-edit state machine over a committed order
//! - **draft**: line list of a new order and its validation
//! - **manager**: async workflow over an [`OrderStore`](crate::store::OrderStore)
//!
//! # Data Flow
//!
//! 1. User picks a product and a quantity
//! 2. [`LinePricer`] prices the line from the product dimensions
//! 3. The line is added to the staged (or draft) list
//! 4. On save, totals are recomputed and written through the store
//! 5. The committed list changes only after the store confirms

pub mod draft;
pub mod error;
pub mod lines;
pub mod manager;
pub mod session;

pub use draft::{OrderDraft, ValidatedOrder};
pub use error::{OrderError, OrderResult, ValidationError};
pub use lines::{LinePricer, ProductCatalog};
pub use manager::{CreatedOrder, OrdersManager};
pub use session::{CommitPlan, EditMode, EditSession, Order};
