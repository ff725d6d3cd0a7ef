//! Order store abstraction
//!
//! The engine only needs a handful of row-oriented operations from the
//! backing data store. Implementations:
//!
//! - [`RedbOrderStore`]: embedded redb database, real write transactions
//! - [`MemoryOrderStore`]: in-process maps with failure injection
//!
//! A hosted REST backend lives in the `order-client` crate.
//!
//! The two composite operations, [`OrderStore::commit_line_items`] and
//! [`OrderStore::create_order`], have sequential default implementations
//! for stores without transactions. `create_order` compensates a failed
//! line-item or payment insert by deleting the orphaned header.

pub mod embedded;
pub mod memory;

pub use embedded::RedbOrderStore;
pub use memory::{FailPoint, MemoryOrderStore};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{Material, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Backend rejected the request; carries its raw error text
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Background task failed: {0}")]
    Task(String),

    /// Order header persisted but a later step failed and the compensating
    /// delete failed too
    #[error("Order {order_id} saved without its line items: {cause}")]
    PartialCommit {
        order_id: i64,
        cause: Box<StoreError>,
        cleanup: Box<StoreError>,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-oriented operations the order engine requires of its data store
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Catalog, optionally scoped to one material
    async fn fetch_products(&self, material: Option<Material>) -> StoreResult<Vec<ProductSpec>>;

    async fn fetch_order(&self, order_id: i64) -> StoreResult<Option<OrderHeader>>;

    /// Line items of an order, in insertion order
    async fn fetch_order_line_items(&self, order_id: i64) -> StoreResult<Vec<LineItem>>;

    async fn fetch_payments(&self, order_id: i64) -> StoreResult<Vec<PaymentRecord>>;

    /// Delete-then-insert of all line items of an order
    async fn replace_order_line_items(&self, order_id: i64, lines: &[LineItem]) -> StoreResult<()>;

    async fn update_order_totals(&self, order_id: i64, totals: &OrderTotals) -> StoreResult<()>;

    /// Insert a sales note header, returning its new id
    async fn insert_order(&self, order: &NewOrder) -> StoreResult<i64>;

    async fn insert_payment(&self, order_id: i64, amount: Decimal, date: NaiveDate) -> StoreResult<()>;

    /// Remove an order with its line items and payments
    async fn delete_order(&self, order_id: i64) -> StoreResult<()>;

    /// Replace the line items and update the totals as one logical unit
    async fn commit_line_items(
        &self,
        order_id: i64,
        lines: &[LineItem],
        totals: &OrderTotals,
    ) -> StoreResult<()> {
        self.replace_order_line_items(order_id, lines).await?;
        self.update_order_totals(order_id, totals).await
    }

    /// Insert header, line items and optional deposit as one logical unit
    ///
    /// If a step after the header insert fails, the header is deleted
    /// again. The original failure is returned; if the delete fails too,
    /// [`StoreError::PartialCommit`] is returned instead.
    async fn create_order(
        &self,
        order: &NewOrder,
        lines: &[LineItem],
        abono: Option<Decimal>,
    ) -> StoreResult<i64> {
        let order_id = self.insert_order(order).await?;

        let rest = async {
            self.replace_order_line_items(order_id, lines).await?;
            if let Some(amount) = abono {
                self.insert_payment(order_id, amount, order.date).await?;
            }
            Ok::<(), StoreError>(())
        };

        if let Err(cause) = rest.await {
            tracing::warn!(order_id, error = %cause, "Order creation failed after header insert, removing header");
            return match self.delete_order(order_id).await {
                Ok(()) => Err(cause),
                Err(cleanup) => {
                    tracing::error!(order_id, error = %cleanup, "Compensating delete failed");
                    Err(StoreError::PartialCommit {
                        order_id,
                        cause: Box::new(cause),
                        cleanup: Box::new(cleanup),
                    })
                }
            };
        }

        Ok(order_id)
    }
}
