//! In-process order store
//!
//! Keeps everything in maps behind a mutex. Operations can be made to fail
//! on demand with [`FailPoint`], which is how the sequential commit and
//! compensation paths are exercised.

use super::{OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{Material, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};
use std::collections::{BTreeMap, HashSet};

/// Store operation that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    FetchProducts,
    FetchOrder,
    ReplaceLineItems,
    UpdateTotals,
    InsertOrder,
    InsertPayment,
    DeleteOrder,
}

#[derive(Debug, Default)]
struct Inner {
    products: BTreeMap<i64, ProductSpec>,
    orders: BTreeMap<i64, OrderHeader>,
    line_items: BTreeMap<i64, Vec<LineItem>>,
    payments: BTreeMap<i64, Vec<PaymentRecord>>,
    next_order_id: i64,
    failures: HashSet<FailPoint>,
}

impl Inner {
    fn check(&self, point: FailPoint) -> StoreResult<()> {
        if self.failures.contains(&point) {
            return Err(StoreError::Backend(format!("injected failure: {:?}", point)));
        }
        Ok(())
    }
}

/// Order store held in memory
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a catalog
    pub fn with_products(products: impl IntoIterator<Item = ProductSpec>) -> Self {
        let store = Self::new();
        for product in products {
            store.put_product(product);
        }
        store
    }

    pub fn put_product(&self, product: ProductSpec) {
        self.inner.lock().products.insert(product.id, product);
    }

    /// Make an operation fail until [`Self::clear_failures`] is called
    pub fn fail_on(&self, point: FailPoint) {
        self.inner.lock().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn fetch_products(&self, material: Option<Material>) -> StoreResult<Vec<ProductSpec>> {
        let inner = self.inner.lock();
        inner.check(FailPoint::FetchProducts)?;
        Ok(inner
            .products
            .values()
            .filter(|p| material.is_none_or(|m| m == p.material))
            .cloned()
            .collect())
    }

    async fn fetch_order(&self, order_id: i64) -> StoreResult<Option<OrderHeader>> {
        let inner = self.inner.lock();
        inner.check(FailPoint::FetchOrder)?;
        Ok(inner.orders.get(&order_id).cloned())
    }

    async fn fetch_order_line_items(&self, order_id: i64) -> StoreResult<Vec<LineItem>> {
        let inner = self.inner.lock();
        inner.check(FailPoint::FetchOrder)?;
        Ok(inner.line_items.get(&order_id).cloned().unwrap_or_default())
    }

    async fn fetch_payments(&self, order_id: i64) -> StoreResult<Vec<PaymentRecord>> {
        let inner = self.inner.lock();
        inner.check(FailPoint::FetchOrder)?;
        Ok(inner.payments.get(&order_id).cloned().unwrap_or_default())
    }

    async fn replace_order_line_items(&self, order_id: i64, lines: &[LineItem]) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::ReplaceLineItems)?;
        if !inner.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        inner.line_items.insert(order_id, lines.to_vec());
        Ok(())
    }

    async fn update_order_totals(&self, order_id: i64, totals: &OrderTotals) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::UpdateTotals)?;
        let header = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        header.totals = *totals;
        Ok(())
    }

    async fn insert_order(&self, order: &NewOrder) -> StoreResult<i64> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::InsertOrder)?;
        inner.next_order_id += 1;
        let order_id = inner.next_order_id;
        inner.orders.insert(order_id, order.clone().into_header(order_id));
        Ok(order_id)
    }

    async fn insert_payment(&self, order_id: i64, amount: Decimal, date: NaiveDate) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::InsertPayment)?;
        if !inner.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        inner.payments.entry(order_id).or_default().push(PaymentRecord {
            order_id,
            amount,
            date,
        });
        Ok(())
    }

    async fn delete_order(&self, order_id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::DeleteOrder)?;
        inner.orders.remove(&order_id);
        inner.line_items.remove(&order_id);
        inner.payments.remove(&order_id);
        Ok(())
    }
}
