//! redb-based order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `ProductSpec` | Catalog |
//! | `orders` | `order_id` | `OrderHeader` | Sales note headers |
//! | `line_items` | `(order_id, position)` | `LineItem` | Lines, in insertion order |
//! | `payments` | `(order_id, payment_seq)` | `PaymentRecord` | Abonos |
//! | `sequence_counter` | name | `u64` | Id allocation |
//!
//! Values are JSON-serialized. Composite operations (commit of an edit,
//! creation of an order) run in a single write transaction, so either all
//! of their writes land or none do.

use super::{OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use rust_decimal::Decimal;
use shared::models::{Material, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};
use std::path::Path;
use std::sync::Arc;

const PRODUCTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("products");

const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

const LINE_ITEMS_TABLE: TableDefinition<(i64, u32), &[u8]> = TableDefinition::new("line_items");

const PAYMENTS_TABLE: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("payments");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const ORDER_SEQ_KEY: &str = "order";
const PAYMENT_SEQ_KEY: &str = "payment";

/// Order store backed by redb
#[derive(Clone)]
pub struct RedbOrderStore {
    db: Arc<Database>,
}

impl RedbOrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(LINE_ITEMS_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Catalog ==========

    /// Insert or replace a catalog entry
    ///
    /// The catalog is maintained by the product screens; this is how they
    /// (and tests) load it.
    pub fn put_product(&self, product: &ProductSpec) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Run a closure on the blocking thread pool with the database handle
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

// ========== Transaction helpers ==========

fn next_id(txn: &WriteTransaction, key: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCE_TABLE)?;
    let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(key, next)?;
    Ok(next)
}

fn read_header(txn: &WriteTransaction, order_id: i64) -> StoreResult<Option<OrderHeader>> {
    let table = txn.open_table(ORDERS_TABLE)?;
    let header = match table.get(order_id)? {
        Some(value) => Some(serde_json::from_slice(value.value())?),
        None => None,
    };
    Ok(header)
}

fn write_header(txn: &WriteTransaction, header: &OrderHeader) -> StoreResult<()> {
    let mut table = txn.open_table(ORDERS_TABLE)?;
    let value = serde_json::to_vec(header)?;
    table.insert(header.id, value.as_slice())?;
    Ok(())
}

fn insert_header(txn: &WriteTransaction, order: &NewOrder) -> StoreResult<i64> {
    let order_id = next_id(txn, ORDER_SEQ_KEY)? as i64;
    write_header(txn, &order.clone().into_header(order_id))?;
    Ok(order_id)
}

fn write_lines(txn: &WriteTransaction, order_id: i64, lines: &[LineItem]) -> StoreResult<()> {
    let mut table = txn.open_table(LINE_ITEMS_TABLE)?;

    let existing: Vec<(i64, u32)> = table
        .range((order_id, 0u32)..=(order_id, u32::MAX))?
        .map(|entry| entry.map(|(key, _)| key.value()))
        .collect::<Result<_, _>>()?;
    for key in existing {
        table.remove(key)?;
    }

    for (position, line) in lines.iter().enumerate() {
        let value = serde_json::to_vec(line)?;
        table.insert((order_id, position as u32), value.as_slice())?;
    }
    Ok(())
}

fn write_totals(txn: &WriteTransaction, order_id: i64, totals: &OrderTotals) -> StoreResult<()> {
    let mut header = read_header(txn, order_id)?.ok_or(StoreError::OrderNotFound(order_id))?;
    header.totals = *totals;
    write_header(txn, &header)
}

fn write_payment(
    txn: &WriteTransaction,
    order_id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> StoreResult<()> {
    let seq = next_id(txn, PAYMENT_SEQ_KEY)?;
    let record = PaymentRecord {
        order_id,
        amount,
        date,
    };
    let mut table = txn.open_table(PAYMENTS_TABLE)?;
    let value = serde_json::to_vec(&record)?;
    table.insert((order_id, seq), value.as_slice())?;
    Ok(())
}

fn remove_order(txn: &WriteTransaction, order_id: i64) -> StoreResult<()> {
    {
        let mut orders = txn.open_table(ORDERS_TABLE)?;
        orders.remove(order_id)?;
    }
    write_lines(txn, order_id, &[])?;

    let mut payments = txn.open_table(PAYMENTS_TABLE)?;
    let keys: Vec<(i64, u64)> = payments
        .range((order_id, 0u64)..=(order_id, u64::MAX))?
        .map(|entry| entry.map(|(key, _)| key.value()))
        .collect::<Result<_, _>>()?;
    for key in keys {
        payments.remove(key)?;
    }
    Ok(())
}

fn ensure_order_exists(txn: &WriteTransaction, order_id: i64) -> StoreResult<()> {
    let table = txn.open_table(ORDERS_TABLE)?;
    if table.get(order_id)?.is_none() {
        return Err(StoreError::OrderNotFound(order_id));
    }
    Ok(())
}

#[async_trait]
impl OrderStore for RedbOrderStore {
    async fn fetch_products(&self, material: Option<Material>) -> StoreResult<Vec<ProductSpec>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(PRODUCTS_TABLE)?;

            let mut products = Vec::new();
            for entry in table.iter()? {
                let (_key, value) = entry?;
                let product: ProductSpec = serde_json::from_slice(value.value())?;
                if material.is_none_or(|m| m == product.material) {
                    products.push(product);
                }
            }
            Ok(products)
        })
        .await
    }

    async fn fetch_order(&self, order_id: i64) -> StoreResult<Option<OrderHeader>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(ORDERS_TABLE)?;
            match table.get(order_id)? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn fetch_order_line_items(&self, order_id: i64) -> StoreResult<Vec<LineItem>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(LINE_ITEMS_TABLE)?;

            let mut lines = Vec::new();
            for entry in table.range((order_id, 0u32)..=(order_id, u32::MAX))? {
                let (_key, value) = entry?;
                lines.push(serde_json::from_slice(value.value())?);
            }
            Ok(lines)
        })
        .await
    }

    async fn fetch_payments(&self, order_id: i64) -> StoreResult<Vec<PaymentRecord>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(PAYMENTS_TABLE)?;

            let mut payments = Vec::new();
            for entry in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
                let (_key, value) = entry?;
                payments.push(serde_json::from_slice(value.value())?);
            }
            Ok(payments)
        })
        .await
    }

    async fn replace_order_line_items(&self, order_id: i64, lines: &[LineItem]) -> StoreResult<()> {
        let lines = lines.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            ensure_order_exists(&txn, order_id)?;
            write_lines(&txn, order_id, &lines)?;
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn update_order_totals(&self, order_id: i64, totals: &OrderTotals) -> StoreResult<()> {
        let totals = *totals;
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            write_totals(&txn, order_id, &totals)?;
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn insert_order(&self, order: &NewOrder) -> StoreResult<i64> {
        let order = order.clone();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let order_id = insert_header(&txn, &order)?;
            txn.commit()?;
            Ok(order_id)
        })
        .await
    }

    async fn insert_payment(&self, order_id: i64, amount: Decimal, date: NaiveDate) -> StoreResult<()> {
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            ensure_order_exists(&txn, order_id)?;
            write_payment(&txn, order_id, amount, date)?;
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete_order(&self, order_id: i64) -> StoreResult<()> {
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            remove_order(&txn, order_id)?;
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn commit_line_items(
        &self,
        order_id: i64,
        lines: &[LineItem],
        totals: &OrderTotals,
    ) -> StoreResult<()> {
        let lines = lines.to_vec();
        let totals = *totals;
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            // Dropping an uncommitted transaction aborts it
            write_totals(&txn, order_id, &totals)?;
            write_lines(&txn, order_id, &lines)?;
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn create_order(
        &self,
        order: &NewOrder,
        lines: &[LineItem],
        abono: Option<Decimal>,
    ) -> StoreResult<i64> {
        let order = order.clone();
        let lines = lines.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let order_id = insert_header(&txn, &order)?;
            write_lines(&txn, order_id, &lines)?;
            if let Some(amount) = abono {
                write_payment(&txn, order_id, amount, order.date)?;
            }
            txn.commit()?;
            Ok(order_id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::ManufacturingType;

    fn product(id: i64, material: Material) -> ProductSpec {
        ProductSpec {
            id,
            name: format!("Producto {}", id),
            material,
            manufacturing_type: Some(ManufacturingType::Lateral),
            width_cm: Some(dec!(20)),
            length_cm: Some(dec!(30)),
            gauge_microns: Some(dec!(25)),
        }
    }

    fn line(product_id: i64, subtotal: Decimal) -> LineItem {
        LineItem {
            product_id,
            display_name: format!("Producto {}", product_id),
            quantity: dec!(1),
            unit_price_ex_vat: subtotal,
            unit_price_inc_vat: subtotal,
            line_subtotal: subtotal,
            weight_per_thousand: Decimal::ZERO,
        }
    }

    fn new_order() -> NewOrder {
        NewOrder {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            client_id: 5,
            seller_id: 2,
            discount: Decimal::ZERO,
            totals: OrderTotals {
                subtotal: dec!(100),
                vat: dec!(16),
                total: dec!(116),
            },
        }
    }

    #[tokio::test]
    async fn test_fetch_products_by_material() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        store.put_product(&product(1, Material::Celofan)).unwrap();
        store.put_product(&product(2, Material::Polietileno)).unwrap();
        store.put_product(&product(3, Material::Celofan)).unwrap();

        let all = store.fetch_products(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let celofan = store.fetch_products(Some(Material::Celofan)).await.unwrap();
        assert_eq!(celofan.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_insert_order_allocates_ids() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let first = store.insert_order(&new_order()).await.unwrap();
        let second = store.insert_order(&new_order()).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let header = store.fetch_order(first).await.unwrap().unwrap();
        assert_eq!(header.client_id, 5);
        assert_eq!(header.totals.total, dec!(116));
    }

    #[tokio::test]
    async fn test_replace_line_items_keeps_order() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let order_id = store.insert_order(&new_order()).await.unwrap();

        let lines = vec![line(9, dec!(10)), line(3, dec!(20)), line(5, dec!(30))];
        store.replace_order_line_items(order_id, &lines).await.unwrap();
        assert_eq!(store.fetch_order_line_items(order_id).await.unwrap(), lines);

        // Shorter list replaces, not merges
        let fewer = vec![line(3, dec!(20))];
        store.replace_order_line_items(order_id, &fewer).await.unwrap();
        assert_eq!(store.fetch_order_line_items(order_id).await.unwrap(), fewer);
    }

    #[tokio::test]
    async fn test_replace_line_items_unknown_order() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let result = store.replace_order_line_items(42, &[line(1, dec!(1))]).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(42))));
    }

    #[tokio::test]
    async fn test_commit_line_items_is_atomic() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let totals = OrderTotals {
            subtotal: dec!(10),
            vat: dec!(1.6),
            total: dec!(11.6),
        };

        // Unknown order: totals update fails, lines must not be written either
        let result = store.commit_line_items(7, &[line(1, dec!(10))], &totals).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(7))));
        assert!(store.fetch_order_line_items(7).await.unwrap().is_empty());

        let order_id = store.insert_order(&new_order()).await.unwrap();
        store
            .commit_line_items(order_id, &[line(1, dec!(10))], &totals)
            .await
            .unwrap();
        let header = store.fetch_order(order_id).await.unwrap().unwrap();
        assert_eq!(header.totals, totals);
        assert_eq!(store.fetch_order_line_items(order_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_with_abono() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let lines = vec![line(1, dec!(100))];
        let order_id = store
            .create_order(&new_order(), &lines, Some(dec!(50)))
            .await
            .unwrap();

        assert_eq!(store.fetch_order_line_items(order_id).await.unwrap(), lines);
        let payments = store.fetch_payments(order_id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, dec!(50));
        assert_eq!(payments[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[tokio::test]
    async fn test_delete_order_removes_everything() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let order_id = store
            .create_order(&new_order(), &[line(1, dec!(100))], Some(dec!(10)))
            .await
            .unwrap();

        store.delete_order(order_id).await.unwrap();
        assert!(store.fetch_order(order_id).await.unwrap().is_none());
        assert!(store.fetch_order_line_items(order_id).await.unwrap().is_empty());
        assert!(store.fetch_payments(order_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");

        let order_id = {
            let store = RedbOrderStore::open(&path).unwrap();
            store.put_product(&product(1, Material::Celofan)).unwrap();
            store
                .create_order(&new_order(), &[line(1, dec!(100))], None)
                .await
                .unwrap()
        };

        let store = RedbOrderStore::open(&path).unwrap();
        assert_eq!(store.fetch_products(None).await.unwrap().len(), 1);
        assert!(store.fetch_order(order_id).await.unwrap().is_some());
    }
}
