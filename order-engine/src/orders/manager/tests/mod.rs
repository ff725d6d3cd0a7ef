use super::*;
use crate::order_money::calculate_totals;
use crate::orders::EditMode;
use crate::store::{FailPoint, MemoryOrderStore, RedbOrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use shared::models::{ManufacturingType, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader};
use tokio::sync::Notify;

fn sample_products() -> Vec<ProductSpec> {
    let bag = |id: i64, name: &str, seal: ManufacturingType| ProductSpec {
        id,
        name: name.to_string(),
        material: Material::Celofan,
        manufacturing_type: Some(seal),
        width_cm: Some(dec!(30)),
        length_cm: Some(dec!(40)),
        gauge_microns: Some(dec!(25)),
    };
    vec![
        bag(1, "Bolsa mordaza 30x40", ManufacturingType::Mordaza),
        bag(2, "Bolsa lateral 30x40", ManufacturingType::Lateral),
        ProductSpec {
            id: 3,
            name: "Rollo natural".to_string(),
            material: Material::Polietileno,
            manufacturing_type: None,
            width_cm: None,
            length_cm: None,
            gauge_microns: None,
        },
    ]
}

fn sample_prices() -> PriceList {
    PriceList::new()
        .with_price(Material::Celofan, dec!(45))
        .with_price(Material::Polietileno, dec!(35))
}

fn memory_store() -> Arc<MemoryOrderStore> {
    Arc::new(MemoryOrderStore::with_products(sample_products()))
}

fn create_test_manager(store: Arc<dyn OrderStore>) -> OrdersManager {
    OrdersManager::new(store, sample_prices(), VatPolicy::default())
}

fn order_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 12).unwrap()
}

fn sample_form(abono: Decimal) -> OrderForm {
    OrderForm {
        date: Some(order_date()),
        client_id: Some(8),
        seller_id: Some(2),
        discount: Decimal::ZERO,
        abono,
    }
}

/// Insert an order whose lines have the given subtotals (product ids 1..)
async fn seed_order(store: &dyn OrderStore, discount: Decimal, subtotals: &[Decimal]) -> i64 {
    let lines: Vec<LineItem> = subtotals
        .iter()
        .enumerate()
        .map(|(i, subtotal)| LineItem {
            product_id: i as i64 + 1,
            display_name: format!("Producto {}", i + 1),
            quantity: dec!(1),
            unit_price_ex_vat: *subtotal,
            unit_price_inc_vat: *subtotal,
            line_subtotal: *subtotal,
            weight_per_thousand: Decimal::ZERO,
        })
        .collect();
    let order = NewOrder {
        date: order_date(),
        client_id: 8,
        seller_id: 2,
        discount,
        totals: calculate_totals(&lines, discount, dec!(0.16)),
    };
    let order_id = store.insert_order(&order).await.unwrap();
    store.replace_order_line_items(order_id, &lines).await.unwrap();
    order_id
}

/// Store whose catalog fetch waits until released
struct GatedStore {
    inner: Arc<MemoryOrderStore>,
    gate: Arc<Notify>,
}

#[async_trait]
impl OrderStore for GatedStore {
    async fn fetch_products(&self, material: Option<Material>) -> StoreResult<Vec<ProductSpec>> {
        self.gate.notified().await;
        self.inner.fetch_products(material).await
    }

    async fn fetch_order(&self, order_id: i64) -> StoreResult<Option<OrderHeader>> {
        self.inner.fetch_order(order_id).await
    }

    async fn fetch_order_line_items(&self, order_id: i64) -> StoreResult<Vec<LineItem>> {
        self.inner.fetch_order_line_items(order_id).await
    }

    async fn fetch_payments(&self, order_id: i64) -> StoreResult<Vec<PaymentRecord>> {
        self.inner.fetch_payments(order_id).await
    }

    async fn replace_order_line_items(&self, order_id: i64, lines: &[LineItem]) -> StoreResult<()> {
        self.inner.replace_order_line_items(order_id, lines).await
    }

    async fn update_order_totals(&self, order_id: i64, totals: &OrderTotals) -> StoreResult<()> {
        self.inner.update_order_totals(order_id, totals).await
    }

    async fn insert_order(&self, order: &NewOrder) -> StoreResult<i64> {
        self.inner.insert_order(order).await
    }

    async fn insert_payment(&self, order_id: i64, amount: Decimal, date: NaiveDate) -> StoreResult<()> {
        self.inner.insert_payment(order_id, amount, date).await
    }

    async fn delete_order(&self, order_id: i64) -> StoreResult<()> {
        self.inner.delete_order(order_id).await
    }
}


#[tokio::test]
async fn test_load_catalog() {
    let manager = create_test_manager(memory_store());

    let catalog = manager.load_catalog(None).await.unwrap();
    assert_eq!(catalog.len(), 3);

    let celofan = manager.load_catalog(Some(Material::Celofan)).await.unwrap();
    assert_eq!(celofan.len(), 2);
    assert!(celofan.get(3).is_none());
}

#[tokio::test]
async fn test_second_call_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(GatedStore {
        inner: memory_store(),
        gate: gate.clone(),
    });
    let manager = create_test_manager(store);

    let (first, second) = tokio::join!(manager.load_catalog(None), async {
        let second = manager.load_catalog(None).await;
        gate.notify_one();
        second
    });

    assert_eq!(first.unwrap().len(), 3);
    assert!(matches!(second, Err(OrderError::Busy)));
    assert!(!manager.is_busy());
}

#[tokio::test]
async fn test_busy_flag_released_after_failure() {
    let store = memory_store();
    store.fail_on(FailPoint::FetchProducts);
    let manager = create_test_manager(store.clone());

    assert!(matches!(
        manager.load_catalog(None).await,
        Err(OrderError::Store(StoreError::Backend(_)))
    ));
    assert!(!manager.is_busy());

    store.clear_failures();
    assert!(manager.load_catalog(None).await.is_ok());
}

#[tokio::test]
async fn test_add_payment() {
    let store = memory_store();
    let order_id = seed_order(store.as_ref(), Decimal::ZERO, &[dec!(100)]).await;
    let manager = create_test_manager(store.clone());

    let payment = manager.add_payment(order_id, dec!(40), order_date()).await.unwrap();
    assert_eq!(payment.amount, dec!(40));

    let session = manager.open_order(order_id).await.unwrap();
    // 100 + 16 - 40
    assert_eq!(session.order().amount_due(), dec!(76.00));

    assert!(matches!(
        manager.add_payment(order_id, Decimal::ZERO, order_date()).await,
        Err(OrderError::Validation(ValidationError::NonPositivePayment(_)))
    ));
    assert!(matches!(
        manager.add_payment(order_id, Decimal::MAX, order_date()).await,
        Err(OrderError::Validation(ValidationError::AmountTooLarge { field: "payment", .. }))
    ));
    assert_eq!(manager.open_order(order_id).await.unwrap().order().payments.len(), 1);
    assert!(matches!(
        manager.add_payment(999, dec!(10), order_date()).await,
        Err(OrderError::Store(StoreError::OrderNotFound(999)))
    ));
}
