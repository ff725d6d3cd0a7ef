//! OrdersManager - async order workflow over an [`OrderStore`]
//!
//! Pure state changes happen in [`EditSession`] and [`OrderDraft`]; the
//! manager adds the store round-trips and the busy flag.
//!
//! # Commit flow
//!
//! ```text
//! commit_edit(session)
//!     ├─ 1. session.prepare_commit()    validate, compute totals
//!     ├─ 2. store.commit_line_items()   replace lines + update totals
//!     └─ 3. session.apply_commit()      only after the store succeeded
//! ```
//!
//! If step 2 fails the session is untouched: still editing, still dirty,
//! committed lines as before.

use super::draft::OrderDraft;
use super::error::{OrderError, OrderResult, ValidationError};
use super::lines::{LinePricer, ProductCatalog};
use super::session::{EditSession, Order};
use crate::core::Config;
use crate::order_money::MAX_AMOUNT;
use crate::pricing::{PriceList, VatPolicy};
use crate::store::OrderStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::Material;
use shared::order::{OrderForm, OrderTotals, PaymentRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a successful order creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedOrder {
    pub order_id: i64,
    pub totals: OrderTotals,
    /// Deposit recorded with the order
    pub abono: Option<Decimal>,
}

/// Clears the busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Order workflow coordinator
///
/// One operation may be in flight at a time; a second call made meanwhile
/// fails with [`OrderError::Busy`].
pub struct OrdersManager {
    store: Arc<dyn OrderStore>,
    prices: PriceList,
    vat: VatPolicy,
    busy: AtomicBool,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("prices", &self.prices)
            .field("vat", &self.vat)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(store: Arc<dyn OrderStore>, prices: PriceList, vat: VatPolicy) -> Self {
        Self {
            store,
            prices,
            vat,
            busy: AtomicBool::new(false),
        }
    }

    /// Create a manager with the prices and VAT policy of a [`Config`]
    pub fn from_config(store: Arc<dyn OrderStore>, config: &Config) -> Self {
        Self::new(store, config.prices.clone(), config.vat)
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    pub fn prices(&self) -> &PriceList {
        &self.prices
    }

    pub fn vat(&self) -> VatPolicy {
        self.vat
    }

    /// An operation is in flight (`cargando`)
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Pricer for line mutations against a loaded catalog
    pub fn pricer<'a>(&'a self, catalog: &'a ProductCatalog) -> LinePricer<'a> {
        LinePricer::new(catalog, &self.prices, self.vat)
    }

    fn try_begin(&self) -> OrderResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OrderError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    // ========== Reads ==========

    /// Load the product catalog, optionally for a single material
    pub async fn load_catalog(&self, material: Option<Material>) -> OrderResult<ProductCatalog> {
        let _guard = self.try_begin()?;
        let products = self.store.fetch_products(material).await?;
        tracing::debug!(material = ?material, count = products.len(), "Catalog loaded");
        Ok(ProductCatalog::new(products))
    }

    /// Load an order with its lines and payments, in viewing mode
    pub async fn open_order(&self, order_id: i64) -> OrderResult<EditSession> {
        let _guard = self.try_begin()?;

        let header = self
            .store
            .fetch_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let lines = self.store.fetch_order_line_items(order_id).await?;
        let payments = self.store.fetch_payments(order_id).await?;

        tracing::debug!(order_id, lines = lines.len(), payments = payments.len(), "Order opened");
        Ok(EditSession::new(Order {
            header,
            lines,
            payments,
        }))
    }

    // ========== Writes ==========

    /// Persist the staged lines of an edit session
    ///
    /// On success the session returns to viewing with the staged lines
    /// committed. On any failure it is left exactly as it was.
    pub async fn commit_edit(&self, session: &mut EditSession) -> OrderResult<()> {
        let _guard = self.try_begin()?;

        let plan = session.prepare_commit(self.vat.rate)?;
        let order_id = plan.order_id;

        if let Err(e) = self
            .store
            .commit_line_items(order_id, &plan.lines, &plan.totals)
            .await
        {
            tracing::error!(order_id, error = %e, "Failed to commit order lines");
            return Err(e.into());
        }

        tracing::info!(
            order_id,
            lines = plan.lines.len(),
            total = %plan.totals.total,
            "Order lines committed"
        );
        session.apply_commit(plan);
        Ok(())
    }

    /// Validate and persist a new order
    ///
    /// The draft is cleared once the order is stored.
    pub async fn create_order(
        &self,
        form: &OrderForm,
        draft: &mut OrderDraft,
    ) -> OrderResult<CreatedOrder> {
        let _guard = self.try_begin()?;

        let validated = draft.validate(form, self.vat.rate)?;
        let order_id = match self
            .store
            .create_order(&validated.order, &validated.lines, validated.abono)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(client_id = validated.order.client_id, error = %e, "Failed to create order");
                return Err(e.into());
            }
        };

        tracing::info!(
            order_id,
            client_id = validated.order.client_id,
            lines = validated.lines.len(),
            total = %validated.order.totals.total,
            abono = ?validated.abono,
            "Order created"
        );
        draft.clear();
        Ok(CreatedOrder {
            order_id,
            totals: validated.order.totals,
            abono: validated.abono,
        })
    }

    /// Record a later abono against an order
    pub async fn add_payment(
        &self,
        order_id: i64,
        amount: Decimal,
        date: NaiveDate,
    ) -> OrderResult<PaymentRecord> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePayment(amount).into());
        }
        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge {
                field: "payment",
                value: amount,
                max: MAX_AMOUNT,
            }
            .into());
        }
        let _guard = self.try_begin()?;

        self.store.insert_payment(order_id, amount, date).await?;
        tracing::info!(order_id, amount = %amount, "Payment recorded");
        Ok(PaymentRecord {
            order_id,
            amount,
            date,
        })
    }
}

#[cfg(test)]
mod tests;
