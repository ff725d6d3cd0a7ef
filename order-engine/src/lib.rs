//! Order Engine - pricing and line-item workflow for packaging sales notes
//!
//! # Overview
//!
//! - **Pricing** (`pricing`): unit price and weight per thousand sheets from
//!   a bag's dimensions, line prices with VAT
//! - **Money** (`order_money`): order subtotal, VAT, total, amount due
//! - **Orders** (`orders`): staged-edit sessions, new-order drafts and the
//!   async `OrdersManager`
//! - **Store** (`store`): the `OrderStore` trait with redb and in-memory
//!   implementations
//!
//! # Module structure
//!
//! ```text
//! order-engine/src/
//! ├── core/          # configuration
//! ├── pricing/       # geometric price formulas
//! ├── order_money/   # decimal money helpers
//! ├── orders/        # session, draft, manager
//! ├── store/         # OrderStore trait + backends
//! └── utils/         # logging
//! ```

pub mod core;
pub mod order_money;
pub mod orders;
pub mod pricing;
pub mod store;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, ConfigError};
pub use orders::{
    CreatedOrder, EditMode, EditSession, OrderDraft, OrderError, OrderResult, OrdersManager,
    ProductCatalog, ValidationError,
};
pub use pricing::{PriceList, VatPolicy, compute_line_price, compute_unit_price, compute_weight_per_thousand};
pub use store::{MemoryOrderStore, OrderStore, RedbOrderStore, StoreError, StoreResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Load configuration, create the working directory and start logging
///
/// ```no_run
/// let config = order_engine::setup_environment()?;
/// let store = order_engine::RedbOrderStore::open(config.database_path())?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn setup_environment() -> anyhow::Result<Config> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    tracing::info!(
        work_dir = %config.work_dir,
        vat_rate = %config.vat.rate,
        "Order engine environment ready"
    );
    Ok(config)
}
