//! Order Client - REST backend for the order engine
//!
//! [`RestOrderStore`] implements [`order_engine::OrderStore`] against a
//! hosted PostgREST-style API, so an [`order_engine::OrdersManager`] can
//! run on it unchanged.
//!
//! ```no_run
//! use order_client::{RestConfig, RestOrderStore};
//! use order_engine::{Config, OrdersManager};
//! use std::sync::Arc;
//!
//! let store = RestOrderStore::new(RestConfig::from_env()?)?;
//! let manager = OrdersManager::from_config(Arc::new(store), &Config::load()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
mod rows;
pub mod store;

pub use config::{RestConfig, Tables};
pub use error::{ClientError, ClientResult};
pub use store::RestOrderStore;
