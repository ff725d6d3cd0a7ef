use crate::pricing::{PriceList, VatPolicy};
use crate::order_money::{DEFAULT_VAT_RATE, MAX_AMOUNT};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::Material;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        let key = match &err {
            ConfigError::Missing(key) | ConfigError::Invalid { key, .. } => *key,
        };
        AppError::with_message(ErrorCode::ConfigError, err.to_string()).with_detail("key", key)
    }
}

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./work_dir | Working directory (database, logs) |
/// | DATABASE_FILE | orders.redb | redb file name, relative to WORK_DIR |
/// | LOG_LEVEL | info | tracing filter when RUST_LOG is unset |
/// | LOG_DIR | (none) | Enables the daily rolling log file |
/// | LOG_JSON | false | JSON log lines |
/// | VAT_RATE | 0.16 | VAT as a fraction |
/// | APPLY_VAT_TO_LINES | true | Show line prices VAT-inclusive |
/// | PRICE_PER_KG_CELOFAN | required | Price per kilogram of cellophane |
/// | PRICE_PER_KG_POLIETILENO | required | Price per kilogram of polyethylene |
///
/// # Example
///
/// ```ignore
/// PRICE_PER_KG_CELOFAN=45 PRICE_PER_KG_POLIETILENO=35 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_file: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    pub vat: VatPolicy,
    pub prices: PriceList,
}

impl Config {
    /// Load `.env` (if present) and read the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_env()
    }

    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    ///
    /// Optional flags and paths fall back to their default when unset or
    /// unparsable. `VAT_RATE`, when set, must be a fraction in `[0, 1)`.
    /// Prices are required and must lie in `[0, MAX_AMOUNT]`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vat_rate = vat_rate(&lookup)?;
        let apply_vat = lookup("APPLY_VAT_TO_LINES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(true);

        let prices = PriceList::new()
            .with_price(
                Material::Celofan,
                required_price(&lookup, "PRICE_PER_KG_CELOFAN")?,
            )
            .with_price(
                Material::Polietileno,
                required_price(&lookup, "PRICE_PER_KG_POLIETILENO")?,
            );

        Ok(Self {
            work_dir: lookup("WORK_DIR").unwrap_or_else(|| "./work_dir".into()),
            database_file: lookup("DATABASE_FILE").unwrap_or_else(|| "orders.redb".into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: lookup("LOG_DIR").filter(|d| !d.trim().is_empty()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false),
            vat: VatPolicy::new(vat_rate, apply_vat),
            prices,
        })
    }

    /// Full path of the redb database
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.database_file)
    }
}

fn vat_rate(lookup: &impl Fn(&str) -> Option<String>) -> Result<Decimal, ConfigError> {
    const KEY: &str = "VAT_RATE";
    let Some(raw) = lookup(KEY) else {
        return Ok(DEFAULT_VAT_RATE);
    };
    match raw.trim().parse::<Decimal>() {
        Ok(rate) if rate >= Decimal::ZERO && rate < Decimal::ONE => Ok(rate),
        _ => Err(ConfigError::Invalid { key: KEY, value: raw }),
    }
}

fn required_price(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Decimal, ConfigError> {
    let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
    match raw.trim().parse::<Decimal>() {
        Ok(price) if price >= Decimal::ZERO && price <= MAX_AMOUNT => Ok(price),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
