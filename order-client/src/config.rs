//! REST store configuration

use crate::{ClientError, ClientResult};

/// Backend table names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub products: String,
    pub orders: String,
    pub line_items: String,
    pub payments: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            products: "productos".into(),
            orders: "pedidos".into(),
            line_items: "pedido_productos".into(),
            payments: "abonos".into(),
        }
    }
}

/// Connection settings for a PostgREST-style backend
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// REST root, e.g. "https://project.example.co/rest/v1"
    pub base_url: String,

    /// Public API key, sent as the `apikey` header
    pub api_key: String,

    /// User access token; the API key is used as bearer when unset
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    pub tables: Tables,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            timeout: 30,
            tables: Tables::default(),
        }
    }

    /// Read `ORDERS_API_URL`, `ORDERS_API_KEY` (both required),
    /// `ORDERS_API_TOKEN` and `ORDERS_API_TIMEOUT` (default 30)
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("ORDERS_API_URL")
            .map_err(|_| ClientError::Config("ORDERS_API_URL is not set".into()))?;
        let api_key = std::env::var("ORDERS_API_KEY")
            .map_err(|_| ClientError::Config("ORDERS_API_KEY is not set".into()))?;

        let mut config = Self::new(base_url, api_key);
        config.access_token = std::env::var("ORDERS_API_TOKEN").ok();
        config.timeout = std::env::var("ORDERS_API_TIMEOUT")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);
        Ok(config)
    }

    /// Set the user access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tables(mut self, tables: Tables) -> Self {
        self.tables = tables;
        self
    }

    /// Bearer token sent with every request
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}
