//! `OrderStore` over a PostgREST-style HTTP backend
//!
//! Rows are exchanged as JSON. Filters use the PostgREST query syntax
//! (`?pedido_id=eq.12`), every request carries the `apikey` and bearer
//! headers, and writes ask for `Prefer: return=representation` so the
//! affected rows come back.
//!
//! The backend has no multi-request transactions: the composite
//! operations use the sequential defaults of [`OrderStore`].

use crate::config::RestConfig;
use crate::rows::{IdRow, LineItemRow, NewOrderRow, OrderRow, PaymentRow, ProductRow, TotalsRow};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use order_engine::store::{OrderStore, StoreError, StoreResult};
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use shared::models::{Material, ProductSpec};
use shared::order::{LineItem, NewOrder, OrderHeader, OrderTotals, PaymentRecord};

const RETURN_REPRESENTATION: &str = "return=representation";

/// PostgREST equality filter
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Order store backed by a hosted REST API
#[derive(Debug, Clone)]
pub struct RestOrderStore {
    client: Client,
    config: RestConfig,
}

impl RestOrderStore {
    pub fn new(config: RestConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    /// Request with authentication headers
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.config.bearer())
    }

    /// Write request that returns the affected rows
    fn write(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", RETURN_REPRESENTATION)
    }

    /// Send and decode a JSON body
    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %text, "Backend request failed");
            return Err(ClientError::Backend {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Send and ignore the body
    async fn send_empty(request: RequestBuilder) -> ClientResult<()> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            tracing::warn!(status = status.as_u16(), body = %text, "Backend request failed");
            return Err(ClientError::Backend {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }

    // ========== Request builders ==========

    fn products_request(&self, material: Option<Material>) -> RequestBuilder {
        let mut request = self
            .request(Method::GET, &self.config.tables.products)
            .query(&[("select", "*"), ("order", "id.asc")]);
        if let Some(material) = material {
            request = request.query(&[("material", eq(material))]);
        }
        request
    }

    fn line_items_request(&self, order_id: i64) -> RequestBuilder {
        self.request(Method::GET, &self.config.tables.line_items)
            .query(&[("pedido_id", eq(order_id))])
            .query(&[("select", "*"), ("order", "id.asc")])
    }

    fn update_totals_request(&self, order_id: i64, totals: &OrderTotals) -> RequestBuilder {
        self.write(Method::PATCH, &self.config.tables.orders)
            .query(&[("id", eq(order_id))])
            .json(&TotalsRow::from(totals))
    }

    async fn delete_where(&self, table: &str, column: &str, order_id: i64) -> ClientResult<()> {
        Self::send_empty(
            self.request(Method::DELETE, table)
                .query(&[(column, eq(order_id))]),
        )
        .await
    }
}

#[async_trait]
impl OrderStore for RestOrderStore {
    async fn fetch_products(&self, material: Option<Material>) -> StoreResult<Vec<ProductSpec>> {
        let rows: Vec<ProductRow> = Self::send(self.products_request(material)).await?;
        let products = rows
            .into_iter()
            .map(ProductSpec::try_from)
            .collect::<ClientResult<Vec<_>>>()?;
        tracing::debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    async fn fetch_order(&self, order_id: i64) -> StoreResult<Option<OrderHeader>> {
        let rows: Vec<OrderRow> = Self::send(
            self.request(Method::GET, &self.config.tables.orders)
                .query(&[("id", eq(order_id))])
                .query(&[("select", "*")]),
        )
        .await?;
        Ok(rows.into_iter().next().map(OrderHeader::from))
    }

    async fn fetch_order_line_items(&self, order_id: i64) -> StoreResult<Vec<LineItem>> {
        let rows: Vec<LineItemRow> = Self::send(self.line_items_request(order_id)).await?;
        Ok(rows.into_iter().map(LineItem::from).collect())
    }

    async fn fetch_payments(&self, order_id: i64) -> StoreResult<Vec<PaymentRecord>> {
        let rows: Vec<PaymentRow> = Self::send(
            self.request(Method::GET, &self.config.tables.payments)
                .query(&[("pedido_id", eq(order_id))])
                .query(&[("select", "*"), ("order", "fecha.asc")]),
        )
        .await?;
        Ok(rows.into_iter().map(PaymentRecord::from).collect())
    }

    async fn replace_order_line_items(&self, order_id: i64, lines: &[LineItem]) -> StoreResult<()> {
        let table = &self.config.tables.line_items;
        self.delete_where(table, "pedido_id", order_id).await?;

        if lines.is_empty() {
            return Ok(());
        }
        let rows: Vec<LineItemRow> = lines
            .iter()
            .map(|line| LineItemRow::from_line(order_id, line))
            .collect();
        let inserted: Vec<LineItemRow> =
            Self::send(self.write(Method::POST, table).json(&rows)).await?;

        tracing::debug!(order_id, lines = inserted.len(), "Replaced line items");
        Ok(())
    }

    async fn update_order_totals(&self, order_id: i64, totals: &OrderTotals) -> StoreResult<()> {
        let updated: Vec<IdRow> = Self::send(self.update_totals_request(order_id, totals)).await?;
        if updated.is_empty() {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }

    async fn insert_order(&self, order: &NewOrder) -> StoreResult<i64> {
        let inserted: Vec<IdRow> = Self::send(
            self.write(Method::POST, &self.config.tables.orders)
                .json(&NewOrderRow::from(order)),
        )
        .await?;
        let order_id = inserted
            .first()
            .map(|row| row.id)
            .ok_or_else(|| ClientError::InvalidResponse("insert returned no order row".into()))?;
        tracing::debug!(order_id, "Inserted order header");
        Ok(order_id)
    }

    async fn insert_payment(&self, order_id: i64, amount: Decimal, date: NaiveDate) -> StoreResult<()> {
        let row = PaymentRow {
            pedido_id: order_id,
            monto: amount,
            fecha: date,
        };
        let _: Vec<PaymentRow> =
            Self::send(self.write(Method::POST, &self.config.tables.payments).json(&row)).await?;
        Ok(())
    }

    async fn delete_order(&self, order_id: i64) -> StoreResult<()> {
        let tables = &self.config.tables;
        self.delete_where(&tables.payments, "pedido_id", order_id).await?;
        self.delete_where(&tables.line_items, "pedido_id", order_id).await?;
        self.delete_where(&tables.orders, "id", order_id).await?;
        tracing::info!(order_id, "Deleted order");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn store(base_url: &str) -> RestOrderStore {
        RestOrderStore::new(RestConfig::new(base_url, "anon-key").with_access_token("user-jwt")).unwrap()
    }

    /// Consume headers and body so the client sees a clean close
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    return;
                }
            }
        }
    }

    /// Serve a single canned HTTP response
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/rest/v1", addr)
    }

    #[test]
    fn test_products_request_filters_by_material() {
        let store = store("https://api.example.com/rest/v1/");
        let request = store
            .products_request(Some(Material::Polietileno))
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().path(), "/rest/v1/productos");
        assert_eq!(
            request.url().query(),
            Some("select=*&order=id.asc&material=eq.POLIETILENO")
        );
        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer user-jwt");
    }

    #[test]
    fn test_line_items_request() {
        let store = store("https://api.example.com/rest/v1");
        let request = store.line_items_request(12).build().unwrap();
        assert_eq!(request.url().path(), "/rest/v1/pedido_productos");
        assert_eq!(
            request.url().query(),
            Some("pedido_id=eq.12&select=*&order=id.asc")
        );
    }

    #[test]
    fn test_update_totals_request() {
        let store = store("https://api.example.com/rest/v1");
        let totals = OrderTotals {
            subtotal: dec!(350.50),
            vat: dec!(56.08),
            total: dec!(386.58),
        };
        let request = store.update_totals_request(31, &totals).build().unwrap();

        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(request.url().query(), Some("id=eq.31"));
        assert_eq!(request.headers()["prefer"], RETURN_REPRESENTATION);

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["iva"], "56.08");
        assert_eq!(json["total"], "386.58");
    }

    #[tokio::test]
    async fn test_non_success_keeps_raw_body() {
        let body = r#"{"code":"42501","message":"permission denied for table productos"}"#;
        let base = one_shot_server("403 Forbidden", body).await;

        let err = store(&base).fetch_products(None).await.unwrap_err();
        match err {
            StoreError::Backend(raw) => assert_eq!(raw, body),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_products_maps_rows() {
        let body = r#"[{"id":1,"nombre":"Bolsa mordaza","material":"CELOFAN","tipo_fabricacion":"mordaza","ancho":30,"largo":40,"micraje":25}]"#;
        let base = one_shot_server("200 OK", body).await;

        let products = store(&base).fetch_products(Some(Material::Celofan)).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Bolsa mordaza");
        assert_eq!(
            products[0].manufacturing_type,
            Some(shared::models::ManufacturingType::Mordaza)
        );
    }

    #[tokio::test]
    async fn test_update_totals_on_missing_order() {
        let base = one_shot_server("200 OK", "[]").await;
        let result = store(&base)
            .update_order_totals(404, &OrderTotals::default())
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(404))));
    }
}
