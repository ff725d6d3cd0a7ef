use crate::store::StoreError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::Material;
use thiserror::Error;

/// Rejected user actions
///
/// Raised before anything is sent to the store; in-memory state is left as
/// it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Quantity must be greater than zero, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Quantity exceeds the maximum of {max}, got {value}")]
    QuantityTooLarge { value: Decimal, max: Decimal },

    #[error("Unknown product: {0}")]
    UnknownProduct(i64),

    #[error("Product {0} is already in the order")]
    DuplicateProduct(i64),

    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field} exceeds the maximum of {max}, got {value}")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },

    #[error("Product {product_id} has dimensions above {max}")]
    DimensionsOutOfRange { product_id: i64, max: Decimal },

    #[error("{0} is too large to compute")]
    Overflow(&'static str),

    #[error("Payment amount must be greater than zero, got {0}")]
    NonPositivePayment(Decimal),

    #[error("Order total must be greater than zero, got {0}")]
    NonPositiveTotal(Decimal),

    #[error("Order has no line items")]
    EmptyOrder,

    #[error("Order is not being edited")]
    NotEditing,

    #[error("Order is already being edited")]
    AlreadyEditing,

    #[error("Line {index} does not exist (order has {len} lines)")]
    LineIndexOutOfRange { index: usize, len: usize },

    #[error("No price per kilogram configured for {0}")]
    PriceNotConfigured(Material),
}

/// Order workflow errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Another operation of the same manager is still in flight
    #[error("Another order operation is in progress")]
    Busy,
}

pub type OrderResult<T> = Result<T, OrderError>;

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::MissingField(_) => ErrorCode::RequiredField,
            ValidationError::NonPositiveQuantity(_) => ErrorCode::InvalidQuantity,
            ValidationError::QuantityTooLarge { .. } => ErrorCode::InvalidQuantity,
            ValidationError::UnknownProduct(_) => ErrorCode::ProductNotFound,
            ValidationError::DuplicateProduct(_) => ErrorCode::DuplicateProduct,
            ValidationError::NegativeAmount { .. } => ErrorCode::InvalidAmount,
            ValidationError::AmountTooLarge { field: "payment", .. } => ErrorCode::PaymentInvalidAmount,
            ValidationError::AmountTooLarge { .. } | ValidationError::Overflow(_) => ErrorCode::InvalidAmount,
            ValidationError::DimensionsOutOfRange { .. } => ErrorCode::ProductDimensionsInvalid,
            ValidationError::NonPositivePayment(_) => ErrorCode::PaymentInvalidAmount,
            ValidationError::NonPositiveTotal(_) => ErrorCode::OrderTotalNotPositive,
            ValidationError::EmptyOrder => ErrorCode::OrderEmpty,
            ValidationError::NotEditing => ErrorCode::OrderNotEditing,
            ValidationError::AlreadyEditing => ErrorCode::OrderAlreadyEditing,
            ValidationError::LineIndexOutOfRange { .. } => ErrorCode::LineItemNotFound,
            ValidationError::PriceNotConfigured(_) => ErrorCode::PriceNotConfigured,
        }
    }
}

fn classify_store_error(e: &StoreError) -> ErrorCode {
    match e {
        StoreError::OrderNotFound(_) => ErrorCode::OrderNotFound,
        StoreError::Backend(_) => ErrorCode::BackendError,
        StoreError::PartialCommit { .. } => ErrorCode::OrderPartiallyCommitted,
        StoreError::Serialization(_) | StoreError::Task(_) => ErrorCode::InternalError,
        StoreError::Database(_)
        | StoreError::Transaction(_)
        | StoreError::Table(_)
        | StoreError::Storage(_)
        | StoreError::Commit(_) => ErrorCode::DatabaseError,
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(ValidationError::MissingField(field)) => AppError::required(field),
            OrderError::Validation(e) => {
                let code = e.code();
                let app = AppError::with_message(code, e.to_string());
                match e {
                    ValidationError::UnknownProduct(id)
                    | ValidationError::DuplicateProduct(id)
                    | ValidationError::DimensionsOutOfRange { product_id: id, .. } => {
                        app.with_detail("product_id", id)
                    }
                    ValidationError::AmountTooLarge { field, .. } => app.with_detail("field", field),
                    ValidationError::LineIndexOutOfRange { index, .. } => app.with_detail("index", index),
                    _ => app,
                }
            }
            OrderError::Store(StoreError::Backend(raw)) => AppError::backend(raw),
            OrderError::Store(e) => {
                let code = classify_store_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Store error occurred");
                let app = AppError::with_message(code, e.to_string());
                match e {
                    StoreError::OrderNotFound(id) | StoreError::PartialCommit { order_id: id, .. } => {
                        app.with_detail("order_id", id)
                    }
                    _ => app,
                }
            }
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {}", id))
                    .with_detail("order_id", id)
            }
            OrderError::Busy => AppError::new(ErrorCode::OrderBusy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_maps_to_order_codes() {
        let app: AppError = OrderError::from(ValidationError::EmptyOrder).into();
        assert_eq!(app.code, ErrorCode::OrderEmpty);

        let app: AppError =
            OrderError::from(ValidationError::NonPositiveTotal(dec!(-38.40))).into();
        assert_eq!(app.code, ErrorCode::OrderTotalNotPositive);
        assert!(app.message.contains("-38.40"));
    }

    #[test]
    fn test_duplicate_product_carries_id() {
        let app: AppError = OrderError::from(ValidationError::DuplicateProduct(7)).into();
        assert_eq!(app.code, ErrorCode::DuplicateProduct);
        let details = app.details.unwrap();
        assert_eq!(details["product_id"], 7);
    }

    #[test]
    fn test_backend_error_keeps_raw_text() {
        let raw = r#"{"code":"23503","message":"violates foreign key constraint"}"#;
        let app: AppError = OrderError::from(StoreError::Backend(raw.to_string())).into();
        assert_eq!(app.code, ErrorCode::BackendError);
        assert_eq!(app.details.unwrap()["raw"], raw);
    }

    #[test]
    fn test_partial_commit_code() {
        let err = StoreError::PartialCommit {
            order_id: 31,
            cause: Box::new(StoreError::Backend("timeout".into())),
            cleanup: Box::new(StoreError::Backend("timeout".into())),
        };
        let app: AppError = OrderError::from(err).into();
        assert_eq!(app.code, ErrorCode::OrderPartiallyCommitted);
        assert_eq!(app.details.unwrap()["order_id"], 31);
    }

    #[test]
    fn test_out_of_range_codes() {
        let app: AppError = OrderError::from(ValidationError::DimensionsOutOfRange {
            product_id: 4,
            max: dec!(100000),
        })
        .into();
        assert_eq!(app.code, ErrorCode::ProductDimensionsInvalid);
        assert_eq!(app.details.unwrap()["product_id"], 4);

        let payment = ValidationError::AmountTooLarge {
            field: "payment",
            value: dec!(2000000000),
            max: dec!(1000000000),
        };
        assert_eq!(payment.code(), ErrorCode::PaymentInvalidAmount);

        let discount = ValidationError::AmountTooLarge {
            field: "discount",
            value: dec!(2000000000),
            max: dec!(1000000000),
        };
        assert_eq!(discount.code(), ErrorCode::InvalidAmount);
        assert_eq!(ValidationError::Overflow("order total").code(), ErrorCode::InvalidAmount);
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let app: AppError = OrderError::from(ValidationError::MissingField("seller")).into();
        assert_eq!(app.code, ErrorCode::RequiredField);
        assert_eq!(app.message, "seller is required");
        assert_eq!(app.details.unwrap()["field"], "seller");
    }

    #[test]
    fn test_busy() {
        let app: AppError = OrderError::Busy.into();
        assert_eq!(app.code, ErrorCode::OrderBusy);
    }
}
