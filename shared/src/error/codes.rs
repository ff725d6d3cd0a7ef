//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 1,
    /// Resource not found
    NotFound = 2,
    /// Required field missing
    RequiredField = 3,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4002,
    /// Order total must be greater than zero
    OrderTotalNotPositive = 4003,
    /// Order is not being edited
    OrderNotEditing = 4004,
    /// Order is already being edited
    OrderAlreadyEditing = 4005,
    /// Line item not found
    LineItemNotFound = 4006,
    /// Product already present in the order
    DuplicateProduct = 4007,
    /// Quantity must be positive
    InvalidQuantity = 4008,
    /// Amount is invalid (negative discount, etc.)
    InvalidAmount = 4009,
    /// Another operation is in progress
    OrderBusy = 4010,
    /// Order header persisted without its line items
    OrderPartiallyCommitted = 4011,

    // ==================== 5xxx: Payment ====================
    /// Payment amount is invalid
    PaymentInvalidAmount = 5001,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// No price per kilogram configured for the material
    PriceNotConfigured = 6002,
    /// Product dimensions are negative or too large to price
    ProductDimensionsInvalid = 6003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Backend unavailable or rejected the request
    BackendError = 9003,
    /// Configuration error
    ConfigError = 9004,
}

impl ErrorCode {
    /// Every defined code
    pub const ALL: [ErrorCode; 23] = [
        ErrorCode::Success,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::RequiredField,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderEmpty,
        ErrorCode::OrderTotalNotPositive,
        ErrorCode::OrderNotEditing,
        ErrorCode::OrderAlreadyEditing,
        ErrorCode::LineItemNotFound,
        ErrorCode::DuplicateProduct,
        ErrorCode::InvalidQuantity,
        ErrorCode::InvalidAmount,
        ErrorCode::OrderBusy,
        ErrorCode::OrderPartiallyCommitted,
        ErrorCode::PaymentInvalidAmount,
        ErrorCode::ProductNotFound,
        ErrorCode::PriceNotConfigured,
        ErrorCode::ProductDimensionsInvalid,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::BackendError,
        ErrorCode::ConfigError,
    ];

    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::RequiredField => "Required field is missing",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no line items",
            ErrorCode::OrderTotalNotPositive => "Order total must be greater than zero",
            ErrorCode::OrderNotEditing => "Order is not in edit mode",
            ErrorCode::OrderAlreadyEditing => "Order is already in edit mode",
            ErrorCode::LineItemNotFound => "Line item not found",
            ErrorCode::DuplicateProduct => "Product is already in the order",
            ErrorCode::InvalidQuantity => "Quantity must be greater than zero",
            ErrorCode::InvalidAmount => "Amount is invalid",
            ErrorCode::OrderBusy => "Another operation is in progress",
            ErrorCode::OrderPartiallyCommitted => "Order was saved without its line items",

            // Payment
            ErrorCode::PaymentInvalidAmount => "Payment amount is invalid",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::PriceNotConfigured => "Price per kilogram is not configured",
            ErrorCode::ProductDimensionsInvalid => "Product dimensions are out of range",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::BackendError => "Backend request failed",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
