//! Client error types

use order_engine::StoreError;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `body` is the backend's raw text
    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Backend { body, .. } => StoreError::Backend(body),
            ClientError::Serialization(e) => StoreError::Serialization(e),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_body_is_kept_verbatim() {
        let body = r#"{"code":"23505","message":"duplicate key value"}"#.to_string();
        let err: StoreError = ClientError::Backend {
            status: 409,
            body: body.clone(),
        }
        .into();
        assert!(matches!(err, StoreError::Backend(raw) if raw == body));
    }

    #[test]
    fn test_invalid_response_maps_to_backend() {
        let err: StoreError = ClientError::InvalidResponse("empty insert result".into()).into();
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("empty insert result")));
    }
}
