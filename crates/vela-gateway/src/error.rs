//! # Gateway Error Types
//!
//! Errors raised by the payment gateway adapter.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Categories                                     │
//! │                                                                         │
//! │  caller mistakes:     AmountTooLow, InvalidCallbackUrl, Config          │
//! │  provider said no:    Rejected (with the provider's own message)        │
//! │  provider unreachable:Unreachable (network/timeout, nothing persisted)  │
//! │  provider malformed:  Protocol (2xx + "00" but unusable body)           │
//! │  webhook boundary:    Unauthorized (signature check failed)             │
//! │  persistence:         Db (passthrough from vela-db)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vela_db::DbError;

/// Payment gateway adapter errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Provider rejects payment links below its minimum amount.
    #[error("Amount {amount_vnd}₫ is below the gateway minimum of {minimum_vnd}₫")]
    AmountTooLow { amount_vnd: i64, minimum_vnd: i64 },

    /// Return or cancel URL is not an absolute http(s) URL.
    #[error("Callback URL is not absolute: {url}")]
    InvalidCallbackUrl { url: String },

    /// Provider answered with a non-2xx status or a non-"00" code.
    #[error("Gateway rejected the request: {message}")]
    Rejected { message: String },

    /// Network failure or timeout before a response arrived.
    /// Nothing was persisted.
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    /// Provider claimed success but the response is unusable
    /// (e.g. missing checkout URL).
    #[error("Gateway protocol error: {0}")]
    Protocol(String),

    /// Webhook signature verification failed at the boundary.
    #[error("Webhook signature verification failed")]
    Unauthorized,

    /// Order/payment record the adapter needs does not exist.
    #[error("No payment record for order {order_id}")]
    PaymentMissing { order_id: i64 },

    /// Missing or invalid configuration value.
    #[error("Gateway configuration error: {0}")]
    Config(String),

    /// Database error (wraps DbError).
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Unreachable(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
