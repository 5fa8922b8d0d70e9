//! # Error Types
//!
//! Domain-specific error types for vela-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vela-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── VoucherError     - Voucher eligibility failures                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vela-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  vela-gateway errors (separate crate)                                  │
//! │  └── GatewayError     - Payment provider failures                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, remaining stock, etc.)
//! 3. Errors are enum variants, never String
//! 4. Validation, conflict, not-found and external failures are distinct so
//!    callers can tell "your request was bad" from "the system failed"

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors raised while assembling or cancelling orders.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Customer id does not resolve to a customer record.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Product id does not resolve to a product record.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order id does not resolve to an order record.
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Delivery address or contact info is missing or still holds the
    /// placeholder default. Hard precondition for order creation.
    #[error("Customer profile incomplete: {field} is missing or not yet updated")]
    IncompleteProfile { field: String },

    /// Cart-sourced order requested but the cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Insufficient stock to reserve a line item.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds the remaining stock of the product
    ///   (or of the specific variant when one is selected)
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Voucher could not be applied (wraps VoucherError).
    #[error("Voucher rejected: {0}")]
    Voucher(#[from] VoucherError),

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_id} is {current}, cannot transition to {requested}")]
    InvalidStatusTransition {
        order_id: i64,
        current: String,
        requested: String,
    },

    /// User cancellation attempted outside the 30-minute window or after
    /// the order left WAITING_CONFIRMATION.
    #[error("Order {order_id} can no longer be cancelled by the customer")]
    CancellationWindowExpired { order_id: i64 },

    /// Order does not belong to the requesting customer.
    #[error("Order {order_id} does not belong to customer {customer_id}")]
    NotOrderOwner { order_id: i64, customer_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Voucher Error
// =============================================================================

/// Voucher eligibility failures.
///
/// Raised by the voucher evaluator; at order creation they abort the order,
/// at preview they are reported as `voucher_valid = false` with the display
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoucherError {
    /// No voucher exists for the supplied code.
    #[error("Voucher does not exist")]
    NotFound,

    /// Voucher has been deactivated.
    #[error("Voucher is not active")]
    Inactive,

    /// Current time is outside [start_date, end_date].
    #[error("Voucher has expired")]
    Expired,

    /// Order subtotal is below the voucher's minimum order value.
    #[error("Order does not meet the voucher minimum value")]
    BelowMinimum,

    /// used_count has reached usage_limit.
    #[error("Voucher has reached its usage limit")]
    Exhausted,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-numeric id, malformed URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Robot Vacuum X1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Robot Vacuum X1: available 3, requested 5"
        );
    }

    #[test]
    fn test_voucher_error_converts_to_core_error() {
        let core_err: CoreError = VoucherError::Exhausted.into();
        assert!(matches!(core_err, CoreError::Voucher(VoucherError::Exhausted)));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }
}
