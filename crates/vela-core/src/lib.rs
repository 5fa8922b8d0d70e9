//! # vela-core: Pure Business Logic for Vela Commerce
//!
//! This crate is the **heart** of the Vela settlement core. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Vela Commerce Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  vela-gateway (Integration)                     │   │
//! │  │      payment-link requests, webhooks, redirect callbacks        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vela-db (Database Layer)                     │   │
//! │  │     SQLite repositories, checkout & lifecycle transactions      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vela-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  voucher  │  │ signature │  │   │
//! │  │   │  Order    │  │   Money   │  │ evaluate  │  │ canonical │  │   │
//! │  │   │  Payment  │  │  (VND)    │  │ discount  │  │ HMAC-hex  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Payment, Voucher, Product, ...)
//! - [`money`] - Money type with integer VND arithmetic (no floating point!)
//! - [`voucher`] - Voucher eligibility and discount evaluation
//! - [`signature`] - Canonicalization + HMAC-SHA256 for the payment provider
//! - [`validation`] - Profile and input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: evaluation and signing are deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are whole dong (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use vela_core::money::Money;
//!
//! let subtotal = Money::from_vnd(100_000);
//! let discount = subtotal.percentage(10.0) + Money::from_vnd(5_000);
//! let total = subtotal - discount.clamp_discount(subtotal);
//! assert_eq!(total.vnd(), 85_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod signature;
pub mod types;
pub mod validation;
pub mod voucher;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vela_core::Money` instead of
// `use vela_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError, VoucherError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minutes after creation during which a customer may cancel their own order.
///
/// ## Business Reason
/// Gives customers a short regret window while keeping fulfilment latency
/// predictable. Admin cancellation is not bound by this window.
pub const USER_CANCEL_WINDOW_MINUTES: i64 = 30;

/// Whole dong of committed order total that earn one loyalty point.
pub const LOYALTY_POINT_UNIT_VND: i64 = 10_000;

/// Minimum amount (whole dong) the payment provider accepts for a link.
pub const GATEWAY_MIN_AMOUNT_VND: i64 = 10_000;
