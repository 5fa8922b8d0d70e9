//! # vela-db: Database Layer for Vela Commerce
//!
//! This crate owns **all database access** for the settlement core: SQLite
//! pooling, the embedded schema, repositories, and the two transactional
//! services (checkout and lifecycle).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Vela Commerce Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  vela-gateway (Integration)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vela-db (THIS CRATE) ★                          │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌──────────┐  │   │
//! │  │   │   pool    │  │ repository │  │ checkout  │  │lifecycle │  │   │
//! │  │   │  schema   │  │  product   │  │ create /  │  │ confirm  │  │   │
//! │  │   │           │  │  order ... │  │ preview   │  │ cancel   │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │        + inventory (stock ledger, transaction-scoped)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vela-core (Pure Logic)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Boundaries
//!
//! - [`checkout::CheckoutService::create_order`]: one transaction covering
//!   reservation, voucher commit, order/items/payment inserts, loyalty and
//!   cart cleanup
//! - [`lifecycle::LifecycleService`]: restore-then-flip cancellation in one
//!   transaction
//!
//! Notifications are written AFTER commit, fire-and-forget.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{BuyNowLine, CheckoutService, CreateOrderRequest, CreatedOrder, OrderPreview};
pub use error::{DbError, DbResult};
pub use lifecycle::LifecycleService;
pub use pool::{Database, DbConfig};
