//! # Repository Layer
//!
//! Database access organized by aggregate.
//!
//! ## Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Services (checkout, lifecycle, gateway)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository structs (this module) ← One per aggregate                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sqlx queries against SqlitePool                                       │
//! │                                                                         │
//! │  Multi-table workflows (checkout, cancellation) run their own          │
//! │  transactions in the service modules; repositories cover single-        │
//! │  aggregate reads and writes.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod notification;
pub mod order;
pub mod product;
pub mod voucher;
