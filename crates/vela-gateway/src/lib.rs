//! # vela-gateway: Payment Gateway Adapter for Vela Commerce
//!
//! The only crate in the workspace that talks to the outside world: it
//! creates signed checkout links at the PayOS-style provider, verifies and
//! applies inbound webhooks, and resolves the provider's browser redirects.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Vela Commerce Architecture                        │
//! │                                                                         │
//! │           Payment Provider (HTTPS)          Browser redirects           │
//! │                 ▲         │                        │                    │
//! │                 │         ▼                        ▼                    │
//! │  ┌──────────────┴──────────────────────────────────────────────────┐   │
//! │  │               ★ vela-gateway (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  client   │  │  webhook  │  │ callback  │  │  config   │  │   │
//! │  │   │ pay links │  │ verify +  │  │ return /  │  │ env vars  │  │   │
//! │  │   │ ordercode │  │  apply    │  │ cancel    │  │ secrets   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                     vela-db ──► vela-core                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`client`] - Payment-link creation and order-code derivation
//! - [`webhook`] - Signature verification and idempotent webhook application
//! - [`callback`] - Return/cancel redirect resolution
//! - [`config`] - Provider credentials and callback URLs
//! - [`error`] - Gateway error taxonomy

// =============================================================================
// Module Declarations
// =============================================================================

pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod webhook;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use callback::{CallbackResolver, RedirectParams};
pub use client::{derive_order_code, GatewayClient, PaymentLink};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use webhook::{WebhookHandler, WebhookOutcome, WebhookPayload};
