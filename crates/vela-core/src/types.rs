//! # Domain Types
//!
//! Core domain types for the order settlement core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (i64)       │   │  id (UUID)      │       │
//! │  │  price_vnd      │   │  status         │   │  order_id (FK)  │       │
//! │  │  stock/hidden   │   │  total_vnd      │   │  status/txn_ref │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Voucher      │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  percent+flat   │   │  Waiting...     │   │  Cod / Payos    │       │
//! │  │  usage window   │   │  → Completed    │   │  Card / Momo    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every entity except `Order` uses a UUID v4 string id. Orders use an i64
//! store-assigned id because the payment provider's order-code derivation
//! needs a numeric seed that fits its 32-bit field.
//!
//! ## Ownership
//! Records reference each other by id, never by embedding. An Order owns its
//! OrderItems and Payment (cascading lifecycle); Voucher and Product are
//! referenced, never owned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// ## State Machine
/// ```text
/// WAITING_CONFIRMATION ──► CONFIRMED ──► SHIPPED ──► COMPLETED
///          │
///          └──► CANCELLED   (CANCELLED and COMPLETED are terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, awaiting shop confirmation.
    WaitingConfirmation,
    /// Shop confirmed the order.
    Confirmed,
    /// Order handed to the carrier.
    Shipped,
    /// Order delivered. Terminal.
    Completed,
    /// Order cancelled by customer or admin. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, for per-status counting.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::WaitingConfirmation,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Stable storage/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingConfirmation => "WAITING_CONFIRMATION",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status permits no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Checks the forward path of the state machine.
    ///
    /// Cancellation policy (who may cancel, and when) is enforced by the
    /// lifecycle manager; this only encodes reachable edges.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (WaitingConfirmation, Confirmed) => true,
            (Confirmed, Shipped) => true,
            (Shipped, Completed) => true,
            (WaitingConfirmation | Confirmed | Shipped, Cancelled) => true,
            _ => false,
        }
    }

    /// Fixed human-readable phrase used in status-change notifications.
    pub const fn phrase(&self) -> &'static str {
        match self {
            OrderStatus::WaitingConfirmation => "is awaiting confirmation",
            OrderStatus::Confirmed => "has been confirmed",
            OrderStatus::Shipped => "is out for delivery",
            OrderStatus::Completed => "has been delivered",
            OrderStatus::Cancelled => "has been cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING_CONFIRMATION" => Ok(OrderStatus::WaitingConfirmation),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Card payment.
    Card,
    /// MoMo wallet.
    Momo,
    /// VNPay gateway.
    Vnpay,
    /// PayOS gateway (the integrated provider).
    Payos,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Momo => "MOMO",
            PaymentMethod::Vnpay => "VNPAY",
            PaymentMethod::Payos => "PAYOS",
        }
    }

    /// COD settles offline; every other method awaits an online payment.
    pub const fn is_cod(&self) -> bool {
        matches!(self, PaymentMethod::Cod)
    }

    /// Initial payment status for an order paid with this method.
    pub const fn initial_payment_status(&self) -> PaymentStatus {
        if self.is_cod() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::AwaitingPayment
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentMethod::Cod),
            "CARD" => Ok(PaymentMethod::Card),
            "MOMO" => Ok(PaymentMethod::Momo),
            "VNPAY" => Ok(PaymentMethod::Vnpay),
            "PAYOS" => Ok(PaymentMethod::Payos),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement status of a payment.
///
/// A closed tagged enumeration; `Other` carries the raw provider status for
/// forward-compatibility with statuses the mapping does not know yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// COD order, settled on delivery.
    Pending,
    /// Gateway order, checkout link not yet paid.
    AwaitingPayment,
    /// Provider reported a successful payment.
    Success,
    /// Provider cancelled or refunded the payment.
    Refunded,
    /// Provider sent no status at all.
    Unknown,
    /// Unmapped provider status, stored uppercased as received.
    Other(String),
}

impl PaymentStatus {
    /// Stable storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::AwaitingPayment => "AWAITING_PAYMENT",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Unknown => "UNKNOWN",
            PaymentStatus::Other(raw) => raw,
        }
    }

    /// Parses a stored status column back into the enum.
    pub fn from_column(s: &str) -> PaymentStatus {
        match s {
            "PENDING" => PaymentStatus::Pending,
            "AWAITING_PAYMENT" => PaymentStatus::AwaitingPayment,
            "SUCCESS" => PaymentStatus::Success,
            "REFUNDED" => PaymentStatus::Refunded,
            "UNKNOWN" => PaymentStatus::Unknown,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    /// Maps a raw provider status onto the closed status set.
    ///
    /// ## Mapping (case-insensitive)
    /// - PAID / SUCCESS / SUCCEEDED / COMPLETED → Success
    /// - CANCELLED / REFUNDED                   → Refunded
    /// - anything else                          → Other(uppercased raw)
    /// - absent                                 → Unknown
    ///
    /// Re-applying the mapping to the same input yields the same value, which
    /// is what makes duplicate webhook delivery safe.
    pub fn from_provider(raw: Option<&str>) -> PaymentStatus {
        let Some(raw) = raw else {
            return PaymentStatus::Unknown;
        };
        let upper = raw.to_uppercase();
        match upper.as_str() {
            "PAID" | "SUCCESS" | "SUCCEEDED" | "COMPLETED" => PaymentStatus::Success,
            "CANCELLED" | "REFUNDED" => PaymentStatus::Refunded,
            _ => PaymentStatus::Other(upper),
        }
    }

    /// Whether a raw redirect/webhook status token signals success.
    pub fn is_success_token(raw: &str) -> bool {
        matches!(
            raw.to_uppercase().as_str(),
            "PAID" | "SUCCESS" | "SUCCEEDED" | "COMPLETED"
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product & Variant
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in catalog, order lines and stock errors.
    pub name: String,

    /// Current unit price in whole dong. Orders snapshot this at creation.
    pub price_vnd: i64,

    /// Aggregate stock for the product itself (variant-less purchases).
    pub stock: i64,

    /// Units sold, incremented at reservation and reversed at cancellation.
    pub sold_count: i64,

    /// Auto-set when stock reaches zero; removes the product from the catalog.
    pub hidden: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_vnd(self.price_vnd)
    }
}

/// A specific variant of a product (color, capacity, ...).
///
/// Variant stock is checked and decremented independently of the parent
/// product's stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    /// Display name ("Black / 512GB"), used in stock errors.
    pub name: String,
    pub stock: i64,
}

// =============================================================================
// Voucher
// =============================================================================

/// A discount instrument.
///
/// Percentage and flat amount are independently optional; when both are set
/// their effects add, and the total is capped at the order subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Voucher {
    pub id: String,
    /// Unique redemption code.
    pub code: String,
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Minimum order subtotal for the voucher to apply.
    pub min_order_value_vnd: i64,
    /// Maximum number of committed redemptions.
    pub usage_limit: i64,
    /// Committed redemptions so far. Incremented only inside the order
    /// creation transaction, never on preview.
    pub used_count: i64,
    /// Percentage reduction of the subtotal, e.g. 10.0 for 10%.
    pub discount_percent: Option<f64>,
    /// Flat reduction in whole dong.
    pub discount_amount_vnd: Option<i64>,
}

impl Voucher {
    #[inline]
    pub fn min_order_value(&self) -> Money {
        Money::from_vnd(self.min_order_value_vnd)
    }
}

// =============================================================================
// Customer, Address & Cart
// =============================================================================

/// A customer account, reduced to the fields settlement needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    /// May still hold the registration placeholder; see [`crate::validation`].
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Earned at 1 point per 10.000₫ of committed order total.
    pub loyalty_points: i64,
}

/// A delivery address. The first address (by id) is the delivery address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub id: String,
    pub customer_id: String,
    pub street: Option<String>,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
}

/// A line in a customer's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

// =============================================================================
// Order
// =============================================================================

/// Delivery and contact info frozen onto the order at creation time.
///
/// ## Snapshot Pattern
/// Copied from the live customer profile exactly once, when the order is
/// placed. Later profile edits never touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub city: String,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned numeric id (also the seed for the gateway order code).
    pub id: i64,
    pub customer_id: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Final amount after discount, in whole dong.
    pub total_amount_vnd: i64,
    /// Discount actually applied, in whole dong.
    pub discount_amount_vnd: i64,
    /// Weak reference; the voucher may later be deleted.
    pub voucher_id: Option<String>,
    /// Snapshot of the voucher code, retained independently of the voucher.
    pub voucher_code: Option<String>,
    /// Frozen delivery/contact snapshot.
    pub info: OrderInfo,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Final amount as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_vnd(self.total_amount_vnd)
    }

    /// Discount as Money.
    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_vnd(self.discount_amount_vnd)
    }

    /// Pre-discount subtotal, reconstructed from the invariant
    /// `total = subtotal - discount`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_vnd(self.total_amount_vnd + self.discount_amount_vnd)
    }
}

/// A line item in an order.
/// Uses the snapshot pattern to freeze the unit price at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: i64,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Quantity ordered (> 0).
    pub quantity: i64,
    /// Unit price at order time (frozen).
    pub unit_price_vnd: i64,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_vnd(self.unit_price_vnd * self.quantity)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// The payment record paired one-to-one with an order.
///
/// Mutated by the gateway adapter on link creation and webhook receipt;
/// everything else treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount_vnd: i64,
    pub status: PaymentStatus,
    /// The gateway order code, as a string; correlates inbound webhooks.
    pub txn_ref: Option<String>,
    /// Provider payment-request id (falls back to payment-link id).
    pub transaction_no: Option<String>,
    /// Raw provider status string, stored verbatim.
    pub transaction_status: Option<String>,
    /// Provider checkout URL, stored from the webhook.
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_vnd(self.amount_vnd)
    }
}

// =============================================================================
// Notification
// =============================================================================

/// A persisted fire-and-forget notification.
///
/// `customer_id = None` marks an admin broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: String,
    pub customer_id: Option<String>,
    pub message: String,
    /// Category tag: "ORDER_CREATED", "ORDER_STATUS", "ORDER_CANCELLED", ...
    pub category: String,
    /// Id of the entity the notification refers to (the order id).
    pub ref_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
