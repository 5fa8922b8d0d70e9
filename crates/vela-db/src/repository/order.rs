//! # Order & Payment Repositories
//!
//! Database operations for orders, order items and payments.
//!
//! ## Row Mapping
//! Orders and payments carry domain enums (`OrderStatus`, `PaymentMethod`,
//! `PaymentStatus`) that are stored as TEXT. Rows are fetched into private
//! row structs and converted explicitly, so an unrecognized stored value
//! surfaces as `DbError::CorruptColumn` instead of a decode panic.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vela_core::{
    Order, OrderInfo, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};

// =============================================================================
// Row Structs
// =============================================================================

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: i64,
    customer_id: String,
    status: String,
    payment_method: String,
    total_amount_vnd: i64,
    discount_amount_vnd: i64,
    voucher_id: Option<String>,
    voucher_code: Option<String>,
    full_name: String,
    email: String,
    phone: String,
    street: String,
    ward: String,
    district: String,
    city: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Order, DbError> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|_| DbError::corrupt("orders.status", &row.status))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|_| DbError::corrupt("orders.payment_method", &row.payment_method))?;

        Ok(Order {
            id: row.id,
            customer_id: row.customer_id,
            status,
            payment_method,
            total_amount_vnd: row.total_amount_vnd,
            discount_amount_vnd: row.discount_amount_vnd,
            voucher_id: row.voucher_id,
            voucher_code: row.voucher_code,
            info: OrderInfo {
                full_name: row.full_name,
                email: row.email,
                phone: row.phone,
                street: row.street,
                ward: row.ward,
                district: row.district,
                city: row.city,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    order_id: i64,
    method: String,
    amount_vnd: i64,
    status: String,
    txn_ref: Option<String>,
    transaction_no: Option<String>,
    transaction_status: Option<String>,
    checkout_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Payment, DbError> {
        let method: PaymentMethod = row
            .method
            .parse()
            .map_err(|_| DbError::corrupt("payments.method", &row.method))?;

        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            method,
            amount_vnd: row.amount_vnd,
            // PaymentStatus is a total mapping, unknown strings become Other
            status: PaymentStatus::from_column(&row.status),
            txn_ref: row.txn_ref,
            transaction_no: row.transaction_no,
            transaction_status: row.transaction_status,
            checkout_url: row.checkout_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, status, payment_method, total_amount_vnd, \
     discount_amount_vnd, voucher_id, voucher_code, full_name, email, phone, \
     street, ward, district, city, created_at";

const PAYMENT_COLUMNS: &str = "id, order_id, method, amount_vnd, status, txn_ref, \
     transaction_no, transaction_status, checkout_url, created_at, updated_at";

// =============================================================================
// Order Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Lists an order's line items.
    pub async fn items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, variant_id, quantity, unit_price_vnd
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Lists all orders in a given status, oldest first (fulfilment order).
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 ORDER BY created_at"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Counts orders per status.
    pub async fn count_by_status(&self) -> DbResult<Vec<(OrderStatus, i64)>> {
        let mut counts = Vec::with_capacity(OrderStatus::ALL.len());
        for status in OrderStatus::ALL {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = ?1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    /// Total committed revenue in whole dong. Cancelled orders don't count.
    pub async fn revenue_total(&self) -> DbResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount_vnd), 0) FROM orders WHERE status != ?1",
        )
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Orders placed in `[from, to]` that still count as spend (everything
    /// except CANCELLED), with their count and combined total.
    pub async fn expense_summary(
        &self,
        customer_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<ExpenseSummary> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE customer_id = ?1 AND status != ?2
              AND created_at >= ?3 AND created_at <= ?4
            ORDER BY created_at DESC
            "#
        ))
        .bind(customer_id)
        .bind(OrderStatus::Cancelled.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let orders: Vec<Order> = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<DbResult<_>>()?;
        let total_vnd = orders.iter().map(|o| o.total_amount_vnd).sum();

        Ok(ExpenseSummary {
            order_count: orders.len() as i64,
            total_vnd,
            orders,
        })
    }
}

/// A customer's non-cancelled spend over a date range.
#[derive(Debug, Clone)]
pub struct ExpenseSummary {
    pub orders: Vec<Order>,
    pub order_count: i64,
    pub total_vnd: i64,
}

// =============================================================================
// Payment Repository
// =============================================================================

/// Repository for payment database operations.
///
/// Gateway state (txn_ref, transaction_no, provider status, checkout URL)
/// is written exclusively through this repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets the payment attached to an order.
    pub async fn get_by_order(&self, order_id: i64) -> DbResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    /// Finds a payment by its gateway order code (txn_ref), compared as the
    /// exact string the provider sent.
    pub async fn get_by_txn_ref(&self, txn_ref: &str) -> DbResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE txn_ref = ?1"
        ))
        .bind(txn_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    /// Persists the derived gateway order code on a payment.
    pub async fn set_txn_ref(&self, payment_id: &str, txn_ref: &str) -> DbResult<()> {
        debug!(payment_id = %payment_id, txn_ref = %txn_ref, "Persisting txn_ref");

        sqlx::query("UPDATE payments SET txn_ref = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(payment_id)
            .bind(txn_ref)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persists the provider's payment-request identifier unless one is
    /// already recorded.
    pub async fn set_transaction_no_if_absent(
        &self,
        payment_id: &str,
        transaction_no: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET transaction_no = ?2, updated_at = ?3
            WHERE id = ?1 AND transaction_no IS NULL
            "#,
        )
        .bind(payment_id)
        .bind(transaction_no)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets the payment status.
    pub async fn set_status(&self, payment_id: &str, status: &PaymentStatus) -> DbResult<()> {
        sqlx::query("UPDATE payments SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(payment_id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Applies a webhook's full state in one update: mapped status, the raw
    /// provider status, the provider transaction number and checkout URL.
    ///
    /// The update itself is absolute (last write wins with identical values),
    /// which is what makes duplicate webhook delivery harmless.
    pub async fn apply_webhook(
        &self,
        payment_id: &str,
        status: &PaymentStatus,
        transaction_status: Option<&str>,
        transaction_no: Option<&str>,
        checkout_url: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?2,
                transaction_status = COALESCE(?3, transaction_status),
                transaction_no = COALESCE(?4, transaction_no),
                checkout_url = COALESCE(?5, checkout_url),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(payment_id)
        .bind(status.as_str())
        .bind(transaction_status)
        .bind(transaction_no)
        .bind(checkout_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Insert Helpers (used by the checkout transaction)
// =============================================================================

/// Builds a fresh payment record for a new order.
pub(crate) fn new_payment(order_id: i64, method: PaymentMethod, amount_vnd: i64) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4().to_string(),
        order_id,
        method,
        amount_vnd,
        status: method.initial_payment_status(),
        txn_ref: None,
        transaction_no: None,
        transaction_status: None,
        checkout_url: None,
        created_at: now,
        updated_at: now,
    }
}
