//! # Order Lifecycle Manager
//!
//! Status transitions, cancellation policy and stock restoration.
//!
//! ## Cancellation Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Cancellation                                  │
//! │                                                                         │
//! │  customer:  status == WAITING_CONFIRMATION                              │
//! │             AND now - created_at <= 30 minutes                          │
//! │             AND order belongs to the customer                           │
//! │                                                                         │
//! │  admin:     status != COMPLETED                                         │
//! │                                                                         │
//! │  both:      restore every line's stock, THEN flip to CANCELLED,         │
//! │             in ONE transaction (restore-then-flip is atomic)            │
//! │                                                                         │
//! │  neither path attempts a payment-gateway refund.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `status != CANCELLED` guard inside the transaction makes cancellation
//! idempotent: a second cancel finds the order already CANCELLED and fails
//! the transition check before any stock moves.

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::error::DbResult;
use crate::inventory;
use crate::pool::Database;
use vela_core::{CoreError, Order, OrderItem, OrderStatus, USER_CANCEL_WINDOW_MINUTES};

/// Service managing order status transitions.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    db: Database,
}

impl LifecycleService {
    /// Creates a new LifecycleService.
    pub fn new(db: Database) -> Self {
        LifecycleService { db }
    }

    /// Moves an order forward along the state machine
    /// (confirm → ship → complete).
    ///
    /// Cancellations go through [`cancel_by_user`](Self::cancel_by_user) or
    /// [`cancel_by_admin`](Self::cancel_by_admin), which also restore stock.
    pub async fn update_status(&self, order_id: i64, new_status: OrderStatus) -> DbResult<Order> {
        let mut tx = self.db.pool().begin().await?;

        let order = load_order(&mut tx, order_id).await?;
        if order.status == new_status {
            // no-op transition: nothing to write, nothing to notify
            tx.rollback().await?;
            return Ok(order);
        }
        if new_status == OrderStatus::Cancelled || !order.status.can_transition_to(new_status) {
            return Err(CoreError::InvalidStatusTransition {
                order_id,
                current: order.status.to_string(),
                requested: new_status.to_string(),
            }
            .into());
        }

        set_status(&mut tx, order_id, new_status).await?;
        tx.commit().await?;

        info!(order_id, from = %order.status, to = %new_status, "Order status updated");
        self.notify_status_change(&order, new_status).await;

        Ok(Order { status: new_status, ..order })
    }

    /// Customer-initiated cancellation.
    ///
    /// Allowed only while the order is WAITING_CONFIRMATION and within
    /// 30 minutes of creation; otherwise `CancellationWindowExpired` and
    /// stock is left untouched.
    pub async fn cancel_by_user(&self, order_id: i64, customer_id: &str) -> DbResult<Order> {
        let mut tx = self.db.pool().begin().await?;

        let order = load_order(&mut tx, order_id).await?;
        if order.customer_id != customer_id {
            return Err(CoreError::NotOrderOwner {
                order_id,
                customer_id: customer_id.to_string(),
            }
            .into());
        }

        let deadline = order.created_at + Duration::minutes(USER_CANCEL_WINDOW_MINUTES);
        if order.status != OrderStatus::WaitingConfirmation || Utc::now() > deadline {
            return Err(CoreError::CancellationWindowExpired { order_id }.into());
        }

        let cancelled = cancel_in_tx(&mut tx, order).await?;
        tx.commit().await?;

        info!(order_id, customer_id = %customer_id, "Order cancelled by customer");
        self.notify_status_change(&cancelled, OrderStatus::Cancelled).await;

        Ok(cancelled)
    }

    /// Admin-initiated cancellation: any non-COMPLETED order.
    pub async fn cancel_by_admin(&self, order_id: i64) -> DbResult<Order> {
        let mut tx = self.db.pool().begin().await?;

        let order = load_order(&mut tx, order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(CoreError::InvalidStatusTransition {
                order_id,
                current: order.status.to_string(),
                requested: OrderStatus::Cancelled.to_string(),
            }
            .into());
        }

        let cancelled = cancel_in_tx(&mut tx, order).await?;
        tx.commit().await?;

        info!(order_id, "Order cancelled by admin");
        self.notify_status_change(&cancelled, OrderStatus::Cancelled).await;

        Ok(cancelled)
    }

    /// Emits the status-change notifications, fire-and-forget.
    async fn notify_status_change(&self, order: &Order, new_status: OrderStatus) {
        let message = format!("Your order #{} {}", order.id, new_status.phrase());
        if let Err(e) = self
            .db
            .notifications()
            .notify_customer(&order.customer_id, &message, "ORDER_STATUS", order.id)
            .await
        {
            warn!(order_id = order.id, error = %e, "Customer notification failed");
        }

        if new_status == OrderStatus::Cancelled {
            if let Err(e) = self
                .db
                .notifications()
                .notify_admins(
                    &format!("Order #{} has been cancelled", order.id),
                    "ORDER_CANCELLED",
                    order.id,
                )
                .await
            {
                warn!(order_id = order.id, error = %e, "Admin notification failed");
            }
        }
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn load_order(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Order> {
    // same row mapping as OrderRepository, run on this transaction's
    // connection so checks and writes see one snapshot
    let row = sqlx::query_as::<_, crate::repository::order::OrderRow>(
        r#"
        SELECT id, customer_id, status, payment_method, total_amount_vnd,
               discount_amount_vnd, voucher_id, voucher_code, full_name, email,
               phone, street, ward, district, city, created_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CoreError::OrderNotFound(order_id))?;

    Order::try_from(row)
}

async fn load_items(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, variant_id, quantity, unit_price_vnd
        FROM order_items
        WHERE order_id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn set_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
) -> DbResult<()> {
    sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
        .bind(order_id)
        .bind(status.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Restores every line's stock, then flips the status. Caller commits.
async fn cancel_in_tx(conn: &mut SqliteConnection, order: Order) -> DbResult<Order> {
    // precondition checked by the caller: order.status != CANCELLED here,
    // so restoration runs at most once per order
    let items = load_items(conn, order.id).await?;
    for item in &items {
        inventory::restore_line(conn, &item.product_id, item.variant_id.as_deref(), item.quantity)
            .await?;
    }
    set_status(conn, order.id, OrderStatus::Cancelled).await?;

    Ok(Order {
        status: OrderStatus::Cancelled,
        ..order
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CheckoutService, CreateOrderRequest};
    use crate::error::DbError;
    use crate::pool::DbConfig;
    use vela_core::PaymentMethod;

    async fn setup_with_order() -> (Database, Order, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .create(Some("Tran Thi B"), Some("0901234567"), Some("b@example.com"))
            .await
            .unwrap();
        db.customers()
            .add_address(&customer.id, Some("12 Nguyen Trai"), Some("W"), Some("D"), Some("C"))
            .await
            .unwrap();
        let product = db.products().create("Kettle K3", 30_000, 5).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 2)
            .await
            .unwrap();

        let created = CheckoutService::new(db.clone())
            .create_order(&CreateOrderRequest {
                customer_id: customer.id.clone(),
                payment_method: PaymentMethod::Cod,
                voucher_code: None,
                buy_now: None,
            })
            .await
            .unwrap();

        (db, created.order, product.id)
    }

    /// Rewrites created_at so window checks can be exercised.
    async fn backdate_order(db: &Database, order_id: i64, minutes: i64) {
        let past = Utc::now() - Duration::minutes(minutes);
        sqlx::query("UPDATE orders SET created_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(past)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_forward_transitions() {
        let (db, order, _) = setup_with_order().await;
        let service = LifecycleService::new(db);

        let order = service.update_status(order.id, OrderStatus::Confirmed).await.unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        let order = service.update_status(order.id, OrderStatus::Shipped).await.unwrap();
        let order = service.update_status(order.id, OrderStatus::Completed).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_skipping_forward_is_rejected() {
        let (db, order, _) = setup_with_order().await;
        let service = LifecycleService::new(db);

        let err = service.update_status(order.id, OrderStatus::Shipped).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_user_cancel_restores_stock() {
        let (db, order, product_id) = setup_with_order().await;
        let service = LifecycleService::new(db.clone());

        let cancelled = service.cancel_by_user(order.id, &order.customer_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
        assert_eq!(product.sold_count, 0);
    }

    #[tokio::test]
    async fn test_user_cancel_after_31_minutes_fails() {
        let (db, order, product_id) = setup_with_order().await;
        backdate_order(&db, order.id, 31).await;

        let service = LifecycleService::new(db.clone());
        let err = service.cancel_by_user(order.id, &order.customer_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::CancellationWindowExpired { .. })
        ));

        // stock stays reserved
        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_user_cancel_within_window_succeeds_at_29_minutes() {
        let (db, order, _) = setup_with_order().await;
        backdate_order(&db, order.id, 29).await;

        let service = LifecycleService::new(db);
        assert!(service.cancel_by_user(order.id, &order.customer_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_cancel_requires_ownership() {
        let (db, order, _) = setup_with_order().await;
        let service = LifecycleService::new(db);

        let err = service.cancel_by_user(order.id, "someone-else").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotOrderOwner { .. })));
    }

    #[tokio::test]
    async fn test_user_cancel_blocked_after_confirmation() {
        let (db, order, _) = setup_with_order().await;
        let service = LifecycleService::new(db);

        service.update_status(order.id, OrderStatus::Confirmed).await.unwrap();
        let err = service.cancel_by_user(order.id, &order.customer_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::CancellationWindowExpired { .. })
        ));
    }

    #[tokio::test]
    async fn test_admin_cancel_any_non_completed() {
        let (db, order, product_id) = setup_with_order().await;
        let service = LifecycleService::new(db.clone());

        service.update_status(order.id, OrderStatus::Confirmed).await.unwrap();
        service.update_status(order.id, OrderStatus::Shipped).await.unwrap();

        let cancelled = service.cancel_by_admin(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_admin_cancel_rejected_for_completed() {
        let (db, order, _) = setup_with_order().await;
        let service = LifecycleService::new(db);

        service.update_status(order.id, OrderStatus::Confirmed).await.unwrap();
        service.update_status(order.id, OrderStatus::Shipped).await.unwrap();
        service.update_status(order.id, OrderStatus::Completed).await.unwrap();

        let err = service.cancel_by_admin(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_double_cancel_restores_stock_once() {
        let (db, order, product_id) = setup_with_order().await;
        let service = LifecycleService::new(db.clone());

        service.cancel_by_admin(order.id).await.unwrap();
        // second cancel fails the transition check, stock untouched
        assert!(service.cancel_by_admin(order.id).await.is_err());

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
        assert_eq!(product.sold_count, 0);
    }

    #[tokio::test]
    async fn test_expense_summary_excludes_cancelled() {
        let (db, order, _) = setup_with_order().await;
        let from = Utc::now() - Duration::hours(1);
        let to = Utc::now() + Duration::hours(1);

        let summary = db
            .orders()
            .expense_summary(&order.customer_id, from, to)
            .await
            .unwrap();
        assert_eq!(summary.order_count, 1);
        assert_eq!(summary.total_vnd, 60_000);

        LifecycleService::new(db.clone()).cancel_by_admin(order.id).await.unwrap();

        let summary = db
            .orders()
            .expense_summary(&order.customer_id, from, to)
            .await
            .unwrap();
        assert_eq!(summary.order_count, 0);
        assert_eq!(summary.total_vnd, 0);
        assert!(summary.orders.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_order_exits_revenue() {
        let (db, order, _) = setup_with_order().await;
        assert_eq!(db.orders().revenue_total().await.unwrap(), 60_000);

        LifecycleService::new(db.clone()).cancel_by_admin(order.id).await.unwrap();
        assert_eq!(db.orders().revenue_total().await.unwrap(), 0);
    }
}
