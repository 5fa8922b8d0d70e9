//! # Checkout Service
//!
//! Order assembly: resolves cart or buy-now lines, reserves stock, applies a
//! voucher and persists the order, its items and its payment in ONE
//! transaction.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_order (single transaction)                  │
//! │                                                                         │
//! │  1. load customer                  → CustomerNotFound                  │
//! │  2. snapshot profile + address     → IncompleteProfile                 │
//! │  3. resolve lines (cart / buy-now) → EmptyCart, MustBePositive         │
//! │  4. price lines at CURRENT prices  → ProductNotFound                   │
//! │  5. reserve stock per line         → InsufficientStock (rolls back)    │
//! │  6. evaluate + commit voucher      → VoucherError (rolls back)         │
//! │  7. insert order (WAITING_CONFIRMATION) + items                        │
//! │  8. insert payment (PENDING for COD, AWAITING_PAYMENT otherwise)       │
//! │  9. award loyalty points (total / 10 000)                              │
//! │ 10. clear cart lines (cart-sourced orders only)                        │
//! │         │                                                               │
//! │      COMMIT                                                             │
//! │         │                                                               │
//! │ 11. notifications, fire-and-forget (logged, never propagated)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `preview_order` walks steps 1–6 read-only: no reservation, no voucher
//! commit, no rows written, no matter how often it is called.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::inventory;
use crate::pool::Database;
use crate::repository::order::new_payment;
use vela_core::{
    validation, voucher, CartItem, CoreError, Customer, Money, Order, OrderInfo, OrderItem,
    OrderStatus, Payment, PaymentMethod, Voucher, LOYALTY_POINT_UNIT_VND,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// A direct purchase of one product/variant, bypassing the cart.
#[derive(Debug, Clone)]
pub struct BuyNowLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Defaults to 1 when absent; must be positive when given.
    pub quantity: Option<i64>,
}

/// Input for order creation and preview.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub payment_method: PaymentMethod,
    pub voucher_code: Option<String>,
    /// When set, the order is built from this single line instead of the cart.
    pub buy_now: Option<BuyNowLine>,
}

/// A committed order with its lines and payment record.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
}

/// One priced line in a preview.
#[derive(Debug, Clone)]
pub struct PreviewLine {
    pub product_id: String,
    pub product_name: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub unit_price_vnd: i64,
    pub line_total_vnd: i64,
}

/// Read-only order preview: totals and voucher outcome, nothing persisted.
#[derive(Debug, Clone)]
pub struct OrderPreview {
    pub lines: Vec<PreviewLine>,
    pub subtotal_vnd: i64,
    pub discount_vnd: i64,
    pub total_vnd: i64,
    /// True only when a voucher code was supplied AND it is eligible.
    pub voucher_valid: bool,
    /// Display message explaining an ineligible voucher.
    pub voucher_message: Option<String>,
}

/// A line resolved against the catalog, priced at the current price.
struct ResolvedLine {
    product_id: String,
    product_name: String,
    variant_id: Option<String>,
    quantity: i64,
    unit_price_vnd: i64,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Service orchestrating order assembly.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Creates an order from the customer's cart or a buy-now line.
    ///
    /// Any error before commit leaves the database untouched: stock,
    /// voucher counts, cart and loyalty points all roll back together.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> DbResult<CreatedOrder> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        // 1-2. customer + frozen profile snapshot
        let customer = load_customer(&mut tx, &request.customer_id).await?;
        let info = load_profile_snapshot(&mut tx, &customer).await?;

        // 3-4. resolve and price the lines
        let (lines, cart_item_ids) = resolve_lines(&mut tx, request).await?;
        let subtotal: Money = lines
            .iter()
            .map(|l| Money::from_vnd(l.unit_price_vnd) * l.quantity)
            .sum();

        // 5. reserve stock, line by line
        for line in &lines {
            inventory::reserve_line(
                &mut tx,
                &line.product_id,
                line.variant_id.as_deref(),
                line.quantity,
            )
            .await?;
        }

        // 6. voucher: evaluate AND commit the redemption
        let (voucher, discount) = match &request.voucher_code {
            Some(code) => {
                let voucher = load_voucher(&mut tx, code).await?;
                let discount = voucher::evaluate(&voucher, subtotal, now).map_err(CoreError::from)?;
                sqlx::query("UPDATE vouchers SET used_count = used_count + 1 WHERE id = ?1")
                    .bind(&voucher.id)
                    .execute(&mut *tx)
                    .await?;
                (Some(voucher), discount)
            }
            None => (None, Money::zero()),
        };
        let total = subtotal - discount;

        // 7. order + items
        let order = Order {
            id: 0, // assigned by the INSERT below
            customer_id: customer.id.clone(),
            status: OrderStatus::WaitingConfirmation,
            payment_method: request.payment_method,
            total_amount_vnd: total.vnd(),
            discount_amount_vnd: discount.vnd(),
            voucher_id: voucher.as_ref().map(|v| v.id.clone()),
            voucher_code: voucher.as_ref().map(|v| v.code.clone()),
            info,
            created_at: now,
        };
        let order_id = insert_order(&mut tx, &order).await?;
        let order = Order { id: order_id, ..order };

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id,
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                unit_price_vnd: line.unit_price_vnd,
            };
            insert_order_item(&mut tx, &item).await?;
            items.push(item);
        }

        // 8. payment record
        let payment = new_payment(order_id, request.payment_method, total.vnd());
        insert_payment(&mut tx, &payment).await?;

        // 9. loyalty points
        let points = total.vnd() / LOYALTY_POINT_UNIT_VND;
        if points > 0 {
            sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + ?2 WHERE id = ?1")
                .bind(&customer.id)
                .bind(points)
                .execute(&mut *tx)
                .await?;
        }

        // 10. consume the cart
        for cart_item_id in &cart_item_ids {
            sqlx::query("DELETE FROM cart_items WHERE id = ?1")
                .bind(cart_item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            order_id,
            customer_id = %customer.id,
            total = %total,
            method = %request.payment_method,
            "Order created"
        );

        // 11. fire-and-forget notifications
        let notifications = self.db.notifications();
        if let Err(e) = notifications
            .notify_customer(
                &customer.id,
                &format!("Your order #{order_id} has been placed and {}", order.status.phrase()),
                "ORDER_CREATED",
                order_id,
            )
            .await
        {
            warn!(order_id, error = %e, "Customer notification failed");
        }
        if let Err(e) = notifications
            .notify_admins(
                &format!("New order #{order_id} for {total}"),
                "ORDER_CREATED",
                order_id,
            )
            .await
        {
            warn!(order_id, error = %e, "Admin notification failed");
        }

        Ok(CreatedOrder { order, items, payment })
    }

    /// Previews an order without persisting anything.
    ///
    /// Voucher ineligibility is reported, not raised: the preview comes back
    /// with `voucher_valid = false` and the display message, discount zero.
    pub async fn preview_order(&self, request: &CreateOrderRequest) -> DbResult<OrderPreview> {
        let now = Utc::now();
        // a read-only transaction gives the preview one consistent snapshot
        let mut tx = self.db.pool().begin().await?;

        let customer = load_customer(&mut tx, &request.customer_id).await?;
        let (lines, _) = resolve_lines(&mut tx, request).await?;

        let preview_lines: Vec<PreviewLine> = lines
            .iter()
            .map(|l| PreviewLine {
                product_id: l.product_id.clone(),
                product_name: l.product_name.clone(),
                variant_id: l.variant_id.clone(),
                quantity: l.quantity,
                unit_price_vnd: l.unit_price_vnd,
                line_total_vnd: l.unit_price_vnd * l.quantity,
            })
            .collect();
        let subtotal: Money = preview_lines
            .iter()
            .map(|l| Money::from_vnd(l.line_total_vnd))
            .sum();

        let (discount, voucher_valid, voucher_message) = match &request.voucher_code {
            Some(code) => match load_voucher(&mut tx, code).await {
                Ok(voucher) => match voucher::evaluate(&voucher, subtotal, now) {
                    Ok(discount) => (discount, true, None),
                    Err(e) => (Money::zero(), false, Some(e.to_string())),
                },
                Err(DbError::Domain(e)) => (Money::zero(), false, Some(e.to_string())),
                Err(e) => return Err(e),
            },
            None => (Money::zero(), false, None),
        };

        tx.rollback().await?;

        debug!(customer_id = %customer.id, subtotal = %subtotal, "Order previewed");

        Ok(OrderPreview {
            lines: preview_lines,
            subtotal_vnd: subtotal.vnd(),
            discount_vnd: discount.vnd(),
            total_vnd: (subtotal - discount).vnd(),
            voucher_valid,
            voucher_message,
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn load_customer(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Customer> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, full_name, phone, email, loyalty_points FROM customers WHERE id = ?1",
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

    Ok(customer)
}

async fn load_profile_snapshot(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> DbResult<OrderInfo> {
    let address = sqlx::query_as::<_, vela_core::Address>(
        r#"
        SELECT id, customer_id, street, ward, district, city
        FROM addresses
        WHERE customer_id = ?1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(&customer.id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CoreError::IncompleteProfile {
        field: "address".to_string(),
    })?;

    Ok(validation::profile_snapshot(customer, &address)?)
}

async fn load_voucher(conn: &mut SqliteConnection, code: &str) -> DbResult<Voucher> {
    let voucher = sqlx::query_as::<_, Voucher>(
        r#"
        SELECT id, code, active, start_date, end_date, min_order_value_vnd,
               usage_limit, used_count, discount_percent, discount_amount_vnd
        FROM vouchers
        WHERE code = ?1
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CoreError::Voucher(vela_core::VoucherError::NotFound))?;

    Ok(voucher)
}

/// Resolves the request into priced lines plus the cart-item ids to consume.
async fn resolve_lines(
    conn: &mut SqliteConnection,
    request: &CreateOrderRequest,
) -> DbResult<(Vec<ResolvedLine>, Vec<String>)> {
    // gather (product_id, variant_id, quantity, cart_item_id)
    let raw: Vec<(String, Option<String>, i64, Option<String>)> = match &request.buy_now {
        Some(line) => {
            let quantity = line.quantity.unwrap_or(1);
            validation::validate_quantity(quantity).map_err(CoreError::from)?;
            vec![(line.product_id.clone(), line.variant_id.clone(), quantity, None)]
        }
        None => {
            let items = sqlx::query_as::<_, CartItem>(
                r#"
                SELECT id, customer_id, product_id, variant_id, quantity
                FROM cart_items
                WHERE customer_id = ?1
                ORDER BY id
                "#,
            )
            .bind(&request.customer_id)
            .fetch_all(&mut *conn)
            .await?;

            if items.is_empty() {
                return Err(CoreError::EmptyCart.into());
            }

            items
                .into_iter()
                .map(|i| (i.product_id, i.variant_id, i.quantity, Some(i.id)))
                .collect()
        }
    };

    let mut lines = Vec::with_capacity(raw.len());
    let mut cart_item_ids = Vec::new();
    for (product_id, variant_id, quantity, cart_item_id) in raw {
        // price every line at the CURRENT product price; the variant shares
        // its parent's price
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, price_vnd FROM products WHERE id = ?1")
                .bind(&product_id)
                .fetch_optional(&mut *conn)
                .await?;
        let (product_name, unit_price_vnd) =
            row.ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        lines.push(ResolvedLine {
            product_id,
            product_name,
            variant_id,
            quantity,
            unit_price_vnd,
        });
        if let Some(id) = cart_item_id {
            cart_item_ids.push(id);
        }
    }

    Ok((lines, cart_item_ids))
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO orders (customer_id, status, payment_method, total_amount_vnd,
                            discount_amount_vnd, voucher_id, voucher_code,
                            full_name, email, phone, street, ward, district, city,
                            created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        RETURNING id
        "#,
    )
    .bind(&order.customer_id)
    .bind(order.status.as_str())
    .bind(order.payment_method.as_str())
    .bind(order.total_amount_vnd)
    .bind(order.discount_amount_vnd)
    .bind(&order.voucher_id)
    .bind(&order.voucher_code)
    .bind(&order.info.full_name)
    .bind(&order.info.email)
    .bind(&order.info.phone)
    .bind(&order.info.street)
    .bind(&order.info.ward)
    .bind(&order.info.district)
    .bind(&order.info.city)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn insert_order_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, variant_id, quantity, unit_price_vnd)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&item.id)
    .bind(item.order_id)
    .bind(&item.product_id)
    .bind(&item.variant_id)
    .bind(item.quantity)
    .bind(item.unit_price_vnd)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, order_id, method, amount_vnd, status, txn_ref,
                              transaction_no, transaction_status, checkout_url,
                              created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&payment.id)
    .bind(payment.order_id)
    .bind(payment.method.as_str())
    .bind(payment.amount_vnd)
    .bind(payment.status.as_str())
    .bind(&payment.txn_ref)
    .bind(&payment.transaction_no)
    .bind(&payment.transaction_status)
    .bind(&payment.checkout_url)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::Duration;
    use vela_core::PaymentStatus;

    /// In-memory database with one complete customer profile.
    async fn setup() -> (Database, Customer) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .create(Some("Tran Thi B"), Some("0901234567"), Some("b@example.com"))
            .await
            .unwrap();
        db.customers()
            .add_address(
                &customer.id,
                Some("12 Nguyen Trai"),
                Some("Ward 5"),
                Some("District 1"),
                Some("Ho Chi Minh City"),
            )
            .await
            .unwrap();
        (db, customer)
    }

    fn cod_request(customer_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: customer_id.to_string(),
            payment_method: PaymentMethod::Cod,
            voucher_code: None,
            buy_now: None,
        }
    }

    #[tokio::test]
    async fn test_cart_order_happy_path() {
        let (db, customer) = setup().await;
        let product = db.products().create("Robot Vacuum X1", 45_000, 10).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 2)
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        let created = service.create_order(&cod_request(&customer.id)).await.unwrap();

        assert_eq!(created.order.status, OrderStatus::WaitingConfirmation);
        assert_eq!(created.order.total_amount_vnd, 90_000);
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].unit_price_vnd, 45_000);
        assert_eq!(created.payment.status, PaymentStatus::Pending);

        // stock reserved, sold_count bumped
        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 8);
        assert_eq!(product.sold_count, 2);

        // cart consumed
        assert!(db.customers().cart_items(&customer.id).await.unwrap().is_empty());

        // loyalty: 90_000 / 10_000 = 9 points
        let customer = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(customer.loyalty_points, 9);
    }

    #[tokio::test]
    async fn test_order_items_snapshot_price() {
        let (db, customer) = setup().await;
        let product = db.products().create("Air Fryer A2", 60_000, 5).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        let created = service.create_order(&cod_request(&customer.id)).await.unwrap();

        // a later price change leaves the order line untouched
        db.products().set_price(&product.id, 99_000).await.unwrap();
        let items = db.orders().items(created.order.id).await.unwrap();
        assert_eq!(items[0].unit_price_vnd, 60_000);
    }

    #[tokio::test]
    async fn test_buy_now_defaults_to_quantity_one() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 30_000, 4).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.buy_now = Some(BuyNowLine {
            product_id: product.id.clone(),
            variant_id: None,
            quantity: None,
        });

        let service = CheckoutService::new(db.clone());
        let created = service.create_order(&request).await.unwrap();
        assert_eq!(created.items[0].quantity, 1);
        assert_eq!(created.order.total_amount_vnd, 30_000);
    }

    #[tokio::test]
    async fn test_buy_now_rejects_non_positive_quantity() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 30_000, 4).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.buy_now = Some(BuyNowLine {
            product_id: product.id.clone(),
            variant_id: None,
            quantity: Some(0),
        });

        let service = CheckoutService::new(db.clone());
        let err = service.create_order(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (db, customer) = setup().await;
        let service = CheckoutService::new(db);
        let err = service.create_order(&cod_request(&customer.id)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_incomplete_profile_blocks_checkout() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // phone still missing, address present
        let customer = db
            .customers()
            .create(Some("Tran Thi B"), None, Some("b@example.com"))
            .await
            .unwrap();
        db.customers()
            .add_address(&customer.id, Some("12 Nguyen Trai"), Some("W"), Some("D"), Some("C"))
            .await
            .unwrap();
        let product = db.products().create("Kettle K3", 30_000, 4).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let service = CheckoutService::new(db);
        let err = service.create_order(&cod_request(&customer.id)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::IncompleteProfile { field }) if field == "phone"
        ));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let (db, customer) = setup().await;
        let plenty = db.products().create("Kettle K3", 30_000, 10).await.unwrap();
        let scarce = db.products().create("Robot Vacuum X1", 45_000, 1).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &plenty.id, None, 2)
            .await
            .unwrap();
        db.customers()
            .add_cart_item(&customer.id, &scarce.id, None, 3)
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        let err = service.create_order(&cod_request(&customer.id)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));

        // the first line's reservation must have rolled back too
        let plenty = db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
        assert_eq!(plenty.stock, 10);
        assert_eq!(plenty.sold_count, 0);

        // no order, cart intact
        assert!(db.orders().list_by_customer(&customer.id).await.unwrap().is_empty());
        assert_eq!(db.customers().cart_items(&customer.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausting_stock_hides_product() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 30_000, 2).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 2)
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        service.create_order(&cod_request(&customer.id)).await.unwrap();

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
        assert!(product.hidden);
    }

    #[tokio::test]
    async fn test_variant_line_reserves_variant_stock_only() {
        let (db, customer) = setup().await;
        let product = db.products().create("Phone P9", 500_000, 7).await.unwrap();
        let variant = db
            .products()
            .create_variant(&product.id, "Black / 256GB", 3)
            .await
            .unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, Some(&variant.id), 2)
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        service.create_order(&cod_request(&customer.id)).await.unwrap();

        let variant = db.products().get_variant(&variant.id).await.unwrap().unwrap();
        assert_eq!(variant.stock, 1);
        // aggregate product stock is untouched, sold_count still moves
        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 7);
        assert_eq!(product.sold_count, 2);
    }

    #[tokio::test]
    async fn test_voucher_commits_exactly_once() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 100_000, 10).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let now = Utc::now();
        let mut voucher = crate::repository::voucher::VoucherRepository::new_voucher(
            "SUMMER10",
            now - Duration::days(1),
            now + Duration::days(1),
        );
        voucher.discount_percent = Some(10.0);
        voucher.discount_amount_vnd = Some(5_000);
        voucher.usage_limit = 10;
        db.vouchers().create(&voucher).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.voucher_code = Some("SUMMER10".to_string());

        let service = CheckoutService::new(db.clone());
        let created = service.create_order(&request).await.unwrap();

        // subtotal 100_000, 10% + 5_000 → discount 15_000, total 85_000
        assert_eq!(created.order.discount_amount_vnd, 15_000);
        assert_eq!(created.order.total_amount_vnd, 85_000);
        assert_eq!(created.order.voucher_code.as_deref(), Some("SUMMER10"));

        let voucher = db.vouchers().get_by_code("SUMMER10").await.unwrap().unwrap();
        assert_eq!(voucher.used_count, 1);
    }

    #[tokio::test]
    async fn test_exhausted_voucher_aborts_order() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 100_000, 10).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let now = Utc::now();
        let mut voucher = crate::repository::voucher::VoucherRepository::new_voucher(
            "GONE",
            now - Duration::days(1),
            now + Duration::days(1),
        );
        voucher.usage_limit = 1;
        voucher.used_count = 1;
        db.vouchers().create(&voucher).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.voucher_code = Some("GONE".to_string());

        let service = CheckoutService::new(db.clone());
        let err = service.create_order(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Voucher(vela_core::VoucherError::Exhausted))
        ));

        // reservation rolled back with the voucher failure
        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
    }

    #[tokio::test]
    async fn test_preview_never_mutates() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 10_000, 5).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let now = Utc::now();
        let mut voucher = crate::repository::voucher::VoucherRepository::new_voucher(
            "SUMMER10",
            now - Duration::days(1),
            now + Duration::days(1),
        );
        voucher.discount_percent = Some(10.0);
        voucher.discount_amount_vnd = Some(5_000);
        voucher.usage_limit = 10;
        db.vouchers().create(&voucher).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.voucher_code = Some("SUMMER10".to_string());

        let service = CheckoutService::new(db.clone());
        for _ in 0..3 {
            let preview = service.preview_order(&request).await.unwrap();
            assert!(preview.voucher_valid);
            // subtotal 10_000: 10% (1_000) + 5_000 flat = 6_000
            assert_eq!(preview.discount_vnd, 6_000);
            assert_eq!(preview.total_vnd, 4_000);
        }

        // nothing moved
        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
        let voucher = db.vouchers().get_by_code("SUMMER10").await.unwrap().unwrap();
        assert_eq!(voucher.used_count, 0);
        assert_eq!(db.customers().cart_items(&customer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preview_reports_ineligible_voucher() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 10_000, 5).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let now = Utc::now();
        let mut voucher = crate::repository::voucher::VoucherRepository::new_voucher(
            "BIGSPEND",
            now - Duration::days(1),
            now + Duration::days(1),
        );
        voucher.min_order_value_vnd = 500_000;
        voucher.usage_limit = 10;
        db.vouchers().create(&voucher).await.unwrap();

        let mut request = cod_request(&customer.id);
        request.voucher_code = Some("BIGSPEND".to_string());

        let service = CheckoutService::new(db);
        let preview = service.preview_order(&request).await.unwrap();
        assert!(!preview.voucher_valid);
        assert!(preview.voucher_message.is_some());
        assert_eq!(preview.discount_vnd, 0);
        assert_eq!(preview.total_vnd, 10_000);
    }

    #[tokio::test]
    async fn test_gateway_method_awaits_payment() {
        let (db, customer) = setup().await;
        let product = db.products().create("Kettle K3", 30_000, 4).await.unwrap();
        db.customers()
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let mut request = cod_request(&customer.id);
        request.payment_method = PaymentMethod::Payos;

        let service = CheckoutService::new(db.clone());
        let created = service.create_order(&request).await.unwrap();
        assert_eq!(created.payment.status, PaymentStatus::AwaitingPayment);
        assert!(created.payment.txn_ref.is_none());
    }
}
