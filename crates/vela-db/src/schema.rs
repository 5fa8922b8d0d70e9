//! # Embedded Schema
//!
//! Creates the full Vela schema on a fresh connection.
//!
//! ## Why Embedded DDL?
//! The database is an application-owned SQLite file; shipping the schema in
//! the binary keeps setup to a single `Database::new` call. Every statement
//! is `CREATE ... IF NOT EXISTS`, so setup is idempotent.
//!
//! ## Table Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customers ──┬── addresses                                              │
//! │              ├── cart_items ──► products ──► product_variants           │
//! │              ├── notifications                                          │
//! │              └── orders ──┬── order_items ──► products / variants       │
//! │                           ├── payments   (1:1)                          │
//! │                           └── vouchers   (weak ref)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Full schema DDL, applied in dependency order.
const SCHEMA: &[&str] = &[
    // -------------------------------------------------------------------------
    // Customers & Addresses
    // -------------------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id              TEXT PRIMARY KEY,
        full_name       TEXT,
        phone           TEXT,
        email           TEXT,
        loyalty_points  INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id          TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL REFERENCES customers(id),
        street      TEXT,
        ward        TEXT,
        district    TEXT,
        city        TEXT
    )
    "#,
    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        price_vnd   INTEGER NOT NULL,
        stock       INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
        sold_count  INTEGER NOT NULL DEFAULT 0,
        hidden      INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_variants (
        id          TEXT PRIMARY KEY,
        product_id  TEXT NOT NULL REFERENCES products(id),
        name        TEXT NOT NULL,
        stock       INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0)
    )
    "#,
    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        id          TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL REFERENCES customers(id),
        product_id  TEXT NOT NULL REFERENCES products(id),
        variant_id  TEXT REFERENCES product_variants(id),
        quantity    INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    // -------------------------------------------------------------------------
    // Vouchers
    // -------------------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS vouchers (
        id                  TEXT PRIMARY KEY,
        code                TEXT NOT NULL UNIQUE,
        active              INTEGER NOT NULL DEFAULT 1,
        start_date          TEXT NOT NULL,
        end_date            TEXT NOT NULL,
        min_order_value_vnd INTEGER NOT NULL DEFAULT 0,
        usage_limit         INTEGER NOT NULL DEFAULT 0,
        used_count          INTEGER NOT NULL DEFAULT 0,
        discount_percent    REAL,
        discount_amount_vnd INTEGER
    )
    "#,
    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------
    // Orders use an INTEGER AUTOINCREMENT id: the gateway order code is
    // derived from a numeric order id.
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id         TEXT NOT NULL REFERENCES customers(id),
        status              TEXT NOT NULL,
        payment_method      TEXT NOT NULL,
        total_amount_vnd    INTEGER NOT NULL,
        discount_amount_vnd INTEGER NOT NULL DEFAULT 0,
        voucher_id          TEXT,
        voucher_code        TEXT,
        full_name           TEXT NOT NULL,
        email               TEXT NOT NULL,
        phone               TEXT NOT NULL,
        street              TEXT NOT NULL,
        ward                TEXT NOT NULL,
        district            TEXT NOT NULL,
        city                TEXT NOT NULL,
        created_at          TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id             TEXT PRIMARY KEY,
        order_id       INTEGER NOT NULL REFERENCES orders(id),
        product_id     TEXT NOT NULL REFERENCES products(id),
        variant_id     TEXT REFERENCES product_variants(id),
        quantity       INTEGER NOT NULL CHECK (quantity > 0),
        unit_price_vnd INTEGER NOT NULL
    )
    "#,
    // -------------------------------------------------------------------------
    // Payments (1:1 with orders)
    // -------------------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id                 TEXT PRIMARY KEY,
        order_id           INTEGER NOT NULL UNIQUE REFERENCES orders(id),
        method             TEXT NOT NULL,
        amount_vnd         INTEGER NOT NULL,
        status             TEXT NOT NULL,
        txn_ref            TEXT,
        transaction_no     TEXT,
        transaction_status TEXT,
        checkout_url       TEXT,
        created_at         TEXT NOT NULL,
        updated_at         TEXT NOT NULL
    )
    "#,
    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------
    // customer_id NULL marks an admin broadcast
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id          TEXT PRIMARY KEY,
        customer_id TEXT REFERENCES customers(id),
        message     TEXT NOT NULL,
        category    TEXT NOT NULL,
        ref_id      INTEGER NOT NULL,
        created_at  TEXT NOT NULL
    )
    "#,
    // -------------------------------------------------------------------------
    // Indexes
    // -------------------------------------------------------------------------
    "CREATE INDEX IF NOT EXISTS idx_addresses_customer ON addresses(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_cart_items_customer ON cart_items(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
    "CREATE INDEX IF NOT EXISTS idx_payments_txn_ref ON payments(txn_ref)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_customer ON notifications(customer_id)",
];

/// Applies the embedded schema to a pool.
pub async fn setup(pool: &SqlitePool) -> DbResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!(statements = SCHEMA.len(), "Schema applied");
    Ok(())
}
