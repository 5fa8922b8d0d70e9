//! # Inventory Ledger
//!
//! Stock reservation and restoration, always inside a caller-owned
//! transaction.
//!
//! ## Reservation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Ledger                                   │
//! │                                                                         │
//! │  line with variant:   check + decrement the VARIANT's stock             │
//! │  line without:        check + decrement the PRODUCT's stock             │
//! │                                                                         │
//! │  either way:          product.sold_count += qty                         │
//! │                       product.stock == 0  →  hidden = 1                 │
//! │                                                                         │
//! │  restore reverses every effect, including un-hiding.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failing a check raises `InsufficientStock` naming the product or variant
//! and the remaining stock; the caller's transaction rollback guarantees no
//! partial decrement survives.

use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vela_core::CoreError;

// =============================================================================
// Reserve
// =============================================================================

/// Reserves stock for one order line.
pub async fn reserve_line(
    conn: &mut SqliteConnection,
    product_id: &str,
    variant_id: Option<&str>,
    quantity: i64,
) -> DbResult<()> {
    match variant_id {
        Some(variant_id) => reserve_variant(conn, product_id, variant_id, quantity).await,
        None => reserve_product(conn, product_id, quantity).await,
    }
}

async fn reserve_product(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let row = sqlx::query("SELECT name, stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    let name: String = row.get("name");
    let stock: i64 = row.get("stock");

    if stock < quantity {
        return Err(CoreError::InsufficientStock {
            name,
            available: stock,
            requested: quantity,
        }
        .into());
    }

    let remaining = stock - quantity;
    sqlx::query(
        r#"
        UPDATE products
        SET stock = ?2,
            sold_count = sold_count + ?3,
            hidden = CASE WHEN ?2 <= 0 THEN 1 ELSE hidden END
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(remaining)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    debug!(product_id = %product_id, quantity, remaining, "Reserved product stock");
    Ok(())
}

async fn reserve_variant(
    conn: &mut SqliteConnection,
    product_id: &str,
    variant_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let row = sqlx::query("SELECT name, stock FROM product_variants WHERE id = ?1")
        .bind(variant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(variant_id.to_string()))?;

    let name: String = row.get("name");
    let stock: i64 = row.get("stock");

    if stock < quantity {
        return Err(CoreError::InsufficientStock {
            name,
            available: stock,
            requested: quantity,
        }
        .into());
    }

    sqlx::query("UPDATE product_variants SET stock = stock - ?2 WHERE id = ?1")
        .bind(variant_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    // sold_count lives on the parent product for both line shapes
    sqlx::query("UPDATE products SET sold_count = sold_count + ?2 WHERE id = ?1")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    debug!(variant_id = %variant_id, quantity, "Reserved variant stock");
    Ok(())
}

// =============================================================================
// Restore
// =============================================================================

/// Restores stock for one order line (cancellation path).
///
/// The caller guarantees the order was not already CANCELLED, which is what
/// makes restoration run at most once per order.
pub async fn restore_line(
    conn: &mut SqliteConnection,
    product_id: &str,
    variant_id: Option<&str>,
    quantity: i64,
) -> DbResult<()> {
    match variant_id {
        Some(variant_id) => {
            let result =
                sqlx::query("UPDATE product_variants SET stock = stock + ?2 WHERE id = ?1")
                    .bind(variant_id)
                    .bind(quantity)
                    .execute(&mut *conn)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::not_found("ProductVariant", variant_id));
            }

            sqlx::query("UPDATE products SET sold_count = sold_count - ?2 WHERE id = ?1")
                .bind(product_id)
                .bind(quantity)
                .execute(&mut *conn)
                .await?;
        }
        None => {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + ?2,
                    sold_count = sold_count - ?2,
                    hidden = 0
                WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", product_id));
            }
        }
    }

    debug!(product_id = %product_id, variant_id = ?variant_id, quantity, "Restored stock");
    Ok(())
}
