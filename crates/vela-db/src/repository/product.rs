//! # Product Repository
//!
//! Database operations for products and product variants.
//!
//! ## Visibility Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock reaches 0  ──►  hidden = 1   (product leaves the catalog)        │
//! │  stock restored   ──►  hidden = 0   (product returns to the catalog)    │
//! │                                                                         │
//! │  The flip happens inside the inventory ledger, in the same              │
//! │  transaction as the stock change.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vela_core::{Product, ProductVariant};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_vnd, stock, sold_count, hidden,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a variant by ID.
    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "SELECT id, product_id, name, stock FROM product_variants WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Lists visible (non-hidden) products.
    pub async fn list_visible(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_vnd, stock, sold_count, hidden,
                   created_at, updated_at
            FROM products
            WHERE hidden = 0
            ORDER BY sold_count DESC, name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Creates a product with the given name, price and stock.
    pub async fn create(&self, name: &str, price_vnd: i64, stock: i64) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_vnd,
            stock,
            sold_count: 0,
            hidden: stock <= 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_vnd, stock, sold_count, hidden,
                                  created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_vnd)
        .bind(product.stock)
        .bind(product.sold_count)
        .bind(product.hidden)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Creates a variant under a product.
    pub async fn create_variant(
        &self,
        product_id: &str,
        name: &str,
        stock: i64,
    ) -> DbResult<ProductVariant> {
        let variant = ProductVariant {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            name: name.to_string(),
            stock,
        };

        debug!(id = %variant.id, product_id = %product_id, "Creating variant");

        sqlx::query(
            "INSERT INTO product_variants (id, product_id, name, stock) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.name)
        .bind(variant.stock)
        .execute(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Updates a product's price. Existing orders keep their snapshot price.
    pub async fn set_price(&self, id: &str, price_vnd: i64) -> DbResult<()> {
        sqlx::query("UPDATE products SET price_vnd = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price_vnd)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
