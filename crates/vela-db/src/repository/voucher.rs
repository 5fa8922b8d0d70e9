//! # Voucher Repository
//!
//! Database operations for vouchers.
//!
//! `used_count` is only ever incremented inside the checkout transaction
//! (see the checkout service); this repository covers lookup and setup.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vela_core::Voucher;

/// Repository for voucher database operations.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

impl VoucherRepository {
    /// Creates a new VoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VoucherRepository { pool }
    }

    /// Gets a voucher by its redemption code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Voucher>> {
        let voucher = sqlx::query_as::<_, Voucher>(
            r#"
            SELECT id, code, active, start_date, end_date, min_order_value_vnd,
                   usage_limit, used_count, discount_percent, discount_amount_vnd
            FROM vouchers
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(voucher)
    }

    /// Inserts a voucher.
    pub async fn create(&self, voucher: &Voucher) -> DbResult<()> {
        debug!(code = %voucher.code, "Creating voucher");

        sqlx::query(
            r#"
            INSERT INTO vouchers (id, code, active, start_date, end_date,
                                  min_order_value_vnd, usage_limit, used_count,
                                  discount_percent, discount_amount_vnd)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&voucher.id)
        .bind(&voucher.code)
        .bind(voucher.active)
        .bind(voucher.start_date)
        .bind(voucher.end_date)
        .bind(voucher.min_order_value_vnd)
        .bind(voucher.usage_limit)
        .bind(voucher.used_count)
        .bind(voucher.discount_percent)
        .bind(voucher.discount_amount_vnd)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Builder-style helper for tests and seeding.
    pub fn new_voucher(
        code: &str,
        start_date: chrono::DateTime<chrono::Utc>,
        end_date: chrono::DateTime<chrono::Utc>,
    ) -> Voucher {
        Voucher {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            active: true,
            start_date,
            end_date,
            min_order_value_vnd: 0,
            usage_limit: i64::MAX,
            used_count: 0,
            discount_percent: None,
            discount_amount_vnd: None,
        }
    }
}
