//! # Notification Repository
//!
//! Persisted notifications for customers and admins.
//!
//! ## Fire-and-Forget
//! Notification writes happen after the owning transaction commits and are
//! never allowed to fail an order operation: callers log a warning and move
//! on. The helpers here still return `DbResult` so the caller decides.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use vela_core::Notification;

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Records a notification addressed to one customer.
    pub async fn notify_customer(
        &self,
        customer_id: &str,
        message: &str,
        category: &str,
        ref_id: i64,
    ) -> DbResult<()> {
        self.insert(Some(customer_id), message, category, ref_id).await
    }

    /// Records an admin broadcast (customer_id NULL).
    pub async fn notify_admins(&self, message: &str, category: &str, ref_id: i64) -> DbResult<()> {
        self.insert(None, message, category, ref_id).await
    }

    async fn insert(
        &self,
        customer_id: Option<&str>,
        message: &str,
        category: &str,
        ref_id: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, customer_id, message, category, ref_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id)
        .bind(message)
        .bind(category)
        .bind(ref_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a customer's notifications, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, customer_id, message, category, ref_id, created_at
            FROM notifications
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Lists admin broadcasts, newest first.
    pub async fn list_for_admins(&self) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, customer_id, message, category, ref_id, created_at
            FROM notifications
            WHERE customer_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}
