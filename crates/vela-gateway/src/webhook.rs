//! # Webhook Handling
//!
//! Verifies and applies the provider's asynchronous payment webhooks.
//!
//! ## Processing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inbound Webhook                                      │
//! │                                                                         │
//! │  {data: {...}, signature: "hex"}                                        │
//! │        │                                                                 │
//! │        ├─► verify_signature        failed → Unauthorized (boundary)     │
//! │        │                                                                 │
//! │        └─► handle_webhook          (performs NO authentication)         │
//! │              │                                                           │
//! │              ├─► find payment by txn_ref == orderCode                   │
//! │              │     absent → log + Dropped (provider may retry)          │
//! │              │                                                           │
//! │              └─► map status, store raw status/txn-no/checkout URL       │
//! │                    re-delivery re-applies the same values (idempotent)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The verify/handle split is deliberate: signature failure is an
//! authentication outcome reported at the boundary, while `handle_webhook`
//! stays a pure state-update function.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use vela_core::{signature, PaymentStatus};
use vela_db::Database;

// =============================================================================
// Payload
// =============================================================================

/// The provider's webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Signed data map: orderCode, amount, status, paymentLinkId,
    /// checkoutUrl, paymentRequestId, ...
    pub data: Value,
    /// Hex HMAC-SHA256 over the sorted `key=value&` join of `data`.
    pub signature: String,
}

impl WebhookPayload {
    fn order_code(&self) -> Option<String> {
        match self.data.get("orderCode") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

/// What a webhook delivery resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payment updated to the given status.
    Applied { payment_id: String, status: PaymentStatus },
    /// No payment matched the orderCode; delivery ignored.
    Dropped,
}

// =============================================================================
// Webhook Handler
// =============================================================================

/// Applies provider webhooks to payment records.
#[derive(Debug, Clone)]
pub struct WebhookHandler {
    db: Database,
    checksum_key: String,
}

impl WebhookHandler {
    /// Creates a new WebhookHandler.
    pub fn new(db: Database, checksum_key: impl Into<String>) -> Self {
        WebhookHandler {
            db,
            checksum_key: checksum_key.into(),
        }
    }

    /// Verifies the payload's signature against the data map.
    pub fn verify_signature(&self, payload: &WebhookPayload) -> bool {
        signature::verify_object(&self.checksum_key, &payload.data, &payload.signature)
    }

    /// Verifies the signature, then applies the webhook.
    ///
    /// This is the endpoint entry point: a bad signature is `Unauthorized`,
    /// everything after that is delegated to [`handle_webhook`](Self::handle_webhook).
    pub async fn authorize_and_handle(
        &self,
        payload: &WebhookPayload,
    ) -> GatewayResult<WebhookOutcome> {
        if !self.verify_signature(payload) {
            warn!("Webhook rejected: signature mismatch");
            return Err(GatewayError::Unauthorized);
        }
        self.handle_webhook(payload).await
    }

    /// Applies an ALREADY-VERIFIED webhook to the matching payment.
    ///
    /// Safe to re-run for the same delivery: the status mapping is total and
    /// stable, and the update writes the same values again.
    pub async fn handle_webhook(&self, payload: &WebhookPayload) -> GatewayResult<WebhookOutcome> {
        let Some(order_code) = payload.order_code() else {
            warn!("Webhook without orderCode dropped");
            return Ok(WebhookOutcome::Dropped);
        };

        let payments = self.db.payments();
        let Some(payment) = payments.get_by_txn_ref(&order_code).await? else {
            // providers retry and deliveries can race order creation
            warn!(order_code = %order_code, "Webhook for unknown payment dropped");
            return Ok(WebhookOutcome::Dropped);
        };

        let raw_status = payload.str_field("status");
        let status = PaymentStatus::from_provider(raw_status);
        let transaction_no = payload
            .str_field("paymentRequestId")
            .or_else(|| payload.str_field("paymentLinkId"));
        let checkout_url = payload.str_field("checkoutUrl");

        payments
            .apply_webhook(
                &payment.id,
                &status,
                raw_status,
                transaction_no,
                checkout_url,
            )
            .await?;

        info!(
            order_code = %order_code,
            payment_id = %payment.id,
            status = %status,
            "Webhook applied"
        );

        Ok(WebhookOutcome::Applied {
            payment_id: payment.id,
            status,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vela_db::{CheckoutService, CreateOrderRequest, DbConfig};
    use vela_core::PaymentMethod;

    const KEY: &str = "test-checksum-key";

    /// In-memory database with one gateway order whose txn_ref is set.
    async fn setup() -> (Database, String, i64) {
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
            .add_cart_item(&customer.id, &product.id, None, 1)
            .await
            .unwrap();

        let created = CheckoutService::new(db.clone())
            .create_order(&CreateOrderRequest {
                customer_id: customer.id,
                payment_method: PaymentMethod::Payos,
                voucher_code: None,
                buy_now: None,
            })
            .await
            .unwrap();

        let order_code = 7001_i64;
        db.payments()
            .set_txn_ref(&created.payment.id, &order_code.to_string())
            .await
            .unwrap();

        (db, created.payment.id, order_code)
    }

    fn signed_payload(data: Value) -> WebhookPayload {
        let sig = signature::hmac_sha256_hex(KEY, &signature::canonicalize_object(&data));
        WebhookPayload { data, signature: sig }
    }

    #[tokio::test]
    async fn test_paid_webhook_marks_success() {
        let (db, payment_id, order_code) = setup().await;
        let handler = WebhookHandler::new(db.clone(), KEY);

        let payload = signed_payload(json!({
            "orderCode": order_code,
            "status": "PAID",
            "paymentRequestId": "req-123",
            "checkoutUrl": "https://pay.example.test/link",
        }));
        let outcome = handler.authorize_and_handle(&payload).await.unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Applied {
                payment_id: payment_id.clone(),
                status: PaymentStatus::Success
            }
        );

        let payment = db.payments().get_by_txn_ref("7001").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.transaction_status.as_deref(), Some("PAID"));
        assert_eq!(payment.transaction_no.as_deref(), Some("req-123"));
        assert_eq!(
            payment.checkout_url.as_deref(),
            Some("https://pay.example.test/link")
        );
    }

    #[tokio::test]
    async fn test_webhook_replay_is_idempotent() {
        let (db, _, order_code) = setup().await;
        let handler = WebhookHandler::new(db.clone(), KEY);

        let payload = signed_payload(json!({
            "orderCode": order_code,
            "status": "PAID",
        }));
        handler.authorize_and_handle(&payload).await.unwrap();
        handler.authorize_and_handle(&payload).await.unwrap();

        let payment = db.payments().get_by_txn_ref("7001").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_cancelled_webhook_marks_refunded() {
        let (db, _, order_code) = setup().await;
        let handler = WebhookHandler::new(db.clone(), KEY);

        let payload = signed_payload(json!({
            "orderCode": order_code,
            "status": "cancelled",
        }));
        handler.authorize_and_handle(&payload).await.unwrap();

        let payment = db.payments().get_by_txn_ref("7001").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_unmapped_status_stored_raw_uppercased() {
        let (db, _, order_code) = setup().await;
        let handler = WebhookHandler::new(db.clone(), KEY);

        let payload = signed_payload(json!({
            "orderCode": order_code,
            "status": "processing",
        }));
        handler.authorize_and_handle(&payload).await.unwrap();

        let payment = db.payments().get_by_txn_ref("7001").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Other("PROCESSING".to_string()));
        // the raw provider string is kept verbatim
        assert_eq!(payment.transaction_status.as_deref(), Some("processing"));
    }

    #[tokio::test]
    async fn test_unknown_order_code_dropped() {
        let (db, _, _) = setup().await;
        let handler = WebhookHandler::new(db, KEY);

        let payload = signed_payload(json!({
            "orderCode": 999_999,
            "status": "PAID",
        }));
        let outcome = handler.authorize_and_handle(&payload).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_bad_signature_is_unauthorized() {
        let (db, _, order_code) = setup().await;
        let handler = WebhookHandler::new(db.clone(), KEY);

        let payload = WebhookPayload {
            data: json!({"orderCode": order_code, "status": "PAID"}),
            signature: "deadbeef".to_string(),
        };
        let err = handler.authorize_and_handle(&payload).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));

        // payment untouched
        let payment = db.payments().get_by_txn_ref("7001").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::AwaitingPayment);
    }
}
