//! # Redirect Callbacks
//!
//! Resolves the provider's browser redirects (return / cancel) into the
//! frontend result URL.
//!
//! ## Redirect Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  provider ──302──► /payment/return?orderCode=&status=&message=          │
//! │                         │                                                │
//! │                         ├─ status is a success token                    │
//! │                         │    → mark the payment SUCCESS                 │
//! │                         │                                                │
//! │                         └─► 302 {frontend}/payment/result               │
//! │                               ?orderCode=&success=&message=&status=     │
//! │                                                                         │
//! │  cancel path never mutates: the authoritative REFUNDED flip comes       │
//! │  from the webhook, not the browser.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use vela_core::PaymentStatus;
use vela_db::Database;

/// Query parameters the provider appends to a redirect.
#[derive(Debug, Clone, Default)]
pub struct RedirectParams {
    pub order_code: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Resolves provider redirects into frontend result URLs.
#[derive(Debug, Clone)]
pub struct CallbackResolver {
    db: Database,
    frontend_base_url: String,
}

impl CallbackResolver {
    /// Creates a new CallbackResolver.
    pub fn new(db: Database, frontend_base_url: impl Into<String>) -> Self {
        CallbackResolver {
            db,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    /// Handles the return redirect: on a success-token status the payment is
    /// marked SUCCESS, then the browser is sent to the frontend result page.
    pub async fn resolve_return(&self, params: &RedirectParams) -> GatewayResult<Url> {
        let success = params
            .status
            .as_deref()
            .is_some_and(PaymentStatus::is_success_token);

        if success {
            if let Some(order_code) = params.order_code.as_deref() {
                match self.db.payments().get_by_txn_ref(order_code).await? {
                    Some(payment) => {
                        self.db
                            .payments()
                            .apply_webhook(
                                &payment.id,
                                &PaymentStatus::Success,
                                params.status.as_deref(),
                                None,
                                None,
                            )
                            .await?;
                        debug!(order_code = %order_code, "Return redirect marked payment success");
                    }
                    None => {
                        warn!(order_code = %order_code, "Return redirect for unknown payment");
                    }
                }
            }
        }

        self.result_url(params, success)
    }

    /// Handles the cancel redirect. Pure URL construction, no state change:
    /// the webhook is the authority on the refunded/cancelled flip.
    pub fn resolve_cancel(&self, params: &RedirectParams) -> GatewayResult<Url> {
        self.result_url(params, false)
    }

    fn result_url(&self, params: &RedirectParams, success: bool) -> GatewayResult<Url> {
        let mut url = Url::parse(&format!("{}/payment/result", self.frontend_base_url))
            .map_err(|e| GatewayError::Config(format!("Bad frontend base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("orderCode", params.order_code.as_deref().unwrap_or(""))
            .append_pair("success", if success { "true" } else { "false" })
            .append_pair("message", params.message.as_deref().unwrap_or(""))
            .append_pair("status", params.status.as_deref().unwrap_or(""));

        Ok(url)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::PaymentMethod;
    use vela_db::{CheckoutService, CreateOrderRequest, DbConfig};

    async fn setup() -> (Database, CallbackResolver) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let resolver = CallbackResolver::new(db.clone(), "https://shop.example.test");
        (db, resolver)
    }

    async fn gateway_order(db: &Database) -> String {
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
        db.payments()
            .set_txn_ref(&created.payment.id, "7001")
            .await
            .unwrap();
        "7001".to_string()
    }

    #[tokio::test]
    async fn test_return_with_success_token_marks_payment() {
        let (db, resolver) = setup().await;
        let order_code = gateway_order(&db).await;

        let url = resolver
            .resolve_return(&RedirectParams {
                order_code: Some(order_code.clone()),
                status: Some("PAID".to_string()),
                message: Some("ok".to_string()),
            })
            .await
            .unwrap();

        let payment = db.payments().get_by_txn_ref(&order_code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(query.contains(&("orderCode".to_string(), "7001".to_string())));
        assert!(query.contains(&("success".to_string(), "true".to_string())));
        assert!(query.contains(&("status".to_string(), "PAID".to_string())));
    }

    #[tokio::test]
    async fn test_return_with_failure_status_mutates_nothing() {
        let (db, resolver) = setup().await;
        let order_code = gateway_order(&db).await;

        let url = resolver
            .resolve_return(&RedirectParams {
                order_code: Some(order_code.clone()),
                status: Some("ERROR".to_string()),
                message: None,
            })
            .await
            .unwrap();

        let payment = db.payments().get_by_txn_ref(&order_code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::AwaitingPayment);
        assert!(url.query().unwrap().contains("success=false"));
    }

    #[tokio::test]
    async fn test_cancel_redirect_is_pure() {
        let (db, resolver) = setup().await;
        let order_code = gateway_order(&db).await;

        let url = resolver
            .resolve_cancel(&RedirectParams {
                order_code: Some(order_code.clone()),
                status: Some("CANCELLED".to_string()),
                message: None,
            })
            .unwrap();

        assert!(url.as_str().starts_with("https://shop.example.test/payment/result"));
        assert!(url.query().unwrap().contains("success=false"));

        let payment = db.payments().get_by_txn_ref(&order_code).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::AwaitingPayment);
    }
}
