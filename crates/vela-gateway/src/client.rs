//! # Payment Link Client
//!
//! Creates signed payment-link requests against the provider's
//! `/v2/payment-requests` endpoint.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_payment_link                                  │
//! │                                                                         │
//! │  load order + payment        → PaymentMissing                          │
//! │  amount >= 10 000            → AmountTooLow                            │
//! │  callbacks are absolute      → InvalidCallbackUrl                      │
//! │  derive order code           (reuse persisted txn_ref when valid)      │
//! │  sign 5-field payload        (vela-core signature engine)              │
//! │  POST /v2/payment-requests                                             │
//! │     ├── network failure      → Unreachable (nothing persisted)         │
//! │     ├── non-2xx / code!="00" → Rejected (nothing persisted)            │
//! │     ├── no checkoutUrl       → Protocol                                │
//! │     └── success              → persist txn_ref + transaction_no        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use vela_core::{signature, GATEWAY_MIN_AMOUNT_VND};
use vela_db::{Database, DbError};

/// Provider-imposed ceiling: the order code must fit a positive 32-bit int.
const ORDER_CODE_CEILING: i64 = 2_000_000_000;

// =============================================================================
// Order Code Derivation
// =============================================================================

/// Derives the provider-facing order code for a payment.
///
/// ## Rules
/// - A persisted txn_ref that parses as a positive integer below 2×10⁹ is
///   reused, so re-creating a link for the same order yields the same code.
/// - Otherwise the code is time-salted (`order_id * 1000 + millis mod 10⁶`)
///   to avoid collisions across retries, folded back under the ceiling.
pub fn derive_order_code(existing_txn_ref: Option<&str>, order_id: i64, unix_millis: i64) -> i64 {
    if let Some(txn_ref) = existing_txn_ref {
        if let Ok(code) = txn_ref.trim().parse::<i64>() {
            if code > 0 && code < ORDER_CODE_CEILING {
                return code;
            }
        }
    }

    let mut code = order_id * 1000 + (unix_millis % 1_000_000);
    if code >= ORDER_CODE_CEILING {
        code = code % 1_900_000_000 + 1_000_000;
    }
    if code <= 0 {
        // unreachable for sane inputs, kept as a hard floor
        code = code.rem_euclid(ORDER_CODE_CEILING - 1) + 1;
    }
    code
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLinkBody {
    order_code: i64,
    amount: i64,
    description: String,
    return_url: String,
    cancel_url: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderData {
    payment_link_id: Option<String>,
    checkout_url: Option<String>,
    qr_code: Option<String>,
    payment_request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    code: Option<String>,
    #[allow(dead_code)]
    desc: Option<String>,
    data: Option<ProviderData>,
}

/// A successfully created checkout link.
#[derive(Debug, Clone)]
pub struct PaymentLink {
    pub order_code: i64,
    pub checkout_url: String,
    pub payment_link_id: Option<String>,
    pub qr_code: Option<String>,
}

/// Extracts the provider's human-readable rejection message from a response
/// body, trying `message`, then `error`, then `desc`.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error", "desc"] {
            if let Some(message) = value.get(field).and_then(|v| v.as_str()) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
    }
    "Payment gateway returned an error".to_string()
}

/// Builds and signs the five-field creation payload.
fn build_signed_body(config: &GatewayConfig, order_code: i64, amount: i64, order_id: i64) -> CreateLinkBody {
    let description = format!("Order {order_id}").trim().to_string();
    let return_url = config.return_url.trim().to_string();
    let cancel_url = config.cancel_url.trim().to_string();

    let fields = json!({
        "orderCode": order_code,
        "amount": amount,
        "description": description,
        "returnUrl": return_url,
        "cancelUrl": cancel_url,
    });
    let signature = signature::hmac_sha256_hex(
        &config.checksum_key,
        &signature::canonicalize_object(&fields),
    );

    CreateLinkBody {
        order_code,
        amount,
        description,
        return_url,
        cancel_url,
        signature,
    }
}

// =============================================================================
// Gateway Client
// =============================================================================

/// HTTP client for the payment provider.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: GatewayConfig,
    http: reqwest::Client,
    db: Database,
}

impl GatewayClient {
    /// Creates a new client with a 15-second request timeout.
    pub fn new(config: GatewayConfig, db: Database) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(GatewayClient { config, http, db })
    }

    /// Creates (or re-creates) a checkout link for an order.
    ///
    /// Calling this twice for the same order returns the same order code:
    /// the first success persists the code as the payment's txn_ref, and
    /// later calls reuse it.
    pub async fn create_payment_link(&self, order_id: i64) -> GatewayResult<PaymentLink> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or(GatewayError::Db(DbError::not_found("Order", order_id)))?;
        let payment = self
            .db
            .payments()
            .get_by_order(order_id)
            .await?
            .ok_or(GatewayError::PaymentMissing { order_id })?;

        let amount = payment.amount_vnd;
        if amount < GATEWAY_MIN_AMOUNT_VND {
            return Err(GatewayError::AmountTooLow {
                amount_vnd: amount,
                minimum_vnd: GATEWAY_MIN_AMOUNT_VND,
            });
        }
        self.config.validate_callbacks()?;

        let order_code = derive_order_code(
            payment.txn_ref.as_deref(),
            order.id,
            Utc::now().timestamp_millis(),
        );
        let body = build_signed_body(&self.config, order_code, amount, order.id);

        debug!(order_id, order_code, amount, "Requesting payment link");

        let response = self
            .http
            .post(format!("{}/v2/payment-requests", self.config.base_url))
            .header("x-client-id", &self.config.client_id)
            .header("x-api-key", &self.config.api_key)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(order_id, status = %status, "Gateway rejected payment link request");
            return Err(GatewayError::Rejected {
                message: extract_message(&text),
            });
        }

        let parsed: ProviderResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Protocol(format!("Unparseable response: {e}")))?;

        if parsed.code.as_deref() != Some("00") {
            warn!(order_id, code = ?parsed.code, "Gateway returned non-success code");
            return Err(GatewayError::Rejected {
                message: extract_message(&text),
            });
        }

        let data = parsed
            .data
            .ok_or_else(|| GatewayError::Protocol("Response missing data".to_string()))?;
        let checkout_url = data
            .checkout_url
            .ok_or_else(|| GatewayError::Protocol("Response missing checkoutUrl".to_string()))?;

        // persist the code so retries reuse it, and the provider request id
        // (falling back to the link id) for reconciliation
        let payments = self.db.payments();
        payments.set_txn_ref(&payment.id, &order_code.to_string()).await?;
        if let Some(transaction_no) = data
            .payment_request_id
            .as_deref()
            .or(data.payment_link_id.as_deref())
        {
            payments
                .set_transaction_no_if_absent(&payment.id, transaction_no)
                .await?;
        }

        info!(order_id, order_code, "Payment link created");

        Ok(PaymentLink {
            order_code,
            checkout_url,
            payment_link_id: data.payment_link_id,
            qr_code: data.qr_code,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use vela_core::PaymentMethod;
    use vela_db::{CheckoutService, CreateOrderRequest, DbConfig};

    #[test]
    fn test_order_code_reuses_valid_txn_ref() {
        assert_eq!(derive_order_code(Some("7001"), 99, 1_700_000_000_000), 7001);
        assert_eq!(derive_order_code(Some(" 7001 "), 99, 0), 7001);
    }

    #[test]
    fn test_order_code_ignores_invalid_txn_ref() {
        let millis = 1_700_000_000_123;
        let fresh = derive_order_code(None, 42, millis);

        // non-numeric, non-positive and oversized refs all fall through
        assert_eq!(derive_order_code(Some("abc"), 42, millis), fresh);
        assert_eq!(derive_order_code(Some("0"), 42, millis), fresh);
        assert_eq!(derive_order_code(Some("-5"), 42, millis), fresh);
        assert_eq!(derive_order_code(Some("2000000001"), 42, millis), fresh);
    }

    #[test]
    fn test_order_code_derivation_shape() {
        // 42 * 1000 + (…123 % 1_000_000)
        let code = derive_order_code(None, 42, 1_700_000_000_123);
        assert_eq!(code, 42_000 + (1_700_000_000_123 % 1_000_000));
    }

    #[test]
    fn test_order_code_folds_under_ceiling() {
        // a huge order id pushes the raw code over 2×10⁹
        let code = derive_order_code(None, 5_000_000, 1_700_000_000_123);
        assert!(code > 0);
        assert!(code < ORDER_CODE_CEILING);
    }

    #[test]
    fn test_signed_body_is_canonical() {
        let config = GatewayConfig::new(
            "https://api.example.test",
            "client",
            "key",
            "secret",
            "https://shop.example.test/return",
            "https://shop.example.test/cancel",
            "https://shop.example.test",
        );
        let body = build_signed_body(&config, 7001, 85_000, 7);

        assert_eq!(body.description, "Order 7");
        // signature over the sorted key=value& join of the five fields
        let expected = signature::hmac_sha256_hex(
            "secret",
            "amount=85000&cancelUrl=https://shop.example.test/cancel\
             &description=Order 7&orderCode=7001\
             &returnUrl=https://shop.example.test/return",
        );
        assert_eq!(body.signature, expected);
    }

    #[test]
    fn test_extract_message_precedence() {
        assert_eq!(
            extract_message(r#"{"message":"m","error":"e","desc":"d"}"#),
            "m"
        );
        assert_eq!(extract_message(r#"{"error":"e","desc":"d"}"#), "e");
        assert_eq!(extract_message(r#"{"desc":"d"}"#), "d");
        assert_eq!(
            extract_message("not json"),
            "Payment gateway returned an error"
        );
    }

    /// In-memory database with one awaiting-payment gateway order.
    async fn setup_order() -> (Database, i64, String) {
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

        (db, created.order.id, created.payment.id)
    }

    /// Minimal one-connection-at-a-time HTTP server answering every request
    /// with a canned success body. Returns its base URL.
    async fn spawn_provider_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                answer_request(stream).await;
            }
        });
        format!("http://{addr}")
    }

    async fn answer_request(mut stream: TcpStream) {
        // read headers, then Content-Length bytes of body
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }

        let body = r#"{"code":"00","desc":"success","data":{"paymentLinkId":"pl-1","checkoutUrl":"https://pay.example.test/pl-1","qrCode":"qr-data","paymentRequestId":"req-1"}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn test_payment_link_persists_and_reuses_order_code() {
        let (db, order_id, payment_id) = setup_order().await;
        let base_url = spawn_provider_stub().await;
        let config = GatewayConfig::new(
            base_url,
            "client",
            "key",
            "secret",
            "https://shop.example.test/return",
            "https://shop.example.test/cancel",
            "https://shop.example.test",
        );
        let client = GatewayClient::new(config, db.clone()).unwrap();

        let first = client.create_payment_link(order_id).await.unwrap();
        assert_eq!(first.checkout_url, "https://pay.example.test/pl-1");

        // the first success persists the code as the payment's txn_ref...
        let payment = db.payments().get_by_order(order_id).await.unwrap().unwrap();
        assert_eq!(payment.id, payment_id);
        assert_eq!(payment.txn_ref.as_deref(), Some(first.order_code.to_string().as_str()));
        assert_eq!(payment.transaction_no.as_deref(), Some("req-1"));

        // ...so a second call yields the same code, not a fresh time-salted one
        let second = client.create_payment_link(order_id).await.unwrap();
        assert_eq!(second.order_code, first.order_code);

        let payment = db.payments().get_by_order(order_id).await.unwrap().unwrap();
        assert_eq!(payment.txn_ref.as_deref(), Some(first.order_code.to_string().as_str()));
    }
}
