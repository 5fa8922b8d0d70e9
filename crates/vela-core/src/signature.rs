//! # Signature Engine
//!
//! Deterministic canonicalization and HMAC-SHA256 signing shared by outbound
//! payment-link requests and inbound webhook verification.
//!
//! ## Signing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Signature Engine                                   │
//! │                                                                         │
//! │  fields {b: 2, a: 1}                                                    │
//! │        │                                                                │
//! │        ├─► sort by key            [a, b]                                │
//! │        ├─► render values          "a=1", "b=2"                          │
//! │        ├─► join with '&'          "a=1&b=2"   (no trailing separator)   │
//! │        │                                                                │
//! │        └─► HMAC-SHA256(checksum key) ──► lowercase hex digest           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sorting by key (never insertion order) is what keeps both sides of the
//! wire in agreement regardless of JSON field ordering.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Canonicalization
// =============================================================================

/// Renders a JSON value the way the provider expects it inside the signed
/// string: strings bare (no quotes), numbers and booleans as written, null
/// as the literal `null`. Nested containers keep their JSON form.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonicalizes a set of fields into the provider's signing string:
/// sorted by key, `key=value` pairs joined with `&`, no trailing separator.
pub fn canonicalize<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut pairs: Vec<(&str, &Value)> = fields.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, render_value(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonicalizes a JSON object. Non-object values canonicalize to the empty
/// string, which will never verify.
pub fn canonicalize_object(data: &Value) -> String {
    match data.as_object() {
        Some(map) => canonicalize(map.iter().map(|(k, v)| (k.as_str(), v))),
        None => String::new(),
    }
}

// =============================================================================
// HMAC
// =============================================================================

/// HMAC-SHA256 over `message` with `key`, returned as lowercase hex.
pub fn hmac_sha256_hex(key: &str, message: &str) -> String {
    // HMAC-SHA256 accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signs a field set: canonicalize, then HMAC.
pub fn sign<'a, I>(key: &str, fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    hmac_sha256_hex(key, &canonicalize(fields))
}

/// Verifies a hex signature over a JSON data object.
///
/// Comparison is case-insensitive on the hex digits. These signatures arrive
/// on a public webhook endpoint, so a failed check is expected traffic, not
/// a bug.
pub fn verify_object(key: &str, data: &Value, signature: &str) -> bool {
    let expected = hmac_sha256_hex(key, &canonicalize_object(data));
    expected.eq_ignore_ascii_case(signature)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonicalize_sorts_by_key() {
        let data = json!({"b": 2, "a": 1});
        assert_eq!(canonicalize_object(&data), "a=1&b=2");
    }

    #[test]
    fn test_canonicalize_is_insertion_order_independent() {
        let forward = json!({"amount": 50000, "orderCode": 123, "description": "Order 7"});
        let backward = json!({"description": "Order 7", "orderCode": 123, "amount": 50000});
        assert_eq!(canonicalize_object(&forward), canonicalize_object(&backward));
    }

    #[test]
    fn test_canonicalize_value_rendering() {
        let data = json!({
            "s": "plain text",
            "n": 42,
            "f": true,
            "z": null,
        });
        assert_eq!(canonicalize_object(&data), "f=true&n=42&s=plain text&z=null");
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?"
        let digest = hmac_sha256_hex("Jefe", "what do ya want for nothing?");
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let key = "test-checksum-key";
        let data = json!({
            "orderCode": 7001,
            "amount": 85000,
            "status": "PAID",
        });
        let signature = hmac_sha256_hex(key, &canonicalize_object(&data));

        assert!(verify_object(key, &data, &signature));
        assert!(verify_object(key, &data, &signature.to_uppercase()));
        assert!(!verify_object("wrong-key", &data, &signature));
    }

    #[test]
    fn test_verify_rejects_tampered_data() {
        let key = "test-checksum-key";
        let data = json!({"orderCode": 7001, "amount": 85000});
        let signature = hmac_sha256_hex(key, &canonicalize_object(&data));

        let tampered = json!({"orderCode": 7001, "amount": 85001});
        assert!(!verify_object(key, &tampered, &signature));
    }

    #[test]
    fn test_non_object_canonicalizes_empty() {
        assert_eq!(canonicalize_object(&json!([1, 2, 3])), "");
        assert_eq!(canonicalize_object(&json!("just a string")), "");
    }
}
