//! # Validation Module
//!
//! Input and profile validation, pure and synchronous.
//!
//! ## Placeholder Semantics
//! Registration seeds profile fields with the literal placeholder
//! `"chưa cập nhật"` ("not yet updated"). A field still holding the
//! placeholder counts as missing: orders must never ship to an address the
//! customer never actually entered.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Address, Customer, OrderInfo};

/// Default value written into profile fields at registration.
pub const PLACEHOLDER: &str = "chưa cập nhật";

// =============================================================================
// Field Checks
// =============================================================================

/// True when a field is absent, blank, or still the registration placeholder.
pub fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || trimmed.eq_ignore_ascii_case(PLACEHOLDER)
        }
    }
}

/// Resolves a profile field or fails with the field's name.
fn require_field(value: Option<&str>, field: &str) -> CoreResult<String> {
    if is_missing(value) {
        return Err(CoreError::IncompleteProfile {
            field: field.to_string(),
        });
    }
    Ok(value.unwrap_or_default().trim().to_string())
}

/// Validates a line-item quantity.
pub fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Profile Snapshot
// =============================================================================

/// Builds the order's frozen contact/delivery snapshot from the live profile.
///
/// Every field is required; the first missing one aborts with
/// `IncompleteProfile` naming that field.
pub fn profile_snapshot(customer: &Customer, address: &Address) -> CoreResult<OrderInfo> {
    Ok(OrderInfo {
        full_name: require_field(customer.full_name.as_deref(), "full_name")?,
        email: require_field(customer.email.as_deref(), "email")?,
        phone: require_field(customer.phone.as_deref(), "phone")?,
        street: require_field(address.street.as_deref(), "street")?,
        ward: require_field(address.ward.as_deref(), "ward")?,
        district: require_field(address.district.as_deref(), "district")?,
        city: require_field(address.city.as_deref(), "city")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            id: "c-1".to_string(),
            full_name: Some("Tran Thi B".to_string()),
            phone: Some("0901234567".to_string()),
            email: Some("b@example.com".to_string()),
            loyalty_points: 0,
        }
    }

    fn address() -> Address {
        Address {
            id: "a-1".to_string(),
            customer_id: "c-1".to_string(),
            street: Some("12 Nguyen Trai".to_string()),
            ward: Some("Ward 5".to_string()),
            district: Some("District 1".to_string()),
            city: Some("Ho Chi Minh City".to_string()),
        }
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(None));
        assert!(is_missing(Some("")));
        assert!(is_missing(Some("   ")));
        assert!(is_missing(Some("chưa cập nhật")));
        assert!(is_missing(Some("  chưa cập nhật  ")));
        assert!(!is_missing(Some("12 Nguyen Trai")));
    }

    #[test]
    fn test_snapshot_happy_path() {
        let info = profile_snapshot(&customer(), &address()).unwrap();
        assert_eq!(info.full_name, "Tran Thi B");
        assert_eq!(info.city, "Ho Chi Minh City");
    }

    #[test]
    fn test_snapshot_trims_whitespace() {
        let mut c = customer();
        c.full_name = Some("  Tran Thi B  ".to_string());
        let info = profile_snapshot(&c, &address()).unwrap();
        assert_eq!(info.full_name, "Tran Thi B");
    }

    #[test]
    fn test_snapshot_rejects_placeholder_field() {
        let mut a = address();
        a.street = Some(PLACEHOLDER.to_string());
        let err = profile_snapshot(&customer(), &a).unwrap_err();
        match err {
            CoreError::IncompleteProfile { field } => assert_eq!(field, "street"),
            other => panic!("expected IncompleteProfile, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_rejects_missing_phone() {
        let mut c = customer();
        c.phone = None;
        let err = profile_snapshot(&c, &address()).unwrap_err();
        assert!(matches!(err, CoreError::IncompleteProfile { field } if field == "phone"));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }
}
