//! # Gateway Configuration
//!
//! Provider credentials and callback URLs, loaded from the environment or
//! built programmatically.
//!
//! ## Environment Variables
//! ```text
//! VELA_GATEWAY_BASE_URL       Provider API base, e.g. https://api-merchant.payos.vn
//! VELA_GATEWAY_CLIENT_ID      x-client-id header value
//! VELA_GATEWAY_API_KEY        x-api-key header value
//! VELA_GATEWAY_CHECKSUM_KEY   HMAC secret for signing and webhook verification
//! VELA_GATEWAY_RETURN_URL     Absolute URL the provider redirects to on success
//! VELA_GATEWAY_CANCEL_URL     Absolute URL the provider redirects to on cancel
//! VELA_GATEWAY_FRONTEND_URL   Frontend base for the final result redirect
//! ```

use crate::error::{GatewayError, GatewayResult};

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider API base URL (no trailing slash).
    pub base_url: String,
    /// Merchant client id, sent as `x-client-id`.
    pub client_id: String,
    /// Merchant API key, sent as `x-api-key`.
    pub api_key: String,
    /// Shared HMAC secret (checksum key).
    pub checksum_key: String,
    /// Absolute URL the provider sends the browser to after payment.
    pub return_url: String,
    /// Absolute URL the provider sends the browser to on cancellation.
    pub cancel_url: String,
    /// Frontend base URL for the final result redirect.
    pub frontend_base_url: String,
}

impl GatewayConfig {
    /// Builds a configuration from explicit values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        api_key: impl Into<String>,
        checksum_key: impl Into<String>,
        return_url: impl Into<String>,
        cancel_url: impl Into<String>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        GatewayConfig {
            base_url: trim_trailing_slash(base_url.into()),
            client_id: client_id.into(),
            api_key: api_key.into(),
            checksum_key: checksum_key.into(),
            return_url: return_url.into(),
            cancel_url: cancel_url.into(),
            frontend_base_url: trim_trailing_slash(frontend_base_url.into()),
        }
    }

    /// Loads the configuration from `VELA_GATEWAY_*` environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        Ok(GatewayConfig::new(
            require_env("VELA_GATEWAY_BASE_URL")?,
            require_env("VELA_GATEWAY_CLIENT_ID")?,
            require_env("VELA_GATEWAY_API_KEY")?,
            require_env("VELA_GATEWAY_CHECKSUM_KEY")?,
            require_env("VELA_GATEWAY_RETURN_URL")?,
            require_env("VELA_GATEWAY_CANCEL_URL")?,
            require_env("VELA_GATEWAY_FRONTEND_URL")?,
        ))
    }

    /// Validates that both callback URLs are absolute http(s) URLs.
    ///
    /// The provider silently misbehaves on relative callback URLs, so this
    /// is enforced before any request is signed.
    pub fn validate_callbacks(&self) -> GatewayResult<()> {
        for url in [&self.return_url, &self.cancel_url] {
            let trimmed = url.trim();
            if !trimmed.starts_with("http") {
                return Err(GatewayError::InvalidCallbackUrl {
                    url: trimmed.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn require_env(name: &str) -> GatewayResult<String> {
    std::env::var(name).map_err(|_| GatewayError::Config(format!("{name} is not set")))
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(return_url: &str, cancel_url: &str) -> GatewayConfig {
        GatewayConfig::new(
            "https://api.example.test/",
            "client",
            "key",
            "checksum",
            return_url,
            cancel_url,
            "https://shop.example.test",
        )
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = config("https://a/r", "https://a/c");
        assert_eq!(c.base_url, "https://api.example.test");
    }

    #[test]
    fn test_validate_callbacks() {
        assert!(config("https://a/return", "http://a/cancel").validate_callbacks().is_ok());
        assert!(matches!(
            config("/relative/return", "https://a/cancel").validate_callbacks(),
            Err(GatewayError::InvalidCallbackUrl { .. })
        ));
        assert!(matches!(
            config("https://a/return", "ftp://a/cancel").validate_callbacks(),
            Err(GatewayError::InvalidCallbackUrl { .. })
        ));
    }
}
