//! Core data types for rtcgrant

use std::fmt;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "LIVEKIT_API_KEY";

/// Environment variable holding the API secret
pub const API_SECRET_ENV: &str = "LIVEKIT_API_SECRET";

/// API key and secret pair identifying a token issuer.
///
/// The key is published as the token's `iss` claim; the secret is the
/// HMAC signing key and never leaves this struct in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    api_key: String,
    api_secret: String,
}

impl ApiCredentials {
    /// Create a credential pair, rejecting an empty key or secret
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> crate::Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(crate::GrantError::Configuration(
                "api-key and api-secret must be set".to_string(),
            ));
        }

        Ok(ApiCredentials {
            api_key,
            api_secret,
        })
    }

    /// Load the pair from `LIVEKIT_API_KEY` and `LIVEKIT_API_SECRET`
    pub fn from_env() -> crate::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let api_secret = std::env::var(API_SECRET_ENV).unwrap_or_default();
        Self::new(api_key, api_secret)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &[u8] {
        self.api_secret.as_bytes()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}
