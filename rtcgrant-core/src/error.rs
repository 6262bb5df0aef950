//! Error types for rtcgrant

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrantError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Identity is required for join but not set")]
    IdentityRequired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Authorization token is missing")]
    MissingCredential,

    #[error("sha256 checksum of body does not match")]
    PayloadTampered,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}
