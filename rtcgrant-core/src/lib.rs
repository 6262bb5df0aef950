//! Access tokens and webhook authentication for rtcgrant
//!
//! Issues HS256-signed tokens carrying per-session video grants, verifies
//! them, and authenticates webhook bodies through a token-embedded digest.

pub mod auth;
pub mod error;
pub mod events;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use auth::*;
pub use error::*;
pub use events::*;
pub use types::*;

/// Result type alias for rtcgrant operations
pub type Result<T> = std::result::Result<T, GrantError>;
