//! Token issuance and verification for rtcgrant
//!
//! This module implements the security plane with:
//! - Video grants and their overlay merge
//! - HS256 access tokens with validity windows and identity rules
//! - Compact JWT signing and decoding
//! - Token verification bound to the issuing API key
//! - Webhook authentication through a body digest carried in the token
//! - Constant-time digest comparison

pub mod grants;
pub mod ttl;
pub mod token;
pub mod verifier;
pub mod webhook;
pub mod timing;
pub(crate) mod jwt;

pub use grants::*;
pub use ttl::*;
pub use token::*;
pub use verifier::*;
pub use webhook::*;
pub use timing::*;
