//! Compact HS256 JWT encoding
//!
//! Tokens are `header.payload.signature`, each segment base64url without
//! padding. The MAC accepts secrets of any length. Issuer and time checks
//! belong to the verifier; this module only signs, authenticates and
//! decodes.

use crate::auth::GrantSet;
use crate::{GrantError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const ALGORITHM: &str = "HS256";

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Registered claims plus the grants, flattened into one payload object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(flatten)]
    pub grants: GrantSet,
}

/// Seconds since the epoch, shared by signer and verifier
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn keyed_mac(secret: &[u8]) -> std::result::Result<HmacSha256, hmac::digest::InvalidLength> {
    HmacSha256::new_from_slice(secret)
}

/// Serialize and sign claims
pub(crate) fn sign(claims: &Claims, secret: &[u8]) -> Result<String> {
    let payload = serde_json::to_vec(claims).map_err(|e| GrantError::Signing(e.to_string()))?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(HEADER),
        URL_SAFE_NO_PAD.encode(payload)
    );

    let mut mac = keyed_mac(secret).map_err(|e| GrantError::Signing(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Authenticate the signature and decode the claims
pub(crate) fn decode(token: &str, secret: &[u8]) -> Result<Claims> {
    let malformed = || GrantError::InvalidToken("malformed token".to_string());

    let (signing_input, signature) = token.rsplit_once('.').ok_or_else(malformed)?;
    let (header_b64, payload_b64) = signing_input.split_once('.').ok_or_else(malformed)?;
    if payload_b64.contains('.') {
        return Err(malformed());
    }

    let header: Header = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(GrantError::InvalidToken(format!(
            "unsupported algorithm: {}",
            header.alg
        )));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| GrantError::InvalidToken("malformed signature".to_string()))?;

    // verify_slice compares in constant time
    let mut mac = keyed_mac(secret).map_err(|e| GrantError::InvalidToken(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| GrantError::InvalidToken("signature mismatch".to_string()))?;

    decode_segment(payload_b64)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| GrantError::InvalidToken(format!("invalid base64 segment: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GrantError::InvalidToken(format!("invalid json segment: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::VideoGrant;

    fn claims() -> Claims {
        let mut grants = GrantSet::new();
        grants.add_grant(VideoGrant::join("room1"));
        Claims {
            exp: Some(1_700_021_600),
            nbf: Some(1_700_000_000),
            iss: Some("APIkey".to_string()),
            sub: Some("alice".to_string()),
            jti: Some("alice".to_string()),
            grants,
        }
    }

    #[test]
    fn test_sign_decode_with_short_secret() {
        let token = sign(&claims(), b"abc").unwrap();
        assert_eq!(decode(&token, b"abc").unwrap(), claims());
    }

    #[test]
    fn test_header_segment() {
        let token = sign(&claims(), b"secret").unwrap();
        let header = token.split('.').next().unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(header).unwrap(), HEADER.as_bytes());
    }

    #[test]
    fn test_known_vector() {
        // HS256 of the canonical jwt.io sample
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";
        let decoded = decode(token, b"your-256-bit-secret").unwrap();

        assert_eq!(decoded.sub.as_deref(), Some("1234567890"));
        assert_eq!(decoded.grants.name.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_rejects_tampering() {
        let token = sign(&claims(), b"abababa").unwrap();
        assert!(matches!(decode(&token, b"abababb"), Err(GrantError::InvalidToken(_))));

        let mut other = claims();
        other.sub = Some("mallory".to_string());
        let forged = sign(&other, b"abababa").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(matches!(decode(&spliced, b"abababa"), Err(GrantError::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice"}"#);
        let token = format!("{}.{}.", header, payload);

        assert!(matches!(decode(&token, b"abababa"), Err(GrantError::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_malformed() {
        for token in ["", "a", "a.b", "a.b.c.d", "!!.??.##"] {
            assert!(matches!(decode(token, b"abababa"), Err(GrantError::InvalidToken(_))));
        }
    }
}
