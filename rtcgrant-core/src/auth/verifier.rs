//! Access token verification
//!
//! A [`TokenVerifier`] trusts tokens signed with one API secret and issued
//! under the matching API key. Signature, issuer, expiry and not-before are
//! all checked; any failure is reported as [`GrantError::InvalidToken`].

use crate::auth::jwt::{self, Claims};
use crate::auth::GrantSet;
use crate::{ApiCredentials, GrantError, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Grants and registered claims recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub grants: GrantSet,
    /// Subject claim, absent on tokens issued without an identity
    pub identity: Option<String>,
    pub issuer: String,
    /// Expiry in seconds since the epoch
    pub expires_at: Option<u64>,
    /// Not-before in seconds since the epoch
    pub not_before: Option<u64>,
}

/// Verifies tokens issued under a single API key
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    credentials: ApiCredentials,
    leeway: Duration,
}

impl TokenVerifier {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        Ok(Self::from_credentials(ApiCredentials::new(api_key, api_secret)?))
    }

    pub fn from_credentials(credentials: ApiCredentials) -> Self {
        TokenVerifier {
            credentials,
            leeway: Duration::ZERO,
        }
    }

    /// Accept tokens up to `leeway` past expiry or before not-before
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Verify a token and return its grants
    pub fn verify(&self, token: &str) -> Result<GrantSet> {
        Ok(self.verify_claims(token)?.grants)
    }

    /// Verify a token and return its grants with the registered claims
    pub fn verify_claims(&self, token: &str) -> Result<VerifiedToken> {
        self.verify_with(token, jwt::now_secs())
    }

    /// Verify as if the current time were `at`
    pub(crate) fn verify_at(&self, token: &str, at: SystemTime) -> Result<VerifiedToken> {
        let at = at
            .duration_since(UNIX_EPOCH)
            .map_err(|_| GrantError::InvalidToken("verification time before epoch".to_string()))?;
        self.verify_with(token, at.as_secs())
    }

    fn verify_with(&self, token: &str, now: u64) -> Result<VerifiedToken> {
        let claims = jwt::decode(token, self.credentials.api_secret())
            .and_then(|claims| self.check_claims(claims, now))
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                e
            })?;

        debug!(
            "Verified access token: issuer={}, identity={:?}",
            self.credentials.api_key(),
            claims.sub
        );

        Ok(VerifiedToken {
            grants: claims.grants,
            identity: claims.sub,
            issuer: claims.iss.unwrap_or_default(),
            expires_at: claims.exp,
            not_before: claims.nbf,
        })
    }

    fn check_claims(&self, claims: Claims, now: u64) -> Result<Claims> {
        if claims.iss.as_deref() != Some(self.credentials.api_key()) {
            return Err(GrantError::InvalidToken("issuer mismatch".to_string()));
        }

        let leeway = self.leeway.as_secs();
        if let Some(exp) = claims.exp {
            if now >= exp.saturating_add(leeway) {
                return Err(GrantError::InvalidToken("token has expired".to_string()));
            }
        }
        if let Some(nbf) = claims.nbf {
            if now.saturating_add(leeway) < nbf {
                return Err(GrantError::InvalidToken("token is not valid yet".to_string()));
            }
        }

        Ok(claims)
    }
}
