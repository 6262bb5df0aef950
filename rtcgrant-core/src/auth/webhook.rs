//! Webhook authentication
//!
//! The media server signs each webhook with an access token whose `sha256`
//! claim holds the base64 SHA-256 of the posted body. A receiver verifies
//! the token, hashes the body exactly as it arrived, and only then parses
//! the event.

use crate::auth::{constant_time_str_compare, TokenVerifier};
use crate::events::WebhookEvent;
use crate::{ApiCredentials, GrantError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Header the media server uses to carry the webhook token
pub const AUTHORIZE_HEADER: &str = "Authorize";

/// Standard header name, accepted from senders that use it instead
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Base64 (standard alphabet, padded) SHA-256 digest of `body`
pub fn body_digest(body: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(body))
}

/// Authenticates webhook requests signed under one API key
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    verifier: TokenVerifier,
}

impl WebhookReceiver {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        Ok(WebhookReceiver {
            verifier: TokenVerifier::new(api_key, api_secret)?,
        })
    }

    pub fn from_credentials(credentials: ApiCredentials) -> Self {
        WebhookReceiver {
            verifier: TokenVerifier::from_credentials(credentials),
        }
    }

    /// Use a preconfigured verifier, e.g. one with clock leeway
    pub fn from_verifier(verifier: TokenVerifier) -> Self {
        WebhookReceiver { verifier }
    }

    /// Authenticate and parse a webhook event.
    ///
    /// `body` must be the raw request body as received; `auth_token` is the
    /// value of the authorization header. With `skip_auth` set, the body is
    /// parsed without any check. That mode is only safe for callers that
    /// already trust the transport and must never face network input.
    pub fn receive(
        &self,
        body: &[u8],
        auth_token: Option<&str>,
        skip_auth: bool,
    ) -> Result<WebhookEvent> {
        self.receive_as(body, auth_token, skip_auth)
    }

    /// Same as [`receive`](Self::receive), parsing into a caller-chosen type
    pub fn receive_as<T: DeserializeOwned>(
        &self,
        body: &[u8],
        auth_token: Option<&str>,
        skip_auth: bool,
    ) -> Result<T> {
        if !skip_auth {
            self.authenticate(body, auth_token)?;
        }

        Ok(serde_json::from_slice(body)?)
    }

    /// Check the token and the body digest without parsing the body
    pub fn authenticate(&self, body: &[u8], auth_token: Option<&str>) -> Result<()> {
        let token = auth_token
            .map(|t| t.trim())
            .map(|t| t.strip_prefix("Bearer ").unwrap_or(t))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("Webhook rejected: authorization header is empty");
                GrantError::MissingCredential
            })?;

        let grants = self.verifier.verify(token)?;

        let digest = body_digest(body);
        let matches = grants
            .sha256
            .as_deref()
            .is_some_and(|claimed| constant_time_str_compare(claimed, &digest));

        if !matches {
            warn!(
                "Webhook rejected: body digest mismatch (issuer={}, body_len={})",
                self.verifier.api_key(),
                body.len()
            );
            return Err(GrantError::PayloadTampered);
        }

        debug!("Webhook authenticated: body_len={}", body.len());
        Ok(())
    }
}
