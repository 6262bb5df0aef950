//! Access token issuance
//!
//! An [`AccessToken`] holds a draft [`GrantSet`] that callers shape with
//! grant additions and setters. Each call to [`AccessToken::to_jwt`] signs
//! the current draft with HS256, so the same issuer can mint several tokens
//! as its grants change.

use crate::auth::jwt::{self, Claims};
use crate::auth::{body_digest, GrantSet, Ttl, VideoGrant};
use crate::{ApiCredentials, GrantError, Result};
use serde::Deserialize;
use tracing::debug;

/// Optional settings applied when an access token is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    /// Identity of the bearer, required for room join tokens
    pub identity: Option<String>,

    /// Display name, exposed to other participants
    pub name: Option<String>,

    /// Metadata passed to other participants
    pub metadata: Option<String>,

    /// Validity window, six hours when unset
    pub ttl: Option<Ttl>,
}

/// Builder and signer for HS256 access tokens
#[derive(Debug, Clone)]
pub struct AccessToken {
    credentials: ApiCredentials,
    grants: GrantSet,
    identity: Option<String>,
    ttl: Ttl,
}

impl AccessToken {
    /// Create an access token with default options
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, api_secret, TokenOptions::default())
    }

    /// Create an access token, failing if the key or secret is empty
    pub fn with_options(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        options: TokenOptions,
    ) -> Result<Self> {
        let credentials = ApiCredentials::new(api_key, api_secret)?;
        Self::from_credentials(credentials, options)
    }

    /// Create an access token from already validated credentials
    pub fn from_credentials(credentials: ApiCredentials, options: TokenOptions) -> Result<Self> {
        let ttl = resolve_ttl(options.ttl)?;

        let mut grants = GrantSet::new();
        grants.name = options.name.filter(|s| !s.is_empty());
        grants.metadata = options.metadata.filter(|s| !s.is_empty());

        Ok(AccessToken {
            credentials,
            grants,
            identity: options.identity.filter(|s| !s.is_empty()),
            ttl,
        })
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.set_identity(identity);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.set_metadata(metadata);
        self
    }

    pub fn with_ttl(mut self, ttl: impl Into<Ttl>) -> Result<Self> {
        self.set_ttl(ttl)?;
        Ok(self)
    }

    pub fn with_grant(mut self, grant: VideoGrant) -> Self {
        self.add_grant(grant);
        self
    }

    /// Bind the token to a message body through its SHA-256 digest
    pub fn with_body_digest(mut self, body: &[u8]) -> Self {
        self.set_sha256(Some(body_digest(body)));
        self
    }

    /// Overlay a video grant onto the grants added so far
    pub fn add_grant(&mut self, grant: VideoGrant) {
        self.grants.add_grant(grant);
    }

    pub fn set_identity(&mut self, identity: impl Into<String>) {
        let identity = identity.into();
        self.identity = if identity.is_empty() {
            None
        } else {
            Some(identity)
        };
    }

    /// Replace the validity window, rejecting one that cannot be resolved
    pub fn set_ttl(&mut self, ttl: impl Into<Ttl>) -> Result<()> {
        self.ttl = resolve_ttl(Some(ttl.into()))?;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.grants.name = Some(name.into());
    }

    /// Set metadata passed to other participants, used only on join
    pub fn set_metadata(&mut self, metadata: impl Into<String>) {
        self.grants.metadata = Some(metadata.into());
    }

    pub fn set_sha256(&mut self, sha256: Option<String>) {
        self.grants.sha256 = sha256;
    }

    pub fn sha256(&self) -> Option<&str> {
        self.grants.sha256.as_deref()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn ttl(&self) -> &Ttl {
        &self.ttl
    }

    pub fn grants(&self) -> &GrantSet {
        &self.grants
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Sign the current grants into a compact JWT
    pub fn to_jwt(&self) -> Result<String> {
        let now = jwt::now_secs();
        let expires_at = self.ttl.expires_at(now)?;

        if self.identity.is_none() && self.grants.requires_identity() {
            return Err(GrantError::IdentityRequired);
        }

        let claims = Claims {
            exp: Some(expires_at),
            nbf: Some(now),
            iss: Some(self.credentials.api_key().to_string()),
            sub: self.identity.clone(),
            jti: self.identity.clone(),
            grants: self.grants.clone(),
        };
        let token = jwt::sign(&claims, self.credentials.api_secret())?;

        debug!(
            "Signed access token: issuer={}, identity={:?}, expires_at={}",
            self.credentials.api_key(),
            self.identity,
            expires_at
        );

        Ok(token)
    }
}

fn resolve_ttl(ttl: Option<Ttl>) -> Result<Ttl> {
    let ttl = match ttl {
        // zero is treated as unset
        None | Some(Ttl::Seconds(0)) => Ttl::default(),
        Some(ttl) => ttl,
    };
    ttl.validate()?;
    Ok(ttl)
}
