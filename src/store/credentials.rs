//! Credential store: the access/refresh token pair kept in key/value storage.

use super::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Storage};
use crate::error::ClientResult;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Access and refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Where the gateway reads and writes its tokens.
pub trait CredentialStore: Send + Sync {
    /// The full pair, when both tokens are stored.
    fn get(&self) -> Option<Credential> {
        Some(Credential {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    fn set(&self, credential: &Credential) -> ClientResult<()>;

    /// Replace only the access token (after a refresh that did not rotate).
    fn set_access_token(&self, token: &str) -> ClientResult<()>;

    /// Remove both tokens.
    fn clear(&self) -> ClientResult<()>;
}

/// [`CredentialStore`] over any [`Storage`], using the `token` and
/// `refreshToken` keys.
#[derive(Clone)]
pub struct StorageCredentials {
    storage: Arc<dyn Storage>,
}

impl StorageCredentials {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl CredentialStore for StorageCredentials {
    fn access_token(&self) -> Option<String> {
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.storage
            .get(REFRESH_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    fn set(&self, credential: &Credential) -> ClientResult<()> {
        self.storage.set_many(&[
            (ACCESS_TOKEN_KEY, credential.access_token.as_str()),
            (REFRESH_TOKEN_KEY, credential.refresh_token.as_str()),
        ])
    }

    fn set_access_token(&self, token: &str) -> ClientResult<()> {
        self.storage.set(ACCESS_TOKEN_KEY, token)
    }

    fn clear(&self) -> ClientResult<()> {
        self.storage.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
    }
}

/// Unverified claims read from a JWT access token.
///
/// Only used to describe the session (`todo status`); the backend is the
/// sole judge of whether a token is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    /// Who the token was issued to: `sub`, falling back to `user_id`.
    pub fn subject(&self) -> Option<String> {
        self.sub.clone().or_else(|| {
            self.user_id.as_ref().map(|id| match id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
    }
}

/// Decode the payload segment of a JWT. Opaque tokens yield `None`.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}
