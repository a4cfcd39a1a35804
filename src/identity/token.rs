//! Bearer-token claims and verification.
//!
//! The identity provider issues short-lived signed tokens; the portal only
//! ever verifies them. `mint` exists for the CLI and tests, where a local
//! stand-in for the provider is needed.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

use super::{IdentityClaims, IdentityError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(uid: String, email: String, config: &IdentityConfig, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: uid,
            email,
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Issue a token the verifier will accept. CLI/dev/test use only.
pub fn mint(claims: &Claims, config: &IdentityConfig) -> Result<String, IdentityError> {
    if config.token_secret.is_empty() {
        return Err(IdentityError::Misconfigured("token secret is not set".into()));
    }
    let key = EncodingKey::from_secret(config.token_secret.as_bytes());
    encode(&Header::default(), claims, &key)
        .map_err(|e| IdentityError::Misconfigured(format!("token encoding failed: {}", e)))
}

/// Verify a bearer token and extract the caller's identity.
pub fn verify(token: &str, config: &IdentityConfig) -> Result<IdentityClaims, IdentityError> {
    if config.token_secret.is_empty() {
        return Err(IdentityError::Misconfigured("token secret is not set".into()));
    }

    let key = DecodingKey::from_secret(config.token_secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

    Ok(IdentityClaims {
        uid: data.claims.sub,
        email: data.claims.email,
    })
}
