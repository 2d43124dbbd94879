//! HS256 session tokens.

use crate::core::{CmsError, Result};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

pub const MISSING_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issues a token valid from now for the configured lifetime.
    pub fn issue(&self, account_id: &str, username: &str) -> Result<String> {
        self.issue_at(account_id, username, chrono::Utc::now().timestamp())
    }

    /// Issues a token as if signed at `issued_at` (unix seconds).
    pub fn issue_at(&self, account_id: &str, username: &str, issued_at: i64) -> Result<String> {
        let claims = Claims {
            sub: account_id.to_string(),
            username: username.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| CmsError::store(format!("token signing failed: {err}")))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(decoded) => Ok(decoded.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(CmsError::TokenExpired),
                _ => Err(CmsError::Forbidden(INVALID_TOKEN.into())),
            },
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str> {
    let missing = || CmsError::Unauthorized(MISSING_TOKEN.into());
    let raw = header_value.ok_or_else(missing)?;
    let token = raw.trim().strip_prefix("Bearer ").ok_or_else(missing)?.trim();
    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}
