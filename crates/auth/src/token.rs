use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use taxtally_core::UserId;

use crate::claims::TokenClaims;

/// Why a token failed to verify.
///
/// The HTTP layer collapses all of these to 401 but keeps the per-case
/// message, so callers can tell an expired token from a tampered one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed or decoded at all.
    #[error("invalid token")]
    Malformed,

    /// The token is past its expiry instant.
    #[error("token expired")]
    Expired,

    /// The signature does not match (tampered payload or wrong secret).
    #[error("invalid token signature")]
    InvalidSignature,

    /// Signing a fresh token failed.
    #[error("failed to sign token")]
    Signing,
}

/// Signs and verifies identity tokens with a process-wide HS256 secret.
///
/// The secret is loaded once at startup and never rotated within a process
/// lifetime, so this type is cheap to clone and share.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked deterministically against the caller's clock in
        // `verify`, not against the library's wall clock.
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `user_id` valid for seven days from now.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Sign a token for `user_id` valid for seven days from `now`.
    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::new(user_id, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify a token and return the user it was issued to.
    ///
    /// Signature and shape are checked first, then expiry against `now` with
    /// zero leeway.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if data.claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}
