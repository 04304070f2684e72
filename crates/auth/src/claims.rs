use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use taxtally_core::UserId;

/// Token lifetime: seven days.
pub const TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// JWT claims model (transport-agnostic).
///
/// This is the full set of claims a taxtally token carries once decoded.
/// Signature verification is intentionally outside this module (see
/// [`crate::token`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `user_id`, valid for [`TOKEN_TTL_SECONDS`] from `now`.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self::with_ttl(user_id, now, Duration::seconds(TOKEN_TTL_SECONDS))
    }

    /// Claims with an explicit lifetime. Mostly useful in tests.
    pub fn with_ttl(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Deterministic expiry check.
    ///
    /// A token is expired from its expiry instant onward (`now >= exp`), with
    /// no leeway.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
