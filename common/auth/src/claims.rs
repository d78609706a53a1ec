use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Claims extracted from a token that passed full signature and
/// standard-claim validation. Never built from unverified input.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: String,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw: serde_json::Value,
}

impl Claims {
    /// Rejects tokens whose `iat` lies beyond the allowed clock skew.
    /// `exp` is enforced by the decoder; this closes the other end of
    /// the validity window.
    pub(crate) fn ensure_not_issued_in_future(&self, leeway_seconds: u32) -> AuthResult<()> {
        if let Some(issued_at) = self.issued_at {
            if issued_at > Utc::now() + Duration::seconds(i64::from(leeway_seconds)) {
                return Err(AuthError::InvalidToken(
                    "token issued in the future".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The authenticated identity handed to authorization logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub authorities: BTreeSet<String>,
}

impl Principal {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    iss: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            subject: value.sub,
            issuer: value.iss,
            expires_at,
            issued_at,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
