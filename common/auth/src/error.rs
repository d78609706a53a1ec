use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is structurally malformed")]
    MalformedToken,
    #[error("no verifier registered for issuer '{0}'")]
    UnknownIssuer(String),
    #[error("token verification failed: {0}")]
    InvalidToken(String),
    #[error("key source unavailable: {0}")]
    KeySource(String),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Collapses "could not check" into "checked and failed" so callers can
    /// never tell a key-source outage apart from a bad signature.
    pub fn fail_closed(self) -> Self {
        match self {
            AuthError::KeySource(_) => {
                AuthError::InvalidToken("signing keys unavailable".to_string())
            }
            other => other,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingAuthorization | AuthError::InvalidAuthorization => {
                (StatusCode::UNAUTHORIZED, "AUTH_HEADER")
            }
            AuthError::MalformedToken => (StatusCode::UNAUTHORIZED, "AUTH_MALFORMED"),
            AuthError::UnknownIssuer(_) => (StatusCode::UNAUTHORIZED, "AUTH_ISSUER"),
            AuthError::InvalidToken(_) | AuthError::KeySource(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_TOKEN")
            }
            AuthError::InvalidClaim(_, _) | AuthError::InvalidJson(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_CLAIMS")
            }
            AuthError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_CONFIG"),
        };

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
