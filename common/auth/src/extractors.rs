use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::claims::{Claims, Principal};
use crate::error::{AuthError, AuthResult};
use crate::pipeline::AuthenticationPipeline;

/// Runs the full authentication pipeline against the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn subject(&self) -> &str {
        &self.principal.subject
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.principal.has_authority(authority)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<AuthenticationPipeline>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pipeline = Arc::<AuthenticationPipeline>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let authenticated = pipeline.authenticate(&token).await?;

        Ok(Self {
            principal: authenticated.principal,
            claims: authenticated.claims,
            token,
        })
    }
}

fn parse_bearer(value: &axum::http::HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}
