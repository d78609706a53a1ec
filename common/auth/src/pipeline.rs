use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;

use crate::authority::AuthorityMapper;
use crate::claims::{Claims, Principal};
use crate::error::{AuthError, AuthResult};
use crate::registry::IssuerRegistry;

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: Principal,
    pub claims: Claims,
}

/// Takes a raw bearer token through parse, issuer resolution, verification
/// and authority mapping. Stateless per call; every failure is terminal for
/// the request and tokens are re-verified on every request.
#[derive(Clone)]
pub struct AuthenticationPipeline {
    registry: Arc<IssuerRegistry>,
    authorities: AuthorityMapper,
}

impl AuthenticationPipeline {
    pub fn new(registry: Arc<IssuerRegistry>, authorities: AuthorityMapper) -> Self {
        Self {
            registry,
            authorities,
        }
    }

    pub fn registry(&self) -> &IssuerRegistry {
        &self.registry
    }

    pub async fn authenticate(&self, token: &str) -> AuthResult<Authenticated> {
        // The pre-verification issuer is only ever used to pick a verifier;
        // every other claim stays untrusted until the signature checks out.
        let issuer_hint = peek_issuer(token)?;

        let verifier = self
            .registry
            .resolve(&issuer_hint)
            .ok_or_else(|| AuthError::UnknownIssuer(issuer_hint.clone()))?;

        let claims = verifier
            .verify(token)
            .await
            .map_err(AuthError::fail_closed)?;

        ensure_issuer_consistency(&claims, &issuer_hint)?;

        let authorities = self.authorities.map(&claims);
        debug!(
            subject = %claims.subject,
            issuer = %claims.issuer,
            authority_count = authorities.len(),
            "authenticated principal"
        );

        Ok(Authenticated {
            principal: Principal {
                subject: claims.subject.clone(),
                authorities,
            },
            claims,
        })
    }
}

/// Reads the `iss` claim from the payload segment without touching the
/// signature. Structural problems are malformed-token failures.
fn peek_issuer(token: &str) -> AuthResult<String> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::MalformedToken),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    value
        .get("iss")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or(AuthError::MalformedToken)
}

/// The issuer in the verified payload must be the one the verifier was
/// selected for. A disagreement means issuer confusion and is never
/// recoverable by re-resolving.
fn ensure_issuer_consistency(claims: &Claims, resolved_issuer: &str) -> AuthResult<()> {
    if claims.issuer != resolved_issuer {
        return Err(AuthError::InvalidToken(format!(
            "issuer '{}' does not match resolved issuer '{resolved_issuer}'",
            claims.issuer
        )));
    }
    Ok(())
}
