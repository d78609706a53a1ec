use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::claims::Claims;
use crate::config::{IssuerConfig, SharedSecret, VerifierSource};
use crate::error::{AuthError, AuthResult};
use crate::jwks::{JwksFetcher, JwksKey};

/// Copy-on-refresh store for keys fetched from a JWKS endpoint. Readers see
/// either the previous snapshot or the new one, never a partial set.
#[derive(Clone, Default)]
pub struct KeySetCache {
    inner: Arc<RwLock<HashMap<String, JwksKey>>>,
}

impl KeySetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kid: &str) -> Option<JwksKey> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.contains_key(kid)
    }

    pub fn is_empty(&self) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.is_empty()
    }

    pub fn all(&self) -> Vec<JwksKey> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.values().cloned().collect()
    }

    pub fn replace_all(&self, keys: Vec<JwksKey>) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.clear();
        for key in keys.into_iter() {
            guard.insert(key.kid.clone(), key);
        }
    }
}

/// Verifies tokens against an issuer's published key set, fetched lazily and
/// refreshed when a token references a key id we have not seen.
pub struct RemoteKeySetVerifier {
    issuer: String,
    leeway_seconds: u32,
    fetcher: JwksFetcher,
    cache: KeySetCache,
    refresh_gate: Mutex<()>,
}

impl RemoteKeySetVerifier {
    pub fn new(issuer: impl Into<String>, fetcher: JwksFetcher, leeway_seconds: u32) -> Self {
        Self {
            issuer: issuer.into(),
            leeway_seconds,
            fetcher,
            cache: KeySetCache::new(),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn cache(&self) -> &KeySetCache {
        &self.cache
    }

    pub async fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let candidates = self.candidate_keys(&header).await?;

        let mut last_err = None;
        for candidate in candidates {
            let mut validation = Validation::new(header.alg);
            validation.algorithms = candidate.algorithms.clone();
            validation.set_issuer(&[&self.issuer]);
            validation.validate_aud = false;
            validation.leeway = u64::from(self.leeway_seconds);

            match decode::<Value>(token, &candidate.key, &validation) {
                Ok(data) => {
                    let claims = Claims::try_from(data.claims)?;
                    claims.ensure_not_issued_in_future(self.leeway_seconds)?;
                    debug!(issuer = %self.issuer, kid = %candidate.kid, "verified JWT successfully");
                    return Ok(claims);
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(last_err.map(AuthError::from).unwrap_or_else(|| {
            AuthError::InvalidToken("no verification keys available".to_string())
        }))
    }

    /// Selects keys to try: the one named by the token's kid (refreshing the
    /// cache on a miss), falling back to every cached key compatible with the
    /// token's algorithm when no kid is present or none matches.
    async fn candidate_keys(&self, header: &jsonwebtoken::Header) -> AuthResult<Vec<JwksKey>> {
        match header.kid.as_deref() {
            Some(kid) => {
                if let Some(key) = self.cache.get(kid) {
                    return Ok(vec![key]);
                }
                self.refresh_if(|cache| !cache.contains(kid)).await?;
                if let Some(key) = self.cache.get(kid) {
                    return Ok(vec![key]);
                }
                self.compatible_keys(header.alg)
            }
            None => {
                if self.cache.is_empty() {
                    self.refresh_if(KeySetCache::is_empty).await?;
                }
                self.compatible_keys(header.alg)
            }
        }
    }

    fn compatible_keys(&self, alg: Algorithm) -> AuthResult<Vec<JwksKey>> {
        let keys: Vec<JwksKey> = self
            .cache
            .all()
            .into_iter()
            .filter(|key| key.algorithms.contains(&alg))
            .collect();
        if keys.is_empty() {
            return Err(AuthError::InvalidToken(format!(
                "no signing key compatible with algorithm {alg:?}"
            )));
        }
        Ok(keys)
    }

    /// Single-flight refresh: concurrent misses queue on the gate and the
    /// late arrivals re-check the cache instead of fetching again.
    async fn refresh_if<F>(&self, still_needed: F) -> AuthResult<()>
    where
        F: Fn(&KeySetCache) -> bool,
    {
        let _guard = self.refresh_gate.lock().await;
        if !still_needed(&self.cache) {
            return Ok(());
        }

        let keys = self.fetcher.fetch().await?;
        if keys.is_empty() {
            return Err(AuthError::Configuration(format!(
                "JWK set at '{}' yields no permitted signature algorithms",
                self.fetcher.url()
            )));
        }

        debug!(issuer = %self.issuer, count = keys.len(), "refreshed key set");
        self.cache.replace_all(keys);
        Ok(())
    }
}

/// Verifies HMAC-signed tokens with a process-held symmetric key. Purely
/// local, no network access.
pub struct SharedSecretVerifier {
    issuer: String,
    leeway_seconds: u32,
    key: DecodingKey,
}

impl SharedSecretVerifier {
    pub fn new(issuer: impl Into<String>, secret: &SharedSecret, leeway_seconds: u32) -> Self {
        Self {
            issuer: issuer.into(),
            leeway_seconds,
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;
        validation.leeway = u64::from(self.leeway_seconds);

        let data = decode::<Value>(token, &self.key, &validation)?;
        let claims = Claims::try_from(data.claims)?;
        claims.ensure_not_issued_in_future(self.leeway_seconds)?;
        debug!(issuer = %self.issuer, "verified HMAC JWT successfully");
        Ok(claims)
    }
}

/// The closed set of verification strategies an issuer can be configured with.
pub enum TokenVerifier {
    RemoteKeySet(RemoteKeySetVerifier),
    SharedSecret(SharedSecretVerifier),
}

impl TokenVerifier {
    pub fn from_config(config: IssuerConfig) -> AuthResult<Self> {
        match config.verifier {
            VerifierSource::Jwks { url } => Ok(Self::RemoteKeySet(RemoteKeySetVerifier::new(
                config.name,
                JwksFetcher::new(url)?,
                config.leeway_seconds,
            ))),
            VerifierSource::SharedSecret { secret } => Ok(Self::SharedSecret(
                SharedSecretVerifier::new(config.name, &secret, config.leeway_seconds),
            )),
        }
    }

    pub fn issuer(&self) -> &str {
        match self {
            Self::RemoteKeySet(verifier) => verifier.issuer(),
            Self::SharedSecret(verifier) => verifier.issuer(),
        }
    }

    pub async fn verify(&self, token: &str) -> AuthResult<Claims> {
        match self {
            Self::RemoteKeySet(verifier) => verifier.verify(token).await,
            Self::SharedSecret(verifier) => verifier.verify(token),
        }
    }
}
