use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A verification key taken from a JWKS document, together with the
/// signature algorithms it admits.
#[derive(Clone)]
pub struct JwksKey {
    pub kid: String,
    pub key: DecodingKey,
    pub algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for JwksKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksKey")
            .field("kid", &self.kid)
            .field("algorithms", &self.algorithms)
            .finish_non_exhaustive()
    }
}

/// Fetches a provider's published key set over HTTPS with a bounded timeout.
#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Configuration(format!("http client: {err}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieves and decodes the key set. Entries that cannot be used for
    /// signature verification are skipped rather than failing the fetch.
    pub async fn fetch(&self) -> AuthResult<Vec<JwksKey>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::KeySource(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySource(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksResponse = response
            .json()
            .await
            .map_err(|err| AuthError::KeySource(format!("malformed JWKS: {err}")))?;

        let mut keys = Vec::new();
        for entry in body.keys.into_iter() {
            match decode_entry(entry) {
                Ok(Some(key)) => keys.push(key),
                Ok(None) => {}
                Err(err) => debug!(url = %self.url, error = %err, "skipping unusable JWKS entry"),
            }
        }

        Ok(keys)
    }
}

/// Converts one JWKS entry into a decoding key plus its permitted algorithms:
/// the explicitly advertised `alg` when present, otherwise the full family
/// implied by the key type.
fn decode_entry(entry: JwkEntry) -> AuthResult<Option<JwksKey>> {
    if let Some(key_use) = &entry.key_use {
        if key_use != "sig" {
            return Ok(None);
        }
    }

    let kid = entry.kid.ok_or_else(|| {
        AuthError::KeySource("JWKS entry missing key id (kid)".to_string())
    })?;
    let kty = entry.kty.unwrap_or_else(|| "RSA".to_string());

    let (key, family) = match kty.as_str() {
        "RSA" => {
            let modulus = entry
                .n
                .ok_or_else(|| missing_components(&kid))?;
            let exponent = entry
                .e
                .ok_or_else(|| missing_components(&kid))?;
            let key = DecodingKey::from_rsa_components(&modulus, &exponent)
                .map_err(|err| key_parse(&kid, err))?;
            (key, rsa_family())
        }
        "EC" => {
            let x = entry.x.ok_or_else(|| missing_components(&kid))?;
            let y = entry.y.ok_or_else(|| missing_components(&kid))?;
            let key = DecodingKey::from_ec_components(&x, &y)
                .map_err(|err| key_parse(&kid, err))?;
            (key, ec_family())
        }
        other => {
            return Err(AuthError::KeySource(format!(
                "JWKS key '{kid}' uses unsupported key type '{other}'"
            )));
        }
    };

    let algorithms = match entry.alg {
        Some(alg) => {
            let algorithm = Algorithm::from_str(&alg).map_err(|_| {
                AuthError::KeySource(format!("JWKS key '{kid}' uses unsupported alg '{alg}'"))
            })?;
            vec![algorithm]
        }
        None => family,
    };

    Ok(Some(JwksKey {
        kid,
        key,
        algorithms,
    }))
}

fn rsa_family() -> Vec<Algorithm> {
    vec![
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
        Algorithm::PS256,
        Algorithm::PS384,
        Algorithm::PS512,
    ]
}

fn ec_family() -> Vec<Algorithm> {
    vec![Algorithm::ES256, Algorithm::ES384]
}

fn missing_components(kid: &str) -> AuthError {
    AuthError::KeySource(format!("JWKS key '{kid}' missing required components"))
}

fn key_parse(kid: &str, err: jsonwebtoken::errors::Error) -> AuthError {
    AuthError::KeySource(format!("failed to parse JWKS key '{kid}': {err}"))
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: Option<String>,
    e: Option<String>,
    x: Option<String>,
    y: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn fetch_decodes_rsa_keys_with_advertised_alg() {
        let server = MockServer::start();
        let body = serde_json::json!({
            "keys": [
                {
                    "kid": "rsa-1",
                    "kty": "RSA",
                    "alg": "RS256",
                    "n": "u1SU1LfVLPHCozMxH2Mo4lgOEePzNm0tRgeLezV6ffAt0gunVTLw7onLRnrq0_IzW7yWR7QkrmBL7jTKEn5u-qKhbwKfBstIs-bMY2Zkp18gnTxKLxoS2tFczGkPLPgizskuemMghRniWaoLcyehkd3qqGElvW_VDL5AaWTg0nLVkjRo9z-40RQzuVaE8AkAFmxZzow3x-VJYKdjykkJ0iT9wCS0DRTXu269V264Vf_3jvredZiKRkgwlL9xNAwxXFg0x_XFw005UWVRIkdgcKWTjpBP2dPwVZ4WWC-9aGVd-Gyn1o0CLelf4rEjGoXbAAEgAqeGUxrcIlbjXfbcmw",
                    "e": "AQAB"
                }
            ]
        });

        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url())).expect("fetcher");
        let keys = fetcher.fetch().await.expect("fetch succeeds");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kid, "rsa-1");
        assert_eq!(keys[0].algorithms, vec![Algorithm::RS256]);
    }

    #[tokio::test]
    async fn key_without_alg_admits_the_full_family() {
        let server = MockServer::start();
        let body = serde_json::json!({
            "keys": [
                {
                    "kid": "rsa-2",
                    "kty": "RSA",
                    "n": "u1SU1LfVLPHCozMxH2Mo4lgOEePzNm0tRgeLezV6ffAt0gunVTLw7onLRnrq0_IzW7yWR7QkrmBL7jTKEn5u-qKhbwKfBstIs-bMY2Zkp18gnTxKLxoS2tFczGkPLPgizskuemMghRniWaoLcyehkd3qqGElvW_VDL5AaWTg0nLVkjRo9z-40RQzuVaE8AkAFmxZzow3x-VJYKdjykkJ0iT9wCS0DRTXu269V264Vf_3jvredZiKRkgwlL9xNAwxXFg0x_XFw005UWVRIkdgcKWTjpBP2dPwVZ4WWC-9aGVd-Gyn1o0CLelf4rEjGoXbAAEgAqeGUxrcIlbjXfbcmw",
                    "e": "AQAB"
                }
            ]
        });

        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url())).expect("fetcher");
        let keys = fetcher.fetch().await.expect("fetch succeeds");
        assert_eq!(keys[0].algorithms.len(), 6);
        assert!(keys[0].algorithms.contains(&Algorithm::RS256));
        assert!(keys[0].algorithms.contains(&Algorithm::PS512));
    }

    #[tokio::test]
    async fn unusable_entries_are_skipped_not_fatal() {
        let server = MockServer::start();
        let body = serde_json::json!({
            "keys": [
                { "kid": "enc-key", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" },
                { "kid": "oct-key", "kty": "oct", "k": "c2VjcmV0" }
            ]
        });

        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url())).expect("fetcher");
        let keys = fetcher.fetch().await.expect("fetch succeeds");
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn http_error_is_a_key_source_failure() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(503);
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url())).expect("fetcher");
        let err = fetcher.fetch().await.expect_err("fetch should fail");
        assert!(matches!(err, AuthError::KeySource(_)));
    }
}
