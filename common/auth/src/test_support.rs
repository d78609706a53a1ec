//! Token-issuing helpers shared by the module tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;

pub const TEST_SECRET: &[u8; 32] = &[42u8; 32];

pub struct TokenSpec {
    pub subject: String,
    pub issuer: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl TokenSpec {
    pub fn new(subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            issued_at: now,
            expires_at: now + 600,
        }
    }

    pub fn expired_seconds_ago(mut self, seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        self.issued_at = now - seconds - 600;
        self.expires_at = now - seconds;
        self
    }
}

#[derive(Serialize)]
struct TokenClaims<'a> {
    sub: &'a str,
    iss: &'a str,
    exp: i64,
    iat: i64,
}

impl<'a> From<&'a TokenSpec> for TokenClaims<'a> {
    fn from(spec: &'a TokenSpec) -> Self {
        Self {
            sub: &spec.subject,
            iss: &spec.issuer,
            exp: spec.expires_at,
            iat: spec.issued_at,
        }
    }
}

pub struct RsaKeyMaterial {
    pub encoding: EncodingKey,
    pub modulus: String,
    pub exponent: String,
}

pub fn rsa_key_material() -> RsaKeyMaterial {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("private pem");

    let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");
    let modulus = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let exponent = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

    RsaKeyMaterial {
        encoding,
        modulus,
        exponent,
    }
}

pub fn issue_hmac_token(secret: &[u8], spec: &TokenSpec) -> String {
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &TokenClaims::from(spec),
        &EncodingKey::from_secret(secret),
    )
    .expect("sign token")
}

pub fn issue_rsa_token(material: &RsaKeyMaterial, kid: Option<&str>, spec: &TokenSpec) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, &TokenClaims::from(spec), &material.encoding).expect("sign token")
}
