use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand_core::{OsRng, RngCore};

use crate::error::{AuthError, AuthResult};

const SECRET_LEN: usize = 32;
const DEFAULT_LEEWAY_SECONDS: u32 = 30;

/// Startup configuration for one trusted issuer. The registry turns a list
/// of these into verifiers; nothing is mutable after that.
#[derive(Clone)]
pub struct IssuerConfig {
    /// Expected `iss` claim value; also the registry lookup key.
    pub name: String,
    /// Allowable clock skew in seconds when validating exp/iat.
    pub leeway_seconds: u32,
    pub verifier: VerifierSource,
}

/// Where the verification key material for an issuer comes from.
#[derive(Clone)]
pub enum VerifierSource {
    /// Public keys published at a JWKS endpoint, fetched lazily.
    Jwks { url: String },
    /// A process-held symmetric key for HMAC-signed tokens.
    SharedSecret { secret: SharedSecret },
}

impl IssuerConfig {
    pub fn jwks(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            verifier: VerifierSource::Jwks { url: url.into() },
        }
    }

    pub fn shared_secret(name: impl Into<String>, secret: SharedSecret) -> Self {
        Self {
            name: name.into(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            verifier: VerifierSource::SharedSecret { secret },
        }
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

/// 256-bit symmetric key for HMAC verification.
#[derive(Clone)]
pub struct SharedSecret(Vec<u8>);

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl SharedSecret {
    /// Draws a fresh key from the OS CSPRNG. Failure to obtain secure
    /// randomness is fatal at startup, never a fallback to a weaker source.
    pub fn generate() -> AuthResult<Self> {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
            AuthError::Configuration(format!("unable to generate shared secret: {err}"))
        })?;
        Ok(Self(bytes.to_vec()))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let bytes = bytes.into();
        if bytes.len() != SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "shared secret must be {SECRET_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Parses a base64url (unpadded) encoded key.
    pub fn from_base64(encoded: &str) -> AuthResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|err| AuthError::Configuration(format!("invalid shared secret: {err}")))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
