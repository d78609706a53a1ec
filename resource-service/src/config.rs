use std::env;

/// Environment-driven settings. Defaults mirror the demo setup: a private
/// authorization server trusted via shared secret, plus a mock OIDC provider
/// trusted via its published key set.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub private_issuer: String,
    /// base64url (unpadded) 256-bit key; generated at startup when unset.
    pub private_secret: Option<String>,
    pub oidc_issuer: String,
    pub oidc_jwks_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8086),
            private_issuer: env::var("PRIVATE_ISSUER_NAME")
                .unwrap_or_else(|_| "https://private-server.local".to_string()),
            private_secret: env::var("PRIVATE_ISSUER_SECRET").ok(),
            oidc_issuer: env::var("OIDC_ISSUER_NAME")
                .unwrap_or_else(|_| "https://oauth.mocklab.io".to_string()),
            oidc_jwks_url: env::var("OIDC_JWKS_URL")
                .unwrap_or_else(|_| "https://oauth.mocklab.io/.well-known/jwks.json".to_string()),
        }
    }
}
