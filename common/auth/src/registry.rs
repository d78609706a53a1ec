use std::collections::HashMap;

use crate::config::IssuerConfig;
use crate::error::{AuthError, AuthResult};
use crate::verifier::TokenVerifier;

/// Maps issuer names to their verifiers. Built once at startup and immutable
/// afterwards, so lookups need no locking no matter how many request handlers
/// read it concurrently.
pub struct IssuerRegistry {
    verifiers: HashMap<String, TokenVerifier>,
}

impl std::fmt::Debug for IssuerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerRegistry")
            .field("issuers", &self.verifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl IssuerRegistry {
    pub fn builder() -> IssuerRegistryBuilder {
        IssuerRegistryBuilder::default()
    }

    /// Builds verifiers from plain configuration data.
    pub fn from_configs(configs: impl IntoIterator<Item = IssuerConfig>) -> AuthResult<Self> {
        let mut builder = Self::builder();
        for config in configs {
            let name = config.name.clone();
            let verifier = TokenVerifier::from_config(config)?;
            builder = builder.register(name, verifier);
        }
        builder.build()
    }

    pub fn resolve(&self, issuer: &str) -> Option<&TokenVerifier> {
        self.verifiers.get(issuer)
    }

    pub fn issuers(&self) -> impl Iterator<Item = &str> {
        self.verifiers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

#[derive(Default)]
pub struct IssuerRegistryBuilder {
    verifiers: HashMap<String, TokenVerifier>,
    duplicates: Vec<String>,
}

impl IssuerRegistryBuilder {
    pub fn register(mut self, name: impl Into<String>, verifier: TokenVerifier) -> Self {
        let name = name.into();
        if self.verifiers.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.verifiers.insert(name, verifier);
        }
        self
    }

    /// Fails on duplicate registration; a config listing the same issuer
    /// twice is a deployment mistake, not something to paper over.
    pub fn build(self) -> AuthResult<IssuerRegistry> {
        if let Some(name) = self.duplicates.first() {
            return Err(AuthError::Configuration(format!(
                "issuer '{name}' registered more than once"
            )));
        }
        Ok(IssuerRegistry {
            verifiers: self.verifiers,
        })
    }
}
