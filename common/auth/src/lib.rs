pub mod authority;
pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod jwks;
pub mod pipeline;
pub mod registry;
pub mod roles;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use authority::{authority_label, AuthorityMapper, AUTHORITY_PREFIX};
pub use claims::{Claims, Principal};
pub use config::{IssuerConfig, SharedSecret, VerifierSource};
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use guards::{ensure_role, GuardError};
pub use jwks::{JwksFetcher, JwksKey};
pub use pipeline::{Authenticated, AuthenticationPipeline};
pub use registry::{IssuerRegistry, IssuerRegistryBuilder};
pub use roles::{InMemorySubjectRolesResolver, SubjectRolesResolver, ROLE_ADMIN, ROLE_USER};
pub use verifier::{KeySetCache, RemoteKeySetVerifier, SharedSecretVerifier, TokenVerifier};
