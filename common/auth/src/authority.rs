use std::collections::BTreeSet;
use std::sync::Arc;

use crate::claims::Claims;
use crate::roles::SubjectRolesResolver;

/// Prefix applied to every role name so authorization rules can match on a
/// consistent label shape.
pub const AUTHORITY_PREFIX: &str = "ROLE_";

pub fn authority_label(role: &str) -> String {
    format!("{AUTHORITY_PREFIX}{role}")
}

/// Converts validated claims into authority labels by looking up the subject's
/// roles. The resolver is injected at construction, never framework-wired.
#[derive(Clone)]
pub struct AuthorityMapper {
    resolver: Arc<dyn SubjectRolesResolver>,
}

impl AuthorityMapper {
    pub fn new(resolver: Arc<dyn SubjectRolesResolver>) -> Self {
        Self { resolver }
    }

    pub fn map(&self, claims: &Claims) -> BTreeSet<String> {
        self.resolver
            .roles_for(&claims.subject)
            .iter()
            .map(|role| authority_label(role))
            .collect()
    }
}
