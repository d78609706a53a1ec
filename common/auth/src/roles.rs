use std::collections::{BTreeSet, HashMap};

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

/// Maps a token subject to the roles granted to it. Implementations can be
/// as simple as an in-memory table or backed by a database query.
///
/// Lookup is infallible: a subject with no grants yields the empty set.
pub trait SubjectRolesResolver: Send + Sync {
    fn roles_for(&self, subject: &str) -> BTreeSet<String>;
}

/// Hard-coded subject-to-roles table. Intended for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubjectRolesResolver {
    grants: HashMap<String, BTreeSet<String>>,
}

impl InMemorySubjectRolesResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, subject: impl Into<String>, role: impl Into<String>) -> Self {
        self.grants
            .entry(subject.into())
            .or_default()
            .insert(role.into());
        self
    }
}

impl SubjectRolesResolver for InMemorySubjectRolesResolver {
    fn roles_for(&self, subject: &str) -> BTreeSet<String> {
        self.grants.get(subject).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subject_returns_granted_roles() {
        let resolver = InMemorySubjectRolesResolver::new()
            .with_role("bob", ROLE_USER)
            .with_role("admin", ROLE_ADMIN)
            .with_role("admin", ROLE_USER);

        assert_eq!(
            resolver.roles_for("admin"),
            BTreeSet::from([ROLE_ADMIN.to_string(), ROLE_USER.to_string()])
        );
    }

    #[test]
    fn unknown_subject_returns_empty_set_not_error() {
        let resolver = InMemorySubjectRolesResolver::new().with_role("bob", ROLE_USER);
        assert!(resolver.roles_for("mallory").is_empty());
    }

    #[test]
    fn duplicate_grants_deduplicate() {
        let resolver = InMemorySubjectRolesResolver::new()
            .with_role("bob", ROLE_USER)
            .with_role("bob", ROLE_USER);
        assert_eq!(resolver.roles_for("bob").len(), 1);
    }
}
