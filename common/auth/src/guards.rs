use axum::http::StatusCode;

use crate::authority::authority_label;
use crate::claims::Principal;

#[derive(Debug, Clone)]
pub enum GuardError {
    Forbidden { required: Vec<String> },
}

impl GuardError {
    pub fn into_response(self) -> (StatusCode, String) {
        match self {
            GuardError::Forbidden { required } => (
                StatusCode::FORBIDDEN,
                if required.is_empty() {
                    "Insufficient role".to_string()
                } else {
                    format!("Insufficient role. Required one of: {}", required.join(", "))
                },
            ),
        }
    }
}

impl From<GuardError> for (StatusCode, String) {
    fn from(value: GuardError) -> Self {
        value.into_response()
    }
}

/// Checks that the principal holds at least one of the named roles. An empty
/// allow-list means any authenticated principal passes.
pub fn ensure_role(principal: &Principal, allowed: &[&str]) -> Result<(), GuardError> {
    if allowed.is_empty() {
        return Ok(());
    }

    let permitted = allowed
        .iter()
        .any(|role| principal.has_authority(&authority_label(role)));

    if permitted {
        Ok(())
    } else {
        Err(GuardError::Forbidden {
            required: allowed.iter().map(|value| value.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{ROLE_ADMIN, ROLE_USER};
    use std::collections::BTreeSet;

    fn principal_with(roles: &[&str]) -> Principal {
        Principal {
            subject: "bob".to_string(),
            authorities: roles.iter().map(|role| authority_label(role)).collect(),
        }
    }

    #[test]
    fn matching_role_passes() {
        let principal = principal_with(&[ROLE_USER]);
        ensure_role(&principal, &[ROLE_USER, ROLE_ADMIN]).expect("user role suffices");
    }

    #[test]
    fn missing_role_is_forbidden() {
        let principal = principal_with(&[ROLE_USER]);
        let err = ensure_role(&principal, &[ROLE_ADMIN]).expect_err("user lacks admin");
        let (status, _) = err.into_response();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn empty_allow_list_only_requires_authentication() {
        let principal = Principal {
            subject: "mallory".to_string(),
            authorities: BTreeSet::new(),
        };
        ensure_role(&principal, &[]).expect("no role required");
    }
}
