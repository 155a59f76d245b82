//! Capability grant records and pattern matching.
//!
//! A grant authorizes a permission class over a resource scope until it is
//! revoked. Grants are mutated only by revocation (a one-way transition)
//! and are never physically deleted; revoked grants remain on record.

use serde::{Deserialize, Serialize};

use crate::types::GrantId;

/// The wildcard that matches any capability or any scope.
pub const WILDCARD: &str = "*";

/// A capability grant: one permission class over one resource pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    /// Random identifier of this grant.
    pub id: GrantId,

    /// The permission class granted (e.g. "read", "execute", or "*").
    pub capability: String,

    /// The resource pattern the grant applies to.
    ///
    /// Exact ("fs/etc/hosts"), global ("*"), or trailing-star prefix
    /// ("fs/*").
    pub scope: String,

    /// Identifier of the entity that created the grant.
    pub issuer: String,

    /// When the grant was issued (Unix milliseconds).
    pub issued_at: i64,

    /// Whether the grant has been revoked. False at issuance; settable to
    /// true only.
    pub revoked: bool,
}

impl CapabilityGrant {
    /// Create a fresh, unrevoked grant with a random id.
    pub fn new(
        capability: impl Into<String>,
        scope: impl Into<String>,
        issuer: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            id: GrantId::random(),
            capability: capability.into(),
            scope: scope.into(),
            issuer: issuer.into(),
            issued_at,
            revoked: false,
        }
    }

    /// Whether this grant permits the requested capability over the
    /// requested scope. Revoked grants permit nothing.
    pub fn permits(&self, capability: &str, scope: &str) -> bool {
        if self.revoked {
            return false;
        }
        capability_matches(&self.capability, capability) && scope_matches(&self.scope, scope)
    }
}

/// Whether a granted capability covers a requested one.
///
/// Exact match, or the wildcard "*" which covers every class.
pub fn capability_matches(granted: &str, requested: &str) -> bool {
    granted == WILDCARD || granted == requested
}

/// Whether a granted scope pattern covers a requested scope.
///
/// A trailing '*' makes the pattern a prefix match: "fs/*" covers
/// "fs/read" and "fs/"; the bare "*" covers everything. Patterns without a
/// trailing star must match exactly.
pub fn scope_matches(pattern: &str, requested: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => requested.starts_with(prefix),
        None => pattern == requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_matching() {
        assert!(capability_matches("read", "read"));
        assert!(capability_matches("*", "read"));
        assert!(capability_matches("*", "execute"));
        assert!(!capability_matches("read", "write"));
        assert!(!capability_matches("read", "*"));
    }

    #[test]
    fn test_scope_matching() {
        assert!(scope_matches("*", "anything/at/all"));
        assert!(scope_matches("fs/etc/hosts", "fs/etc/hosts"));
        assert!(scope_matches("fs/*", "fs/read"));
        assert!(scope_matches("fs/*", "fs/"));
        assert!(!scope_matches("fs/*", "net/http"));
        assert!(!scope_matches("fs/etc", "fs/etc/hosts"));
        assert!(!scope_matches("fs", "fs/etc"));
    }

    #[test]
    fn test_grant_permits() {
        let grant = CapabilityGrant::new("execute", "shell/*", "operator", 0);
        assert!(grant.permits("execute", "shell/bash"));
        assert!(!grant.permits("read", "shell/bash"));
        assert!(!grant.permits("execute", "fs/read"));
    }

    #[test]
    fn test_revoked_grant_permits_nothing() {
        let mut grant = CapabilityGrant::new("*", "*", "operator", 0);
        assert!(grant.permits("execute", "shell/bash"));

        grant.revoked = true;
        assert!(!grant.permits("execute", "shell/bash"));
    }

    #[test]
    fn test_overlapping_grants_have_distinct_ids() {
        let a = CapabilityGrant::new("read", "fs/*", "operator", 0);
        let b = CapabilityGrant::new("read", "fs/*", "operator", 0);
        assert_ne!(a.id, b.id);
    }
}
