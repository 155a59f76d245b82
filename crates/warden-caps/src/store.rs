//! The capability store: issuance, revocation, and authorization checks.

use std::sync::Arc;

use tracing::{debug, info};

use warden_core::{CapabilityGrant, GrantId};
use warden_store::GrantStore;

use crate::error::{CapsError, Result};

/// Orchestrates capability grants over a [`GrantStore`].
///
/// Authorization is deny-by-default: a request is allowed only if at least
/// one unrevoked grant covers both the requested capability and scope.
/// Grants combine additively; there is no deny rule that overrides an
/// allow.
pub struct CapabilityStore<S> {
    store: Arc<S>,
}

impl<S: GrantStore> CapabilityStore<S> {
    /// Create a capability store backed by the given grant storage.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Issue a new grant for a capability over a scope.
    ///
    /// The grant is active immediately. Issuing a grant identical in every
    /// field to an existing one creates a second, independent record.
    pub async fn issue(
        &self,
        capability: impl Into<String>,
        scope: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<CapabilityGrant> {
        let capability = capability.into();
        let scope = scope.into();
        let issuer = issuer.into();

        if capability.is_empty() {
            return Err(CapsError::InvalidGrant("capability is empty".into()));
        }
        if scope.is_empty() {
            return Err(CapsError::InvalidGrant("scope is empty".into()));
        }
        if issuer.is_empty() {
            return Err(CapsError::InvalidGrant("issuer is empty".into()));
        }

        let grant = CapabilityGrant::new(capability, scope, issuer, now_millis());
        self.store.insert_grant(&grant).await?;

        info!(
            grant_id = %grant.id,
            capability = %grant.capability,
            scope = %grant.scope,
            issuer = %grant.issuer,
            "capability granted"
        );

        Ok(grant)
    }

    /// Revoke a grant by id.
    ///
    /// Returns false if no such grant exists. Revoking twice is not an
    /// error; the second call reports true like the first.
    pub async fn revoke(&self, id: &GrantId) -> Result<bool> {
        let found = self.store.mark_revoked(id).await?;
        if found {
            info!(grant_id = %id, "capability revoked");
        } else {
            debug!(grant_id = %id, "revoke of unknown grant");
        }
        Ok(found)
    }

    /// Whether any active grant permits the capability over the scope.
    pub async fn is_authorized(&self, capability: &str, scope: &str) -> Result<bool> {
        let grants = self.store.active_grants().await?;
        Ok(grants.iter().any(|g| g.permits(capability, scope)))
    }

    /// Look up a grant by id, revoked or not.
    pub async fn get(&self, id: &GrantId) -> Result<Option<CapabilityGrant>> {
        Ok(self.store.get_grant(id).await?)
    }

    /// Every grant on record, including revoked ones.
    pub async fn grants(&self) -> Result<Vec<CapabilityGrant>> {
        Ok(self.store.list_grants().await?)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_store::MemoryStore;

    fn caps() -> CapabilityStore<MemoryStore> {
        CapabilityStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_deny_by_default() {
        let caps = caps();
        assert!(!caps.is_authorized("execute", "shell/bash").await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_then_authorized() {
        let caps = caps();
        caps.issue("execute", "shell/*", "operator").await.unwrap();

        assert!(caps.is_authorized("execute", "shell/bash").await.unwrap());
        assert!(!caps.is_authorized("execute", "fs/read").await.unwrap());
        assert!(!caps.is_authorized("read", "shell/bash").await.unwrap());
    }

    #[tokio::test]
    async fn test_wildcard_capability() {
        let caps = caps();
        caps.issue("*", "net/*", "operator").await.unwrap();

        assert!(caps.is_authorized("read", "net/http").await.unwrap());
        assert!(caps.is_authorized("execute", "net/http").await.unwrap());
        assert!(!caps.is_authorized("read", "fs/etc").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_takes_effect_immediately() {
        let caps = caps();
        let grant = caps.issue("execute", "*", "operator").await.unwrap();
        assert!(caps.is_authorized("execute", "shell/bash").await.unwrap());

        assert!(caps.revoke(&grant.id).await.unwrap());
        assert!(!caps.is_authorized("execute", "shell/bash").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let caps = caps();
        let grant = caps.issue("read", "fs/*", "operator").await.unwrap();

        assert!(caps.revoke(&grant.id).await.unwrap());
        assert!(caps.revoke(&grant.id).await.unwrap());

        let missing = GrantId::from_bytes([0xff; 16]);
        assert!(!caps.revoke(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_overlapping_grants_revoke_one() {
        let caps = caps();
        let a = caps.issue("read", "fs/*", "operator").await.unwrap();
        let _b = caps.issue("read", "fs/*", "operator").await.unwrap();

        caps.revoke(&a.id).await.unwrap();
        // The untouched duplicate still authorizes.
        assert!(caps.is_authorized("read", "fs/logs").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let caps = caps();
        assert!(caps.issue("", "fs/*", "operator").await.is_err());
        assert!(caps.issue("read", "", "operator").await.is_err());
        assert!(caps.issue("read", "fs/*", "").await.is_err());
    }

    #[tokio::test]
    async fn test_revoked_grants_remain_listed() {
        let caps = caps();
        let grant = caps.issue("read", "fs/*", "operator").await.unwrap();
        caps.revoke(&grant.id).await.unwrap();

        let all = caps.grants().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].revoked);

        let loaded = caps.get(&grant.id).await.unwrap().unwrap();
        assert!(loaded.revoked);
    }
}
