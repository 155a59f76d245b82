//! The authorization gate: the single chokepoint for tool invocations.
//!
//! Every decision, allowed or denied, lands in the audit ledger before the
//! verdict is returned. If the ledger write fails the gate fails closed:
//! the caller gets an error, never an unaudited allow.

use std::sync::Arc;

use tracing::{error, info, warn};

use warden_caps::CapabilityStore;
use warden_core::{EntryRecord, Outcome, Params, Signer};
use warden_store::{GrantStore, LedgerStore};

use crate::chain::AuditChain;
use crate::error::Result;

/// Denial reason recorded when no grant covers a request.
///
/// Deliberately uniform: the reason names the policy outcome, not which
/// grants exist or almost matched.
pub const REASON_NO_GRANT: &str = "not authorized: no matching unrevoked grant";

/// A request to perform an action, presented to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Operation category recorded in the ledger (e.g. "tool_call").
    pub action: String,
    /// The specific tool or resource acted upon.
    pub subject: String,
    /// Arguments of the action, recorded verbatim.
    pub params: Params,
    /// The permission class the action requires.
    pub capability: String,
    /// The resource scope the action touches.
    pub scope: String,
    /// Optional correlation identifier.
    pub context_id: Option<String>,
}

impl AccessRequest {
    /// Start a request for the given action and subject; by default the
    /// required capability is the action and the scope is the subject.
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        let action = action.into();
        let subject = subject.into();
        Self {
            capability: action.clone(),
            scope: subject.clone(),
            action,
            subject,
            params: Params::new(),
            context_id: None,
        }
    }

    /// Set the required capability.
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = capability.into();
        self
    }

    /// Set the requested scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Add a recorded parameter.
    pub fn param(
        mut self,
        key: impl Into<String>,
        value: impl Into<warden_core::ParamValue>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the correlation identifier.
    pub fn context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }
}

/// The gate's verdict on a request.
///
/// Denial is a normal result, not an error; errors are reserved for
/// infrastructure failures (storage, ledger write).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Why it was denied, if it was.
    pub reason: Option<String>,
    /// Sequence number of the ledger entry recording this decision.
    pub seq: u64,
}

impl Decision {
    /// Whether the action may proceed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Capability check plus unconditional audit, in one call.
pub struct AuthorizationGate<S> {
    chain: AuditChain<S>,
    caps: CapabilityStore<S>,
}

impl<S: LedgerStore + GrantStore> AuthorizationGate<S> {
    /// Create a gate over a shared store, sealing entries with the signer.
    pub fn new(store: Arc<S>, signer: Signer) -> Self {
        Self {
            chain: AuditChain::new(store.clone(), signer),
            caps: CapabilityStore::new(store),
        }
    }

    /// Decide whether the request may proceed, and record the decision.
    ///
    /// The ledger entry is written before the verdict is returned, for
    /// allowed and denied requests alike. A failed write propagates as an
    /// error and the caller must treat the action as not permitted.
    pub async fn authorize(&self, request: AccessRequest) -> Result<Decision> {
        let allowed = self
            .caps
            .is_authorized(&request.capability, &request.scope)
            .await?;

        let outcome = if allowed {
            Outcome::Allowed
        } else {
            Outcome::Denied {
                reason: REASON_NO_GRANT.to_string(),
            }
        };

        let mut record = EntryRecord::new(&request.action, &request.subject)
            .params(request.params)
            .outcome(outcome.clone());
        if let Some(context_id) = &request.context_id {
            record = record.context(context_id.clone());
        }

        let entry = match self.chain.append(record).await {
            Ok(entry) => entry,
            Err(e) => {
                // Fail closed: an unrecorded decision must not leak through
                // as an allow.
                error!(subject = %request.subject, error = %e, "audit write failed");
                return Err(e);
            }
        };

        if allowed {
            info!(
                seq = entry.seq,
                subject = %request.subject,
                capability = %request.capability,
                scope = %request.scope,
                "request allowed"
            );
        } else {
            warn!(
                seq = entry.seq,
                subject = %request.subject,
                capability = %request.capability,
                scope = %request.scope,
                "request denied"
            );
        }

        Ok(Decision {
            allowed,
            reason: outcome.reason().map(str::to_string),
            seq: entry.seq,
        })
    }

    /// The audit chain behind this gate.
    pub fn chain(&self) -> &AuditChain<S> {
        &self.chain
    }

    /// The capability store behind this gate.
    pub fn caps(&self) -> &CapabilityStore<S> {
        &self.caps
    }
}
