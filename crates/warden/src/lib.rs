//! # Warden
//!
//! A tamper-evident audit ledger and capability gate for autonomous tool
//! use. Every action an agent attempts goes through the
//! [`AuthorizationGate`], which checks capability grants and records the
//! decision as a keyed, hash-chained [`warden_core::AuditEntry`]. The
//! [`IntegrityVerifier`] later proves the record was not rewritten.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden::{AccessRequest, AuthorizationGate, IntegrityVerifier};
//! use warden_core::{Signer, SignerKey};
//! use warden_store::SqliteStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let key = SignerKey::from_hex(&std::env::var("WARDEN_KEY")?)?;
//! let store = Arc::new(SqliteStore::open("warden.db")?);
//! let gate = AuthorizationGate::new(store.clone(), Signer::new(key.clone()));
//!
//! gate.caps().issue("execute", "shell/*", "operator").await?;
//!
//! let decision = gate
//!     .authorize(
//!         AccessRequest::new("tool_call", "shell")
//!             .capability("execute")
//!             .scope("shell/bash")
//!             .param("command", "ls"),
//!     )
//!     .await?;
//! assert!(decision.allowed);
//!
//! let report = IntegrityVerifier::new(Signer::new(key))
//!     .verify_chain(store.as_ref())
//!     .await?;
//! assert!(report.valid);
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod error;
pub mod gate;
pub mod verify;

pub use chain::AuditChain;
pub use error::{Result, WardenError};
pub use gate::{AccessRequest, AuthorizationGate, Decision, REASON_NO_GRANT};
pub use verify::{ChainReport, IntegrityVerifier};
