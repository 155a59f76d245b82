//! # Warden Testkit
//!
//! Testing utilities for the Warden audit ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Helper structs for setting up ledger test scenarios
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up an in-memory ledger with a deterministic key:
//!
//! ```rust
//! use warden_core::EntryRecord;
//! use warden_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let entries = fixture.seal_chain(vec![
//!     EntryRecord::new("tool_call", "shell"),
//!     EntryRecord::new("tool_call", "fs/read"),
//! ]);
//! assert_eq!(entries[1].prev_tag, entries[0].tag);
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use warden_testkit::generators::{entry_from_spec, EntrySpec};
//!
//! proptest! {
//!     #[test]
//!     fn tag_is_deterministic(spec: EntrySpec) {
//!         let e1 = entry_from_spec(&spec);
//!         let e2 = entry_from_spec(&spec);
//!         prop_assert_eq!(e1.tag, e2.tag);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestFixture, TEST_KEY};
pub use generators::{entry_from_spec, EntrySpec};
