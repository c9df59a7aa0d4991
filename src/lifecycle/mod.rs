//! # Version-Lifecycle Components
//!
//! Hooks invoked at each stage of the record/draft super-lifecycle (create,
//! update-draft, publish, new-version, edit, delete, restore). They decide
//! which identifiers must exist, enforce parent/child and cross-version
//! consistency, and schedule asynchronous registration.
//!
//! The hooks run synchronously, inline with the record mutation, and are
//! side-effect-free with respect to remote systems: a transaction rollback
//! never leaves a remote authority out of sync with local state. All
//! authority contact happens in [`crate::registration`] after commit.

pub mod parent_pids;
pub mod record_pids;
pub mod transition_policy;

pub use parent_pids::ParentPidsComponent;
pub use record_pids::RecordPidsComponent;
pub use transition_policy::ProviderTransitionPolicy;
