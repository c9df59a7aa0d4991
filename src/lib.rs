#![allow(clippy::doc_markdown)] // Allow technical terms like DOI, JSON:API in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Registrar Core
//!
//! Rust implementation of the persistent-identifier (PID) lifecycle subsystem
//! of a research-data repository: minting, reserving, registering, updating,
//! restoring and deleting external identifiers (DOIs, OAI identifiers) for
//! records and their version-spanning parent entities, across multiple
//! external registration authorities.
//!
//! ## Overview
//!
//! The core maintains a strict identifier state machine that must never
//! become inconsistent with the state held by a remote authority, guarantees
//! parent/child identifier consistency across an unbounded chain of record
//! versions, validates cross-version provider-transition policies, and
//! tolerates partial failure of the remote authority without corrupting
//! local state.
//!
//! ## Architecture
//!
//! Leaf to root:
//!
//! - [`providers`] - one concrete integration per registration authority
//!   (managed DOI authorities, the local OAI authority, and a pass-through
//!   for externally supplied identifiers)
//! - [`registry`] - resolves which provider governs a `(scheme, provider)`
//!   pair and enforces per-scheme policy
//! - [`manager`] - bulk create/reserve/discard/restore operations and
//!   one-pass validation over a record's full `pids` map
//! - [`lifecycle`] - hooks for each stage of the record/draft lifecycle,
//!   including the cross-version provider-transition policy and the
//!   parent-level concept identifiers
//! - [`registration`] - the retryable background worker that performs the
//!   actual outbound calls after the local transaction has committed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use registrar_core::config::RegistrarConfig;
//! use registrar_core::providers::{default_doi_metadata, HttpRegistrationClient, ManagedDoiProvider, OaiProvider, ExternalDoiProvider, PidProvider};
//! use registrar_core::registry::ProviderRegistry;
//! use registrar_core::store::{InMemoryPidStore, PidStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistrarConfig::from_env()?;
//! let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
//!
//! let datacite_client = Arc::new(HttpRegistrationClient::new("datacite", config.datacite.clone())?);
//! let datacite: Arc<dyn PidProvider> = Arc::new(ManagedDoiProvider::datacite(
//!     config.datacite.clone(),
//!     datacite_client,
//!     store.clone(),
//!     default_doi_metadata,
//!     config.sandbox_mode,
//! )?);
//! let oai: Arc<dyn PidProvider> = Arc::new(OaiProvider::new(config.oai_prefix.clone(), store.clone()));
//! let external: Arc<dyn PidProvider> = Arc::new(ExternalDoiProvider::new(
//!     store.clone(),
//!     vec![config.datacite.prefix.clone()],
//! ));
//!
//! let registry = ProviderRegistry::build(&config, vec![datacite, oai, external])?;
//! println!("registry ready for schemes: {:?}", registry.required_schemes());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Lifecycle hooks run inline with the record-mutation transaction and never
//! contact a remote system; all outbound calls happen in the registration
//! worker after commit. Configuration and the provider registry are built
//! once at startup and shared read-only across workers.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod manager;
pub mod models;
pub mod providers;
pub mod registration;
pub mod registry;
pub mod store;

pub use config::{AuthorityCredentials, RegistrarConfig, SchemeConfig, TransitionRule};
pub use error::{RegistrarError, Result, ValidationIssue};
pub use lifecycle::{ParentPidsComponent, ProviderTransitionPolicy, RecordPidsComponent};
pub use manager::{PidManager, ValidationMode};
pub use models::{
    Parent, PersistentIdentifier, PidAttrs, PidStatus, PidSubject, PidsMap, Record, RecordAccess,
    RecordMetadata, SubjectType,
};
pub use providers::{PidProvider, ProviderCategory};
pub use registration::{
    InProcessScheduler, RecordResolver, RegistrationJob, RegistrationOutcome, RegistrationWorker,
    TaskScheduler,
};
pub use registry::ProviderRegistry;
pub use store::{InMemoryPidStore, PidStore};
