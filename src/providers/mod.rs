//! # Identifier Providers
//!
//! One concrete integration per registration authority, all implementing the
//! uniform [`PidProvider`] capability set:
//!
//! - [`ManagedDoiProvider`] - managed remote DOI authorities (the primary and
//!   the alternate one), speaking to their REST APIs through the
//!   [`client::RegistrationClient`] seam.
//! - [`OaiProvider`] - the local identifier authority; values derive from the
//!   record itself and are born `Registered`, no remote calls.
//! - [`ExternalDoiProvider`] - pass-through for user-supplied DOIs; only
//!   validation does real work.
//!
//! Remote-authority failures never escape a provider: `register`, `update`
//! and `delete` degrade them to a returned `false` plus a logged diagnostic
//! so local state stays a safe under-approximation of the remote truth.

pub mod client;
pub mod external;
pub mod managed;
pub mod oai;

pub use client::{
    default_doi_metadata, HttpRegistrationClient, MetadataSerializer, RegistrationClient,
    RemoteError,
};
pub use external::ExternalDoiProvider;
pub use managed::ManagedDoiProvider;
pub use oai::OaiProvider;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RegistrarError, Result, ValidationIssue};
use crate::models::identifier::{PersistentIdentifier, PidStatus, PidSubject};
use crate::models::record::Record;
use crate::store::PidStore;

/// Coarse category a provider falls into, used by the cross-version
/// provider-transition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    /// The provider mints values itself and owns the remote registration
    Managed,
    /// The value is supplied by the user and only locally tracked
    External,
    /// No identifier of the scheme exists for the version
    NotNeeded,
}

impl std::fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed => write!(f, "managed"),
            Self::External => write!(f, "external"),
            Self::NotNeeded => write!(f, "not_needed"),
        }
    }
}

/// Uniform capability set over a remote or local identifier space.
#[async_trait]
pub trait PidProvider: Send + Sync {
    /// Provider name as referenced by scheme policies and pids maps.
    fn name(&self) -> &str;

    /// Scheme this provider instance governs, e.g. `doi` or `oai`.
    fn scheme(&self) -> &str;

    fn category(&self) -> ProviderCategory;

    /// True when the provider mints values itself; false for pass-through
    /// providers where the caller must supply the value.
    fn is_managed(&self) -> bool {
        matches!(self.category(), ProviderCategory::Managed)
    }

    /// Produce an identifier value for the record. Fails with `Generation`
    /// if the authority is unreachable or the provider is misconfigured.
    async fn generate_id(&self, record: &Record) -> Result<String>;

    /// Idempotent lookup-or-create. A soft-deleted row with the same
    /// `(scheme, value)` is reactivated to `New`; an active one conflicts.
    async fn create(
        &self,
        subject: PidSubject,
        record: &Record,
        value: Option<&str>,
        status: Option<PidStatus>,
    ) -> Result<PersistentIdentifier>;

    /// Claim the identifier prior to public registration. No-op (true) when
    /// already `Reserved` or `Registered`. Never contacts the authority.
    async fn reserve(&self, pid: &mut PersistentIdentifier) -> Result<bool>;

    /// Make the identifier publicly resolvable at the authority. Remote
    /// rejection returns `false`, never an error, so the caller can retry.
    async fn register(
        &self,
        pid: &mut PersistentIdentifier,
        record: &Record,
        url: &str,
    ) -> Result<bool>;

    /// Push new metadata/visibility to the authority. A restricted record
    /// triggers the authority's hide operation instead of a metadata update.
    async fn update(
        &self,
        pid: &mut PersistentIdentifier,
        record: &Record,
        url: &str,
    ) -> Result<bool>;

    /// Soft-delete a `Reserved`/`Registered` identifier (keeping the row),
    /// hard-delete a `New` one (no remote call was ever made).
    async fn delete(&self, pid: &mut PersistentIdentifier) -> Result<bool>;

    /// Reverse a soft deletion. Authority "not found" is fatal outside
    /// sandbox mode.
    async fn restore(&self, pid: &mut PersistentIdentifier) -> Result<()>;

    /// Pure validation against the local index and the record's fields;
    /// never contacts the authority.
    async fn validate(
        &self,
        record: &Record,
        value: Option<&str>,
        provider_name: Option<&str>,
    ) -> Result<(bool, Vec<ValidationIssue>)>;
}

impl std::fmt::Debug for dyn PidProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidProvider")
            .field("name", &self.name())
            .field("scheme", &self.scheme())
            .field("category", &self.category())
            .finish()
    }
}

/// Minimal structural check for a DOI: `10.<registrant>/<suffix>`.
pub(crate) fn looks_like_doi(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("10.") else {
        return false;
    };
    let Some((registrant, suffix)) = rest.split_once('/') else {
        return false;
    };
    !registrant.is_empty()
        && registrant.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !suffix.is_empty()
}

/// Deterministic DOI suffix derived from a subject id, e.g. `k9x2p-a71bc`.
pub(crate) fn doi_suffix_for(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("{}-{}", &hex[..5], &hex[5..10])
}

/// Shared lookup-or-create with soft-delete reactivation, the common core of
/// every provider's `create`.
pub(crate) async fn lookup_or_create(
    store: &Arc<dyn PidStore>,
    scheme: &str,
    value: &str,
    provider_name: &str,
    subject: PidSubject,
    status: PidStatus,
) -> Result<PersistentIdentifier> {
    match store.get(scheme, value).await? {
        Some(mut existing) if existing.status.is_deleted() => {
            // Reuse the soft-deleted row for the same (scheme, value)
            existing.set_status(PidStatus::New)?;
            existing.deleted_from = None;
            existing.subject = subject;
            store.update(&existing).await?;
            tracing::debug!(scheme, value, "reactivated soft-deleted identifier");
            Ok(existing)
        }
        Some(_) => Err(RegistrarError::Conflict {
            scheme: scheme.to_string(),
            value: value.to_string(),
        }),
        None => {
            store
                .insert(PersistentIdentifier::new(
                    scheme,
                    value,
                    provider_name,
                    subject,
                    status,
                ))
                .await
        }
    }
}

/// Local-index uniqueness check shared by provider `validate` impls.
pub(crate) async fn uniqueness_issue(
    store: &Arc<dyn PidStore>,
    scheme: &str,
    value: &str,
    record: &Record,
) -> Result<Option<ValidationIssue>> {
    if let Some(existing) = store.get(scheme, value).await? {
        if !existing.status.is_deleted() && existing.subject.subject_id != record.id {
            return Ok(Some(ValidationIssue::new(
                format!("pids.{scheme}.identifier"),
                format!("identifier '{value}' is already in use"),
            )));
        }
    }
    Ok(None)
}
