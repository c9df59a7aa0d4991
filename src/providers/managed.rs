//! Managed remote DOI providers.
//!
//! One [`ManagedDoiProvider`] instance exists per managed authority: the
//! primary one (`datacite`) and the alternate one (`crossref`). Both speak
//! the same capability set through their own [`RegistrationClient`], with
//! per-authority credentials, prefix and metadata requirements.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AuthorityCredentials;
use crate::error::{RegistrarError, Result, ValidationIssue};
use crate::models::identifier::{PersistentIdentifier, PidStatus, PidSubject};
use crate::models::record::Record;
use crate::providers::client::{MetadataSerializer, RegistrationClient, RemoteError};
use crate::providers::{
    doi_suffix_for, lookup_or_create, looks_like_doi, uniqueness_issue, PidProvider,
    ProviderCategory,
};
use crate::store::PidStore;

/// Provider for a DOI authority that mints values itself and owns the
/// authoritative remote registration.
pub struct ManagedDoiProvider {
    name: String,
    credentials: AuthorityCredentials,
    client: Arc<dyn RegistrationClient>,
    store: Arc<dyn PidStore>,
    serializer: MetadataSerializer,
    sandbox_mode: bool,
    /// The alternate authority additionally requires a title up front.
    require_title: bool,
}

impl std::fmt::Debug for ManagedDoiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedDoiProvider")
            .field("name", &self.name)
            .field("sandbox_mode", &self.sandbox_mode)
            .field("require_title", &self.require_title)
            .finish()
    }
}

impl ManagedDoiProvider {
    /// Provider for the primary managed DOI authority.
    pub fn datacite(
        credentials: AuthorityCredentials,
        client: Arc<dyn RegistrationClient>,
        store: Arc<dyn PidStore>,
        serializer: MetadataSerializer,
        sandbox_mode: bool,
    ) -> Result<Self> {
        Self::build("datacite", credentials, client, store, serializer, sandbox_mode, false)
    }

    /// Provider for the alternate managed DOI authority.
    pub fn crossref(
        credentials: AuthorityCredentials,
        client: Arc<dyn RegistrationClient>,
        store: Arc<dyn PidStore>,
        serializer: MetadataSerializer,
        sandbox_mode: bool,
    ) -> Result<Self> {
        Self::build("crossref", credentials, client, store, serializer, sandbox_mode, true)
    }

    fn build(
        name: &str,
        credentials: AuthorityCredentials,
        client: Arc<dyn RegistrationClient>,
        store: Arc<dyn PidStore>,
        serializer: MetadataSerializer,
        sandbox_mode: bool,
        require_title: bool,
    ) -> Result<Self> {
        if !credentials.is_configured() {
            return Err(RegistrarError::Configuration(format!(
                "Provider '{name}' is missing credentials or prefix"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            credentials,
            client,
            store,
            serializer,
            sandbox_mode,
            require_title,
        })
    }

    fn doi_for(&self, subject_id: uuid::Uuid) -> String {
        format!("{}/{}", self.credentials.prefix, doi_suffix_for(subject_id))
    }

    fn owns(&self, value: &str) -> bool {
        value.starts_with(&format!("{}/", self.credentials.prefix))
    }
}

#[async_trait]
impl PidProvider for ManagedDoiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn scheme(&self) -> &str {
        "doi"
    }

    fn category(&self) -> ProviderCategory {
        ProviderCategory::Managed
    }

    async fn generate_id(&self, record: &Record) -> Result<String> {
        Ok(self.doi_for(record.id))
    }

    async fn create(
        &self,
        subject: PidSubject,
        _record: &Record,
        value: Option<&str>,
        status: Option<PidStatus>,
    ) -> Result<PersistentIdentifier> {
        let value = match value {
            Some(v) => v.to_string(),
            None => self.doi_for(subject.subject_id),
        };
        lookup_or_create(
            &self.store,
            self.scheme(),
            &value,
            &self.name,
            subject,
            status.unwrap_or(PidStatus::New),
        )
        .await
    }

    async fn reserve(&self, pid: &mut PersistentIdentifier) -> Result<bool> {
        match pid.status {
            PidStatus::Reserved | PidStatus::Registered => Ok(true),
            PidStatus::New => {
                pid.set_status(PidStatus::Reserved)?;
                self.store.update(pid).await?;
                Ok(true)
            }
            PidStatus::Deleted => {
                warn!(doi = %pid.value, "cannot reserve a deleted identifier");
                Ok(false)
            }
        }
    }

    async fn register(
        &self,
        pid: &mut PersistentIdentifier,
        record: &Record,
        url: &str,
    ) -> Result<bool> {
        if pid.status.is_registered() {
            return Ok(true);
        }
        if pid.status.is_deleted() {
            warn!(doi = %pid.value, "cannot register a deleted identifier");
            return Ok(false);
        }

        let metadata = (self.serializer)(record);
        match self.client.publish(&pid.value, url, &metadata).await {
            Ok(()) | Err(RemoteError::AlreadyRegistered) => {
                pid.set_status(PidStatus::Registered)?;
                self.store.update(pid).await?;
                debug!(doi = %pid.value, authority = self.client.authority(), "registered identifier");
                Ok(true)
            }
            Err(err) => {
                warn!(
                    doi = %pid.value,
                    authority = self.client.authority(),
                    error = %err,
                    "registration failed, identifier left at local status"
                );
                Ok(false)
            }
        }
    }

    async fn update(
        &self,
        pid: &mut PersistentIdentifier,
        record: &Record,
        url: &str,
    ) -> Result<bool> {
        if !pid.status.is_registered() {
            debug!(doi = %pid.value, status = %pid.status, "nothing registered remotely, skipping update");
            return Ok(false);
        }

        let outcome = if record.is_restricted() {
            self.client.hide(&pid.value).await
        } else {
            let metadata = (self.serializer)(record);
            self.client.update(&pid.value, url, &metadata).await
        };

        match outcome {
            Ok(()) | Err(RemoteError::AlreadyRegistered) => Ok(true),
            Err(err) => {
                warn!(doi = %pid.value, error = %err, "metadata update failed");
                Ok(false)
            }
        }
    }

    async fn delete(&self, pid: &mut PersistentIdentifier) -> Result<bool> {
        match pid.status {
            // No remote call was ever made for a New identifier; purge the row
            PidStatus::New => {
                self.store.remove(&pid.scheme, &pid.value).await?;
                Ok(true)
            }
            PidStatus::Reserved => {
                // Registration never ran, so the authority may not know the
                // draft at all; "not found" is expected here.
                if let Err(err) = self.client.delete_draft(&pid.value).await {
                    if !matches!(err, RemoteError::NotFound) {
                        warn!(doi = %pid.value, error = %err, "draft cleanup at authority failed");
                        return Ok(false);
                    }
                }
                pid.set_status(PidStatus::Deleted)?;
                self.store.update(pid).await?;
                Ok(true)
            }
            PidStatus::Registered => match self.client.hide(&pid.value).await {
                Ok(()) | Err(RemoteError::NotFound) => {
                    pid.set_status(PidStatus::Deleted)?;
                    self.store.update(pid).await?;
                    Ok(true)
                }
                Err(err) => {
                    warn!(doi = %pid.value, error = %err, "hide at authority failed, keeping local status");
                    Ok(false)
                }
            },
            PidStatus::Deleted => Ok(true),
        }
    }

    async fn restore(&self, pid: &mut PersistentIdentifier) -> Result<()> {
        if !pid.status.is_deleted() {
            return Ok(());
        }

        // Only identifiers that were publicly registered need re-showing
        if pid.deleted_from.unwrap_or(PidStatus::Registered) == PidStatus::Registered {
            match self.client.show(&pid.value).await {
                Ok(()) => {}
                Err(RemoteError::NotFound) if self.sandbox_mode => {
                    warn!(doi = %pid.value, "authority does not know this identifier (sandbox mode, tolerated)");
                }
                Err(RemoteError::NotFound) => {
                    return Err(RegistrarError::NotFound {
                        scheme: pid.scheme.clone(),
                        value: pid.value.clone(),
                    });
                }
                Err(err) => {
                    warn!(doi = %pid.value, error = %err, "re-show at authority failed, leaving identifier deleted");
                    return Ok(());
                }
            }
        }

        pid.restore_status()?;
        self.store.update(pid).await?;
        Ok(())
    }

    async fn validate(
        &self,
        record: &Record,
        value: Option<&str>,
        provider_name: Option<&str>,
    ) -> Result<(bool, Vec<ValidationIssue>)> {
        let mut issues = Vec::new();

        if let Some(name) = provider_name {
            if name != self.name {
                issues.push(ValidationIssue::new(
                    "pids.doi.provider",
                    format!("provider '{name}' does not match '{}'", self.name),
                ));
            }
        }

        if let Some(value) = value {
            if !looks_like_doi(value) {
                issues.push(ValidationIssue::new(
                    "pids.doi.identifier",
                    format!("'{value}' is not a valid DOI"),
                ));
            } else if !self.owns(value) {
                issues.push(ValidationIssue::new(
                    "pids.doi.identifier",
                    format!(
                        "'{value}' does not belong to the '{}' prefix",
                        self.credentials.prefix
                    ),
                ));
            } else if let Some(issue) =
                uniqueness_issue(&self.store, self.scheme(), value, record).await?
            {
                issues.push(issue);
            }
        }

        if record.metadata.publisher.is_none() {
            issues.push(ValidationIssue::new(
                "metadata.publisher",
                "a publisher is required for DOI registration",
            ));
        }
        if self.require_title && record.metadata.title.is_none() {
            issues.push(ValidationIssue::new(
                "metadata.title",
                "a title is required for DOI registration",
            ));
        }

        Ok((issues.is_empty(), issues))
    }
}
