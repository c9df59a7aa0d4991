//! Local identifier authority.
//!
//! OAI identifiers are generated from the record's own id under a configured
//! repository prefix and are registered synchronously: the row is born
//! `Registered` and no remote authority is ever contacted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RegistrarError, Result, ValidationIssue};
use crate::models::identifier::{PersistentIdentifier, PidStatus, PidSubject};
use crate::models::record::Record;
use crate::providers::{lookup_or_create, uniqueness_issue, PidProvider, ProviderCategory};
use crate::store::PidStore;

pub struct OaiProvider {
    prefix: String,
    store: Arc<dyn PidStore>,
}

impl OaiProvider {
    pub fn new<P: Into<String>>(prefix: P, store: Arc<dyn PidStore>) -> Self {
        Self {
            prefix: prefix.into(),
            store,
        }
    }

    fn value_for(&self, id: uuid::Uuid) -> Result<String> {
        if self.prefix.is_empty() {
            return Err(RegistrarError::Generation {
                provider: self.name().to_string(),
                reason: "no OAI prefix configured".to_string(),
            });
        }
        Ok(format!("{}{}", self.prefix, id))
    }
}

#[async_trait]
impl PidProvider for OaiProvider {
    fn name(&self) -> &str {
        "oai"
    }

    fn scheme(&self) -> &str {
        "oai"
    }

    fn category(&self) -> ProviderCategory {
        ProviderCategory::Managed
    }

    async fn generate_id(&self, record: &Record) -> Result<String> {
        self.value_for(record.id)
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
            None => self.value_for(subject.subject_id)?,
        };
        // Locally generated identifiers are resolvable as soon as they exist
        lookup_or_create(
            &self.store,
            self.scheme(),
            &value,
            self.name(),
            subject,
            status.unwrap_or(PidStatus::Registered),
        )
        .await
    }

    async fn reserve(&self, _pid: &mut PersistentIdentifier) -> Result<bool> {
        // Default status is already Registered; nothing to claim
        Ok(true)
    }

    async fn register(
        &self,
        pid: &mut PersistentIdentifier,
        _record: &Record,
        _url: &str,
    ) -> Result<bool> {
        match pid.status {
            PidStatus::Registered => Ok(true),
            PidStatus::New | PidStatus::Reserved => {
                pid.set_status(PidStatus::Registered)?;
                self.store.update(pid).await?;
                Ok(true)
            }
            PidStatus::Deleted => Ok(false),
        }
    }

    async fn update(
        &self,
        pid: &mut PersistentIdentifier,
        _record: &Record,
        _url: &str,
    ) -> Result<bool> {
        // Nothing to push anywhere; the local row is the authority
        debug!(oai = %pid.value, "local identifier, update is a no-op");
        Ok(true)
    }

    async fn delete(&self, pid: &mut PersistentIdentifier) -> Result<bool> {
        match pid.status {
            PidStatus::New => {
                self.store.remove(&pid.scheme, &pid.value).await?;
                Ok(true)
            }
            PidStatus::Deleted => Ok(true),
            PidStatus::Reserved | PidStatus::Registered => {
                pid.set_status(PidStatus::Deleted)?;
                self.store.update(pid).await?;
                Ok(true)
            }
        }
    }

    async fn restore(&self, pid: &mut PersistentIdentifier) -> Result<()> {
        if !pid.status.is_deleted() {
            return Ok(());
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
            if name != self.name() {
                issues.push(ValidationIssue::new(
                    "pids.oai.provider",
                    format!("provider '{name}' does not match 'oai'"),
                ));
            }
        }

        if let Some(value) = value {
            if !value.starts_with(&self.prefix) {
                issues.push(ValidationIssue::new(
                    "pids.oai.identifier",
                    format!("'{value}' is not under the repository prefix '{}'", self.prefix),
                ));
            } else if let Some(issue) =
                uniqueness_issue(&self.store, self.scheme(), value, record).await?
            {
                issues.push(issue);
            }
        }

        Ok((issues.is_empty(), issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPidStore;
    use uuid::Uuid;

    fn provider() -> (OaiProvider, Arc<dyn PidStore>) {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        (OaiProvider::new("oai:repo.example.org:", store.clone()), store)
    }

    #[tokio::test]
    async fn test_created_identifier_is_born_registered() {
        let (provider, _store) = provider();
        let record = Record::new_draft(Uuid::new_v4());

        let pid = provider
            .create(record.subject(), &record, None, None)
            .await
            .unwrap();
        assert_eq!(pid.status, PidStatus::Registered);
        assert!(pid.value.starts_with("oai:repo.example.org:"));
    }

    #[tokio::test]
    async fn test_reserve_is_constant_true() {
        let (provider, _store) = provider();
        let record = Record::new_draft(Uuid::new_v4());
        let mut pid = provider
            .create(record.subject(), &record, None, None)
            .await
            .unwrap();
        assert!(provider.reserve(&mut pid).await.unwrap());
        assert_eq!(pid.status, PidStatus::Registered);
    }

    #[tokio::test]
    async fn test_delete_and_restore_round_trip() {
        let (provider, store) = provider();
        let record = Record::new_draft(Uuid::new_v4());
        let mut pid = provider
            .create(record.subject(), &record, None, None)
            .await
            .unwrap();

        provider.delete(&mut pid).await.unwrap();
        assert_eq!(pid.status, PidStatus::Deleted);
        assert_eq!(store.count().await.unwrap(), 1);

        provider.restore(&mut pid).await.unwrap();
        assert_eq!(pid.status, PidStatus::Registered);
    }

    #[tokio::test]
    async fn test_empty_prefix_is_a_generation_error() {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        let provider = OaiProvider::new("", store);
        let record = Record::new_draft(Uuid::new_v4());

        let err = provider.generate_id(&record).await.unwrap_err();
        assert!(matches!(err, RegistrarError::Generation { .. }));

        let err = provider
            .create(record.subject(), &record, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::Generation { .. }));
    }

    #[tokio::test]
    async fn test_validate_rejects_foreign_prefix() {
        let (provider, _store) = provider();
        let record = Record::new_draft(Uuid::new_v4());
        let (ok, issues) = provider
            .validate(&record, Some("oai:elsewhere.org:1"), Some("oai"))
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(issues.len(), 1);
    }
}
