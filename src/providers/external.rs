//! Pass-through provider for externally supplied DOIs.
//!
//! The user brings the value; this core only tracks and validates it.
//! Minting operations are programming errors here, and validation refuses
//! values that fall inside a prefix owned by one of the managed authorities.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RegistrarError, Result, ValidationIssue};
use crate::models::identifier::{PersistentIdentifier, PidStatus, PidSubject};
use crate::models::record::Record;
use crate::providers::{looks_like_doi, uniqueness_issue, PidProvider, ProviderCategory};
use crate::store::PidStore;

pub struct ExternalDoiProvider {
    store: Arc<dyn PidStore>,
    /// Prefixes owned by managed providers; external values must not use them.
    blocked_prefixes: Vec<String>,
}

impl ExternalDoiProvider {
    pub fn new(store: Arc<dyn PidStore>, blocked_prefixes: Vec<String>) -> Self {
        Self {
            store,
            blocked_prefixes,
        }
    }

    fn unsupported(&self, operation: &'static str) -> RegistrarError {
        RegistrarError::UnsupportedOperation {
            provider: self.name().to_string(),
            operation,
        }
    }
}

#[async_trait]
impl PidProvider for ExternalDoiProvider {
    fn name(&self) -> &str {
        "external"
    }

    fn scheme(&self) -> &str {
        "doi"
    }

    fn category(&self) -> ProviderCategory {
        ProviderCategory::External
    }

    async fn generate_id(&self, _record: &Record) -> Result<String> {
        Err(self.unsupported("generate_id"))
    }

    async fn create(
        &self,
        _subject: PidSubject,
        _record: &Record,
        _value: Option<&str>,
        _status: Option<PidStatus>,
    ) -> Result<PersistentIdentifier> {
        Err(self.unsupported("create"))
    }

    async fn reserve(&self, _pid: &mut PersistentIdentifier) -> Result<bool> {
        Ok(true)
    }

    async fn register(
        &self,
        _pid: &mut PersistentIdentifier,
        _record: &Record,
        _url: &str,
    ) -> Result<bool> {
        Err(self.unsupported("register"))
    }

    async fn update(
        &self,
        _pid: &mut PersistentIdentifier,
        _record: &Record,
        _url: &str,
    ) -> Result<bool> {
        Err(self.unsupported("update"))
    }

    async fn delete(&self, pid: &mut PersistentIdentifier) -> Result<bool> {
        // Only locally tracked; same soft/hard branching, no remote calls
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
                    "pids.doi.provider",
                    format!("provider '{name}' does not match 'external'"),
                ));
            }
        }

        match value {
            None => issues.push(ValidationIssue::new(
                "pids.doi.identifier",
                "an externally managed DOI requires a value",
            )),
            Some(value) => {
                if !looks_like_doi(value) {
                    issues.push(ValidationIssue::new(
                        "pids.doi.identifier",
                        format!("'{value}' is not a valid DOI"),
                    ));
                } else if let Some(prefix) = self
                    .blocked_prefixes
                    .iter()
                    .find(|p| value.starts_with(&format!("{p}/")))
                {
                    issues.push(ValidationIssue::new(
                        "pids.doi.identifier",
                        format!(
                            "the prefix '{prefix}' is administered by this repository; \
                             the DOI cannot be supplied as an external one"
                        ),
                    ));
                } else if let Some(issue) =
                    uniqueness_issue(&self.store, self.scheme(), value, record).await?
                {
                    issues.push(issue);
                }
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

    fn provider() -> ExternalDoiProvider {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        ExternalDoiProvider::new(store, vec!["10.1234".to_string()])
    }

    #[tokio::test]
    async fn test_minting_operations_are_programming_errors() {
        let provider = provider();
        let record = Record::new_draft(Uuid::new_v4());

        let err = provider.generate_id(&record).await.unwrap_err();
        assert!(matches!(err, RegistrarError::UnsupportedOperation { .. }));

        let err = provider
            .create(record.subject(), &record, Some("10.9999/x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::UnsupportedOperation { .. }));
    }

    #[tokio::test]
    async fn test_validate_blocks_managed_prefix() {
        let provider = provider();
        let record = Record::new_draft(Uuid::new_v4());

        let (ok, issues) = provider
            .validate(&record, Some("10.1234/stolen"), Some("external"))
            .await
            .unwrap();
        assert!(!ok);
        assert!(issues[0].message.contains("administered by this repository"));

        let (ok, _) = provider
            .validate(&record, Some("10.9999/fine"), Some("external"))
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_validate_requires_value() {
        let provider = provider();
        let record = Record::new_draft(Uuid::new_v4());
        let (ok, issues) = provider.validate(&record, None, Some("external")).await.unwrap();
        assert!(!ok);
        assert!(issues[0].message.contains("requires a value"));
    }
}
