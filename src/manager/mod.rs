//! # Identifier Manager
//!
//! Bulk operations over a record's full `pids` map: one validation pass
//! across every identifier, and create/reserve/discard/restore applied
//! scheme by scheme. Schemes are independent - there is no cross-scheme
//! ordering guarantee, and one scheme's failure never blocks the others.

use std::sync::Arc;

use tracing::warn;

use crate::error::{RegistrarError, Result, ValidationIssue};
use crate::models::identifier::PidStatus;
use crate::models::record::{PidsMap, Record};
use crate::providers::lookup_or_create;
use crate::registry::ProviderRegistry;
use crate::store::PidStore;

/// How a validation pass reports its findings.
///
/// The asymmetry is an explicit parameter, not inferred from caller context:
/// draft saves accumulate so the user can keep an invalid draft, while
/// publish raises on the first pass that finds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Return `Err(Validation)` when any issue is found.
    Raise,
    /// Collect all issues and hand them back to the caller.
    Accumulate,
}

pub struct PidManager {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn PidStore>,
}

impl PidManager {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn PidStore>) -> Self {
        Self { registry, store }
    }

    /// Run every relevant provider's validation over the map in one pass.
    pub async fn validate(
        &self,
        pids: &PidsMap,
        record: &Record,
        mode: ValidationMode,
    ) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let mut schemes: Vec<&String> = pids.keys().collect();
        schemes.sort();

        for scheme in schemes {
            let attrs = &pids[scheme];
            if self.registry.policy(scheme).is_err() {
                issues.push(ValidationIssue::new(
                    format!("pids.{scheme}"),
                    format!("scheme '{scheme}' is not supported"),
                ));
                continue;
            }
            if !self.registry.is_allowed(scheme, &attrs.provider) {
                issues.push(ValidationIssue::new(
                    format!("pids.{scheme}.provider"),
                    format!("provider '{}' is not allowed for scheme '{scheme}'", attrs.provider),
                ));
                continue;
            }
            let provider = self.registry.provider(scheme, &attrs.provider)?;
            let (_, provider_issues) = provider
                .validate(record, Some(&attrs.identifier), Some(&attrs.provider))
                .await?;
            issues.extend(provider_issues);
        }

        match mode {
            ValidationMode::Raise if !issues.is_empty() => Err(RegistrarError::Validation(issues)),
            _ => Ok(issues),
        }
    }

    /// Mint identifiers for every scheme in `schemes` not already present in
    /// the map, using each scheme's default provider.
    pub async fn create_all(
        &self,
        record: &Record,
        pids: &mut PidsMap,
        schemes: &[String],
    ) -> Result<()> {
        for scheme in schemes {
            if pids.contains_key(scheme) {
                continue;
            }
            let provider = self.registry.default_provider_for(scheme)?;
            if !provider.is_managed() {
                return Err(RegistrarError::Configuration(format!(
                    "Default provider '{}' for scheme '{scheme}' cannot mint identifiers",
                    provider.name()
                )));
            }
            let pid = provider
                .create(record.subject(), record, None, None)
                .await?;
            pids.insert(scheme.clone(), pid.as_attrs());
        }
        Ok(())
    }

    /// Persist rows for externally supplied identifiers. Managed schemes are
    /// minted through [`Self::create_all`]; pass-through values enter the
    /// local index here, at publish, so the `(scheme, value)` uniqueness
    /// invariant covers them as well. The rows go straight to `Registered`:
    /// the external authority already registered the value.
    pub async fn track_supplied(&self, record: &Record, pids: &PidsMap) -> Result<()> {
        for (scheme, attrs) in pids {
            let provider = self.registry.provider(scheme, &attrs.provider)?;
            if provider.is_managed() {
                continue;
            }

            if let Some(existing) = self.store.get(scheme, &attrs.identifier).await? {
                if !existing.status.is_deleted() {
                    if existing.subject.subject_id == record.id {
                        continue;
                    }
                    return Err(RegistrarError::Conflict {
                        scheme: scheme.clone(),
                        value: attrs.identifier.clone(),
                    });
                }
            }

            let mut row = lookup_or_create(
                &self.store,
                scheme,
                &attrs.identifier,
                &attrs.provider,
                record.subject(),
                PidStatus::Registered,
            )
            .await?;
            // A reactivated soft-deleted row comes back as New
            if !row.status.is_registered() {
                row.set_status(PidStatus::Registered)?;
                self.store.update(&row).await?;
            }
        }
        Ok(())
    }

    /// Reserve every identifier in the map. Per-scheme try/continue: one
    /// scheme's failure must not block reservation of the others.
    pub async fn reserve_all(&self, _record: &Record, pids: &PidsMap) -> Result<()> {
        for (scheme, attrs) in pids {
            let outcome = async {
                let provider = self.registry.provider(scheme, &attrs.provider)?;
                if let Some(mut row) = self.store.get(scheme, &attrs.identifier).await? {
                    provider.reserve(&mut row).await?;
                }
                Ok::<(), RegistrarError>(())
            }
            .await;

            if let Err(err) = outcome {
                warn!(scheme, identifier = %attrs.identifier, error = %err, "reservation failed");
            }
        }
        Ok(())
    }

    /// Delete every identifier in the map. `soft_delete` marks the
    /// record-removal path; the draft-cleanup path expects only `New` rows,
    /// which are purged outright.
    pub async fn discard_all(&self, pids: &PidsMap, soft_delete: bool) -> Result<()> {
        for (scheme, attrs) in pids {
            let outcome = async {
                let provider = self.registry.provider(scheme, &attrs.provider)?;
                if let Some(mut row) = self.store.get(scheme, &attrs.identifier).await? {
                    if !soft_delete && row.status != PidStatus::New {
                        warn!(
                            scheme,
                            identifier = %attrs.identifier,
                            status = %row.status,
                            "discarding an identifier that was already claimed"
                        );
                    }
                    provider.delete(&mut row).await?;
                }
                Ok::<(), RegistrarError>(())
            }
            .await;

            if let Err(err) = outcome {
                warn!(scheme, identifier = %attrs.identifier, error = %err, "discard failed");
            }
        }
        Ok(())
    }

    /// Restore every soft-deleted identifier in the map.
    pub async fn restore_all(&self, pids: &PidsMap) -> Result<()> {
        for (scheme, attrs) in pids {
            let provider = self.registry.provider(scheme, &attrs.provider)?;
            if let Some(mut row) = self.store.get(scheme, &attrs.identifier).await? {
                if row.status.is_deleted() {
                    provider.restore(&mut row).await?;
                }
            }
        }
        Ok(())
    }
}
