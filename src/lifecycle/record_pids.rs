//! Record-level identifier lifecycle component.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, ValidationIssue};
use crate::lifecycle::transition_policy::ProviderTransitionPolicy;
use crate::manager::{PidManager, ValidationMode};
use crate::models::record::{PidsMap, Record};
use crate::registration::{RegistrationJob, TaskScheduler};
use crate::registry::ProviderRegistry;

/// Drives a record's `pids` map through the draft/record super-lifecycle.
pub struct RecordPidsComponent {
    registry: Arc<ProviderRegistry>,
    manager: Arc<PidManager>,
    scheduler: Arc<dyn TaskScheduler>,
    policy: ProviderTransitionPolicy,
    /// When DOIs are globally required the transition policy is moot: every
    /// version must carry a managed DOI anyway.
    doi_required: bool,
}

impl RecordPidsComponent {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        manager: Arc<PidManager>,
        scheduler: Arc<dyn TaskScheduler>,
        policy: ProviderTransitionPolicy,
        doi_required: bool,
    ) -> Self {
        Self {
            registry,
            manager,
            scheduler,
            policy,
            doi_required,
        }
    }

    /// Create-draft hook: validate any incoming scheme data and keep a
    /// placeholder empty map for schemes the user hasn't supplied; those are
    /// filled at publish.
    pub async fn create_draft(
        &self,
        draft: &mut Record,
        incoming: PidsMap,
    ) -> Result<Vec<ValidationIssue>> {
        let issues = self
            .manager
            .validate(&incoming, draft, ValidationMode::Accumulate)
            .await?;
        draft.pids = incoming;
        Ok(issues)
    }

    /// Update-draft hook: re-validate, and when the optional-DOI policy
    /// applies and the current identity lacks override permission, run the
    /// provider-transition check against the previous published version.
    pub async fn update_draft(
        &self,
        draft: &mut Record,
        incoming: PidsMap,
        previous_version: Option<&Record>,
        can_override: bool,
    ) -> Result<Vec<ValidationIssue>> {
        let mut issues = self
            .manager
            .validate(&incoming, draft, ValidationMode::Accumulate)
            .await?;

        if let Some(previous) = previous_version {
            issues.extend(self.immutability_issues(&previous.pids, &incoming));
            if !self.doi_required && !can_override {
                issues.extend(self.policy.check(
                    &self.registry,
                    &previous.pids,
                    &incoming,
                    &["doi".to_string()],
                ));
            }
        }

        draft.pids = incoming;
        Ok(issues)
    }

    /// Publish hook. `published` is the currently-published snapshot of this
    /// same record, present when re-publishing an edited record.
    pub async fn publish(&self, draft: &mut Record, published: Option<&Record>) -> Result<()> {
        self.manager
            .validate(&draft.pids, draft, ValidationMode::Raise)
            .await?;

        // Pass-through identifiers enter the local index at publish, so the
        // value is claimed before any other record can supply it
        self.manager.track_supplied(draft, &draft.pids).await?;

        // The user swapped an externally-managed identifier: drop the old one
        if let Some(published) = published {
            let mut swapped = PidsMap::new();
            for (scheme, old_attrs) in &published.pids {
                if let Some(new_attrs) = draft.pids.get(scheme) {
                    if new_attrs.identifier != old_attrs.identifier {
                        debug!(scheme, old = %old_attrs.identifier, new = %new_attrs.identifier, "identifier swapped");
                        swapped.insert(scheme.clone(), old_attrs.clone());
                    }
                }
            }
            if !swapped.is_empty() {
                self.manager.discard_all(&swapped, false).await?;
            }

            // Restore any required identifier the user tried to remove
            for scheme in self.registry.required_schemes() {
                if draft.pids.contains_key(&scheme) {
                    continue;
                }
                if let Some(old_attrs) = published.pids.get(&scheme) {
                    let restored = PidsMap::from([(scheme.clone(), old_attrs.clone())]);
                    self.manager.restore_all(&restored).await?;
                    draft.pids.insert(scheme.clone(), old_attrs.clone());
                }
            }
        }

        // Mint everything still missing from the required set
        let missing: Vec<String> = self
            .registry
            .required_schemes()
            .into_iter()
            .filter(|scheme| !draft.pids.contains_key(scheme))
            .collect();
        let mut pids = std::mem::take(&mut draft.pids);
        self.manager.create_all(draft, &mut pids, &missing).await?;
        self.manager.reserve_all(draft, &pids).await?;
        draft.pids = pids;

        // Registration itself runs out-of-band, after commit
        let mut schemes: Vec<&String> = draft.pids.keys().collect();
        schemes.sort();
        for scheme in schemes {
            self.scheduler
                .schedule(RegistrationJob::for_record(draft.id, scheme))
                .await?;
        }

        draft.is_published = true;
        info!(record_id = %draft.id, pids = draft.pids.len(), "record identifiers published");
        Ok(())
    }

    /// New-version hook: the draft inherits no record-level identifiers.
    pub fn new_version(&self, record: &Record) -> Record {
        record.new_version_draft()
    }

    /// Edit hook: re-open a published record as a draft, copying its
    /// identifiers without allowing mutation of managed ones.
    pub fn edit(&self, record: &Record) -> Record {
        record.edit_draft()
    }

    /// Delete-record hook: soft-delete every record-level identifier. The
    /// parent-level identifier is handled by the parent component, keyed on
    /// whether this was the last remaining published version.
    pub async fn delete_record(&self, record: &Record) -> Result<()> {
        self.manager.discard_all(&record.pids, true).await
    }

    /// Restore-record hook: reverse the soft deletion.
    pub async fn restore_record(&self, record: &Record) -> Result<()> {
        self.manager.restore_all(&record.pids).await
    }

    /// Identifiers are fixed once published: a managed scheme may not change
    /// value or provider in a later draft.
    fn immutability_issues(&self, previous: &PidsMap, incoming: &PidsMap) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (scheme, old_attrs) in previous {
            let managed = self
                .registry
                .category_of(scheme, &old_attrs.provider)
                .map(|c| matches!(c, crate::providers::ProviderCategory::Managed))
                .unwrap_or(false);
            if !managed {
                continue;
            }
            if let Some(new_attrs) = incoming.get(scheme) {
                if new_attrs.identifier != old_attrs.identifier
                    || new_attrs.provider != old_attrs.provider
                {
                    issues.push(ValidationIssue::new(
                        format!("pids.{scheme}"),
                        format!("the published {scheme} cannot be changed"),
                    ));
                }
            }
        }
        issues
    }
}
