//! Parent-level (concept) identifier lifecycle component.
//!
//! A parallel state machine keyed off the parent entity, not the record: on
//! first publish of a logical work the required parent schemes are computed,
//! created once, and never recreated on subsequent versions - the same value
//! is propagated, never regenerated.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::manager::PidManager;
use crate::models::record::{Parent, Record};
use crate::providers::ProviderCategory;
use crate::registration::{RegistrationJob, TaskScheduler};
use crate::registry::ProviderRegistry;

pub struct ParentPidsComponent {
    registry: Arc<ProviderRegistry>,
    manager: Arc<PidManager>,
    scheduler: Arc<dyn TaskScheduler>,
    /// Schemes every parent carries regardless of what its versions chose.
    base_required: Vec<String>,
}

impl ParentPidsComponent {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        manager: Arc<PidManager>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self {
            registry,
            manager,
            scheduler,
            base_required: Vec::new(),
        }
    }

    pub fn with_required_schemes(mut self, schemes: Vec<String>) -> Self {
        self.base_required = schemes;
        self
    }

    /// Schemes this parent must hold, given the version being published:
    /// the configured base set, plus a concept DOI whenever the child record
    /// chose a managed DOI.
    fn required_for(&self, record: &Record) -> Vec<String> {
        let mut required = self.base_required.clone();
        if let Some(attrs) = record.pids.get("doi") {
            let managed = self
                .registry
                .category_of("doi", &attrs.provider)
                .map(|c| matches!(c, ProviderCategory::Managed))
                .unwrap_or(false);
            if managed && !required.iter().any(|s| s == "doi") {
                required.push("doi".to_string());
            }
        }
        required.sort();
        required
    }

    /// Publish hook, run after the record-level component. Creates missing
    /// parent identifiers exactly once and schedules their registration (an
    /// update, on later versions, so the concept identifier tracks the
    /// latest published version).
    pub async fn publish(&self, record: &Record, parent: &mut Parent) -> Result<()> {
        for scheme in self.required_for(record) {
            if parent.pids.contains_key(&scheme) {
                // Already minted by an earlier version; same value propagates
                debug!(scheme, parent_id = %parent.id, "concept identifier already exists");
                continue;
            }
            let provider = self.registry.default_provider_for(&scheme)?;
            let pid = provider
                .create(parent.subject(), record, None, None)
                .await?;
            parent.pids.insert(scheme.clone(), pid.as_attrs());
            info!(scheme, parent_id = %parent.id, identifier = %pid.value, "concept identifier created");
        }

        self.manager.reserve_all(record, &parent.pids).await?;

        let mut schemes: Vec<&String> = parent.pids.keys().collect();
        schemes.sort();
        for scheme in schemes {
            self.scheduler
                .schedule(RegistrationJob::for_parent(parent.id, scheme))
                .await?;
        }
        Ok(())
    }

    /// Delete hook: the parent-level identifier is soft-deleted only when
    /// the deleted version was the last remaining published one.
    pub async fn delete(&self, parent: &Parent, was_last_published_version: bool) -> Result<()> {
        if !was_last_published_version {
            return Ok(());
        }
        self.manager.discard_all(&parent.pids, true).await
    }

    /// Restore hook, the counterpart of [`Self::delete`].
    pub async fn restore(&self, parent: &Parent) -> Result<()> {
        self.manager.restore_all(&parent.pids).await
    }
}
