//! Retryable background worker performing the actual outbound registration.
//!
//! The worker is safely re-invokable: it may be retried after a timeout with
//! no knowledge of whether the previous remote call completed, and providers
//! treat "already registered" as success. On failure the identifier is left
//! at its current local status (`Reserved`, not `Registered`) so a later
//! retry or manual re-registration can complete the process - local state is
//! always a safe under-approximation of the true remote state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::RegistrarConfig;
use crate::error::Result;
use crate::models::identifier::PidStatus;
use crate::models::record::{PidsMap, Record};
use crate::registration::{RecordResolver, RegistrationJob};
use crate::registry::ProviderRegistry;
use crate::store::PidStore;

/// What one worker invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Identifier became publicly resolvable
    Registered,
    /// Metadata/visibility pushed for an already-registered identifier
    Updated,
    /// Remote authority rejected or was unreachable; safe to retry
    Retry,
    /// Nothing to do for this job (missing pid, deleted, never reserved)
    Skipped,
}

pub struct RegistrationWorker {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn PidStore>,
    resolver: Arc<dyn RecordResolver>,
    landing_base_url: String,
    retry_limit: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
}

impl RegistrationWorker {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn PidStore>,
        resolver: Arc<dyn RecordResolver>,
        config: &RegistrarConfig,
    ) -> Self {
        Self {
            registry,
            store,
            resolver,
            landing_base_url: config.landing_base_url.clone(),
            retry_limit: config.retry_limit,
            backoff_base_ms: config.backoff_base_ms,
            backoff_max_ms: config.backoff_max_ms,
        }
    }

    /// Execute one job. Never errors on remote failure; those come back as
    /// [`RegistrationOutcome::Retry`].
    pub async fn run(&self, job: &RegistrationJob) -> Result<RegistrationOutcome> {
        let (pids, record, url) = match self.load(job).await? {
            Some(loaded) => loaded,
            None => {
                warn!(subject_id = %job.subject_id, scheme = %job.scheme, "job subject no longer exists");
                return Ok(RegistrationOutcome::Skipped);
            }
        };

        let Some(attrs) = pids.get(&job.scheme) else {
            return Ok(RegistrationOutcome::Skipped);
        };
        let Some(mut row) = self.store.get(&job.scheme, &attrs.identifier).await? else {
            return Ok(RegistrationOutcome::Skipped);
        };
        let provider = self.registry.provider(&job.scheme, &attrs.provider)?;
        if !provider.is_managed() {
            // Pass-through identifiers are registered elsewhere; the local
            // row only claims the value
            return Ok(RegistrationOutcome::Skipped);
        }

        let outcome = match row.status {
            PidStatus::Reserved => {
                if provider.register(&mut row, &record, &url).await? {
                    info!(scheme = %job.scheme, identifier = %row.value, "identifier registered");
                    RegistrationOutcome::Registered
                } else {
                    RegistrationOutcome::Retry
                }
            }
            PidStatus::Registered => {
                if provider.update(&mut row, &record, &url).await? {
                    RegistrationOutcome::Updated
                } else {
                    RegistrationOutcome::Retry
                }
            }
            PidStatus::New | PidStatus::Deleted => {
                warn!(
                    scheme = %job.scheme,
                    identifier = %row.value,
                    status = %row.status,
                    "identifier not in a registrable state"
                );
                RegistrationOutcome::Skipped
            }
        };

        Ok(outcome)
    }

    /// Execute a job with the configured bounded backoff until it stops
    /// asking for a retry.
    pub async fn run_with_retries(&self, job: &RegistrationJob) -> Result<RegistrationOutcome> {
        let mut attempt = 0u32;
        loop {
            let outcome = self.run(job).await?;
            if outcome != RegistrationOutcome::Retry || attempt >= self.retry_limit {
                return Ok(outcome);
            }
            attempt += 1;
            let delay = (self.backoff_base_ms * 2u64.saturating_pow(attempt - 1))
                .min(self.backoff_max_ms);
            warn!(
                scheme = %job.scheme,
                subject_id = %job.subject_id,
                attempt,
                delay_ms = delay,
                "registration attempt failed, backing off"
            );
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
    }

    async fn load(&self, job: &RegistrationJob) -> Result<Option<(PidsMap, Record, String)>> {
        if job.is_parent {
            let Some(parent) = self.resolver.parent(job.subject_id).await? else {
                return Ok(None);
            };
            // Concept identifiers resolve to the latest published version
            let Some(record) = self.resolver.latest_record_of(parent.id).await? else {
                return Ok(None);
            };
            let url = format!("{}/records/{}/latest", self.landing_base_url, parent.id);
            Ok(Some((parent.pids, record, url)))
        } else {
            let Some(record) = self.resolver.record(job.subject_id).await? else {
                return Ok(None);
            };
            let url = format!("{}/records/{}", self.landing_base_url, record.id);
            Ok(Some((record.pids.clone(), record, url)))
        }
    }
}
