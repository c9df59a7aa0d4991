//! Shared factories and collaborator doubles for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use registrar_core::config::RegistrarConfig;
use registrar_core::lifecycle::{
    ParentPidsComponent, ProviderTransitionPolicy, RecordPidsComponent,
};
use registrar_core::manager::PidManager;
use registrar_core::models::{Parent, Record};
use registrar_core::providers::client::{RegistrationClient, RemoteError, RemoteResult};
use registrar_core::providers::{
    default_doi_metadata, ExternalDoiProvider, ManagedDoiProvider, OaiProvider, PidProvider,
};
use registrar_core::registration::{
    InProcessScheduler, RecordResolver, RegistrationJob, RegistrationWorker,
};
use registrar_core::registry::ProviderRegistry;
use registrar_core::store::{InMemoryPidStore, PidStore};
use registrar_core::Result;

/// Scripted stand-in for a remote registration authority.
#[derive(Default)]
pub struct MockAuthorityClient {
    pub calls: Mutex<Vec<String>>,
    pub reject_publish: AtomicBool,
    pub not_found_on_show: AtomicBool,
}

impl MockAuthorityClient {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RegistrationClient for MockAuthorityClient {
    fn authority(&self) -> &str {
        "mock"
    }

    async fn publish(&self, doi: &str, _url: &str, _metadata: &Value) -> RemoteResult {
        self.record(format!("publish {doi}"));
        if self.reject_publish.load(Ordering::SeqCst) {
            return Err(RemoteError::Http {
                status: 503,
                body: "authority unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn update(&self, doi: &str, _url: &str, _metadata: &Value) -> RemoteResult {
        self.record(format!("update {doi}"));
        Ok(())
    }

    async fn hide(&self, doi: &str) -> RemoteResult {
        self.record(format!("hide {doi}"));
        Ok(())
    }

    async fn show(&self, doi: &str) -> RemoteResult {
        self.record(format!("show {doi}"));
        if self.not_found_on_show.load(Ordering::SeqCst) {
            return Err(RemoteError::NotFound);
        }
        Ok(())
    }

    async fn delete_draft(&self, doi: &str) -> RemoteResult {
        self.record(format!("delete_draft {doi}"));
        // Drafts are only created remotely at registration time, so cleanup
        // of a merely-reserved identifier typically finds nothing.
        Err(RemoteError::NotFound)
    }
}

/// In-memory draft/record store double.
#[derive(Default)]
pub struct InMemoryRecords {
    records: DashMap<Uuid, Record>,
    parents: DashMap<Uuid, Parent>,
}

impl InMemoryRecords {
    pub fn put_record(&self, record: &Record) {
        self.records.insert(record.id, record.clone());
    }

    pub fn put_parent(&self, parent: &Parent) {
        self.parents.insert(parent.id, parent.clone());
    }
}

#[async_trait]
impl RecordResolver for InMemoryRecords {
    async fn record(&self, id: Uuid) -> Result<Option<Record>> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn parent(&self, id: Uuid) -> Result<Option<Parent>> {
        Ok(self.parents.get(&id).map(|p| p.clone()))
    }

    async fn latest_record_of(&self, parent_id: Uuid) -> Result<Option<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.parent_id == parent_id && r.is_published)
            .max_by_key(|r| r.version_index)
            .map(|r| r.clone()))
    }
}

/// Fully wired test environment over the in-memory store and a scripted
/// authority.
pub struct TestEnv {
    pub config: RegistrarConfig,
    pub store: Arc<dyn PidStore>,
    pub client: Arc<MockAuthorityClient>,
    pub registry: Arc<ProviderRegistry>,
    pub manager: Arc<PidManager>,
    pub record_component: RecordPidsComponent,
    pub parent_component: ParentPidsComponent,
    pub records: Arc<InMemoryRecords>,
    pub worker: RegistrationWorker,
    jobs: Mutex<mpsc::UnboundedReceiver<RegistrationJob>>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: RegistrarConfig) -> Self {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        let client = Arc::new(MockAuthorityClient::default());

        let datacite: Arc<dyn PidProvider> = Arc::new(
            ManagedDoiProvider::datacite(
                config.datacite.clone(),
                client.clone(),
                store.clone(),
                default_doi_metadata,
                config.sandbox_mode,
            )
            .expect("datacite provider"),
        );
        let oai: Arc<dyn PidProvider> =
            Arc::new(OaiProvider::new(config.oai_prefix.clone(), store.clone()));
        let external: Arc<dyn PidProvider> = Arc::new(ExternalDoiProvider::new(
            store.clone(),
            vec![config.datacite.prefix.clone()],
        ));

        let registry = Arc::new(
            ProviderRegistry::build(&config, vec![datacite, oai, external])
                .expect("provider registry"),
        );
        let manager = Arc::new(PidManager::new(registry.clone(), store.clone()));

        let (scheduler, jobs) = InProcessScheduler::new();
        let scheduler = Arc::new(scheduler);

        let record_component = RecordPidsComponent::new(
            registry.clone(),
            manager.clone(),
            scheduler.clone(),
            ProviderTransitionPolicy::from_config(&config),
            config.doi_required,
        );
        let parent_component =
            ParentPidsComponent::new(registry.clone(), manager.clone(), scheduler);

        let records = Arc::new(InMemoryRecords::default());
        let worker = RegistrationWorker::new(
            registry.clone(),
            store.clone(),
            records.clone(),
            &config,
        );

        Self {
            config,
            store,
            client,
            registry,
            manager,
            record_component,
            parent_component,
            records,
            worker,
            jobs: Mutex::new(jobs),
        }
    }

    /// First-version draft under a fresh parent, with the metadata DOI
    /// registration requires.
    pub fn draft(&self) -> (Record, Parent) {
        let parent = Parent::new();
        let mut record = Record::new_draft(parent.id);
        record.metadata.title = Some("Example dataset".to_string());
        record.metadata.publisher = Some("Example Labs".to_string());
        (record, parent)
    }

    /// Record- and parent-level publish hooks in lifecycle order, with the
    /// snapshots the worker resolves afterwards.
    pub async fn publish(&self, record: &mut Record, parent: &mut Parent) -> Result<()> {
        self.record_component.publish(record, None).await?;
        self.parent_component.publish(record, parent).await?;
        self.records.put_record(record);
        self.records.put_parent(parent);
        Ok(())
    }

    /// Everything scheduled so far.
    pub fn drain_jobs(&self) -> Vec<RegistrationJob> {
        let mut jobs = Vec::new();
        let mut rx = self.jobs.lock();
        while let Ok(job) = rx.try_recv() {
            jobs.push(job);
        }
        jobs
    }

    /// Drain and run every scheduled job once.
    pub async fn run_scheduled(&self) -> Vec<registrar_core::RegistrationOutcome> {
        let mut outcomes = Vec::new();
        for job in self.drain_jobs() {
            outcomes.push(self.worker.run(&job).await.expect("worker run"));
        }
        outcomes
    }
}

/// Default deployment for tests: sandbox mode, scripted authority
/// credentials, fast backoff.
pub fn test_config() -> RegistrarConfig {
    let mut config = RegistrarConfig::default();
    config.datacite.username = "repo".to_string();
    config.datacite.password = "secret".to_string();
    config.backoff_base_ms = 1;
    config.backoff_max_ms = 4;
    config
}
