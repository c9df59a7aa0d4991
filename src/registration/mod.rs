//! # Asynchronous Registration
//!
//! All remote-authority contact happens here, out-of-band after the record
//! mutation has committed. Lifecycle components only *schedule* a
//! [`RegistrationJob`] through the [`TaskScheduler`] seam; the surrounding
//! application is responsible for running scheduled jobs only after the
//! enclosing transaction commits, with at-least-once delivery.
//!
//! [`InProcessScheduler`] is the in-crate implementation: an unbounded mpsc
//! channel the embedder drains with a [`worker::RegistrationWorker`].

pub mod worker;

pub use worker::{RegistrationOutcome, RegistrationWorker};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{RegistrarError, Result};
use crate::models::record::{Parent, Record};

/// One unit of registration work: a single `(subject, scheme)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationJob {
    /// Record id, or parent id when `is_parent` is set
    pub subject_id: Uuid,
    pub scheme: String,
    pub is_parent: bool,
    pub requested_at: DateTime<Utc>,
}

impl RegistrationJob {
    pub fn for_record<S: Into<String>>(record_id: Uuid, scheme: S) -> Self {
        Self {
            subject_id: record_id,
            scheme: scheme.into(),
            is_parent: false,
            requested_at: Utc::now(),
        }
    }

    pub fn for_parent<S: Into<String>>(parent_id: Uuid, scheme: S) -> Self {
        Self {
            subject_id: parent_id,
            scheme: scheme.into(),
            is_parent: true,
            requested_at: Utc::now(),
        }
    }
}

/// Task-queue seam: schedule a job to run after the current transaction
/// commits, with at-least-once delivery.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule(&self, job: RegistrationJob) -> Result<()>;
}

/// Channel-backed scheduler for embedders that drain jobs in-process.
#[derive(Debug, Clone)]
pub struct InProcessScheduler {
    tx: mpsc::UnboundedSender<RegistrationJob>,
}

impl InProcessScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RegistrationJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TaskScheduler for InProcessScheduler {
    async fn schedule(&self, job: RegistrationJob) -> Result<()> {
        tracing::debug!(
            subject_id = %job.subject_id,
            scheme = %job.scheme,
            is_parent = job.is_parent,
            "scheduled registration job"
        );
        self.tx
            .send(job)
            .map_err(|e| RegistrarError::Store(format!("Scheduler channel closed: {e}")))
    }
}

/// Draft/record store seam the worker reads snapshots through.
#[async_trait]
pub trait RecordResolver: Send + Sync {
    async fn record(&self, id: Uuid) -> Result<Option<Record>>;

    async fn parent(&self, id: Uuid) -> Result<Option<Parent>>;

    /// Latest published version under a parent, used as the metadata source
    /// when registering a concept identifier.
    async fn latest_record_of(&self, parent_id: Uuid) -> Result<Option<Record>>;
}
