//! # Identifier Persistence Seam
//!
//! The identifier row is consumed through a generic get/create/update/delete
//! interface rather than a specific storage engine, so embedders can back it
//! with whatever the surrounding repository uses. [`InMemoryPidStore`] is the
//! in-crate implementation used by tests and by embedders without a database.
//!
//! The store is the single authority for the `(scheme, value)` uniqueness
//! invariant: `insert` refuses a duplicate key with a `Conflict` error.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{RegistrarError, Result};
use crate::models::identifier::{PersistentIdentifier, PidSubject};

/// Generic persistence interface for identifier rows, keyed by `(scheme, value)`.
#[async_trait]
pub trait PidStore: Send + Sync {
    /// Look up a row by its unique key.
    async fn get(&self, scheme: &str, value: &str) -> Result<Option<PersistentIdentifier>>;

    /// Find the row a subject holds for one scheme, if any.
    async fn find_for_subject(
        &self,
        subject: &PidSubject,
        scheme: &str,
    ) -> Result<Option<PersistentIdentifier>>;

    /// Insert a new row. Fails with `Conflict` if `(scheme, value)` exists.
    async fn insert(&self, pid: PersistentIdentifier) -> Result<PersistentIdentifier>;

    /// Persist changes to an existing row. Fails with `NotFound` if absent.
    async fn update(&self, pid: &PersistentIdentifier) -> Result<()>;

    /// Hard-delete a row. Fails with `NotFound` if absent.
    async fn remove(&self, scheme: &str, value: &str) -> Result<()>;

    /// All rows owned by a subject, soft-deleted ones included.
    async fn list_for_subject(&self, subject: &PidSubject) -> Result<Vec<PersistentIdentifier>>;

    /// Total number of rows, soft-deleted ones included.
    async fn count(&self) -> Result<usize>;
}

/// Concurrent in-memory store over a dashmap index.
#[derive(Debug, Default)]
pub struct InMemoryPidStore {
    rows: DashMap<(String, String), PersistentIdentifier>,
}

impl InMemoryPidStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(scheme: &str, value: &str) -> (String, String) {
        (scheme.to_string(), value.to_string())
    }
}

#[async_trait]
impl PidStore for InMemoryPidStore {
    async fn get(&self, scheme: &str, value: &str) -> Result<Option<PersistentIdentifier>> {
        Ok(self.rows.get(&Self::key(scheme, value)).map(|r| r.clone()))
    }

    async fn find_for_subject(
        &self,
        subject: &PidSubject,
        scheme: &str,
    ) -> Result<Option<PersistentIdentifier>> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.subject == *subject && r.scheme == scheme)
            .map(|r| r.clone()))
    }

    async fn insert(&self, pid: PersistentIdentifier) -> Result<PersistentIdentifier> {
        let key = Self::key(&pid.scheme, &pid.value);
        if self.rows.contains_key(&key) {
            return Err(RegistrarError::Conflict {
                scheme: pid.scheme,
                value: pid.value,
            });
        }
        self.rows.insert(key, pid.clone());
        Ok(pid)
    }

    async fn update(&self, pid: &PersistentIdentifier) -> Result<()> {
        let key = Self::key(&pid.scheme, &pid.value);
        match self.rows.get_mut(&key) {
            Some(mut row) => {
                *row = pid.clone();
                Ok(())
            }
            None => Err(RegistrarError::NotFound {
                scheme: pid.scheme.clone(),
                value: pid.value.clone(),
            }),
        }
    }

    async fn remove(&self, scheme: &str, value: &str) -> Result<()> {
        match self.rows.remove(&Self::key(scheme, value)) {
            Some(_) => Ok(()),
            None => Err(RegistrarError::NotFound {
                scheme: scheme.to_string(),
                value: value.to_string(),
            }),
        }
    }

    async fn list_for_subject(&self, subject: &PidSubject) -> Result<Vec<PersistentIdentifier>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.subject == *subject)
            .map(|r| r.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }
}
