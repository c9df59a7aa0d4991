//! Persistent identifier entity and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RegistrarError, Result};
use crate::models::record::PidAttrs;

/// Lifecycle status of a persistent identifier.
///
/// Status only ever advances `New -> Reserved -> Registered`. `Deleted` is
/// reachable from any state (soft deletion); the reverse edges out of
/// `Deleted` exist only for restore and for reactivating a soft-deleted row
/// in `create`. Self-transitions are permitted so that retried operations
/// stay idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidStatus {
    /// Row exists locally, nothing claimed or communicated anywhere
    New,
    /// Claimed prior to public registration, not yet resolvable
    Reserved,
    /// Publicly resolvable at the registration authority
    Registered,
    /// Soft-deleted; row kept for audit and possible restore
    Deleted,
}

impl PidStatus {
    /// Check whether the status machine permits moving to `next`.
    pub fn can_transition_to(self, next: PidStatus) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::New, Self::Reserved)
                | (Self::New, Self::Registered)
                | (Self::Reserved, Self::Registered)
                | (Self::New, Self::Deleted)
                | (Self::Reserved, Self::Deleted)
                | (Self::Registered, Self::Deleted)
                | (Self::Deleted, Self::New)
                | (Self::Deleted, Self::Reserved)
                | (Self::Deleted, Self::Registered)
        )
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }

    pub fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }
}

impl Default for PidStatus {
    fn default() -> Self {
        Self::New
    }
}

impl std::fmt::Display for PidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Reserved => write!(f, "reserved"),
            Self::Registered => write!(f, "registered"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for PidStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "reserved" => Ok(Self::Reserved),
            "registered" => Ok(Self::Registered),
            "deleted" => Ok(Self::Deleted),
            _ => Err(format!("Invalid pid status: {s}")),
        }
    }
}

/// Kind of entity an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// A single record version
    Record,
    /// The version-spanning parent entity (concept identifiers)
    Parent,
}

/// Owning entity of an identifier, by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PidSubject {
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
}

impl PidSubject {
    pub fn record(id: Uuid) -> Self {
        Self {
            subject_type: SubjectType::Record,
            subject_id: id,
        }
    }

    pub fn parent(id: Uuid) -> Self {
        Self {
            subject_type: SubjectType::Parent,
            subject_id: id,
        }
    }
}

/// A persistent identifier row.
///
/// `(scheme, value)` is unique across the whole identifier space regardless
/// of provider; the store enforces this on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentIdentifier {
    pub id: Uuid,
    pub scheme: String,
    pub value: String,
    pub status: PidStatus,
    pub provider_name: String,
    pub subject: PidSubject,
    /// Status the identifier held before soft deletion, used by restore.
    pub deleted_from: Option<PidStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistentIdentifier {
    pub fn new<S, V, P>(
        scheme: S,
        value: V,
        provider_name: P,
        subject: PidSubject,
        status: PidStatus,
    ) -> Self
    where
        S: Into<String>,
        V: Into<String>,
        P: Into<String>,
    {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            scheme: scheme.into(),
            value: value.into(),
            status,
            provider_name: provider_name.into(),
            subject,
            deleted_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the status, enforcing the forward-only machine.
    pub fn set_status(&mut self, next: PidStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(RegistrarError::InvalidStatusTransition {
                scheme: self.scheme.clone(),
                value: self.value.clone(),
                from: self.status,
                to: next,
            });
        }
        if next == PidStatus::Deleted && self.status != PidStatus::Deleted {
            self.deleted_from = Some(self.status);
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reverse a soft deletion, returning to the status held beforehand.
    pub fn restore_status(&mut self) -> Result<()> {
        let prior = self.deleted_from.unwrap_or(PidStatus::Registered);
        self.set_status(prior)?;
        self.deleted_from = None;
        Ok(())
    }

    /// The per-scheme entry this identifier contributes to a record's pids map.
    pub fn as_attrs(&self) -> PidAttrs {
        PidAttrs {
            identifier: self.value.clone(),
            provider: self.provider_name.clone(),
            client: None,
        }
    }
}
