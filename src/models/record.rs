//! Record and parent snapshots as supplied by the draft/record store.
//!
//! The draft/record store collaborator owns persistence of these maps; this
//! core reads and writes them in memory as part of the record mutation and
//! the store commits them with the record itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::identifier::PidSubject;

/// Per-scheme entry of a record's `pids` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidAttrs {
    /// The external identifier text, e.g. `10.1234/abcd-efgh`
    pub identifier: String,
    /// Name of the provider that minted or tracks the identifier
    pub provider: String,
    /// Optional client/credential name within the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl PidAttrs {
    pub fn new<I: Into<String>, P: Into<String>>(identifier: I, provider: P) -> Self {
        Self {
            identifier: identifier.into(),
            provider: provider.into(),
            client: None,
        }
    }
}

/// Scheme -> identifier attributes, the record-facing view of its pids.
pub type PidsMap = HashMap<String, PidAttrs>;

/// Visibility of a record, as far as identifier registration cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordAccess {
    Public,
    Restricted,
}

/// The slice of record metadata that identifier validation reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub title: Option<String>,
    pub publisher: Option<String>,
}

/// One version of a logical work.
///
/// Immutable once superseded by a new version; a fresh `Record` is created
/// instead. `pids` holds at most one identifier per scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub parent_id: Uuid,
    /// 1-based position in the version chain
    pub version_index: u32,
    pub is_published: bool,
    pub access: RecordAccess,
    pub metadata: RecordMetadata,
    pub pids: PidsMap,
}

impl Record {
    /// Fresh first-version draft under a new parent.
    pub fn new_draft(parent_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id,
            version_index: 1,
            is_published: false,
            access: RecordAccess::Public,
            metadata: RecordMetadata::default(),
            pids: PidsMap::new(),
        }
    }

    /// Draft for the next version. Record-level identifiers are not
    /// inherited; each version gets its own. Parent identifiers are untouched
    /// because the parent entity is shared.
    pub fn new_version_draft(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: self.parent_id,
            version_index: self.version_index + 1,
            is_published: false,
            access: self.access,
            metadata: self.metadata.clone(),
            pids: PidsMap::new(),
        }
    }

    /// Re-open this published record as a draft. Existing identifiers are
    /// copied along; they are fixed once published and the lifecycle
    /// components reject mutations of managed ones.
    pub fn edit_draft(&self) -> Self {
        let mut draft = self.clone();
        draft.is_published = false;
        draft
    }

    pub fn subject(&self) -> PidSubject {
        PidSubject::record(self.id)
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self.access, RecordAccess::Restricted)
    }
}

/// The version-spanning entity shared by all versions of a logical work.
///
/// Owns concept identifiers that keep the same value across every version
/// once minted. Never deleted while any version remains published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub id: Uuid,
    pub pids: PidsMap,
}

impl Parent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            pids: PidsMap::new(),
        }
    }

    pub fn subject(&self) -> PidSubject {
        PidSubject::parent(self.id)
    }
}

impl Default for Parent {
    fn default() -> Self {
        Self::new()
    }
}
