//! Data layer for the identifier lifecycle core.
//!
//! Two families of entities live here:
//!
//! - [`identifier`] - the persistent identifier row itself, with its
//!   forward-only status machine (`New -> Reserved -> Registered`, soft
//!   deletion from any state).
//! - [`record`] - lightweight snapshots of the record and its version-spanning
//!   parent entity, as supplied by the draft/record store collaborator. Only
//!   the attributes this core reads (pids map, access, publisher metadata) are
//!   modeled; full record metadata is out of scope.

pub mod identifier;
pub mod record;

pub use identifier::{PersistentIdentifier, PidStatus, PidSubject, SubjectType};
pub use record::{Parent, PidAttrs, PidsMap, Record, RecordAccess, RecordMetadata};
