//! # Structured Error Handling
//!
//! Crate-wide error taxonomy for the identifier lifecycle core.
//!
//! Errors fall into four families with distinct propagation rules:
//!
//! - **Configuration** errors (`Configuration`, `UnknownProvider`) are bugs in
//!   deployment wiring. They are fatal at startup or first use and never retried.
//! - **Validation** errors carry field-scoped messages back to the caller and
//!   are recoverable by correcting input.
//! - **Conflict** errors imply cross-record state, not malformed input, and are
//!   surfaced separately from validation.
//! - **Remote-authority** failures never appear here at all: providers degrade
//!   them to a returned `false` plus a logged diagnostic so that local state is
//!   never corrupted by a transient remote fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::identifier::PidStatus;

/// A single field-scoped validation message.
///
/// `field` uses dotted-path addressing into the record payload, e.g.
/// `pids.doi.identifier` or `metadata.publisher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced by the identifier lifecycle core.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown provider '{provider}' for scheme '{scheme}'")]
    UnknownProvider { scheme: String, provider: String },

    #[error("Validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Identifier '{value}' already exists for scheme '{scheme}'")]
    Conflict { scheme: String, value: String },

    #[error("Identifier '{value}' not found for scheme '{scheme}'")]
    NotFound { scheme: String, value: String },

    #[error("Provider '{provider}' does not support operation '{operation}'")]
    UnsupportedOperation {
        provider: String,
        operation: &'static str,
    },

    #[error("Provider '{provider}' could not generate an identifier: {reason}")]
    Generation { provider: String, reason: String },

    #[error("Illegal status transition {from} -> {to} for identifier '{value}' ({scheme})")]
    InvalidStatusTransition {
        scheme: String,
        value: String,
        from: PidStatus,
        to: PidStatus,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
