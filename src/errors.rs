//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the metadata pipeline, providing structured
//! error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various pipeline components
//! - **Output**: Structured error types with context
//! - **Error Categories**: Document, Extraction, Aggregation, Storage, Configuration
//!
//! ## Propagation Policy
//! Per-document failures never abort a batch; they are logged and the
//! document is skipped or retried. Corpus-wide aggregation failures are fatal
//! to the batch and carry the set of documents still pending. Data
//! conditions (unresolved references, hierarchy cycles, incomplete version
//! chains) are modeled as result states in their own modules, not as errors
//! here — errors are reserved for faults.

use crate::DocumentId;
use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Error types for the metadata pipeline
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Undecodable or empty raw text; the document is skipped, batch continues
    #[error("Malformed document '{document_id}': {details}")]
    MalformedDocument {
        document_id: DocumentId,
        details: String,
    },

    /// Multiple valid parse interpretations; the documented tie-break was
    /// applied, surfaced here only when a caller asks for strict parsing
    #[error("Parse ambiguity in '{document_id}': {details}")]
    ParseAmbiguity {
        document_id: DocumentId,
        details: String,
    },

    /// A pattern scan exceeded the per-document time budget
    #[error("Document '{document_id}' exceeded processing budget of {budget_ms}ms")]
    Timeout {
        document_id: DocumentId,
        budget_ms: u64,
    },

    /// The batch was cancelled before this document completed
    #[error("Processing of '{document_id}' was cancelled")]
    Cancelled { document_id: DocumentId },

    /// Corpus store could not be reached or written; fatal to the batch
    #[error("Corpus store unavailable: {details} ({pending} documents pending)")]
    StoreUnavailable { details: String, pending: usize },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// A point-in-time version query found no version in force
    #[error("No version of '{identity}' in force as of {as_of}")]
    VersionNotFound { identity: String, as_of: String },

    /// Artifact stream write failures
    #[error("Failed to write '{stream}' stream: {details}")]
    StreamWrite { stream: String, details: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProcessError {
    /// Whether the error may be retried. Retries apply only to timeouts and
    /// transient decode failures, not to parse ambiguity, which is a data
    /// condition. No error is retried more than once automatically.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProcessError::Timeout { .. } | ProcessError::StoreUnavailable { .. }
        )
    }

    /// Error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ProcessError::MalformedDocument { .. }
            | ProcessError::ParseAmbiguity { .. }
            | ProcessError::Timeout { .. }
            | ProcessError::Cancelled { .. } => "document",
            ProcessError::VersionNotFound { .. } => "query",
            ProcessError::StoreUnavailable { .. } | ProcessError::StreamWrite { .. } => "storage",
            ProcessError::Config { .. } | ProcessError::ValidationFailed { .. } => "configuration",
            ProcessError::Io(_) | ProcessError::Json(_) | ProcessError::Toml(_) => "io",
            ProcessError::Internal { .. } => "internal",
        }
    }

    /// Whether this error should abort the whole batch
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, ProcessError::StoreUnavailable { .. })
    }
}
