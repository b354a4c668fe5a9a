//! # Legal Metadata Pipeline
//!
//! ## Overview
//! This library turns raw South African legal text (legislation and court
//! judgments, already extracted from PDF/HTML/RTF upstream) into structured
//! legal metadata: citations, document structure, a cross-reference graph, a
//! legal-hierarchy graph, temporal version chains, per-paragraph language
//! tags, and classified legal-reasoning spans.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `citations`: Layered citation pattern matching and canonicalization
//! - `structure`: Section/definition/judgment segmentation into node trees
//! - `language`: Per-paragraph language tagging (eleven official languages)
//! - `graph`: Corpus-wide cross-reference graph construction
//! - `hierarchy`: Legal-authority ranking and conflict detection
//! - `temporal`: Version chains for amended legislation
//! - `reasoning`: Cue-phrase classification of judgment reasoning spans
//! - `pipeline`: Batch orchestration with a bounded worker pool
//! - `corpus`: Document identity index and corpus store interface
//! - `storage`: Append-only JSONL artifact streams
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: `(id, raw_text, source_format, court_or_body, date)` records
//!   from a `DocumentSource` collaborator
//! - **Output**: Seven append-only line-record artifact streams
//! - **Guarantee**: Per-document failures never abort a batch
//!
//! ## Usage
//! ```rust,no_run
//! use legal_metadata_pipeline::{Config, Pipeline};
//! use legal_metadata_pipeline::pipeline::VecDocumentSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let pipeline = Pipeline::new(config)?;
//!     let source = VecDocumentSource::new(vec![]);
//!     let output = pipeline.run_batch(source).await?;
//!     println!("Processed {} documents", output.stats.total_processed);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod citations;
pub mod structure;
pub mod language;
pub mod corpus;
pub mod graph;
pub mod hierarchy;
pub mod temporal;
pub mod reasoning;
pub mod pipeline;
pub mod storage;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{ProcessError, Result};
pub use pipeline::{BatchOutput, Pipeline};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for documents, assigned by the document source
pub type DocumentId = String;

/// Half-open byte range `[start, end)` into a document's raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Upstream file format the raw text was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Html,
    Rtf,
    Doc,
    Txt,
}

/// Document type as supplied by the source, used as the hierarchy rank prior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Constitution,
    Act,
    Regulation,
    Case,
    Gazette,
    Other,
}

impl DocumentKind {
    /// Default authority tier: lower is higher authority
    pub fn prior_rank(&self) -> u8 {
        match self {
            DocumentKind::Constitution => 0,
            DocumentKind::Act => 1,
            DocumentKind::Regulation | DocumentKind::Gazette => 2,
            DocumentKind::Case => 3,
            DocumentKind::Other => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Constitution => "constitution",
            DocumentKind::Act => "act",
            DocumentKind::Regulation => "regulation",
            DocumentKind::Case => "case",
            DocumentKind::Gazette => "gazette",
            DocumentKind::Other => "other",
        }
    }

    /// Infer a kind from the head of the text, used when the source labels a
    /// document `other`. Keyword heuristics only; a wrong source label is
    /// never overridden.
    pub fn infer(text: &str) -> DocumentKind {
        let head: String = text.chars().take(400).collect();
        let head = head.to_lowercase();
        if head.contains("constitution of the republic") {
            DocumentKind::Constitution
        } else if head.contains(" v ") || head.contains("judgment") {
            DocumentKind::Case
        } else if head.contains("government notice") || head.contains("regulation") {
            DocumentKind::Regulation
        } else if head.contains("government gazette") {
            DocumentKind::Gazette
        } else if head.contains(" act") {
            DocumentKind::Act
        } else {
            DocumentKind::Other
        }
    }
}

/// An ingested legal document.
///
/// Created once per ingested text and never mutated by later stages; the
/// per-document passes attach derived records to it rather than rewriting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source-assigned identifier
    pub id: DocumentId,
    /// Raw text from the upstream extractor
    pub raw_text: String,
    /// Upstream file format
    pub source_format: SourceFormat,
    /// Document type (court or body classification)
    pub kind: DocumentKind,
    /// Effective/decision date, if known
    pub date: Option<NaiveDate>,
}

impl Document {
    pub fn new(
        id: impl Into<DocumentId>,
        raw_text: impl Into<String>,
        source_format: SourceFormat,
        kind: DocumentKind,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            source_format,
            kind,
            date,
        }
    }
}
