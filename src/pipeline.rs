//! # Pipeline Orchestration Module
//!
//! ## Purpose
//! Runs the per-document analysis passes over a batch with a bounded worker
//! pool, then performs the corpus-wide aggregation passes once every
//! document has settled.
//!
//! ## Concurrency Model
//! - Per-document work runs on blocking worker threads, bounded by a
//!   semaphore sized from configuration
//! - Workers check a shared cancellation flag and their time budget at stage
//!   boundaries; both surface as per-document statuses, never panics
//! - A document that exceeds its budget is retried once in isolation under
//!   the stricter retry budget
//! - Aggregation (index, graph, hierarchy, version chains) starts only after
//!   the barrier: every document has succeeded, failed, or been skipped
//!
//! ## Failure Policy
//! Per-document failures are recorded and the batch continues. Corpus store
//! failures are fatal to the batch and report how many documents were still
//! pending persistence.

use crate::citations::{Citation, CitationExtractor};
use crate::config::Config;
use crate::corpus::{CorpusStore, DocumentIndex};
use crate::errors::{ProcessError, Result};
use crate::graph::CrossReferenceGraph;
use crate::hierarchy::HierarchyModel;
use crate::language::{LanguageTag, LanguageTagger};
use crate::reasoning::{ReasoningExtractor, ReasoningSpan};
use crate::structure::{DocumentStructure, StructureAnalyzer};
use crate::temporal::{TemporalModel, TemporalModeler};
use crate::utils::{normalize_text, parse_flexible_date, Timer};
use crate::{Document, DocumentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, Semaphore};
use tokio::task;

/// Supplier of documents to process
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name of the source, used in logs
    fn name(&self) -> &str;

    /// Fetch the batch. Called once per `run_batch`.
    async fn fetch(&mut self) -> Result<Vec<Document>>;
}

/// In-memory source, used in tests and by embedders
pub struct VecDocumentSource {
    documents: Vec<Document>,
}

impl VecDocumentSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for VecDocumentSource {
    fn name(&self) -> &str {
        "vec"
    }

    async fn fetch(&mut self) -> Result<Vec<Document>> {
        Ok(std::mem::take(&mut self.documents))
    }
}

/// One input line of a JSONL document file. Dates arrive in whatever format
/// the upstream source used; parsing is flexible and failures leave the
/// document undated rather than rejecting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub text: String,
    pub source_format: crate::SourceFormat,
    pub kind: crate::DocumentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        let date = record.date.as_deref().and_then(parse_flexible_date);
        Document::new(
            record.id,
            record.text,
            record.source_format,
            record.kind,
            date,
        )
    }
}

/// Reads one `DocumentRecord` per line from a JSONL file
pub struct JsonlFileSource {
    path: PathBuf,
}

impl JsonlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for JsonlFileSource {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn fetch(&mut self) -> Result<Vec<Document>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut documents = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // A malformed record is skipped; the rest of the batch continues
            match serde_json::from_str::<DocumentRecord>(line) {
                Ok(record) => documents.push(record.into()),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping malformed document record"
                    );
                }
            }
        }
        Ok(documents)
    }
}

/// Terminal state of one document in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Succeeded,
    SucceededAfterRetry,
    Skipped { reason: String },
    /// Exceeded the budget on both the first attempt and the retry
    Timeout,
    Failed { error: String },
    Cancelled,
}

impl DocumentStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Succeeded | DocumentStatus::SucceededAfterRetry
        )
    }
}

/// Everything the per-document passes produced for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub status: DocumentStatus,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<DocumentStructure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language_tags: Vec<LanguageTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning_spans: Vec<ReasoningSpan>,
}

impl DocumentAnalysis {
    fn terminal(document_id: &str, status: DocumentStatus, elapsed_ms: u64) -> Self {
        Self {
            document_id: document_id.to_string(),
            status,
            elapsed_ms,
            citations: Vec::new(),
            structure: None,
            language_tags: Vec::new(),
            reasoning_spans: Vec::new(),
        }
    }
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_processed: usize,
    pub succeeded: usize,
    pub retried: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub citation_count: usize,
    pub edge_count: usize,
    pub resolved_edge_count: usize,
    pub chain_count: usize,
    pub elapsed_ms: u64,
    /// Document counts per kind, post-inference
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documents_by_kind: BTreeMap<String, usize>,
    /// Paragraph counts per detected language code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paragraphs_by_language: BTreeMap<String, usize>,
}

/// Full output of one batch run
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub documents: Vec<Document>,
    pub analyses: Vec<DocumentAnalysis>,
    pub graph: CrossReferenceGraph,
    pub hierarchy: HierarchyModel,
    pub temporal: TemporalModel,
    pub stats: BatchStats,
}

/// The per-document analyzers, shared read-only across workers
struct Analyzers {
    citations: CitationExtractor,
    structure: StructureAnalyzer,
    language: LanguageTagger,
    reasoning: ReasoningExtractor,
}

/// Batch processing pipeline
pub struct Pipeline {
    config: Config,
    analyzers: Arc<Analyzers>,
    semaphore: Arc<Semaphore>,
    cancel: Arc<AtomicBool>,
    /// Cumulative stats across batches
    stats: Arc<RwLock<BatchStats>>,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let analyzers = Arc::new(Analyzers {
            citations: CitationExtractor::new(&config.citations),
            structure: StructureAnalyzer::new(),
            language: LanguageTagger::new(&config.language),
            reasoning: ReasoningExtractor::new(&config.reasoning),
        });
        let semaphore = Arc::new(Semaphore::new(config.pipeline.max_concurrent_jobs));
        Ok(Self {
            config,
            analyzers,
            semaphore,
            cancel: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RwLock::new(BatchStats::default())),
        })
    }

    /// Request cancellation of in-flight per-document work. Documents not
    /// yet finished settle as `Cancelled`; completed results are kept.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Cumulative stats across all batches run on this pipeline
    pub async fn stats(&self) -> BatchStats {
        self.stats.read().await.clone()
    }

    /// Process one batch end to end
    pub async fn run_batch<S: DocumentSource>(&self, mut source: S) -> Result<BatchOutput> {
        self.run_batch_with_store(&mut source, None).await
    }

    /// Process one batch, persisting documents to `store` before analysis.
    /// Store failures abort the batch.
    pub async fn run_batch_with_store<S: DocumentSource>(
        &self,
        source: &mut S,
        store: Option<&dyn CorpusStore>,
    ) -> Result<BatchOutput> {
        let timer = Timer::new("run_batch");
        let raw_documents = source.fetch().await?;
        tracing::info!(
            source = source.name(),
            documents = raw_documents.len(),
            "starting batch"
        );

        // Normalize up front so every span downstream indexes the same text
        let mut documents: Vec<Document> = Vec::with_capacity(raw_documents.len());
        let mut analyses: Vec<DocumentAnalysis> = Vec::new();
        for mut document in raw_documents {
            document.raw_text = normalize_text(&document.raw_text);
            if document.kind == crate::DocumentKind::Other {
                document.kind = crate::DocumentKind::infer(&document.raw_text);
            }
            if document.raw_text.trim().len() < self.config.pipeline.min_text_length {
                tracing::warn!(document_id = %document.id, "skipping malformed document");
                analyses.push(DocumentAnalysis::terminal(
                    &document.id,
                    DocumentStatus::Skipped {
                        reason: "text empty or below minimum length".to_string(),
                    },
                    0,
                ));
                continue;
            }
            documents.push(document);
        }

        if let Some(store) = store {
            self.persist(store, &documents).await?;
        }

        let mut handles = Vec::with_capacity(documents.len());
        for document in &documents {
            let document = document.clone();
            let analyzers = Arc::clone(&self.analyzers);
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = Arc::clone(&self.cancel);
            let budget_ms = self.config.pipeline.document_budget_ms;
            let retry_budget_ms = self.config.pipeline.retry_budget_ms;

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let started = Instant::now();
                let first = Self::run_worker(&analyzers, &document, &cancel, budget_ms).await;
                match first {
                    Ok(mut analysis) => {
                        analysis.elapsed_ms = started.elapsed().as_millis() as u64;
                        analysis
                    }
                    Err(err @ ProcessError::Timeout { .. }) => {
                        tracing::warn!(
                            document_id = %document.id,
                            error = %err,
                            "retrying once under the stricter budget"
                        );
                        match Self::run_worker(&analyzers, &document, &cancel, retry_budget_ms)
                            .await
                        {
                            Ok(mut analysis) => {
                                analysis.status = DocumentStatus::SucceededAfterRetry;
                                analysis.elapsed_ms = started.elapsed().as_millis() as u64;
                                analysis
                            }
                            Err(retry_err) => DocumentAnalysis::terminal(
                                &document.id,
                                Self::status_for(retry_err),
                                started.elapsed().as_millis() as u64,
                            ),
                        }
                    }
                    Err(err) => DocumentAnalysis::terminal(
                        &document.id,
                        Self::status_for(err),
                        started.elapsed().as_millis() as u64,
                    ),
                }
            }));
        }

        // Barrier: aggregation may only see settled documents
        for handle in futures::future::join_all(handles).await {
            match handle {
                Ok(analysis) => analyses.push(analysis),
                Err(join_err) => {
                    tracing::error!(error = %join_err, "worker task failed to join");
                }
            }
        }

        let output = self.aggregate(documents, analyses, timer.stop());
        self.accumulate(&output.stats).await;
        tracing::info!(
            succeeded = output.stats.succeeded,
            failed = output.stats.failed,
            skipped = output.stats.skipped,
            cancelled = output.stats.cancelled,
            elapsed_ms = output.stats.elapsed_ms,
            "batch complete"
        );
        Ok(output)
    }

    async fn persist(&self, store: &dyn CorpusStore, documents: &[Document]) -> Result<()> {
        for (stored, document) in documents.iter().enumerate() {
            if let Err(err) = store.put_document(document).await {
                return Err(ProcessError::StoreUnavailable {
                    details: err.to_string(),
                    pending: documents.len() - stored,
                });
            }
        }
        Ok(())
    }

    async fn run_worker(
        analyzers: &Arc<Analyzers>,
        document: &Document,
        cancel: &Arc<AtomicBool>,
        budget_ms: u64,
    ) -> Result<DocumentAnalysis> {
        let analyzers = Arc::clone(analyzers);
        let document = document.clone();
        let cancel = Arc::clone(cancel);
        task::spawn_blocking(move || analyze_document(&analyzers, &document, &cancel, budget_ms))
            .await
            .map_err(|e| ProcessError::Internal {
                message: format!("worker panicked: {e}"),
            })?
    }

    fn status_for(err: ProcessError) -> DocumentStatus {
        match err {
            ProcessError::Cancelled { .. } => DocumentStatus::Cancelled,
            ProcessError::Timeout { .. } => DocumentStatus::Timeout,
            other => DocumentStatus::Failed {
                error: other.to_string(),
            },
        }
    }

    /// Corpus-wide aggregation over settled per-document results
    fn aggregate(
        &self,
        documents: Vec<Document>,
        analyses: Vec<DocumentAnalysis>,
        elapsed_ms: u64,
    ) -> BatchOutput {
        let index = DocumentIndex::build(&documents, &self.analyzers.citations, &self.config.citations);

        let mut graph = CrossReferenceGraph::new();
        for analysis in &analyses {
            for citation in &analysis.citations {
                graph.add_citation(citation, &index);
            }
        }

        let hierarchy = HierarchyModel::build(&documents, &graph.resolved_adjacency());
        let temporal = TemporalModeler::new().build(&documents, &index, &graph);

        let mut stats = BatchStats {
            total_processed: analyses.len(),
            citation_count: analyses.iter().map(|a| a.citations.len()).sum(),
            edge_count: graph.edge_count(),
            resolved_edge_count: graph.resolved_count(),
            chain_count: temporal.len(),
            elapsed_ms,
            ..BatchStats::default()
        };
        for document in &documents {
            *stats
                .documents_by_kind
                .entry(document.kind.as_str().to_string())
                .or_insert(0) += 1;
        }
        for analysis in &analyses {
            for tag in &analysis.language_tags {
                *stats
                    .paragraphs_by_language
                    .entry(tag.language_code.as_str().to_string())
                    .or_insert(0) += 1;
            }
            match &analysis.status {
                DocumentStatus::Succeeded => stats.succeeded += 1,
                DocumentStatus::SucceededAfterRetry => {
                    stats.succeeded += 1;
                    stats.retried += 1;
                }
                DocumentStatus::Skipped { .. } => stats.skipped += 1,
                DocumentStatus::Timeout => stats.timed_out += 1,
                DocumentStatus::Failed { .. } => stats.failed += 1,
                DocumentStatus::Cancelled => stats.cancelled += 1,
            }
        }

        BatchOutput {
            documents,
            analyses,
            graph,
            hierarchy,
            temporal,
            stats,
        }
    }

    async fn accumulate(&self, batch: &BatchStats) {
        let mut stats = self.stats.write().await;
        stats.total_processed += batch.total_processed;
        stats.succeeded += batch.succeeded;
        stats.retried += batch.retried;
        stats.skipped += batch.skipped;
        stats.timed_out += batch.timed_out;
        stats.failed += batch.failed;
        stats.cancelled += batch.cancelled;
        stats.citation_count += batch.citation_count;
        stats.edge_count += batch.edge_count;
        stats.resolved_edge_count += batch.resolved_edge_count;
        stats.chain_count += batch.chain_count;
        stats.elapsed_ms += batch.elapsed_ms;
        for (kind, count) in &batch.documents_by_kind {
            *stats.documents_by_kind.entry(kind.clone()).or_insert(0) += count;
        }
        for (language, count) in &batch.paragraphs_by_language {
            *stats
                .paragraphs_by_language
                .entry(language.clone())
                .or_insert(0) += count;
        }
    }
}

/// The synchronous per-document passes, run on a blocking worker thread.
///
/// The budget and cancellation flag are checked between passes; a pass in
/// progress is allowed to finish.
fn analyze_document(
    analyzers: &Analyzers,
    document: &Document,
    cancel: &AtomicBool,
    budget_ms: u64,
) -> Result<DocumentAnalysis> {
    let started = Instant::now();
    let checkpoint = || -> Result<()> {
        if cancel.load(Ordering::Relaxed) {
            return Err(ProcessError::Cancelled {
                document_id: document.id.clone(),
            });
        }
        if started.elapsed().as_millis() as u64 >= budget_ms {
            return Err(ProcessError::Timeout {
                document_id: document.id.clone(),
                budget_ms,
            });
        }
        Ok(())
    };

    checkpoint()?;
    let citations = analyzers.citations.extract(&document.id, &document.raw_text);
    checkpoint()?;
    let structure = analyzers
        .structure
        .analyze(&document.id, &document.raw_text, document.kind);
    checkpoint()?;
    let language_tags = analyzers
        .language
        .tag_document(&document.id, &document.raw_text);
    checkpoint()?;
    let reasoning_spans =
        analyzers
            .reasoning
            .extract(&document.id, &document.raw_text, &structure, &citations);

    Ok(DocumentAnalysis {
        document_id: document.id.clone(),
        status: DocumentStatus::Succeeded,
        elapsed_ms: started.elapsed().as_millis() as u64,
        citations,
        structure: Some(structure),
        language_tags,
        reasoning_spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::InMemoryCorpusStore;
    use crate::graph::Reference;
    use chrono::NaiveDate;
    use crate::temporal::ChainStatus;
    use crate::{DocumentKind, SourceFormat};

    fn doc(id: &str, kind: DocumentKind, text: &str, date: Option<&str>) -> Document {
        Document::new(
            id,
            text,
            SourceFormat::Txt,
            kind,
            date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        )
    }

    fn batch() -> Vec<Document> {
        vec![
            doc(
                "act_2008_71",
                DocumentKind::Act,
                "COMPANIES ACT 71 OF 2008\n\n1. Definitions\n\nIn this Act \"company\" means a juristic person.",
                Some("2011-05-01"),
            ),
            doc(
                "act_2011_3",
                DocumentKind::Act,
                "COMPANIES AMENDMENT ACT 3 OF 2011\n\nTo amend the Companies Act 71 of 2008.",
                Some("2011-09-01"),
            ),
            doc(
                "case_1",
                DocumentKind::Case,
                "SMITH v JONES [2012] ZASCA 3\n\nORDER\n\n[1] In terms of section 4 of the Companies Act 71 of 2008 the test applies. It follows that the appeal must succeed.",
                Some("2012-03-01"),
            ),
        ]
    }

    #[tokio::test]
    async fn batch_runs_end_to_end() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let output = pipeline
            .run_batch(VecDocumentSource::new(batch()))
            .await
            .unwrap();

        assert_eq!(output.stats.total_processed, 3);
        assert_eq!(output.stats.succeeded, 3);
        assert!(output.analyses.iter().all(|a| a.status.is_success()));

        // The judgment's statute citation resolved into a graph edge
        assert!(output.graph.edges().iter().any(|e| {
            e.from == "case_1" && e.to == Reference::Resolved("act_2008_71".to_string())
        }));

        // Tiers and version chains were aggregated
        assert_eq!(output.hierarchy.record("case_1").unwrap().rank, 3);
        let chain = output.temporal.chain("Companies Act").unwrap();
        assert_eq!(chain.status, ChainStatus::Complete);
        assert_eq!(chain.versions.len(), 2);

        // And the judgment produced a reasoning span
        let case = output
            .analyses
            .iter()
            .find(|a| a.document_id == "case_1")
            .unwrap();
        assert!(!case.reasoning_spans.is_empty());

        // Summary counts
        assert_eq!(output.stats.documents_by_kind.get("act"), Some(&2));
        assert_eq!(output.stats.documents_by_kind.get("case"), Some(&1));
        assert!(output.stats.paragraphs_by_language.contains_key("en"));
    }

    #[tokio::test]
    async fn unlabeled_documents_get_an_inferred_kind() {
        let documents = vec![doc(
            "mystery",
            DocumentKind::Other,
            "SMITH v JONES [2012] ZASCA 3\n\n[1] The appeal is dismissed with costs against the appellant.",
            None,
        )];
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let output = pipeline
            .run_batch(VecDocumentSource::new(documents))
            .await
            .unwrap();
        assert_eq!(output.hierarchy.record("mystery").unwrap().rank, 3);
        assert_eq!(output.stats.documents_by_kind.get("case"), Some(&1));
    }

    #[tokio::test]
    async fn empty_documents_are_skipped_not_fatal() {
        let mut documents = batch();
        documents.push(doc("empty", DocumentKind::Other, "   ", None));
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let output = pipeline
            .run_batch(VecDocumentSource::new(documents))
            .await
            .unwrap();
        assert_eq!(output.stats.skipped, 1);
        assert_eq!(output.stats.succeeded, 3);
        let skipped = output
            .analyses
            .iter()
            .find(|a| a.document_id == "empty")
            .unwrap();
        assert!(matches!(skipped.status, DocumentStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn malformed_jsonl_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"id":"act_2008_71","text":"COMPANIES ACT 71 OF 2008","source_format":"txt","kind":"act"}"#,
                "\n",
                "{this is not json}\n",
                r#"{"id":"case_1","text":"[2012] ZASCA 3","source_format":"txt","kind":"case"}"#,
                "\n",
            ),
        )
        .unwrap();

        let mut source = JsonlFileSource::new(&path);
        let documents = source.fetch().await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "act_2008_71");
        assert_eq!(documents[1].id, "case_1");
    }

    #[test]
    fn repeated_timeouts_carry_a_distinct_status() {
        let status = Pipeline::status_for(ProcessError::Timeout {
            document_id: "slow".to_string(),
            budget_ms: 10,
        });
        assert_eq!(status, DocumentStatus::Timeout);

        // The stream record tags it as a timeout, not a generic failure
        let analysis = DocumentAnalysis::terminal("slow", status, 10);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["status"], "timeout");

        let other = Pipeline::status_for(ProcessError::Internal {
            message: "boom".to_string(),
        });
        assert!(matches!(other, DocumentStatus::Failed { .. }));
    }

    #[test]
    fn exhausted_budget_surfaces_as_timeout() {
        let config = Config::default();
        let analyzers = Analyzers {
            citations: CitationExtractor::new(&config.citations),
            structure: StructureAnalyzer::new(),
            language: LanguageTagger::new(&config.language),
            reasoning: ReasoningExtractor::new(&config.reasoning),
        };
        let document = &batch()[0];
        let cancel = AtomicBool::new(false);
        let err = analyze_document(&analyzers, document, &cancel, 0).unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { budget_ms: 0, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn zero_budget_config_is_rejected() {
        let mut config = Config::default();
        config.pipeline.document_budget_ms = 0;
        assert!(Pipeline::new(config).is_err());
    }

    #[tokio::test]
    async fn cancelled_batch_settles_every_document() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        pipeline.cancel();
        let output = pipeline
            .run_batch(VecDocumentSource::new(batch()))
            .await
            .unwrap();
        assert_eq!(output.stats.cancelled, 3);
        assert!(output
            .analyses
            .iter()
            .all(|a| a.status == DocumentStatus::Cancelled));
    }

    #[tokio::test]
    async fn documents_are_persisted_before_analysis() {
        let store = InMemoryCorpusStore::new();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let mut source = VecDocumentSource::new(batch());
        pipeline
            .run_batch_with_store(&mut source, Some(&store))
            .await
            .unwrap();
        assert_eq!(
            store.document_ids().await.unwrap(),
            vec!["act_2008_71", "act_2011_3", "case_1"]
        );
    }
}
