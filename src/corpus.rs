//! # Corpus Index Module
//!
//! ## Purpose
//! Maintains the citation-identity index used to resolve canonical citation
//! forms to documents in the corpus, and defines the `CorpusStore`
//! collaborator interface that persists batch output.
//!
//! ## Lifecycle
//! The index is process-wide state with an explicit lifecycle: built fresh
//! per batch after the per-document barrier, then read as an immutable
//! snapshot by the aggregation stages. Workers never write to it — the merge
//! step is the sole writer.
//!
//! ## Identity Derivation
//! The input contract carries no titles, so a document's own citation
//! identities are derived by running the citation matchers over its title
//! block (the first paragraph of the text) and keeping the identities
//! consistent with its kind (an act document yields statute identities, a
//! judgment yields case identities). Citations past the title block belong
//! to *other* instruments and never become identities of this one. The raw
//! document id is always registered as an identity too.

use crate::citations::{Citation, CitationExtractor, TargetType};
use crate::config::CitationConfig;
use crate::errors::Result;
use crate::utils::split_paragraphs;
use crate::{Document, DocumentId, DocumentKind};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Snapshot index from citation identity keys to document ids
#[derive(Debug, Default)]
pub struct DocumentIndex {
    by_identity: HashMap<String, DocumentId>,
    identities: HashMap<DocumentId, Vec<String>>,
}

impl DocumentIndex {
    /// Build the index for a batch of documents
    pub fn build(
        documents: &[Document],
        extractor: &CitationExtractor,
        config: &CitationConfig,
    ) -> Self {
        let mut index = DocumentIndex::default();
        for document in documents {
            let identities = Self::derive_identities(document, extractor, config);
            for identity in &identities {
                let key = Self::key(identity);
                match index.by_identity.get(&key) {
                    Some(existing) if existing != &document.id => {
                        tracing::debug!(
                            identity = %identity,
                            first = %existing,
                            second = %document.id,
                            "identity collision, keeping first document"
                        );
                    }
                    _ => {
                        index.by_identity.insert(key, document.id.clone());
                    }
                }
            }
            index
                .by_identity
                .entry(Self::key(&document.id))
                .or_insert_with(|| document.id.clone());
            index.identities.insert(document.id.clone(), identities);
        }
        index
    }

    /// The citation identities a document answers to.
    ///
    /// Only the title block is scanned: a long title or judgment body that
    /// *cites* another instrument must not make this document resolvable as
    /// that instrument.
    fn derive_identities(
        document: &Document,
        extractor: &CitationExtractor,
        config: &CitationConfig,
    ) -> Vec<String> {
        let mut end = config.identity_scan_chars.min(document.raw_text.len());
        while end > 0 && !document.raw_text.is_char_boundary(end) {
            end -= 1;
        }
        let head = &document.raw_text[..end];
        let title = match split_paragraphs(head).first() {
            Some(block) => &head[block.start..block.end],
            None => return Vec::new(),
        };

        let wanted = match document.kind {
            DocumentKind::Constitution | DocumentKind::Act => TargetType::Act,
            DocumentKind::Case => TargetType::Case,
            DocumentKind::Regulation | DocumentKind::Gazette => TargetType::Regulation,
            DocumentKind::Other => return Vec::new(),
        };

        let mut identities: Vec<String> = extractor
            .extract(&document.id, title)
            .into_iter()
            .filter(|c| c.target_type == wanted)
            .map(|c| c.base_canonical().to_string())
            .collect();
        identities.dedup();
        identities
    }

    fn key(identity: &str) -> String {
        identity.trim().to_lowercase()
    }

    /// Resolve a citation to a document in the corpus, if any.
    ///
    /// Section suffixes are stripped first so `..., section 4` resolves to
    /// the act itself.
    pub fn resolve(&self, citation: &Citation) -> Option<&DocumentId> {
        self.by_identity.get(&Self::key(citation.base_canonical()))
    }

    /// Resolve a bare canonical string
    pub fn resolve_canonical(&self, canonical: &str) -> Option<&DocumentId> {
        self.by_identity.get(&Self::key(canonical))
    }

    /// The identities derived for a document, in head order
    pub fn identities_of(&self, document_id: &str) -> &[String] {
        self.identities
            .get(document_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Persistence collaborator for batch artifacts.
///
/// The pipeline treats store failures as fatal to the batch; per-document
/// work already completed is reported back alongside the error.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Persist one document's raw record
    async fn put_document(&self, document: &Document) -> Result<()>;

    /// Retrieve a document by id
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Ids of all stored documents
    async fn document_ids(&self) -> Result<Vec<DocumentId>>;
}

/// In-memory corpus store, used in tests and single-run CLI invocations
#[derive(Debug, Default)]
pub struct InMemoryCorpusStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpusStore {
    async fn put_document(&self, document: &Document) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>> {
        let mut ids: Vec<_> = self.documents.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceFormat;

    fn act(id: &str, head: &str) -> Document {
        Document::new(id, head, SourceFormat::Pdf, DocumentKind::Act, None)
    }

    #[test]
    fn resolves_act_by_head_identity() {
        let config = CitationConfig::default();
        let extractor = CitationExtractor::new(&config);
        let documents = vec![act(
            "act_2008_71",
            "COMPANIES ACT 71 OF 2008\n\nTo provide for the incorporation of companies.",
        )];
        let index = DocumentIndex::build(&documents, &extractor, &config);

        let citations = extractor.extract(
            "case_1",
            "In terms of section 4 of the Companies Act 71 of 2008 the test applies.",
        );
        assert_eq!(citations.len(), 1);
        assert_eq!(
            index.resolve(&citations[0]),
            Some(&"act_2008_71".to_string())
        );
    }

    #[test]
    fn unresolvable_citation_returns_none() {
        let config = CitationConfig::default();
        let extractor = CitationExtractor::new(&config);
        let index = DocumentIndex::build(&[], &extractor, &config);
        let citations = extractor.extract("case_1", "the Banks Act 94 of 1990");
        assert_eq!(index.resolve(&citations[0]), None);
    }

    #[test]
    fn cited_acts_in_the_long_title_are_not_claimed_as_identities() {
        let config = CitationConfig::default();
        let extractor = CitationExtractor::new(&config);
        // The amendment is ingested first; its long title cites the
        // principal act, which must still resolve to its own document
        let documents = vec![
            act(
                "act_2011_3",
                "COMPANIES AMENDMENT ACT 3 OF 2011\n\nTo amend the Companies Act 71 of 2008.",
            ),
            act(
                "act_2008_71",
                "COMPANIES ACT 71 OF 2008\n\nTo provide for the incorporation of companies.",
            ),
        ];
        let index = DocumentIndex::build(&documents, &extractor, &config);
        assert_eq!(
            index.resolve_canonical("Companies Act 71 of 2008"),
            Some(&"act_2008_71".to_string())
        );
        assert_eq!(
            index.resolve_canonical("Companies Amendment Act 3 of 2011"),
            Some(&"act_2011_3".to_string())
        );
        assert_eq!(
            index.identities_of("act_2011_3"),
            ["Companies Amendment Act 3 of 2011"]
        );
    }

    #[test]
    fn case_documents_do_not_claim_act_identities() {
        let config = CitationConfig::default();
        let extractor = CitationExtractor::new(&config);
        // A judgment whose head quotes an act must not become resolvable as
        // that act
        let judgment = Document::new(
            "case_1",
            "SMITH v JONES [2010] ZASCA 5\nConcerning the Companies Act 71 of 2008.",
            SourceFormat::Html,
            DocumentKind::Case,
            None,
        );
        let index = DocumentIndex::build(&[judgment], &extractor, &config);
        assert!(index.resolve_canonical("Companies Act 71 of 2008").is_none());
        assert_eq!(
            index.resolve_canonical("[2010] ZASCA 5"),
            Some(&"case_1".to_string())
        );
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryCorpusStore::new();
        let doc = act("act_1990_94", "BANKS ACT 94 OF 1990");
        store.put_document(&doc).await.unwrap();
        let fetched = store.get_document("act_1990_94").await.unwrap().unwrap();
        assert_eq!(fetched.id, doc.id);
        assert_eq!(store.document_ids().await.unwrap(), vec!["act_1990_94"]);
    }
}
