//! # Cross-Reference Graph Module
//!
//! ## Purpose
//! Builds the corpus-wide directed citation graph from the citation stream.
//! Each citation either resolves against the document index or is kept as a
//! dangling edge holding its canonical string.
//!
//! ## Input/Output Specification
//! - **Input**: Per-document `Citation` records plus the `DocumentIndex`
//!   snapshot
//! - **Output**: An append-only edge list, plus a deduplicated resolved
//!   adjacency view for hierarchy computation
//!
//! ## Policies
//! - Multi-edges are retained: edge multiplicity approximates citation weight.
//! - Resolved self-citations are dropped, not stored as self-loops.
//! - Bare section references stay out of the graph — they point within their
//!   own document, and dangling `section N` strings would only add noise.
//! - Partial graphs built per worker can be merged by concatenation: every
//!   edge depends only on its own source document's citations.

use crate::citations::{Citation, TargetType};
use crate::corpus::DocumentIndex;
use crate::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Edge target: a document in the corpus or an unresolved canonical string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Reference {
    Resolved(DocumentId),
    Dangling(String),
}

impl Reference {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }
}

/// One directed citation edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceEdge {
    pub from: DocumentId,
    pub to: Reference,
    /// Canonical form of the citation that produced the edge
    pub canonical_form: String,
    pub confidence: f64,
}

/// Deduplicated resolved adjacency used by the hierarchy modeler.
///
/// Simple edges only; self-loops are impossible by construction because
/// resolved self-citations are dropped before they reach the edge list.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAdjacency {
    outgoing: BTreeMap<DocumentId, BTreeSet<DocumentId>>,
}

impl ResolvedAdjacency {
    /// Documents cited by `from`, deduplicated
    pub fn cited_by(&self, from: &str) -> impl Iterator<Item = &DocumentId> {
        self.outgoing.get(from).into_iter().flatten()
    }

    /// All `(citer, cited)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&DocumentId, &DocumentId)> {
        self.outgoing
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from, to)))
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.outgoing
            .get(from)
            .map(|tos| tos.contains(to))
            .unwrap_or(false)
    }
}

/// Append-only, mergeable cross-reference graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossReferenceGraph {
    edges: Vec<CrossReferenceEdge>,
}

impl CrossReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge for one citation, resolving it against the index.
    ///
    /// Section-type citations and resolved self-citations produce no edge.
    pub fn add_citation(&mut self, citation: &Citation, index: &DocumentIndex) {
        if citation.target_type == TargetType::Section {
            return;
        }

        let to = match index.resolve(citation) {
            Some(target) if target == &citation.document_id => {
                tracing::debug!(
                    document_id = %citation.document_id,
                    canonical = %citation.canonical_form,
                    "dropping self-citation"
                );
                return;
            }
            Some(target) => Reference::Resolved(target.clone()),
            None => Reference::Dangling(citation.canonical_form.clone()),
        };

        self.edges.push(CrossReferenceEdge {
            from: citation.document_id.clone(),
            to,
            canonical_form: citation.canonical_form.clone(),
            confidence: citation.confidence,
        });
    }

    /// Build a partial graph from one batch of citations
    pub fn from_citations<'a>(
        citations: impl IntoIterator<Item = &'a Citation>,
        index: &DocumentIndex,
    ) -> Self {
        let mut graph = Self::new();
        for citation in citations {
            graph.add_citation(citation, index);
        }
        graph
    }

    /// Concatenate another partial graph into this one
    pub fn merge(&mut self, other: CrossReferenceGraph) {
        self.edges.extend(other.edges);
    }

    pub fn edges(&self) -> &[CrossReferenceEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.edges.iter().filter(|e| e.to.is_resolved()).count()
    }

    pub fn dangling_count(&self) -> usize {
        self.edges.len() - self.resolved_count()
    }

    /// The deduplicated resolved view for hierarchy computation
    pub fn resolved_adjacency(&self) -> ResolvedAdjacency {
        let mut adjacency = ResolvedAdjacency::default();
        for edge in &self.edges {
            if let Reference::Resolved(to) = &edge.to {
                adjacency
                    .outgoing
                    .entry(edge.from.clone())
                    .or_default()
                    .insert(to.clone());
            }
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citations::CitationExtractor;
    use crate::config::CitationConfig;
    use crate::{Document, DocumentKind, SourceFormat};

    fn setup() -> (CitationExtractor, CitationConfig) {
        let config = CitationConfig::default();
        (CitationExtractor::new(&config), config)
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(
                "act_2008_71",
                "COMPANIES ACT 71 OF 2008\n\nTo provide for companies.",
                SourceFormat::Pdf,
                DocumentKind::Act,
                None,
            ),
            Document::new(
                "act_1990_94",
                "BANKS ACT 94 OF 1990\n\nTo regulate banks.",
                SourceFormat::Pdf,
                DocumentKind::Act,
                None,
            ),
        ]
    }

    #[test]
    fn resolved_and_dangling_edges() {
        let (extractor, config) = setup();
        let documents = corpus();
        let index = DocumentIndex::build(&documents, &extractor, &config);

        let citations = extractor.extract(
            "case_1",
            "See the Companies Act 71 of 2008 and the Insolvency Act 24 of 1936.",
        );
        let graph = CrossReferenceGraph::from_citations(&citations, &index);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.resolved_count(), 1);
        assert_eq!(graph.dangling_count(), 1);
        assert_eq!(
            graph.edges()[0].to,
            Reference::Resolved("act_2008_71".to_string())
        );
        assert_eq!(
            graph.edges()[1].to,
            Reference::Dangling("Insolvency Act 24 of 1936".to_string())
        );
    }

    #[test]
    fn multi_edges_are_retained() {
        let (extractor, config) = setup();
        let documents = corpus();
        let index = DocumentIndex::build(&documents, &extractor, &config);

        let citations = extractor.extract(
            "case_1",
            "The Banks Act 94 of 1990 regulates deposits. The Banks Act 94 of 1990 also defines them.",
        );
        let graph = CrossReferenceGraph::from_citations(&citations, &index);
        assert_eq!(graph.edge_count(), 2);

        // But the resolved adjacency view deduplicates
        let adjacency = graph.resolved_adjacency();
        assert_eq!(adjacency.cited_by("case_1").count(), 1);
    }

    #[test]
    fn self_citations_are_dropped_not_self_looped() {
        let (extractor, config) = setup();
        let documents = corpus();
        let index = DocumentIndex::build(&documents, &extractor, &config);

        // The act citing itself in its own text
        let citations = extractor.extract(
            "act_2008_71",
            "This Act may be cited as the Companies Act 71 of 2008.",
        );
        let graph = CrossReferenceGraph::from_citations(&citations, &index);
        assert_eq!(graph.edge_count(), 0);

        let adjacency = graph.resolved_adjacency();
        assert!(adjacency.pairs().all(|(from, to)| from != to));
    }

    #[test]
    fn bare_section_references_make_no_edges() {
        let (extractor, config) = setup();
        let index = DocumentIndex::build(&corpus(), &extractor, &config);
        let citations = extractor.extract("act_2008_71", "Subject to section 5, a company...");
        let graph = CrossReferenceGraph::from_citations(&citations, &index);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn partial_graphs_merge_by_concatenation() {
        let (extractor, config) = setup();
        let documents = corpus();
        let index = DocumentIndex::build(&documents, &extractor, &config);

        let a = extractor.extract("case_1", "See the Companies Act 71 of 2008.");
        let b = extractor.extract("case_2", "See the Banks Act 94 of 1990.");

        let mut merged = CrossReferenceGraph::from_citations(&a, &index);
        merged.merge(CrossReferenceGraph::from_citations(&b, &index));

        assert_eq!(merged.edge_count(), 2);
        let adjacency = merged.resolved_adjacency();
        assert!(adjacency.contains("case_1", "act_2008_71"));
        assert!(adjacency.contains("case_2", "act_1990_94"));
    }
}
