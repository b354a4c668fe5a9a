//! # Hierarchy Modeling Module
//!
//! ## Purpose
//! Assigns each document an authority rank from the legal-instrument tier it
//! belongs to, refines ordering within a tier by effective date, and flags
//! conflicts the citation graph cannot justify.
//!
//! ## Ranking Policy
//! Rank comes from the document kind alone (constitution above acts, acts
//! above subordinate instruments, then case law). Citations never move a
//! document across tiers; they only surface conflicts:
//! - a citation cycle among same-tier documents, where no consistent
//!   precedence ordering exists
//! - a same-tier citation whose direction contradicts the effective dates
//!   (the citing document predates the document it cites)

use crate::graph::ResolvedAdjacency;
use crate::{Document, DocumentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A conflict attached to a hierarchy record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyConflict {
    /// This document sits on a same-tier citation cycle with the listed peers
    Cycle { with: Vec<DocumentId> },
    /// This document cites a same-tier document dated after it
    DateContradiction { cites: DocumentId },
}

/// One document's place in the authority hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub document_id: DocumentId,
    /// Tier rank, lower is more authoritative
    pub rank: u8,
    pub effective_date: Option<NaiveDate>,
    /// Position within the tier after date ordering, 0-based
    pub tier_position: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub conflicts: Vec<HierarchyConflict>,
}

/// The batch hierarchy model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyModel {
    records: Vec<HierarchyRecord>,
}

impl HierarchyModel {
    /// Build the model for a batch from its documents and the deduplicated
    /// resolved citation view
    pub fn build(documents: &[Document], adjacency: &ResolvedAdjacency) -> Self {
        let ranks: HashMap<&str, u8> = documents
            .iter()
            .map(|d| (d.id.as_str(), d.kind.prior_rank()))
            .collect();
        let dates: HashMap<&str, Option<NaiveDate>> =
            documents.iter().map(|d| (d.id.as_str(), d.date)).collect();

        let cycles = same_tier_cycles(documents, adjacency, &ranks);

        let mut records: Vec<HierarchyRecord> = documents
            .iter()
            .map(|document| {
                let rank = ranks[document.id.as_str()];
                let mut conflicts: Vec<HierarchyConflict> = Vec::new();

                if let Some(peers) = cycles.get(document.id.as_str()) {
                    conflicts.push(HierarchyConflict::Cycle {
                        with: peers.clone(),
                    });
                }

                for cited in adjacency.cited_by(&document.id) {
                    let same_tier = ranks.get(cited.as_str()) == Some(&rank);
                    if !same_tier {
                        continue;
                    }
                    if let (Some(own), Some(Some(their))) =
                        (document.date, dates.get(cited.as_str()))
                    {
                        if own < *their {
                            conflicts.push(HierarchyConflict::DateContradiction {
                                cites: cited.clone(),
                            });
                        }
                    }
                }

                HierarchyRecord {
                    document_id: document.id.clone(),
                    rank,
                    effective_date: document.date,
                    tier_position: 0,
                    conflicts,
                }
            })
            .collect();

        // Within a tier, dated documents order by effective date; undated
        // ones follow in id order so the output stays deterministic
        records.sort_by(|a, b| {
            (a.rank, a.effective_date.is_none(), a.effective_date, &a.document_id).cmp(&(
                b.rank,
                b.effective_date.is_none(),
                b.effective_date,
                &b.document_id,
            ))
        });
        let mut position = 0usize;
        let mut current_rank: Option<u8> = None;
        for record in &mut records {
            if current_rank != Some(record.rank) {
                current_rank = Some(record.rank);
                position = 0;
            }
            record.tier_position = position;
            position += 1;
        }

        HierarchyModel { records }
    }

    pub fn records(&self) -> &[HierarchyRecord] {
        &self.records
    }

    pub fn record(&self, document_id: &str) -> Option<&HierarchyRecord> {
        self.records.iter().find(|r| r.document_id == document_id)
    }

    pub fn conflict_count(&self) -> usize {
        self.records.iter().map(|r| r.conflicts.len()).sum()
    }
}

/// Find citation cycles restricted to same-tier edges.
///
/// Returns, for every document on a cycle, the sorted list of its cycle
/// peers. Uses an iterative strongly-connected-components pass; self-loops
/// cannot occur because the graph drops self-citations.
fn same_tier_cycles(
    documents: &[Document],
    adjacency: &ResolvedAdjacency,
    ranks: &HashMap<&str, u8>,
) -> HashMap<String, Vec<DocumentId>> {
    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    let index_of: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for (from, to) in adjacency.pairs() {
        let (Some(&f), Some(&t)) = (index_of.get(from.as_str()), index_of.get(to.as_str())) else {
            continue;
        };
        if ranks.get(from.as_str()) == ranks.get(to.as_str()) {
            edges[f].push(t);
        }
    }

    // Tarjan's algorithm, iterative to keep the stack bounded
    let n = ids.len();
    let mut index = vec![usize::MAX; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if index[start] != usize::MAX {
            continue;
        }
        // (node, next child offset)
        let mut call_stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(&(v, child)) = call_stack.last() {
            if child == 0 {
                index[v] = next_index;
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            if let Some(&w) = edges[v].get(child) {
                if let Some(frame) = call_stack.last_mut() {
                    frame.1 += 1;
                }
                if index[w] == usize::MAX {
                    call_stack.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
            } else {
                call_stack.pop();
                if let Some(&(parent, _)) = call_stack.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    if component.len() > 1 {
                        components.push(component);
                    }
                }
            }
        }
    }

    let mut cycles = HashMap::new();
    for component in components {
        let mut members: Vec<String> = component.iter().map(|&i| ids[i].to_string()).collect();
        members.sort();
        for member in members.clone() {
            let peers: Vec<String> = members.iter().filter(|m| **m != member).cloned().collect();
            cycles.insert(member, peers);
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citations::CitationExtractor;
    use crate::config::CitationConfig;
    use crate::corpus::DocumentIndex;
    use crate::graph::CrossReferenceGraph;
    use crate::{DocumentKind, SourceFormat};

    fn doc(id: &str, kind: DocumentKind, text: &str, date: Option<&str>) -> Document {
        Document::new(
            id,
            text,
            SourceFormat::Pdf,
            kind,
            date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        )
    }

    fn graph_for(documents: &[Document]) -> ResolvedAdjacency {
        let config = CitationConfig::default();
        let extractor = CitationExtractor::new(&config);
        let index = DocumentIndex::build(documents, &extractor, &config);
        let mut graph = CrossReferenceGraph::new();
        for document in documents {
            for citation in extractor.extract(&document.id, &document.raw_text) {
                graph.add_citation(&citation, &index);
            }
        }
        graph.resolved_adjacency()
    }

    #[test]
    fn ranks_follow_instrument_tiers() {
        let documents = vec![
            doc("const", DocumentKind::Constitution, "THE CONSTITUTION", None),
            doc("act", DocumentKind::Act, "COMPANIES ACT 71 OF 2008", None),
            doc("reg", DocumentKind::Regulation, "GN 1234 of 2011", None),
            doc("case", DocumentKind::Case, "[2012] ZASCA 1", None),
        ];
        let model = HierarchyModel::build(&documents, &ResolvedAdjacency::default());
        assert_eq!(model.record("const").unwrap().rank, 0);
        assert_eq!(model.record("act").unwrap().rank, 1);
        assert_eq!(model.record("reg").unwrap().rank, 2);
        assert_eq!(model.record("case").unwrap().rank, 3);
    }

    #[test]
    fn within_tier_ordering_follows_effective_date() {
        let documents = vec![
            doc("act_b", DocumentKind::Act, "BANKS ACT 94 OF 1990", Some("1991-02-01")),
            doc("act_a", DocumentKind::Act, "COMPANIES ACT 71 OF 2008", Some("2011-05-01")),
            doc("act_c", DocumentKind::Act, "INSOLVENCY ACT 24 OF 1936", None),
        ];
        let model = HierarchyModel::build(&documents, &ResolvedAdjacency::default());
        assert_eq!(model.record("act_b").unwrap().tier_position, 0);
        assert_eq!(model.record("act_a").unwrap().tier_position, 1);
        // Undated documents trail their tier
        assert_eq!(model.record("act_c").unwrap().tier_position, 2);
    }

    #[test]
    fn mutual_same_tier_citation_flags_a_cycle() {
        let documents = vec![
            doc(
                "act_2008_71",
                DocumentKind::Act,
                "COMPANIES ACT 71 OF 2008\n\nAmends the Banks Act 94 of 1990.",
                None,
            ),
            doc(
                "act_1990_94",
                DocumentKind::Act,
                "BANKS ACT 94 OF 1990\n\nSubject to the Companies Act 71 of 2008.",
                None,
            ),
        ];
        let adjacency = graph_for(&documents);
        let model = HierarchyModel::build(&documents, &adjacency);

        // Neither document outranks the other; both carry the cycle conflict
        let a = model.record("act_2008_71").unwrap();
        let b = model.record("act_1990_94").unwrap();
        assert_eq!(a.rank, b.rank);
        assert_eq!(
            a.conflicts,
            vec![HierarchyConflict::Cycle {
                with: vec!["act_1990_94".to_string()]
            }]
        );
        assert_eq!(
            b.conflicts,
            vec![HierarchyConflict::Cycle {
                with: vec!["act_2008_71".to_string()]
            }]
        );
    }

    #[test]
    fn cross_tier_citations_are_not_cycles() {
        let documents = vec![
            doc(
                "act_2008_71",
                DocumentKind::Act,
                "COMPANIES ACT 71 OF 2008",
                None,
            ),
            doc(
                "case_1",
                DocumentKind::Case,
                "SMITH v JONES [2012] ZASCA 3\nApplying the Companies Act 71 of 2008.",
                None,
            ),
        ];
        let adjacency = graph_for(&documents);
        let model = HierarchyModel::build(&documents, &adjacency);
        assert_eq!(model.conflict_count(), 0);
    }

    #[test]
    fn citing_a_later_same_tier_document_is_a_date_contradiction() {
        let documents = vec![
            doc(
                "act_1990_94",
                DocumentKind::Act,
                "BANKS ACT 94 OF 1990\n\nSubject to the Companies Act 71 of 2008.",
                Some("1991-02-01"),
            ),
            doc(
                "act_2008_71",
                DocumentKind::Act,
                "COMPANIES ACT 71 OF 2008",
                Some("2011-05-01"),
            ),
        ];
        let adjacency = graph_for(&documents);
        let model = HierarchyModel::build(&documents, &adjacency);
        assert_eq!(
            model.record("act_1990_94").unwrap().conflicts,
            vec![HierarchyConflict::DateContradiction {
                cites: "act_2008_71".to_string()
            }]
        );
        assert!(model.record("act_2008_71").unwrap().conflicts.is_empty());
    }

    #[test]
    fn three_document_cycle_lists_both_peers() {
        let adjacency = {
            let config = CitationConfig::default();
            let extractor = CitationExtractor::new(&config);
            let documents = [
                doc("a", DocumentKind::Act, "ALPHA ACT 1 OF 2000\n\nSee the Beta Act 2 of 2000.", None),
                doc("b", DocumentKind::Act, "BETA ACT 2 OF 2000\n\nSee the Gamma Act 3 of 2000.", None),
                doc("c", DocumentKind::Act, "GAMMA ACT 3 OF 2000\n\nSee the Alpha Act 1 of 2000.", None),
            ];
            let index = DocumentIndex::build(&documents, &extractor, &config);
            let mut graph = CrossReferenceGraph::new();
            for document in &documents {
                for citation in extractor.extract(&document.id, &document.raw_text) {
                    graph.add_citation(&citation, &index);
                }
            }
            graph.resolved_adjacency()
        };
        let documents = vec![
            doc("a", DocumentKind::Act, "ALPHA ACT 1 OF 2000", None),
            doc("b", DocumentKind::Act, "BETA ACT 2 OF 2000", None),
            doc("c", DocumentKind::Act, "GAMMA ACT 3 OF 2000", None),
        ];
        let model = HierarchyModel::build(&documents, &adjacency);
        assert_eq!(
            model.record("a").unwrap().conflicts,
            vec![HierarchyConflict::Cycle {
                with: vec!["b".to_string(), "c".to_string()]
            }]
        );
    }
}
