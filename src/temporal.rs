//! # Temporal Version Tracking Module
//!
//! ## Purpose
//! Groups acts and their amendment acts into version chains per base
//! instrument, orders versions by effective date, and answers point-in-time
//! queries about which version was in force.
//!
//! ## Input/Output Specification
//! - **Input**: Batch documents, the identity index, and the citation graph
//! - **Output**: One `VersionChain` per base act, plus `version_in_force`
//!   lookups
//! - **Completeness**: A chain is `Incomplete` when amendment citations in
//!   the corpus have no matching version document, or when two versions share
//!   an effective date (the later-ingested one is dropped)
//!
//! Chains never reorder on query: `version_in_force` is a pure read over the
//! model built at aggregation time.

use crate::corpus::DocumentIndex;
use crate::errors::{ProcessError, Result};
use crate::graph::{CrossReferenceGraph, Reference};
use crate::{Document, DocumentId, DocumentKind};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One version of an instrument, either the principal act or an amendment act
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActVersion {
    pub document_id: DocumentId,
    /// Canonical citation of this version, e.g. `Companies Amendment Act 3 of 2011`
    pub canonical: String,
    pub effective_date: NaiveDate,
    /// Canonicals this version cites within its own chain, i.e. what it amends
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amendment_refs: Vec<String>,
    /// Next version in the chain, if any
    pub superseded_by: Option<DocumentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    Complete,
    Incomplete,
}

/// The version history of one base instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionChain {
    /// Base instrument name with amendment markers stripped,
    /// e.g. `Companies Act`
    pub identity: String,
    pub versions: Vec<ActVersion>,
    pub status: ChainStatus,
    /// Canonicals of amendment citations with no matching version document
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing: Vec<String>,
}

/// Version chains for a batch, keyed by lowercased base identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalModel {
    chains: BTreeMap<String, VersionChain>,
}

struct ParsedAct {
    name: String,
    year: i32,
}

/// Builds the temporal model; holds the compiled act-canonical pattern
pub struct TemporalModeler {
    act_pattern: Regex,
}

impl TemporalModeler {
    pub fn new() -> Self {
        Self {
            // Matches canonical act forms produced by the citation extractor
            act_pattern: Regex::new(r"^(.+?)\s+(\d+)\s+(?:of|OF)\s+(\d{4})$")
                .expect("static pattern"),
        }
    }

    /// Build the model for a batch
    pub fn build(
        &self,
        documents: &[Document],
        index: &DocumentIndex,
        graph: &CrossReferenceGraph,
    ) -> TemporalModel {
        let mut chains: BTreeMap<String, VersionChain> = BTreeMap::new();

        // Documents are walked in ingest order so duplicate-date resolution
        // keeps the earlier-ingested version
        for document in documents {
            if !matches!(
                document.kind,
                DocumentKind::Act | DocumentKind::Constitution
            ) {
                continue;
            }
            let Some((canonical, parsed)) = self.primary_act_identity(document, index) else {
                continue;
            };
            let effective_date = document.date.unwrap_or_else(|| {
                NaiveDate::from_ymd_opt(parsed.year, 1, 1).unwrap_or_default()
            });
            let base = base_name(&parsed.name);
            let chain = chains
                .entry(base.to_lowercase())
                .or_insert_with(|| VersionChain {
                    identity: base.clone(),
                    versions: Vec::new(),
                    status: ChainStatus::Complete,
                    missing: Vec::new(),
                });

            if chain
                .versions
                .iter()
                .any(|v| v.effective_date == effective_date)
            {
                tracing::warn!(
                    identity = %chain.identity,
                    document_id = %document.id,
                    date = %effective_date,
                    "duplicate effective date, dropping later-ingested version"
                );
                chain.status = ChainStatus::Incomplete;
                continue;
            }

            chain.versions.push(ActVersion {
                document_id: document.id.clone(),
                canonical,
                effective_date,
                amendment_refs: Vec::new(),
                superseded_by: None,
            });
        }

        // A version's amendment refs are its own citations into the chain:
        // the instrument text it amends
        for (base_key, chain) in chains.iter_mut() {
            for version in chain.versions.iter_mut() {
                for edge in graph.edges() {
                    if edge.from != version.document_id {
                        continue;
                    }
                    let Some(parsed) = self.parse_act(&edge.canonical_form) else {
                        continue;
                    };
                    if base_name(&parsed.name).to_lowercase() == *base_key
                        && !version.amendment_refs.contains(&edge.canonical_form)
                    {
                        version.amendment_refs.push(edge.canonical_form.clone());
                    }
                }
            }
        }

        for chain in chains.values_mut() {
            chain.versions.sort_by_key(|v| v.effective_date);
            let successors: Vec<Option<DocumentId>> = chain
                .versions
                .iter()
                .skip(1)
                .map(|v| Some(v.document_id.clone()))
                .chain(std::iter::once(None))
                .collect();
            for (version, successor) in chain.versions.iter_mut().zip(successors) {
                version.superseded_by = successor;
            }
        }

        // Amendment citations that resolved to nothing mark their base
        // chain incomplete
        for edge in graph.edges() {
            let Reference::Dangling(canonical) = &edge.to else {
                continue;
            };
            let Some(parsed) = self.parse_act(canonical) else {
                continue;
            };
            if !is_amendment(&parsed.name) {
                continue;
            }
            let base_key = base_name(&parsed.name).to_lowercase();
            if let Some(chain) = chains.get_mut(&base_key) {
                chain.status = ChainStatus::Incomplete;
                if !chain.missing.contains(canonical) {
                    chain.missing.push(canonical.clone());
                }
            }
        }

        TemporalModel { chains }
    }

    /// The first act-shaped identity the index derived for a document
    fn primary_act_identity(
        &self,
        document: &Document,
        index: &DocumentIndex,
    ) -> Option<(String, ParsedAct)> {
        index
            .identities_of(&document.id)
            .iter()
            .find_map(|identity| {
                self.parse_act(identity)
                    .map(|parsed| (identity.clone(), parsed))
            })
    }

    fn parse_act(&self, canonical: &str) -> Option<ParsedAct> {
        let captures = self.act_pattern.captures(canonical)?;
        let name = captures.get(1)?.as_str().to_string();
        let year: i32 = captures.get(3)?.as_str().parse().ok()?;
        Some(ParsedAct { name, year })
    }
}

impl Default for TemporalModeler {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalModel {
    pub fn chains(&self) -> impl Iterator<Item = &VersionChain> {
        self.chains.values()
    }

    pub fn chain(&self, identity: &str) -> Option<&VersionChain> {
        self.chains.get(&identity.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// The version of `identity` in force on `as_of`, with the chain's
    /// completeness status alongside.
    ///
    /// Errors when the chain is unknown or no version had yet commenced. An
    /// `Incomplete` chain still answers best-effort; the returned status
    /// tells the caller the chain has gaps.
    pub fn version_in_force(
        &self,
        identity: &str,
        as_of: NaiveDate,
    ) -> Result<(&ActVersion, ChainStatus)> {
        let not_found = || ProcessError::VersionNotFound {
            identity: identity.to_string(),
            as_of: as_of.to_string(),
        };
        let chain = self.chain(identity).ok_or_else(not_found)?;
        chain
            .versions
            .iter()
            .rev()
            .find(|v| v.effective_date <= as_of)
            .map(|v| (v, chain.status))
            .ok_or_else(not_found)
    }
}

fn is_amendment(name: &str) -> bool {
    name.split_whitespace()
        .any(|w| w.eq_ignore_ascii_case("amendment"))
}

/// Strip amendment markers from an act name, e.g.
/// `Companies Amendment Act` becomes `Companies Act`
fn base_name(name: &str) -> String {
    name.split_whitespace()
        .filter(|w| !w.eq_ignore_ascii_case("amendment"))
        .collect::<Vec<_>>()
        .join(" ")
}
