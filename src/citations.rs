//! # Citation Extraction Module
//!
//! ## Purpose
//! Parses legal citation strings out of raw South African legal text using a
//! prioritized list of independent matcher strategies. New citation formats
//! are added by appending a matcher, not by modifying existing ones.
//!
//! ## Input/Output Specification
//! - **Input**: Raw document text
//! - **Output**: Ordered sequence of `Citation` records (document order, not
//!   deduplicated — repeated citations keep their distinct spans)
//! - **Layers**: case citations > statutes > regulations/gazette > bare
//!   section references
//!
//! ## Matching Policy
//! Overlapping matches are resolved by preferring the longest span, then the
//! earliest layer as a deterministic tie-break. Canonical forms collapse
//! whitespace, expand `s` to `section` and upper-case court codes.
//! Confidence is 1.0 for complete structural matches and degrades when
//! optional fields (court code, year) are absent. Citation-like fragments
//! with no resolvable shape ("the Act" alone) are never emitted — recall is
//! intentionally bounded to keep noise out of the cross-reference graph.
//!
//! Extraction never fails on malformed input; no matches yields an empty
//! sequence.

use crate::config::CitationConfig;
use crate::utils::collapse_whitespace;
use crate::{DocumentId, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a citation points at, assigned by the matching layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Case,
    Act,
    Section,
    Regulation,
    Unresolved,
}

/// A citation extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Document the citation appears in
    pub document_id: DocumentId,
    /// Byte span of the matched text
    pub span: Span,
    /// Text as matched
    pub raw_text: String,
    /// Which pattern layer matched
    pub target_type: TargetType,
    /// Normalized form used for matching and deduplication
    pub canonical_form: String,
    /// 1.0 for complete structural matches, degraded otherwise
    pub confidence: f64,
}

impl Citation {
    /// Canonical form with any trailing `, section N` stripped, used when
    /// resolving a citation to its target act
    pub fn base_canonical(&self) -> &str {
        match self.canonical_form.find(", section ") {
            Some(idx) => &self.canonical_form[..idx],
            None => &self.canonical_form,
        }
    }
}

/// A candidate produced by one matcher before overlap resolution
#[derive(Debug, Clone)]
pub struct CitationMatch {
    pub span: Span,
    pub target_type: TargetType,
    pub canonical_form: String,
    pub confidence: f64,
}

/// A single citation pattern strategy: match spans, produce typed results
pub trait CitationMatcher: Send + Sync {
    /// Name for logging and diagnostics
    fn name(&self) -> &'static str;

    /// All candidate matches in the text, in any order
    fn find(&self, text: &str) -> Vec<CitationMatch>;
}

/// Case citations: reporter style `2008 (2) SA 232 (SCA)` (also covers the
/// BCLR series) and neutral style `[2008] ZASCA 10`
pub struct CaseCitationMatcher {
    reporter: Regex,
    neutral: Regex,
    partial_confidence: f64,
}

impl CaseCitationMatcher {
    pub fn new(partial_confidence: f64) -> Self {
        Self {
            reporter: Regex::new(
                r"\b(\d{4})\s*\(\s*(\d+)\s*\)\s*([A-Z]{2,6})\s+(\d+)(?:\s*\(([A-Za-z]{1,6})\))?",
            )
            .expect("reporter citation pattern"),
            neutral: Regex::new(r"\[(\d{4})\]\s*([A-Z]{2,10})\s+(\d+)\b")
                .expect("neutral citation pattern"),
            partial_confidence,
        }
    }
}

impl CitationMatcher for CaseCitationMatcher {
    fn name(&self) -> &'static str {
        "case"
    }

    fn find(&self, text: &str) -> Vec<CitationMatch> {
        let mut matches = Vec::new();

        for caps in self.reporter.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            let year = &caps[1];
            let part = &caps[2];
            let series = caps[3].to_uppercase();
            let page = &caps[4];
            let court = caps.get(5).map(|m| m.as_str().to_uppercase());

            let (canonical_form, confidence) = match &court {
                Some(court) => (
                    format!("{} ({}) {} {} ({})", year, part, series, page, court),
                    1.0,
                ),
                None => (
                    format!("{} ({}) {} {}", year, part, series, page),
                    self.partial_confidence,
                ),
            };

            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Case,
                canonical_form,
                confidence,
            });
        }

        for caps in self.neutral.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Case,
                canonical_form: format!("[{}] {} {}", &caps[1], caps[2].to_uppercase(), &caps[3]),
                confidence: 1.0,
            });
        }

        matches
    }
}

/// Statute citations: `NAME Act NUMBER of YEAR`, with an optional section
/// reference either prefixed (`section 4 of the Companies Act 71 of 2008`)
/// or suffixed (`Companies Act 71 of 2008, section 4`)
pub struct StatuteCitationMatcher {
    section_of_act: Regex,
    act_with_suffix: Regex,
    bare_act: Regex,
    partial_confidence: f64,
}

/// Sub-pattern for a section number like `25`, `12B` or `4(1)(a)`
const SECTION_NUM: &str = r"\d+[A-Za-z]?(?:\([0-9a-zA-Z]+\))*";
/// Sub-pattern for an act name: capitalized words, allowing connectives.
/// Gazetted headers print act names in full caps, so `ACT`/`OF` are accepted
const ACT_NAME: &str =
    r"[A-Z][A-Za-z'\-]*(?:\s+(?:of|to|and|for|on|in|OF|TO|AND|FOR|ON|IN|[A-Z][A-Za-z'\-]*))*?\s+(?:Act|ACT)";
/// Sub-pattern for the `NUMBER of YEAR` tail of a statute citation
const ACT_NUMBER: &str = r"(?:No\.?\s*|NO\.?\s*)?(\d+)\s+(?:of|OF)\s+(\d{4})";

impl StatuteCitationMatcher {
    pub fn new(partial_confidence: f64) -> Self {
        let section_of_act = Regex::new(&format!(
            r"\b[Ss](?:ection)?\.?\s*({sec})\s+of\s+(?:[Tt]he\s+)?({name})\s+{num}",
            sec = SECTION_NUM,
            name = ACT_NAME,
            num = ACT_NUMBER,
        ))
        .expect("section-of-act pattern");

        let act_with_suffix = Regex::new(&format!(
            r"\b({name})\s+{num}(?:\s*,\s*[Ss](?:ection)?\.?\s*({sec}))?",
            sec = SECTION_NUM,
            name = ACT_NAME,
            num = ACT_NUMBER,
        ))
        .expect("act-with-suffix pattern");

        let bare_act = Regex::new(&format!(r"\b(?:Act|ACT)\s+{num}", num = ACT_NUMBER))
            .expect("bare act pattern");

        Self {
            section_of_act,
            act_with_suffix,
            bare_act,
            partial_confidence,
        }
    }

    fn canonical_act(name: &str, number: &str, year: &str, section: Option<&str>) -> String {
        let mut name = collapse_whitespace(name);
        // Drop a leading article picked up by the name pattern
        for article in ["The ", "A "] {
            if let Some(stripped) = name.strip_prefix(article) {
                name = stripped.to_string();
                break;
            }
        }
        match section {
            Some(sec) => format!("{} {} of {}, section {}", name, number, year, sec),
            None => format!("{} {} of {}", name, number, year),
        }
    }
}

impl CitationMatcher for StatuteCitationMatcher {
    fn name(&self) -> &'static str {
        "statute"
    }

    fn find(&self, text: &str) -> Vec<CitationMatch> {
        let mut matches = Vec::new();

        for caps in self.section_of_act.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Act,
                canonical_form: Self::canonical_act(&caps[2], &caps[3], &caps[4], Some(&caps[1])),
                confidence: 1.0,
            });
        }

        for caps in self.act_with_suffix.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            let section = caps.get(4).map(|m| m.as_str());
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Act,
                canonical_form: Self::canonical_act(&caps[1], &caps[2], &caps[3], section),
                confidence: 1.0,
            });
        }

        // `Act 108 of 1996` with no act name: core pattern present, name
        // missing, so the confidence degrades
        for caps in self.bare_act.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Act,
                canonical_form: format!("Act {} of {}", &caps[1], &caps[2]),
                confidence: self.partial_confidence,
            });
        }

        matches
    }
}

/// Government notices and gazette references: `Government Notice 1234 of
/// 2009`, `GN 1234`, `GG 4321`
pub struct RegulationCitationMatcher {
    notice: Regex,
    gazette: Regex,
    partial_confidence: f64,
}

impl RegulationCitationMatcher {
    pub fn new(partial_confidence: f64) -> Self {
        Self {
            notice: Regex::new(
                r"\b(?:Government\s+Notice|GN)\s*(?:No\.?\s*)?(\d+)(?:\s+of\s+(\d{4}))?",
            )
            .expect("government notice pattern"),
            gazette: Regex::new(r"\b(?:Government\s+Gazette|GG)\s*(?:No\.?\s*)?(\d+)\b")
                .expect("gazette pattern"),
            partial_confidence,
        }
    }
}

impl CitationMatcher for RegulationCitationMatcher {
    fn name(&self) -> &'static str {
        "regulation"
    }

    fn find(&self, text: &str) -> Vec<CitationMatch> {
        let mut matches = Vec::new();

        for caps in self.notice.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            let (canonical_form, confidence) = match caps.get(2) {
                Some(year) => (
                    format!("Government Notice {} of {}", &caps[1], year.as_str()),
                    1.0,
                ),
                None => (
                    format!("Government Notice {}", &caps[1]),
                    self.partial_confidence,
                ),
            };
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Regulation,
                canonical_form,
                confidence,
            });
        }

        for caps in self.gazette.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            matches.push(CitationMatch {
                span: Span::new(whole.start(), whole.end()),
                target_type: TargetType::Regulation,
                canonical_form: format!("Government Gazette {}", &caps[1]),
                confidence: self.partial_confidence,
            });
        }

        matches
    }
}

/// Bare section references with no act name in the span: `section 25(b)`,
/// `s 25(b)`. Lowest layer, so a section attached to an act citation is
/// always claimed by the statute matcher first.
pub struct SectionReferenceMatcher {
    section: Regex,
    partial_confidence: f64,
}

impl SectionReferenceMatcher {
    pub fn new(partial_confidence: f64) -> Self {
        Self {
            section: Regex::new(&format!(
                r"\b[Ss](?:ection)?\.?\s+({sec})",
                sec = SECTION_NUM
            ))
            .expect("section reference pattern"),
            partial_confidence,
        }
    }
}

impl CitationMatcher for SectionReferenceMatcher {
    fn name(&self) -> &'static str {
        "section"
    }

    fn find(&self, text: &str) -> Vec<CitationMatch> {
        self.section
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).expect("group 0");
                CitationMatch {
                    span: Span::new(whole.start(), whole.end()),
                    target_type: TargetType::Section,
                    canonical_form: format!("section {}", &caps[1]),
                    confidence: self.partial_confidence,
                }
            })
            .collect()
    }
}

/// Layered citation extractor over all matcher strategies
pub struct CitationExtractor {
    matchers: Vec<Box<dyn CitationMatcher>>,
}

impl CitationExtractor {
    pub fn new(config: &CitationConfig) -> Self {
        let partial = config.partial_match_confidence;
        Self {
            matchers: vec![
                Box::new(CaseCitationMatcher::new(partial)),
                Box::new(StatuteCitationMatcher::new(partial)),
                Box::new(RegulationCitationMatcher::new(partial)),
                Box::new(SectionReferenceMatcher::new(partial)),
            ],
        }
    }

    /// Extract citations from a document's text, in document order.
    ///
    /// Overlapping candidates are resolved by longest span, then earliest
    /// layer. Duplicate citations at distinct spans are all retained.
    pub fn extract(&self, document_id: &str, text: &str) -> Vec<Citation> {
        let mut candidates: Vec<(usize, CitationMatch)> = Vec::new();
        for (layer, matcher) in self.matchers.iter().enumerate() {
            for m in matcher.find(text) {
                candidates.push((layer, m));
            }
        }

        // Longest span first; layer order breaks ties deterministically
        candidates.sort_by(|(la, a), (lb, b)| {
            b.span
                .len()
                .cmp(&a.span.len())
                .then(la.cmp(lb))
                .then(a.span.start.cmp(&b.span.start))
        });

        let mut accepted: Vec<CitationMatch> = Vec::new();
        for (_, candidate) in candidates {
            if accepted.iter().all(|a| !a.span.overlaps(&candidate.span)) {
                accepted.push(candidate);
            }
        }

        accepted.sort_by_key(|m| m.span.start);

        accepted
            .into_iter()
            .map(|m| Citation {
                document_id: document_id.to_string(),
                raw_text: text[m.span.start..m.span.end].to_string(),
                span: m.span,
                target_type: m.target_type,
                canonical_form: m.canonical_form,
                confidence: m.confidence,
            })
            .collect()
    }
}
