//! # Document Structure Module
//!
//! ## Purpose
//! Segments a legal document into a tree of structural nodes: chapters,
//! sections, subsections, definitions and preamble for legislation; header
//! and canonical body sections (introduction, facts, issues, analysis,
//! order) for judgments.
//!
//! ## Input/Output Specification
//! - **Input**: Raw document text plus its `DocumentKind`
//! - **Output**: `DocumentStructure` with nested nodes, definition entries
//!   and judgment section boundaries
//! - **Degradation**: A document with no recognizable structure yields a
//!   single flat `unclassified` node spanning the whole text — never an error
//!
//! ## Numbering Tie-Break
//! When a file mixes numbering styles (`1.` and `(1)`), the first scheme
//! encountered anchors the section level and departures nest as sub-levels
//! instead of restarting the hierarchy.

use crate::utils::trim_span;
use crate::{DocumentId, DocumentKind, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structural node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Chapter,
    Section,
    Subsection,
    Definition,
    Preamble,
    JudgmentHeader,
    JudgmentBody,
    Unclassified,
}

/// A node in the structural tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureNode {
    /// Heading text, where the node has one
    pub heading: Option<String>,
    /// Depth in the tree, 0 at the top
    pub level: u8,
    /// Byte span the node covers, including its children
    pub span: Span,
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructureNode>,
}

/// A `(term, definition_text)` pair from a definitions block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionEntry {
    pub term: String,
    pub definition: String,
    pub span: Span,
}

/// Canonical judgment sections used downstream to bound reasoning spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentSectionKind {
    Introduction,
    Facts,
    Issues,
    Analysis,
    Order,
}

/// One detected judgment section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentSection {
    pub kind: JudgmentSectionKind,
    pub heading: String,
    pub span: Span,
}

/// Judgment-specific boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentStructure {
    /// Case name, court and appearance block before the body
    pub header_span: Option<Span>,
    /// The reasoning-bearing body of the judgment
    pub body_span: Span,
    /// Canonical sections detected inside the body
    pub sections: Vec<JudgmentSection>,
}

impl JudgmentStructure {
    /// Span of the order/conclusion section, when one was detected
    pub fn order_span(&self) -> Option<Span> {
        self.sections
            .iter()
            .find(|s| s.kind == JudgmentSectionKind::Order)
            .map(|s| s.span)
    }
}

/// Full structural analysis of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub document_id: DocumentId,
    /// Top-level structural nodes in document order
    pub nodes: Vec<StructureNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<DefinitionEntry>,
    /// Present only for documents recognized as judgments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<JudgmentStructure>,
}

impl DocumentStructure {
    pub fn is_judgment(&self) -> bool {
        self.judgment.is_some()
    }

    fn flat(document_id: &str, text_len: usize) -> Self {
        Self {
            document_id: document_id.to_string(),
            nodes: vec![StructureNode {
                heading: None,
                level: 0,
                span: Span::new(0, text_len),
                node_type: NodeType::Unclassified,
                children: Vec::new(),
            }],
            definitions: Vec::new(),
            judgment: None,
        }
    }
}

/// Which numbering style a marker line uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberingScheme {
    /// `1.` / `Section 2`
    Dotted,
    /// `(1)`
    ParenNumber,
    /// `(a)`
    ParenLetter,
}

#[derive(Debug)]
struct Marker {
    offset: usize,
    node_type: NodeType,
    level: u8,
    heading: String,
}

/// Structure analyzer over legislation and judgments
pub struct StructureAnalyzer {
    chapter: Regex,
    preamble: Regex,
    dotted_section: Regex,
    named_section: Regex,
    paren_number: Regex,
    paren_letter: Regex,
    definitions_heading: Regex,
    definition_entry: Regex,
    judgment_heading: Regex,
    numbered_judgment_para: Regex,
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self {
            chapter: Regex::new(r"^CHAPTER\s+([IVXLCDM]+|\d+)").expect("chapter pattern"),
            preamble: Regex::new(r"^PREAMBLE\b").expect("preamble pattern"),
            dotted_section: Regex::new(r"^(\d+)\.\s+(.*)").expect("dotted section pattern"),
            named_section: Regex::new(r"^Section\s+(\d+)\b\s*(.*)").expect("named section pattern"),
            paren_number: Regex::new(r"^\((\d+)\)\s*(.*)").expect("paren number pattern"),
            paren_letter: Regex::new(r"^\(([a-z])\)\s*(.*)").expect("paren letter pattern"),
            definitions_heading: Regex::new(r"(?i)^(definitions|interpretation)\b")
                .expect("definitions heading pattern"),
            definition_entry: Regex::new(r#"^["“]([^"”]+)["”]\s+means\s+(.+)"#)
                .expect("definition entry pattern"),
            judgment_heading: Regex::new(
                r"(?i)^(introduction|facts|background|the\s+facts|issues?|analysis|reasoning|discussion|evaluation|order|conclusion|disposition)\b",
            )
            .expect("judgment heading pattern"),
            numbered_judgment_para: Regex::new(r"^\[\d+\]").expect("judgment paragraph pattern"),
        }
    }

    /// Segment a document. Judgments (kind `Case`) go through the judgment
    /// path; everything else is parsed as legislation first.
    pub fn analyze(&self, document_id: &str, text: &str, kind: DocumentKind) -> DocumentStructure {
        if text.trim().is_empty() {
            return DocumentStructure::flat(document_id, text.len());
        }
        match kind {
            DocumentKind::Case => self.analyze_judgment(document_id, text),
            _ => self.analyze_legislation(document_id, text),
        }
    }

    fn analyze_legislation(&self, document_id: &str, text: &str) -> DocumentStructure {
        let mut markers: Vec<Marker> = Vec::new();
        let mut definitions: Vec<DefinitionEntry> = Vec::new();
        let mut first_scheme: Option<NumberingScheme> = None;
        let mut in_definitions_block = false;

        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let trimmed = line.trim();
            let line_start = offset + (line.len() - line.trim_start().len());
            let line_end = line_start + trimmed.len();
            offset += line.len();
            if trimmed.is_empty() {
                continue;
            }

            if self.preamble.is_match(trimmed) {
                in_definitions_block = false;
                markers.push(Marker {
                    offset: line_start,
                    node_type: NodeType::Preamble,
                    level: 0,
                    heading: trimmed.to_string(),
                });
                continue;
            }

            if self.chapter.is_match(trimmed) {
                in_definitions_block = false;
                markers.push(Marker {
                    offset: line_start,
                    node_type: NodeType::Chapter,
                    level: 0,
                    heading: trimmed.to_string(),
                });
                continue;
            }

            if let Some(caps) = self.definition_entry.captures(trimmed) {
                if in_definitions_block {
                    definitions.push(DefinitionEntry {
                        term: caps[1].to_string(),
                        definition: caps[2].trim().to_string(),
                        span: trim_span(text, Span::new(line_start, line_end)),
                    });
                    markers.push(Marker {
                        offset: line_start,
                        node_type: NodeType::Definition,
                        level: 2,
                        heading: caps[1].to_string(),
                    });
                    continue;
                }
            }

            let scheme = if self.dotted_section.is_match(trimmed)
                || self.named_section.is_match(trimmed)
            {
                Some(NumberingScheme::Dotted)
            } else if self.paren_number.is_match(trimmed) {
                Some(NumberingScheme::ParenNumber)
            } else if self.paren_letter.is_match(trimmed) {
                Some(NumberingScheme::ParenLetter)
            } else {
                None
            };

            if let Some(scheme) = scheme {
                // The first scheme seen anchors the section level; a
                // departing scheme nests beneath it rather than resetting
                // the hierarchy
                let anchor = *first_scheme.get_or_insert(scheme);
                let (node_type, level) = if scheme == anchor {
                    (NodeType::Section, 1)
                } else if scheme == NumberingScheme::ParenLetter {
                    (NodeType::Subsection, 3)
                } else {
                    (NodeType::Subsection, 2)
                };

                let heading = trimmed.to_string();
                if self.definitions_heading_in(&heading) {
                    in_definitions_block = true;
                } else if node_type == NodeType::Section {
                    in_definitions_block = false;
                }

                markers.push(Marker {
                    offset: line_start,
                    node_type,
                    level,
                    heading,
                });
                continue;
            }

            if self.definitions_heading.is_match(trimmed) {
                in_definitions_block = true;
                markers.push(Marker {
                    offset: line_start,
                    node_type: NodeType::Section,
                    level: 1,
                    heading: trimmed.to_string(),
                });
            }
        }

        if markers.is_empty() {
            tracing::debug!(document_id, "no recognizable structure, flat node");
            return DocumentStructure::flat(document_id, text.len());
        }

        let nodes = Self::build_tree(&markers, text.len());
        DocumentStructure {
            document_id: document_id.to_string(),
            nodes,
            definitions,
            judgment: None,
        }
    }

    fn definitions_heading_in(&self, heading: &str) -> bool {
        // Section headings like `1. Definitions` open a definitions block
        heading
            .split_whitespace()
            .nth(1)
            .map(|word| self.definitions_heading.is_match(word))
            .unwrap_or(false)
    }

    /// Convert flat markers into a nested tree. A node's span runs from its
    /// marker to the next marker at the same or a shallower level.
    fn build_tree(markers: &[Marker], text_len: usize) -> Vec<StructureNode> {
        let mut nodes: Vec<StructureNode> = Vec::new();
        let mut stack: Vec<StructureNode> = Vec::new();

        fn close_levels(
            stack: &mut Vec<StructureNode>,
            nodes: &mut Vec<StructureNode>,
            level: u8,
            end: usize,
        ) {
            while stack
                .last()
                .map(|node| node.level >= level)
                .unwrap_or(false)
            {
                let mut node = stack.pop().expect("non-empty stack");
                node.span.end = end;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => nodes.push(node),
                }
            }
        }

        for (i, marker) in markers.iter().enumerate() {
            let span_end = markers
                .get(i + 1)
                .map(|next| next.offset)
                .unwrap_or(text_len);
            close_levels(&mut stack, &mut nodes, marker.level, marker.offset);
            stack.push(StructureNode {
                heading: Some(marker.heading.clone()),
                level: marker.level,
                span: Span::new(marker.offset, span_end),
                node_type: marker.node_type,
                children: Vec::new(),
            });
        }
        close_levels(&mut stack, &mut nodes, 0, text_len);

        nodes
    }

    fn analyze_judgment(&self, document_id: &str, text: &str) -> DocumentStructure {
        // The header runs until the first canonical heading or the first
        // numbered judgment paragraph `[1]`
        let mut body_start: Option<usize> = None;
        let mut headings: Vec<(usize, usize, JudgmentSectionKind, String)> = Vec::new();

        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let trimmed = line.trim();
            let line_start = offset + (line.len() - line.trim_start().len());
            offset += line.len();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(kind) = self.classify_judgment_heading(trimmed) {
                headings.push((
                    line_start,
                    line_start + trimmed.len(),
                    kind,
                    trimmed.to_string(),
                ));
                body_start.get_or_insert(line_start);
            } else if self.numbered_judgment_para.is_match(trimmed) {
                body_start.get_or_insert(line_start);
            }
        }

        let body_start = body_start.unwrap_or(0);
        let body_span = Span::new(body_start, text.len());
        let header_span = if body_start > 0 {
            Some(trim_span(text, Span::new(0, body_start)))
        } else {
            None
        };

        // Each section runs to the start of the next heading
        let mut sections = Vec::new();
        for (i, (start, _, kind, heading)) in headings.iter().enumerate() {
            let end = headings
                .get(i + 1)
                .map(|(next_start, _, _, _)| *next_start)
                .unwrap_or(text.len());
            sections.push(JudgmentSection {
                kind: *kind,
                heading: heading.clone(),
                span: Span::new(*start, end),
            });
        }

        let mut nodes = Vec::new();
        if let Some(header) = header_span {
            nodes.push(StructureNode {
                heading: None,
                level: 0,
                span: header,
                node_type: NodeType::JudgmentHeader,
                children: Vec::new(),
            });
        }
        nodes.push(StructureNode {
            heading: None,
            level: 0,
            span: body_span,
            node_type: NodeType::JudgmentBody,
            children: sections
                .iter()
                .map(|s| StructureNode {
                    heading: Some(s.heading.clone()),
                    level: 1,
                    span: s.span,
                    node_type: NodeType::Section,
                    children: Vec::new(),
                })
                .collect(),
        });

        DocumentStructure {
            document_id: document_id.to_string(),
            nodes,
            definitions: Vec::new(),
            judgment: Some(JudgmentStructure {
                header_span,
                body_span,
                sections,
            }),
        }
    }

    /// Heading heuristic: a short line matching a canonical judgment-section
    /// keyword, either upper-case or standing alone
    fn classify_judgment_heading(&self, line: &str) -> Option<JudgmentSectionKind> {
        if line.len() > 60 {
            return None;
        }
        let stripped = line.trim_end_matches(':');
        let caps = self.judgment_heading.captures(stripped)?;
        let looks_like_heading =
            stripped.chars().filter(|c| c.is_lowercase()).count() == 0 || stripped.split_whitespace().count() <= 4;
        if !looks_like_heading {
            return None;
        }
        let keyword = caps[1].to_lowercase();
        let kind = match keyword.as_str() {
            "introduction" => JudgmentSectionKind::Introduction,
            "facts" | "background" => JudgmentSectionKind::Facts,
            s if s.starts_with("the") => JudgmentSectionKind::Facts,
            "issue" | "issues" => JudgmentSectionKind::Issues,
            "analysis" | "reasoning" | "discussion" | "evaluation" => JudgmentSectionKind::Analysis,
            "order" | "conclusion" | "disposition" => JudgmentSectionKind::Order,
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> StructureAnalyzer {
        StructureAnalyzer::new()
    }

    const ACT_TEXT: &str = "\
CHAPTER I
1. Definitions
\"bank\" means a public company registered as a bank.
\"deposit\" means an amount of money paid by one person to another.
2. Application of Act
(1) This Act applies to all banks.
(a) including mutual banks;
3. Administration
The Registrar administers this Act.
";

    #[test]
    fn legislation_tree_with_definitions() {
        let s = analyzer().analyze("banks_act", ACT_TEXT, DocumentKind::Act);
        assert!(!s.is_judgment());

        assert_eq!(s.nodes.len(), 1);
        let chapter = &s.nodes[0];
        assert_eq!(chapter.node_type, NodeType::Chapter);
        assert_eq!(chapter.children.len(), 3);
        assert!(chapter
            .children
            .iter()
            .all(|n| n.node_type == NodeType::Section));

        assert_eq!(s.definitions.len(), 2);
        assert_eq!(s.definitions[0].term, "bank");
        assert!(s.definitions[0]
            .definition
            .starts_with("a public company"));
    }

    #[test]
    fn first_numbering_scheme_anchors_levels() {
        // `1.` seen first, so `(1)` and `(a)` nest below sections
        let s = analyzer().analyze("banks_act", ACT_TEXT, DocumentKind::Act);
        let application = &s.nodes[0].children[1];
        assert_eq!(application.heading.as_deref(), Some("2. Application of Act"));
        assert!(!application.children.is_empty());
        assert!(application
            .children
            .iter()
            .all(|n| n.node_type == NodeType::Subsection || n.node_type == NodeType::Definition));
    }

    #[test]
    fn paren_first_document_keeps_paren_as_section_level() {
        let text = "(1) First provision applies.\n(2) Second provision applies.\n1. A departure.\n";
        let s = analyzer().analyze("odd_act", text, DocumentKind::Act);
        let top: Vec<_> = s.nodes.iter().filter(|n| n.level == 1).collect();
        // `(1)` style anchored at section level; the dotted line nests
        assert_eq!(s.nodes[0].node_type, NodeType::Section);
        assert!(top.len() >= 2 || !s.nodes[0].children.is_empty() || s.nodes.len() >= 2);
    }

    #[test]
    fn unstructured_text_degrades_to_flat_node() {
        let text = "Just prose with no numbering or headings at all.";
        let s = analyzer().analyze("memo", text, DocumentKind::Other);
        assert_eq!(s.nodes.len(), 1);
        assert_eq!(s.nodes[0].node_type, NodeType::Unclassified);
        assert_eq!(s.nodes[0].span, Span::new(0, text.len()));
    }

    const JUDGMENT_TEXT: &str = "\
CASE NO 123/2020
SMITH v THE STATE
High Court of South Africa

INTRODUCTION
[1] This is an appeal against conviction.

FACTS
[2] The appellant was arrested in 2019.

ANALYSIS
[3] The evidence does not support the conviction.

ORDER
[4] It follows that the appeal must succeed.
";

    #[test]
    fn judgment_sections_detected() {
        let s = analyzer().analyze("smith_v_state", JUDGMENT_TEXT, DocumentKind::Case);
        assert!(s.is_judgment());
        let judgment = s.judgment.as_ref().unwrap();

        assert!(judgment.header_span.is_some());
        let kinds: Vec<_> = judgment.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                JudgmentSectionKind::Introduction,
                JudgmentSectionKind::Facts,
                JudgmentSectionKind::Analysis,
                JudgmentSectionKind::Order,
            ]
        );

        let order = judgment.order_span().unwrap();
        let order_text = &JUDGMENT_TEXT[order.start..order.end];
        assert!(order_text.contains("the appeal must succeed"));
    }

    #[test]
    fn judgment_without_headings_is_all_body() {
        let text = "[1] The applicant seeks leave to appeal.\n[2] Leave is granted.\n";
        let s = analyzer().analyze("short_case", text, DocumentKind::Case);
        let judgment = s.judgment.as_ref().unwrap();
        assert!(judgment.sections.is_empty());
        assert_eq!(judgment.body_span.start, 0);
    }

    #[test]
    fn empty_document_degrades_to_flat_node() {
        let s = analyzer().analyze("empty", "   ", DocumentKind::Act);
        assert_eq!(s.nodes.len(), 1);
        assert_eq!(s.nodes[0].node_type, NodeType::Unclassified);
    }
}
