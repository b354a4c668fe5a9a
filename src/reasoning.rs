//! # Reasoning Pattern Extraction Module
//!
//! ## Purpose
//! Locates spans of judicial reasoning in judgment bodies and labels them by
//! category: ratio decidendi, obiter dictum, statutory interpretation,
//! constitutional reasoning, and precedent application.
//!
//! ## Method
//! Sentences inside the judgment body are scored per category against the
//! configured cue-phrase lexicons. Two structural signals add to the lexical
//! score:
//! - ratio decidendi sentences gain a bonus inside the order section, or in
//!   the closing stretch of the body when no order section was detected
//! - precedent application gains a bonus when the sentence carries a case
//!   citation
//!
//! A sentence below the score threshold is left unlabeled. Adjacent
//! sentences with the same label merge into one span, so emitted spans never
//! overlap.

use crate::citations::{Citation, TargetType};
use crate::config::ReasoningConfig;
use crate::structure::DocumentStructure;
use crate::utils::split_sentences;
use crate::{DocumentId, Span};
use serde::{Deserialize, Serialize};

/// Reasoning categories, in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningCategory {
    RatioDecidendi,
    StatutoryInterpretation,
    ConstitutionalReasoning,
    PrecedentApplication,
    ObiterDictum,
}

impl ReasoningCategory {
    pub const ALL: [ReasoningCategory; 5] = [
        ReasoningCategory::RatioDecidendi,
        ReasoningCategory::StatutoryInterpretation,
        ReasoningCategory::ConstitutionalReasoning,
        ReasoningCategory::PrecedentApplication,
        ReasoningCategory::ObiterDictum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningCategory::RatioDecidendi => "ratio_decidendi",
            ReasoningCategory::StatutoryInterpretation => "statutory_interpretation",
            ReasoningCategory::ConstitutionalReasoning => "constitutional_reasoning",
            ReasoningCategory::PrecedentApplication => "precedent_application",
            ReasoningCategory::ObiterDictum => "obiter_dictum",
        }
    }
}

/// One labeled reasoning span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSpan {
    pub document_id: DocumentId,
    pub span: Span,
    pub category: ReasoningCategory,
    pub confidence: f64,
}

/// Fraction of the body treated as the closing stretch when no order
/// section exists
const CLOSING_FRACTION: f64 = 0.15;

/// Cue-lexicon reasoning extractor
pub struct ReasoningExtractor {
    lexicons: Vec<(ReasoningCategory, Vec<String>)>,
    min_score: f64,
    order_proximity_bonus: f64,
    citation_anchor_bonus: f64,
}

impl ReasoningExtractor {
    pub fn new(config: &ReasoningConfig) -> Self {
        let lexicons = ReasoningCategory::ALL
            .iter()
            .map(|category| {
                let cues = config
                    .cue_lexicons
                    .get(category.as_str())
                    .cloned()
                    .unwrap_or_default();
                (*category, cues)
            })
            .collect();
        Self {
            lexicons,
            min_score: config.min_score,
            order_proximity_bonus: config.order_proximity_bonus,
            citation_anchor_bonus: config.citation_anchor_bonus,
        }
    }

    /// Extract reasoning spans from one document. Non-judgments yield
    /// nothing; reasoning labels only apply to judicial prose.
    pub fn extract(
        &self,
        document_id: &str,
        text: &str,
        structure: &DocumentStructure,
        citations: &[Citation],
    ) -> Vec<ReasoningSpan> {
        let Some(judgment) = &structure.judgment else {
            return Vec::new();
        };
        let body = judgment.body_span;

        // The ratio bonus region: the order section, or the closing stretch
        let ratio_region = judgment.order_span().unwrap_or_else(|| {
            let closing = (body.len() as f64 * CLOSING_FRACTION) as usize;
            Span::new(body.end.saturating_sub(closing), body.end)
        });

        let case_spans: Vec<Span> = citations
            .iter()
            .filter(|c| c.target_type == TargetType::Case)
            .map(|c| c.span)
            .collect();

        let mut labeled: Vec<ReasoningSpan> = Vec::new();
        for sentence in split_sentences(text, body) {
            let Some(prose) = text.get(sentence.start..sentence.end) else {
                continue;
            };
            let lowered = prose.to_lowercase();

            let mut best: Option<(ReasoningCategory, f64)> = None;
            for (category, cues) in &self.lexicons {
                let mut score: f64 = cues
                    .iter()
                    .map(|cue| lowered.matches(cue.as_str()).count() as f64)
                    .sum();
                if *category == ReasoningCategory::RatioDecidendi
                    && score > 0.0
                    && sentence.overlaps(&ratio_region)
                {
                    score += self.order_proximity_bonus;
                }
                if *category == ReasoningCategory::PrecedentApplication
                    && case_spans.iter().any(|c| c.overlaps(&sentence))
                {
                    score += self.citation_anchor_bonus;
                }
                // Strict comparison keeps the earlier, higher-priority
                // category on ties
                if score > best.map(|(_, s)| s).unwrap_or(0.0) {
                    best = Some((*category, score));
                }
            }

            let Some((category, score)) = best else {
                continue;
            };
            if score < self.min_score {
                continue;
            }
            let confidence = score / (score + 1.0);

            // Merge with the previous span when same-category and adjacent
            // (nothing but whitespace between them)
            if let Some(last) = labeled.last_mut() {
                let gap = text.get(last.span.end..sentence.start).unwrap_or("?");
                if last.category == category && gap.trim().is_empty() {
                    last.span.end = sentence.end;
                    last.confidence = last.confidence.max(confidence);
                    continue;
                }
            }
            labeled.push(ReasoningSpan {
                document_id: document_id.to_string(),
                span: sentence,
                category,
                confidence,
            });
        }
        labeled
    }
}
