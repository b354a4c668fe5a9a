//! # Utilities Module
//!
//! ## Purpose
//! Common text utilities shared by the per-document passes: normalization,
//! paragraph and sentence segmentation, flexible date parsing, and a small
//! performance timer.
//!
//! ## Input/Output Specification
//! - **Input**: Raw document text, date strings
//! - **Output**: Byte spans into the original text, parsed dates
//! - **Invariant**: Segmentation returns spans into the *original* text so
//!   downstream records can always be mapped back to source offsets

use crate::Span;
use chrono::NaiveDate;
use std::time::Instant;
use unicode_normalization::UnicodeNormalization;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// Unicode-normalize (NFC) and collapse runs of spaces and tabs.
///
/// Line breaks are preserved so structural segmentation still sees them.
pub fn normalize_text(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let mut out = String::with_capacity(normalized.len());
    let mut prev_space = false;
    for c in normalized.chars() {
        if c == ' ' || c == '\t' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            if !c.is_control() || c == '\n' {
                out.push(c);
            }
            prev_space = false;
        }
    }
    out
}

/// Collapse all whitespace runs (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into paragraph spans at blank lines.
///
/// Returns byte spans into the original text; empty paragraphs are skipped.
pub fn split_paragraphs(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if let Some(start) = para_start.take() {
                spans.push(trim_span(text, Span::new(start, offset)));
            }
        } else if para_start.is_none() {
            para_start = Some(offset);
        }
        offset += line.len();
    }

    if let Some(start) = para_start {
        spans.push(trim_span(text, Span::new(start, text.len())));
    }

    spans.retain(|s| !s.is_empty());
    spans
}

/// Split a region of text into sentence spans.
///
/// `region` bounds the scan; returned spans are offsets into the full text.
/// A sentence ends at `.`, `!` or `?` followed by whitespace, except after
/// common legal abbreviations (`No.`, `v.`, `s.`, `para.`, `art.`) and
/// single-letter initials.
pub fn split_sentences(text: &str, region: Span) -> Vec<Span> {
    let slice = match text.get(region.start..region.end) {
        Some(s) => s,
        None => return Vec::new(),
    };

    const ABBREVIATIONS: &[&str] = &["no", "v", "s", "ss", "para", "art", "cf", "et al"];

    let bytes = slice.as_bytes();
    let mut spans = Vec::new();
    let mut sent_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '.' || c == '!' || c == '?' {
            let followed_by_break = bytes
                .get(i + 1)
                .map(|b| (*b as char).is_whitespace())
                .unwrap_or(true);
            let is_abbrev = c == '.' && {
                let head = &slice[sent_start..i];
                let last_word = head
                    .rsplit(|ch: char| !ch.is_alphanumeric())
                    .next()
                    .unwrap_or("");
                let lower = last_word.to_lowercase();
                ABBREVIATIONS.contains(&lower.as_str()) || last_word.len() == 1
            };
            if followed_by_break && !is_abbrev {
                let span = trim_span(
                    text,
                    Span::new(region.start + sent_start, region.start + i + 1),
                );
                if !span.is_empty() {
                    spans.push(span);
                }
                sent_start = i + 1;
            }
        }
        i += 1;
    }

    let tail = trim_span(
        text,
        Span::new(region.start + sent_start, region.start + bytes.len()),
    );
    if !tail.is_empty() {
        spans.push(tail);
    }

    spans
}

/// Shrink a span so it excludes leading and trailing whitespace
pub fn trim_span(text: &str, span: Span) -> Span {
    let slice = match text.get(span.start..span.end) {
        Some(s) => s,
        None => return Span::new(span.start, span.start),
    };
    let trimmed_start = slice.len() - slice.trim_start().len();
    let trimmed_end = slice.trim_end().len();
    Span::new(span.start + trimmed_start, span.start + trimmed_start.max(trimmed_end))
}

/// Parse a date in the formats legal sources actually use
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    const FORMATS: &[&str] = &["%Y-%m-%d", "%d %B %Y", "%d/%m/%Y", "%Y/%m/%d"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    // Bare year, pinned to 1 January
    if value.len() == 4 {
        if let Ok(year) = value.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_at_blank_lines() {
        let text = "First paragraph.\n\nSecond paragraph\ncontinues here.\n\n\nThird.";
        let spans = split_paragraphs(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[0].start..spans[0].end], "First paragraph.");
        assert_eq!(
            &text[spans[1].start..spans[1].end],
            "Second paragraph\ncontinues here."
        );
        assert_eq!(&text[spans[2].start..spans[2].end], "Third.");
    }

    #[test]
    fn sentences_respect_abbreviations() {
        let text = "The court applied Act No. 71 of 2008. The appeal succeeds.";
        let spans = split_sentences(text, Span::new(0, text.len()));
        assert_eq!(spans.len(), 2);
        assert_eq!(
            &text[spans[0].start..spans[0].end],
            "The court applied Act No. 71 of 2008."
        );
        assert_eq!(&text[spans[1].start..spans[1].end], "The appeal succeeds.");
    }

    #[test]
    fn sentence_spans_are_absolute_within_region() {
        let text = "HEADER\nOne sentence. Another one.";
        let region = Span::new(7, text.len());
        let spans = split_sentences(text, region);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].start..spans[0].end], "One sentence.");
    }

    #[test]
    fn flexible_dates() {
        assert_eq!(
            parse_flexible_date("2008-04-01"),
            NaiveDate::from_ymd_opt(2008, 4, 1)
        );
        assert_eq!(
            parse_flexible_date("1 April 2008"),
            NaiveDate::from_ymd_opt(2008, 4, 1)
        );
        assert_eq!(
            parse_flexible_date("2008"),
            NaiveDate::from_ymd_opt(2008, 1, 1)
        );
        assert_eq!(parse_flexible_date("not a date"), None);
    }

    #[test]
    fn normalize_collapses_spaces_keeps_newlines() {
        let text = "Companies  Act\t71  of 2008\nSection 4";
        assert_eq!(normalize_text(text), "Companies Act 71 of 2008\nSection 4");
    }
}
