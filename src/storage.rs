//! # Artifact Storage Module
//!
//! ## Purpose
//! Writes batch output to the seven append-only JSONL artifact streams:
//! citations, structure, language tags, cross-references, hierarchy, version
//! chains, and reasoning spans.
//!
//! ## Format
//! One JSON record per line. Streams are opened in append mode so repeated
//! batch runs accumulate, and every record is flushed as it is written so a
//! crashed run leaves whole lines behind, never a torn record.

use crate::errors::{ProcessError, Result};
use crate::pipeline::BatchOutput;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One append-only JSONL stream
pub struct StreamWriter {
    name: &'static str,
    writer: BufWriter<File>,
}

impl StreamWriter {
    /// Open (or create) the stream file `<dir>/<name>.jsonl` for appending
    pub fn open(dir: &Path, name: &'static str) -> Result<Self> {
        let path = dir.join(format!("{name}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ProcessError::StreamWrite {
                stream: name.to_string(),
                details: e.to_string(),
            })?;
        Ok(Self {
            name,
            writer: BufWriter::new(file),
        })
    }

    /// Append one record as a line and flush it
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush())
            .map_err(|e| ProcessError::StreamWrite {
                stream: self.name.to_string(),
                details: e.to_string(),
            })
    }
}

/// Writer over the full artifact stream set
pub struct ArtifactWriter {
    dir: PathBuf,
    citations: StreamWriter,
    structure: StreamWriter,
    language_tags: StreamWriter,
    cross_references: StreamWriter,
    hierarchy: StreamWriter,
    version_chains: StreamWriter,
    reasoning_spans: StreamWriter,
}

impl ArtifactWriter {
    pub const STREAM_NAMES: [&'static str; 7] = [
        "citations",
        "structure",
        "language_tags",
        "cross_references",
        "hierarchy",
        "version_chains",
        "reasoning_spans",
    ];

    /// Create the output directory if needed and open all seven streams
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            citations: StreamWriter::open(&dir, "citations")?,
            structure: StreamWriter::open(&dir, "structure")?,
            language_tags: StreamWriter::open(&dir, "language_tags")?,
            cross_references: StreamWriter::open(&dir, "cross_references")?,
            hierarchy: StreamWriter::open(&dir, "hierarchy")?,
            version_chains: StreamWriter::open(&dir, "version_chains")?,
            reasoning_spans: StreamWriter::open(&dir, "reasoning_spans")?,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one batch's records across all streams
    pub fn write_batch(&mut self, output: &BatchOutput) -> Result<()> {
        for analysis in &output.analyses {
            for citation in &analysis.citations {
                self.citations.write_record(citation)?;
            }
            if let Some(structure) = &analysis.structure {
                self.structure.write_record(structure)?;
            }
            for tag in &analysis.language_tags {
                self.language_tags.write_record(tag)?;
            }
            for span in &analysis.reasoning_spans {
                self.reasoning_spans.write_record(span)?;
            }
        }
        for edge in output.graph.edges() {
            self.cross_references.write_record(edge)?;
        }
        for record in output.hierarchy.records() {
            self.hierarchy.write_record(record)?;
        }
        for chain in output.temporal.chains() {
            self.version_chains.write_record(chain)?;
        }
        tracing::info!(dir = %self.dir.display(), "artifact streams written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, VecDocumentSource};
    use crate::{Config, Document, DocumentKind, SourceFormat};
    use std::fs;

    fn sample_batch() -> Vec<Document> {
        vec![
            Document::new(
                "act_2008_71",
                "COMPANIES ACT 71 OF 2008\n\n1. Definitions\n\nIn this Act \"company\" means a juristic person.",
                SourceFormat::Txt,
                DocumentKind::Act,
                None,
            ),
            Document::new(
                "case_1",
                "SMITH v JONES [2012] ZASCA 3\n\nORDER\n\n[1] It follows that the appeal against the Companies Act 71 of 2008 ruling must succeed.",
                SourceFormat::Txt,
                DocumentKind::Case,
                None,
            ),
        ]
    }

    fn line_count(path: &Path) -> usize {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
    }

    #[tokio::test]
    async fn writes_all_seven_streams() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let output = pipeline
            .run_batch(VecDocumentSource::new(sample_batch()))
            .await
            .unwrap();

        let mut writer = ArtifactWriter::create(dir.path()).unwrap();
        writer.write_batch(&output).unwrap();

        for name in ArtifactWriter::STREAM_NAMES {
            assert!(dir.path().join(format!("{name}.jsonl")).exists());
        }
        assert_eq!(line_count(&dir.path().join("structure.jsonl")), 2);
        assert!(line_count(&dir.path().join("citations.jsonl")) >= 2);
        assert!(line_count(&dir.path().join("cross_references.jsonl")) >= 1);
        assert_eq!(line_count(&dir.path().join("hierarchy.jsonl")), 2);
    }

    #[tokio::test]
    async fn repeated_batches_append() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let output = pipeline
            .run_batch(VecDocumentSource::new(sample_batch()))
            .await
            .unwrap();

        let mut writer = ArtifactWriter::create(dir.path()).unwrap();
        writer.write_batch(&output).unwrap();
        writer.write_batch(&output).unwrap();
        assert_eq!(line_count(&dir.path().join("hierarchy.jsonl")), 4);
    }

    #[test]
    fn every_line_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut stream = StreamWriter::open(dir.path(), "citations").unwrap();
        stream
            .write_record(&serde_json::json!({"document_id": "a", "raw": "x"}))
            .unwrap();
        stream
            .write_record(&serde_json::json!({"document_id": "b"}))
            .unwrap();

        let raw = fs::read_to_string(dir.path().join("citations.jsonl")).unwrap();
        for line in raw.lines() {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }
}
