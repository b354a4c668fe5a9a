//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the metadata pipeline, supporting TOML files
//! and environment variable overrides with validation and type-safe access.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Range checking, threshold bounds, lexicon completeness
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! The reasoning cue lexicons are deliberately part of configuration rather
//! than hard-coded constants: the category set is heuristic and extensible,
//! so deployments can append cue phrases without code changes.

use crate::errors::{ProcessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Batch processing and worker pool settings
    pub pipeline: PipelineConfig,
    /// Citation extraction settings
    pub citations: CitationConfig,
    /// Language tagging settings
    pub language: LanguageConfig,
    /// Reasoning span extraction settings
    pub reasoning: ReasoningConfig,
    /// Output artifact settings
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum concurrent per-document workers
    pub max_concurrent_jobs: usize,
    /// Per-document processing time budget in milliseconds
    pub document_budget_ms: u64,
    /// Stricter budget applied when a timed-out document is retried in isolation
    pub retry_budget_ms: u64,
    /// Minimum raw text length; shorter documents are rejected as malformed
    pub min_text_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: num_cpus::get(),
            document_budget_ms: 30_000,
            retry_budget_ms: 10_000,
            min_text_length: 1,
        }
    }
}

/// Citation extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    /// How many characters of a document's head are scanned when deriving
    /// its own citation identity for the resolution index
    pub identity_scan_chars: usize,
    /// Confidence assigned when optional structural fields are missing
    pub partial_match_confidence: f64,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            identity_scan_chars: 600,
            partial_match_confidence: 0.6,
        }
    }
}

/// Language tagging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Minimum marker-hit fraction (hits / tokens) for a confident tag;
    /// below this the paragraph is tagged `unknown`
    pub min_confidence: f64,
    /// Paragraphs with fewer tokens than this are tagged `unknown`
    pub min_tokens: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.05,
            min_tokens: 4,
        }
    }
}

/// Reasoning span extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Minimum category score for a sentence to be classified
    pub min_score: f64,
    /// Additive ratio-decidendi bonus for sentences inside or adjacent to
    /// the order/conclusion structural section
    pub order_proximity_bonus: f64,
    /// Additive precedent-application bonus for sentences anchored by a
    /// case citation span
    pub citation_anchor_bonus: f64,
    /// Cue-phrase lexicon per category. Keys are category names as they
    /// appear in the output stream; values are lower-case cue phrases.
    pub cue_lexicons: BTreeMap<String, Vec<String>>,
}

impl ReasoningConfig {
    /// Default cue lexicons for South African judgment prose
    fn default_lexicons() -> BTreeMap<String, Vec<String>> {
        let mut lexicons = BTreeMap::new();
        lexicons.insert(
            "ratio_decidendi".to_string(),
            vec![
                "accordingly",
                "for these reasons",
                "it follows that",
                "i conclude that",
                "therefore",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        lexicons.insert(
            "obiter_dictum".to_string(),
            vec![
                "in passing",
                "obiter",
                "i note that",
                "it is worth observing",
                "although not necessary for this decision",
                "it may be noted",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        lexicons.insert(
            "statutory_interpretation".to_string(),
            vec![
                "interpreting section",
                "meaning of the provision",
                "legislative intent",
                "purpose of the act",
                "provides that",
                "provides",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        lexicons.insert(
            "constitutional_reasoning".to_string(),
            vec![
                "constitutional values",
                "fundamental rights",
                "limitation of rights",
                "section 36",
                "section 39",
                "constitutional",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        lexicons.insert(
            "precedent_application".to_string(),
            vec![
                "following the decision in",
                "as held in",
                "binding precedent",
                "stare decisis",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        lexicons
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            order_proximity_bonus: 1.0,
            citation_anchor_bonus: 1.0,
            cue_lexicons: Self::default_lexicons(),
        }
    }
}

/// Output artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the seven artifact streams are written to
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./processed_output"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ProcessError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ProcessError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("LEGAL_METADATA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(dir) = std::env::var("LEGAL_METADATA_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Ok(jobs) = std::env::var("LEGAL_METADATA_MAX_JOBS") {
            self.pipeline.max_concurrent_jobs =
                jobs.parse().map_err(|_| ProcessError::Config {
                    message: "Invalid worker count in LEGAL_METADATA_MAX_JOBS".to_string(),
                })?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_jobs == 0 {
            return Err(ProcessError::ValidationFailed {
                field: "pipeline.max_concurrent_jobs".to_string(),
                reason: "Worker count cannot be zero".to_string(),
            });
        }

        if self.pipeline.document_budget_ms == 0 {
            return Err(ProcessError::ValidationFailed {
                field: "pipeline.document_budget_ms".to_string(),
                reason: "Document budget must be greater than zero".to_string(),
            });
        }

        if self.pipeline.retry_budget_ms > self.pipeline.document_budget_ms {
            return Err(ProcessError::ValidationFailed {
                field: "pipeline.retry_budget_ms".to_string(),
                reason: "Retry budget must be stricter than the initial budget".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.language.min_confidence) {
            return Err(ProcessError::ValidationFailed {
                field: "language.min_confidence".to_string(),
                reason: "Confidence threshold must be within [0, 1]".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.citations.partial_match_confidence) {
            return Err(ProcessError::ValidationFailed {
                field: "citations.partial_match_confidence".to_string(),
                reason: "Confidence must be within [0, 1]".to_string(),
            });
        }

        if self.reasoning.cue_lexicons.is_empty() {
            return Err(ProcessError::ValidationFailed {
                field: "reasoning.cue_lexicons".to_string(),
                reason: "At least one reasoning category must be configured".to_string(),
            });
        }

        for (category, cues) in &self.reasoning.cue_lexicons {
            if cues.is_empty() {
                return Err(ProcessError::ValidationFailed {
                    field: format!("reasoning.cue_lexicons.{}", category),
                    reason: "Cue list cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Serialize configuration as a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ProcessError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.reasoning.cue_lexicons.contains_key("ratio_decidendi"));
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = Config::default();
        config.pipeline.max_concurrent_jobs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_retry_budget_looser_than_initial() {
        let mut config = Config::default();
        config.pipeline.document_budget_ms = 1000;
        config.pipeline.retry_budget_ms = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.pipeline.document_budget_ms,
            config.pipeline.document_budget_ms
        );
        assert_eq!(parsed.reasoning.cue_lexicons, config.reasoning.cue_lexicons);
    }
}
