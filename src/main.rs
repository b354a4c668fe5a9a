//! # Legal Metadata Pipeline Main Driver
//!
//! ## Purpose
//! Main entry point for the batch metadata pipeline. Loads configuration,
//! reads a JSONL document batch, runs the per-document and aggregation
//! passes, and writes the artifact streams.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file, command line arguments, environment
//!   variables, and a JSONL file of document records
//! - **Output**: Seven JSONL artifact streams plus a batch summary on stdout
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Build the pipeline and read the document batch
//! 4. Run the batch (Ctrl-C requests cooperative cancellation)
//! 5. Write artifact streams and report stats

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use legal_metadata_pipeline::{
    config::Config,
    errors::{ProcessError, Result},
    pipeline::{JsonlFileSource, Pipeline},
    storage::ArtifactWriter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("legal-metadata-pipeline")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Batch metadata extraction for South African legal text")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("JSONL file of document records")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Artifact output directory (overrides configuration)"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Maximum concurrent document workers")
                .value_parser(clap::value_parser!(usize)),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let mut config = Config::from_file(config_path)?;

    if let Some(dir) = matches.get_one::<String>("output") {
        config.output.dir = dir.into();
    }
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        config.pipeline.max_concurrent_jobs = *jobs;
    }
    config.validate()?;

    init_logging(&config)?;
    info!(config = config_path, "starting legal metadata pipeline");

    let input = matches
        .get_one::<String>("input")
        .ok_or_else(|| ProcessError::Config {
            message: "input file is required".to_string(),
        })?;
    let mut source = JsonlFileSource::new(input.as_str());

    let output_dir = config.output.dir.clone();
    let pipeline = Arc::new(Pipeline::new(config)?);

    // Ctrl-C requests cooperative cancellation; in-flight documents settle
    // as cancelled and whatever finished is still aggregated and written
    let canceller = Arc::clone(&pipeline);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("received SIGINT, cancelling batch");
            canceller.cancel();
        }
    });

    let output = pipeline.run_batch_with_store(&mut source, None).await?;

    let mut writer = ArtifactWriter::create(&output_dir)?;
    writer.write_batch(&output)?;

    info!(
        documents = output.stats.total_processed,
        succeeded = output.stats.succeeded,
        failed = output.stats.failed,
        skipped = output.stats.skipped,
        timed_out = output.stats.timed_out,
        cancelled = output.stats.cancelled,
        citations = output.stats.citation_count,
        edges = output.stats.edge_count,
        resolved = output.stats.resolved_edge_count,
        chains = output.stats.chain_count,
        elapsed_ms = output.stats.elapsed_ms,
        "batch finished"
    );
    println!(
        "Processed {} documents ({} succeeded, {} failed, {} skipped, {} cancelled) in {}ms",
        output.stats.total_processed,
        output.stats.succeeded,
        output.stats.failed,
        output.stats.skipped,
        output.stats.cancelled,
        output.stats.elapsed_ms,
    );
    println!("Artifacts written to {}", writer.dir().display());

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .map_err(|e| ProcessError::Config {
            message: format!("Invalid log level '{}': {}", config.logging.level, e),
        })?;

    let fmt_layer = if config.logging.json_format {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .json()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    info!(level = %config.logging.level, "logging initialized");
    Ok(())
}
