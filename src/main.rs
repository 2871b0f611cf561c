//! Confidence-based-marking benchmark harness.
//!
//! Elicits an answer and a calibrated confidence value from a pool of LLMs
//! under four prompting variants, scores the result with incentive-
//! compatible marking functions, and exports calibration statistics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

mod ambiguous;
mod calibration;
mod config;
mod dataset;
mod error;
mod parser;
mod prompting;
mod provider;
mod rate_limiter;
mod report;
mod runner;
mod scoring;
mod types;

use config::BenchmarkConfig;
use error::BenchmarkError;
use provider::{VendorCaller, VendorClient};
use rate_limiter::RateLimiter;
use report::SliceDimension;
use types::{RunSummary, Variant, Vendor};

#[derive(Parser, Debug)]
#[command(name = "cbm_benchmark")]
#[command(author = "CBM Project")]
#[command(version = "1.0.0")]
#[command(about = "Confidence-based-marking calibration benchmark for LLMs")]
struct Args {
    /// Path to the unified question file.
    #[arg(short, long, default_value = "datasets/unified/questions.json")]
    dataset: PathBuf,

    /// Path to the model registry JSON file.
    #[arg(short, long, default_value = "models.json")]
    registry: PathBuf,

    /// Variants to test (comma-separated subset of discrete_combined,
    /// discrete_linear, hlcc_combined, hlcc_linear). Default: all four.
    #[arg(long)]
    variants: Option<String>,

    /// Vendor allow-list (comma-separated). Default: all vendors with an
    /// API key present.
    #[arg(long)]
    vendors: Option<String>,

    /// Model allow-list (comma-separated). Default: all models for
    /// selected vendors.
    #[arg(long)]
    models: Option<String>,

    /// Temperatures to sweep (comma-separated). Default: 0.0,0.7,1.0.
    #[arg(long)]
    temperatures: Option<String>,

    /// Repetitions per (question, variant, vendor, model, temperature).
    #[arg(long, default_value_t = config::DEFAULT_REPETITIONS)]
    repetitions: u32,

    /// Per-subject sample cap; pass 0 to disable.
    #[arg(long, default_value_t = config::DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Output directory for raw and published results.
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Accepted for compatibility with the historical CLI surface. Dataset
    /// acquisition is handled by an external tool, out of this core's
    /// scope; this flag is inert beyond logging and exiting.
    #[arg(long)]
    download_only: bool,

    /// Validate configuration and enumerate tasks without issuing any
    /// vendor calls.
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn print_banner() {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".cyan());
    println!("{}", "║         Confidence-Based-Marking Benchmark Harness         ║".cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════╝".cyan());
    println!();
}

fn parse_variants(raw: &Option<String>) -> Result<Vec<Variant>> {
    match raw {
        None => Ok(Variant::all().to_vec()),
        Some(s) => s.split(',').map(|v| v.trim().parse::<Variant>()).collect(),
    }
}

fn parse_vendors(raw: &Option<String>) -> Result<Vec<Vendor>> {
    match raw {
        None => Ok(Vec::new()),
        Some(s) => s.split(',').map(|v| v.trim().parse::<Vendor>()).collect(),
    }
}

fn parse_temperatures(raw: &Option<String>) -> Result<Vec<f64>> {
    match raw {
        None => Ok(config::DEFAULT_TEMPERATURES.to_vec()),
        Some(s) => s
            .split(',')
            .map(|t| t.trim().parse::<f64>().context("invalid temperature"))
            .collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();

    print_banner();

    let config = BenchmarkConfig {
        dataset_path: args.dataset,
        registry_path: args.registry,
        variants: parse_variants(&args.variants)?,
        vendor_allow_list: parse_vendors(&args.vendors)?,
        model_allow_list: args.models.map(|m| m.split(',').map(|s| s.trim().to_string()).collect()).unwrap_or_default(),
        temperatures: parse_temperatures(&args.temperatures)?,
        repetitions: args.repetitions,
        sample_size: if args.sample_size == 0 { None } else { Some(args.sample_size) },
        output_dir: args.output_dir,
        download_only: args.download_only,
        dry_run: args.dry_run,
    };

    if config.variants.is_empty() {
        return Err(BenchmarkError::Configuration("--variants resolved to an empty set".to_string()).into());
    }
    if config.temperatures.is_empty() {
        return Err(BenchmarkError::Configuration("--temperatures resolved to an empty set".to_string()).into());
    }
    if config.repetitions == 0 {
        return Err(BenchmarkError::Configuration("--repetitions must be at least 1".to_string()).into());
    }

    println!("{} Configuration:", "▶".green());
    println!("  {} Dataset: {:?}", "•".blue(), config.dataset_path);
    println!("  {} Variants: {:?}", "•".blue(), config.variants);
    println!("  {} Repetitions: {}", "•".blue(), config.repetitions);
    println!();

    if config.download_only {
        tracing::info!("--download-only is inert in this core; dataset acquisition is handled externally");
        println!("{} --download-only has no effect here; dataset acquisition is out of this core's scope.", "ℹ".blue());
        return Ok(());
    }

    let questions = dataset::load_questions(&config.dataset_path)
        .await
        .map_err(|source| BenchmarkError::DatasetLoad { path: config.dataset_path.display().to_string(), source })?;
    let questions = dataset::apply_sample_cap(questions, config.sample_size);
    println!("{} Loaded {} questions after sampling", "✓".green(), questions.len());

    let registry = dataset::load_model_registry(&config.registry_path)
        .await
        .map_err(|source| BenchmarkError::RegistryLoad { path: config.registry_path.display().to_string(), source })?;

    let (provider_configs, vendor_models) = runner::eligible_vendor_models(&config, &registry);
    if vendor_models.is_empty() {
        return Err(BenchmarkError::NoEligibleVendor.into());
    }
    println!(
        "{} {} eligible (vendor, model) pairs across {} vendors",
        "✓".green(),
        vendor_models.len(),
        provider_configs.len()
    );

    let tasks =
        runner::enumerate_tasks(&questions, &config.variants, &vendor_models, &config.temperatures, config.repetitions);
    println!("{} Enumerated {} tasks", "✓".green(), tasks.len());

    if config.dry_run {
        println!("{} Dry run complete. Configuration is valid.", "✓".green());
        return Ok(());
    }

    let pb = ProgressBar::new(tasks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tasks")
            .unwrap()
            .progress_chars("#>-"),
    );

    let client: Arc<dyn VendorCaller> = Arc::new(VendorClient::new());
    let provider_configs = Arc::new(provider_configs);
    let limiter = Arc::new(RateLimiter::with_default_caps());

    let cancel = Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received; finishing in-flight batch and stopping");
                cancel.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        });
    }

    let outcome = runner::execute(tasks, client, provider_configs, limiter, cancel, |completed, _total| {
        pb.set_position(completed as u64);
    })
    .await;
    pb.finish_with_message("done");

    let timestamp = chrono::Utc::now().to_rfc3339();
    let dataset_tag = questions.first().map(|q| q.dataset.clone()).unwrap_or_else(|| "unified".to_string());

    let mut written = Vec::new();
    written.push(
        report::write_raw_results(&outcome.records, &config.output_dir, &dataset_tag, &timestamp)
            .await
            .map_err(|source| BenchmarkError::Persistence { path: config.output_dir.display().to_string(), source })?,
    );

    let published_dir = config.output_dir.join("published");
    for (name, dims) in [
        ("by_vendor", vec![SliceDimension::Vendor]),
        ("by_model_variant", vec![SliceDimension::Model, SliceDimension::Variant]),
        ("by_dataset", vec![SliceDimension::Dataset]),
    ] {
        written.push(
            report::write_published_results(&outcome.records, &published_dir, &dims, name)
                .await
                .map_err(|source| BenchmarkError::Persistence { path: published_dir.display().to_string(), source })?,
        );
    }

    let ambiguous_questions: Vec<_> = questions.iter().filter(|q| q.is_ambiguous()).cloned().collect();
    if !ambiguous_questions.is_empty() {
        let index = ambiguous::index_expected_confidence(&ambiguous_questions);
        let ambiguous_records: Vec<_> = outcome
            .records
            .iter()
            .filter(|r| index.contains_key(r.question_id.as_str()))
            .cloned()
            .collect();
        let metrics = ambiguous::compute_ambiguous_metrics(&ambiguous_records, &index);
        println!(
            "{} Ambiguous-set calibration gap: {:.4} (avg {:.4} vs ideal {:.4}, n={})",
            "ℹ".blue(),
            metrics.calibration_gap,
            metrics.avg_confidence_on_ambiguous,
            metrics.ideal_avg_confidence,
            metrics.n_questions
        );
    }

    print_summary(&outcome.summary, &written);

    Ok(())
}

fn print_summary(summary: &RunSummary, written: &[PathBuf]) {
    report::print_run_summary(summary, written);
}
