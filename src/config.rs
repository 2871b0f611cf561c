//! Run configuration: CLI/env-derived settings, per-vendor endpoint and
//! rate-limit tables, and defaults for the planner sweep.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{Variant, Vendor};

/// Default temperatures swept per TaskSpec cell when the CLI does not
/// override them.
pub const DEFAULT_TEMPERATURES: [f64; 3] = [0.0, 0.7, 1.0];

/// Default repetitions per (question, variant, vendor, model, temperature).
pub const DEFAULT_REPETITIONS: u32 = 3;

/// Default per-subject sample cap (None = full dataset) applied by the
/// planner before TaskSpec enumeration.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Tasks scheduled per batch, load-bearing as datasets scale into the tens
/// of thousands of questions.
pub const BATCH_SIZE: usize = 100;

/// Per-request wall-clock timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Top-level run configuration assembled from CLI args.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Path to the unified question file.
    pub dataset_path: PathBuf,
    /// Path to the model registry JSON file.
    pub registry_path: PathBuf,
    /// Variants to exercise.
    pub variants: Vec<Variant>,
    /// Vendor allow-list; empty means "all vendors with a present API key".
    pub vendor_allow_list: Vec<Vendor>,
    /// Model allow-list filter; empty means "all models for selected vendors".
    pub model_allow_list: Vec<String>,
    pub temperatures: Vec<f64>,
    pub repetitions: u32,
    /// Per-subject sample cap; `None` disables capping.
    pub sample_size: Option<usize>,
    pub output_dir: PathBuf,
    pub download_only: bool,
    pub dry_run: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("datasets/unified/questions.json"),
            registry_path: PathBuf::from("models.json"),
            variants: Variant::all().to_vec(),
            vendor_allow_list: Vec::new(),
            model_allow_list: Vec::new(),
            temperatures: DEFAULT_TEMPERATURES.to_vec(),
            repetitions: DEFAULT_REPETITIONS,
            sample_size: Some(DEFAULT_SAMPLE_SIZE),
            output_dir: PathBuf::from("results"),
            download_only: false,
            dry_run: false,
        }
    }
}

/// Per-vendor adapter configuration: API key (if present), fixed endpoint,
/// request timeout, and bounded-concurrency cap.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub vendor: Vendor,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
    pub rate_limit: usize,
}

impl ProviderConfig {
    pub fn for_vendor(vendor: Vendor) -> Self {
        let api_key = std::env::var(vendor.api_key_env_var()).ok();
        Self {
            vendor,
            api_key,
            endpoint: default_endpoint(vendor).to_string(),
            timeout: REQUEST_TIMEOUT,
            rate_limit: vendor.default_rate_limit(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Fixed default endpoint per vendor, overridable by future
/// configuration but not by this implementation's CLI surface today.
pub fn default_endpoint(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::OpenAi => "https://api.openai.com/v1/chat/completions",
        Vendor::Claude => "https://api.anthropic.com/v1/messages",
        Vendor::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        Vendor::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
        Vendor::Xai => "https://api.x.ai/v1/chat/completions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_covers_all_variants() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.variants.len(), 4);
        assert_eq!(config.temperatures, DEFAULT_TEMPERATURES.to_vec());
        assert_eq!(config.repetitions, DEFAULT_REPETITIONS);
    }

    #[test]
    fn provider_config_reads_rate_limit_from_vendor() {
        let cfg = ProviderConfig::for_vendor(Vendor::Xai);
        assert_eq!(cfg.rate_limit, 10);
    }
}
