//! Aggregator/exporter: groups results by any subset of
//! (dataset, vendor, model, variant, temperature), computes per-slice
//! calibration statistics, and persists both raw and published JSON files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use serde_json::json;

use crate::calibration::{compute_calibration_bundle, CalibrationBundle};
use crate::types::{ResultRecord, RunSummary};

/// One of the five slicing dimensions a published-results file may group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceDimension {
    Dataset,
    Vendor,
    Model,
    Variant,
    Temperature,
}

impl SliceDimension {
    fn name(self) -> &'static str {
        match self {
            SliceDimension::Dataset => "dataset",
            SliceDimension::Vendor => "vendor",
            SliceDimension::Model => "model",
            SliceDimension::Variant => "variant",
            SliceDimension::Temperature => "temperature",
        }
    }
}

fn slice_key(record: &ResultRecord, dims: &[SliceDimension]) -> Vec<String> {
    dims.iter()
        .map(|dim| match dim {
            SliceDimension::Dataset => record.dataset.clone(),
            SliceDimension::Vendor => record.vendor.to_string(),
            SliceDimension::Model => record.model.clone(),
            SliceDimension::Variant => record.variant.to_string(),
            SliceDimension::Temperature => format!("{:.2}", record.temperature),
        })
        .collect()
}

/// Rounds to four decimal places for byte-stable diffing across runs.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean_score: Option<f64>,
    pub mean_confidence: f64,
    pub accuracy: f64,
    pub calibration: CalibrationBundle,
}

/// Groups `records` by `dims` and computes the full per-group statistics
/// bundle. Iteration order of the returned map is sorted by
/// key (a `BTreeMap`), which is what makes the published JSON byte-stable.
pub fn group_and_aggregate(
    records: &[ResultRecord],
    dims: &[SliceDimension],
) -> BTreeMap<Vec<String>, GroupStats> {
    let mut groups: BTreeMap<Vec<String>, Vec<&ResultRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(slice_key(record, dims)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, group)| {
            let confidences: Vec<f64> = group.iter().map(|r| r.confidence_normalized).collect();
            let correctness: Vec<bool> = group.iter().map(|r| r.is_correct).collect();
            let scores: Vec<f64> = group.iter().filter_map(|r| r.score).collect();

            let mean_score = if scores.is_empty() {
                None
            } else {
                Some(round4(scores.iter().sum::<f64>() / scores.len() as f64))
            };
            let mean_confidence = round4(confidences.iter().sum::<f64>() / confidences.len() as f64);
            let accuracy =
                round4(correctness.iter().filter(|&&c| c).count() as f64 / correctness.len() as f64);

            let mut calibration = compute_calibration_bundle(&confidences, &correctness);
            calibration.ece = round4(calibration.ece);
            calibration.brier = round4(calibration.brier);
            calibration.overconfidence_rate = round4(calibration.overconfidence_rate);
            for bin in &mut calibration.reliability_diagram {
                bin.bin_center = round4(bin.bin_center);
                bin.mean_accuracy = bin.mean_accuracy.map(round4);
                bin.mean_confidence = bin.mean_confidence.map(round4);
            }

            (key, GroupStats { count: group.len(), mean_score, mean_confidence, accuracy, calibration })
        })
        .collect()
}

/// Persists the raw, unaggregated result list for one dataset/timestamp
/// pair.
pub async fn write_raw_results(
    records: &[ResultRecord],
    output_dir: &Path,
    dataset_tag: &str,
    timestamp: &str,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create output directory {output_dir:?}"))?;
    let path = output_dir.join(format!("{dataset_tag}_{timestamp}.json"));
    let json = serde_json::to_string_pretty(records).context("failed to serialize raw results")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write raw results to {path:?}"))?;
    Ok(path)
}

/// Writes one published-results file for a single slicing, keyed by the
/// joined slice values, sorted and fixed to four decimal places.
pub async fn write_published_results(
    records: &[ResultRecord],
    published_dir: &Path,
    dims: &[SliceDimension],
    slicing_name: &str,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(published_dir)
        .await
        .with_context(|| format!("failed to create published directory {published_dir:?}"))?;

    let grouped = group_and_aggregate(records, dims);
    let mut entries = BTreeMap::new();
    for (key, stats) in grouped {
        let group_key: BTreeMap<String, String> =
            dims.iter().zip(key.iter()).map(|(dim, value)| (dim.name().to_string(), value.clone())).collect();
        entries.insert(
            key.join("/"),
            json!({
                "group_key": group_key,
                "metrics": {
                    "count": stats.count,
                    "mean_score": stats.mean_score,
                    "mean_confidence": stats.mean_confidence,
                    "accuracy": stats.accuracy,
                    "ece": stats.calibration.ece,
                    "brier": stats.calibration.brier,
                    "overconfidence_rate": stats.calibration.overconfidence_rate,
                },
                "reliability": stats.calibration.reliability_diagram,
            }),
        );
    }

    let path = published_dir.join(format!("{slicing_name}.json"));
    let json = serde_json::to_string_pretty(&entries).context("failed to serialize published results")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write published results to {path:?}"))?;
    Ok(path)
}

/// Short colored console summary, printed once at the end of a run.
pub fn print_run_summary(summary: &RunSummary, written: &[PathBuf]) {
    println!();
    println!("{}", "▶ Run complete".green().bold());
    println!("  {} {} tasks completed", "•".blue(), summary.tasks_completed);
    println!("  {} {} tasks failed", "•".blue(), summary.tasks_failed);
    for path in written {
        println!("  {} wrote {}", "✓".green(), path.display());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParseMethod, Variant, Vendor};
    use chrono::Utc;

    fn record(vendor: Vendor, confidence_normalized: f64, is_correct: bool, score: Option<f64>) -> ResultRecord {
        ResultRecord {
            question_id: "q1".into(),
            dataset: "mmlu".into(),
            vendor,
            model: "gpt-test".into(),
            variant: Variant::DiscreteCombined,
            temperature: 0.0,
            iteration: 0,
            answer_letter: "A".into(),
            confidence_raw: confidence_normalized,
            confidence_normalized,
            score,
            is_correct,
            parse_method: ParseMethod::Json,
            raw_response: String::new(),
            timestamp: Utc::now(),
            latency_seconds: 0.1,
        }
    }

    #[test]
    fn groups_by_requested_dimensions() {
        let records = vec![
            record(Vendor::OpenAi, 0.8, true, Some(1.5)),
            record(Vendor::OpenAi, 0.2, false, Some(-0.5)),
            record(Vendor::Claude, 0.9, true, Some(2.0)),
        ];
        let grouped = group_and_aggregate(&records, &[SliceDimension::Vendor]);
        assert_eq!(grouped.len(), 2);
        let openai = &grouped[&vec!["openai".to_string()]];
        assert_eq!(openai.count, 2);
        assert_eq!(openai.accuracy, 0.5);
    }

    #[test]
    fn mean_score_is_none_when_all_scores_absent() {
        let records = vec![record(Vendor::OpenAi, 0.5, false, None)];
        let grouped = group_and_aggregate(&records, &[SliceDimension::Vendor]);
        let stats = &grouped[&vec!["openai".to_string()]];
        assert!(stats.mean_score.is_none());
    }

    #[test]
    fn rounding_is_stable_to_four_decimal_places() {
        let records = vec![
            record(Vendor::OpenAi, 1.0 / 3.0, true, Some(1.0)),
            record(Vendor::OpenAi, 2.0 / 3.0, false, Some(-1.0)),
        ];
        let grouped = group_and_aggregate(&records, &[SliceDimension::Vendor]);
        let stats = &grouped[&vec!["openai".to_string()]];
        let s = format!("{}", stats.mean_confidence);
        assert!(s.len() <= "0.5000".len() + 1);
    }
}
