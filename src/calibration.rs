//! Calibration metrics: ECE, Brier score, overconfidence
//! rate, and the reliability diagram, all computed over equal-width bins.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BINS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub bin_center: f64,
    pub mean_accuracy: Option<f64>,
    pub mean_confidence: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationBundle {
    pub ece: f64,
    pub brier: f64,
    pub overconfidence_rate: f64,
    pub reliability_diagram: Vec<ReliabilityBin>,
}

/// Indices of `confidences` that fall in bin `i` of `n_bins`, with the
/// uppermost boundary of the last bin inclusive.
fn bin_indices(confidences: &[f64], n_bins: usize, i: usize) -> Vec<usize> {
    let lo = i as f64 / n_bins as f64;
    let hi = (i + 1) as f64 / n_bins as f64;
    confidences
        .iter()
        .enumerate()
        .filter(|(_, &c)| (c >= lo && c < hi) || (i == n_bins - 1 && c == hi))
        .map(|(j, _)| j)
        .collect()
}

pub fn compute_ece(confidences: &[f64], correctness: &[bool], n_bins: usize) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let n = confidences.len() as f64;
    let mut ece = 0.0;
    for i in 0..n_bins {
        let indices = bin_indices(confidences, n_bins, i);
        if indices.is_empty() {
            continue;
        }
        let bin_accuracy =
            indices.iter().filter(|&&j| correctness[j]).count() as f64 / indices.len() as f64;
        let bin_confidence =
            indices.iter().map(|&j| confidences[j]).sum::<f64>() / indices.len() as f64;
        ece += (indices.len() as f64 / n) * (bin_accuracy - bin_confidence).abs();
    }
    ece
}

pub fn compute_brier_score(confidences: &[f64], correctness: &[bool]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let n = confidences.len() as f64;
    confidences
        .iter()
        .zip(correctness)
        .map(|(&c, &correct)| {
            let indicator = if correct { 1.0 } else { 0.0 };
            (c - indicator).powi(2)
        })
        .sum::<f64>()
        / n
}

pub fn compute_overconfidence_rate(confidences: &[f64], correctness: &[bool], n_bins: usize) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let mut overconfident = 0;
    let mut total_nonempty = 0;
    for i in 0..n_bins {
        let indices = bin_indices(confidences, n_bins, i);
        if indices.is_empty() {
            continue;
        }
        total_nonempty += 1;
        let bin_accuracy =
            indices.iter().filter(|&&j| correctness[j]).count() as f64 / indices.len() as f64;
        let bin_confidence =
            indices.iter().map(|&j| confidences[j]).sum::<f64>() / indices.len() as f64;
        if bin_confidence > bin_accuracy {
            overconfident += 1;
        }
    }
    if total_nonempty > 0 {
        overconfident as f64 / total_nonempty as f64
    } else {
        0.0
    }
}

pub fn compute_reliability_diagram(
    confidences: &[f64],
    correctness: &[bool],
    n_bins: usize,
) -> Vec<ReliabilityBin> {
    if confidences.is_empty() {
        return Vec::new();
    }
    (0..n_bins)
        .map(|i| {
            let lo = i as f64 / n_bins as f64;
            let hi = (i + 1) as f64 / n_bins as f64;
            let bin_center = (lo + hi) / 2.0;
            let indices = bin_indices(confidences, n_bins, i);
            if indices.is_empty() {
                ReliabilityBin {
                    bin_center,
                    mean_accuracy: None,
                    mean_confidence: None,
                    count: 0,
                }
            } else {
                let mean_accuracy =
                    indices.iter().filter(|&&j| correctness[j]).count() as f64 / indices.len() as f64;
                let mean_confidence =
                    indices.iter().map(|&j| confidences[j]).sum::<f64>() / indices.len() as f64;
                ReliabilityBin {
                    bin_center,
                    mean_accuracy: Some(mean_accuracy),
                    mean_confidence: Some(mean_confidence),
                    count: indices.len(),
                }
            }
        })
        .collect()
}

/// Computes the full calibration bundle over the default bin count.
pub fn compute_calibration_bundle(confidences: &[f64], correctness: &[bool]) -> CalibrationBundle {
    CalibrationBundle {
        ece: compute_ece(confidences, correctness, DEFAULT_BINS),
        brier: compute_brier_score(confidences, correctness),
        overconfidence_rate: compute_overconfidence_rate(confidences, correctness, DEFAULT_BINS),
        reliability_diagram: compute_reliability_diagram(confidences, correctness, DEFAULT_BINS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_zero_scalars_and_empty_diagram() {
        let bundle = compute_calibration_bundle(&[], &[]);
        assert_eq!(bundle.ece, 0.0);
        assert_eq!(bundle.brier, 0.0);
        assert_eq!(bundle.overconfidence_rate, 0.0);
        assert!(bundle.reliability_diagram.is_empty());
    }

    #[test]
    fn perfect_calibration_yields_zero_ece_and_overconfidence() {
        // Singleton bins: accuracy must equal confidence in each, which for
        // one point per bin only holds at the 0.0/1.0 extremes.
        let confidences = vec![0.0, 1.0];
        let correctness = vec![false, true];
        let ece = compute_ece(&confidences, &correctness, 10);
        assert!((ece - 0.0).abs() < 1e-9);
        let ocr = compute_overconfidence_rate(&confidences, &correctness, 10);
        assert_eq!(ocr, 0.0);
    }

    #[test]
    fn worst_case_all_confident_and_wrong() {
        let confidences = vec![1.0; 10];
        let correctness = vec![false; 10];
        let bundle = compute_calibration_bundle(&confidences, &correctness);
        assert_eq!(bundle.ece, 1.0);
        assert_eq!(bundle.brier, 1.0);
        assert_eq!(bundle.overconfidence_rate, 1.0);
    }

    #[test]
    fn confidence_of_exactly_one_falls_in_last_bin() {
        let diagram = compute_reliability_diagram(&[1.0], &[true], 10);
        assert_eq!(diagram[9].count, 1);
        for bin in &diagram[..9] {
            assert_eq!(bin.count, 0);
        }
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let confidences = vec![0.1, 0.42, 0.8, 0.95, 0.3];
        let correctness = vec![true, false, true, true, false];
        let a = compute_calibration_bundle(&confidences, &correctness);
        let b = compute_calibration_bundle(&confidences, &correctness);
        assert_eq!(a.ece, b.ece);
        assert_eq!(a.brier, b.brier);
        assert_eq!(a.overconfidence_rate, b.overconfidence_rate);
    }
}
