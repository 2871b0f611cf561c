//! Scoring functions: map (confidence, correct?) to a score,
//! and normalize raw confidence to [0,1].

use crate::types::ConfidenceType;

/// Shared contract for the two scoring families.
pub trait Scorer {
    fn score(&self, confidence: f64, is_correct: bool) -> f64;
    fn normalize(&self, raw_confidence: f64) -> f64;
    fn name(&self) -> &'static str;
    fn confidence_type(&self) -> ConfidenceType;
}

/// Discrete three-level CBM payoff table.
const CBM_CORRECT: [f64; 3] = [1.0, 1.5, 2.0];
const CBM_INCORRECT: [f64; 3] = [0.0, -0.5, -2.0];
const LEVEL_TO_NORMALIZED: [f64; 3] = [0.250, 0.625, 0.875];

pub struct DiscreteCbmScorer;

impl DiscreteCbmScorer {
    fn level(confidence: f64) -> usize {
        let rounded = confidence.round() as i64;
        rounded.clamp(1, 3) as usize - 1
    }
}

impl Scorer for DiscreteCbmScorer {
    fn score(&self, confidence: f64, is_correct: bool) -> f64 {
        let idx = Self::level(confidence);
        if is_correct {
            CBM_CORRECT[idx]
        } else {
            CBM_INCORRECT[idx]
        }
    }

    fn normalize(&self, raw_confidence: f64) -> f64 {
        LEVEL_TO_NORMALIZED[Self::level(raw_confidence)]
    }

    fn name(&self) -> &'static str {
        "Discrete CBM"
    }

    fn confidence_type(&self) -> ConfidenceType {
        ConfidenceType::Discrete
    }
}

/// Continuous Hyperbolic-Log Calibrated Confidence scorer.
pub struct HlccScorer;

impl Scorer for HlccScorer {
    fn score(&self, confidence: f64, is_correct: bool) -> f64 {
        let x = confidence.clamp(0.0, 1.0);
        if is_correct {
            x + 1.0
        } else {
            -2.0 * x * x
        }
    }

    fn normalize(&self, raw_confidence: f64) -> f64 {
        raw_confidence.clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "Continuous HLCC"
    }

    fn confidence_type(&self) -> ConfidenceType {
        ConfidenceType::Continuous
    }
}

/// Returns the scorer appropriate for a variant name prefix, matching
/// `original_source/benchmark/engine/tester.py`'s `get_scorer` dispatch.
pub fn scorer_for_variant(variant: crate::types::Variant) -> Box<dyn Scorer> {
    if variant.is_discrete() {
        Box::new(DiscreteCbmScorer)
    } else {
        Box::new(HlccScorer)
    }
}
