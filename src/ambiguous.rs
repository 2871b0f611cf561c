//! Ambiguous-question evaluator: for items with no single
//! correct answer, expected confidence stands in for ground truth instead
//! of correctness.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Question, ResultRecord};

/// Default expected confidence used when a result references a question id
/// absent from the index.
pub const DEFAULT_EXPECTED_CONFIDENCE: f64 = 0.25;

#[derive(Debug, Clone, Serialize)]
pub struct AmbiguousMetrics {
    pub avg_confidence_on_ambiguous: f64,
    pub ideal_avg_confidence: f64,
    pub calibration_gap: f64,
    pub overconfidence_rate: f64,
    pub n_questions: usize,
}

/// Pre-indexes ambiguous questions by id so repeated lookups during
/// aggregation don't rescan the dataset.
pub fn index_expected_confidence(questions: &[Question]) -> HashMap<&str, f64> {
    questions
        .iter()
        .filter_map(|q| q.expected_confidence.map(|c| (q.id.as_str(), c)))
        .collect()
}

pub fn compute_ambiguous_metrics(
    records: &[ResultRecord],
    expected_by_question: &HashMap<&str, f64>,
) -> AmbiguousMetrics {
    if records.is_empty() {
        return AmbiguousMetrics {
            avg_confidence_on_ambiguous: 0.0,
            ideal_avg_confidence: 0.0,
            calibration_gap: 0.0,
            overconfidence_rate: 0.0,
            n_questions: 0,
        };
    }

    let n = records.len() as f64;
    let mut sum_confidence = 0.0;
    let mut sum_expected = 0.0;
    let mut overconfident = 0usize;

    for record in records {
        let expected = expected_by_question
            .get(record.question_id.as_str())
            .copied()
            .unwrap_or(DEFAULT_EXPECTED_CONFIDENCE);
        sum_confidence += record.confidence_normalized;
        sum_expected += expected;
        if record.confidence_normalized > expected {
            overconfident += 1;
        }
    }

    let avg_confidence = sum_confidence / n;
    let ideal_avg = sum_expected / n;

    AmbiguousMetrics {
        avg_confidence_on_ambiguous: avg_confidence,
        ideal_avg_confidence: ideal_avg,
        calibration_gap: avg_confidence - ideal_avg,
        overconfidence_rate: overconfident as f64 / n,
        n_questions: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParseMethod, Variant, Vendor};
    use chrono::Utc;

    fn record(question_id: &str, confidence_normalized: f64) -> ResultRecord {
        ResultRecord {
            question_id: question_id.to_string(),
            dataset: "ambiguous".into(),
            vendor: Vendor::OpenAi,
            model: "gpt-test".into(),
            variant: Variant::HlccCombined,
            temperature: 0.0,
            iteration: 0,
            answer_letter: String::new(),
            confidence_raw: confidence_normalized,
            confidence_normalized,
            score: None,
            is_correct: false,
            parse_method: ParseMethod::Json,
            raw_response: String::new(),
            timestamp: Utc::now(),
            latency_seconds: 0.1,
        }
    }

    #[test]
    fn calibration_gap_and_overconfidence_for_two_overconfident_records() {
        let records = vec![record("q1", 0.9), record("q2", 0.8)];
        let index = HashMap::from([("q1", 0.25), ("q2", 0.25)]);
        let metrics = compute_ambiguous_metrics(&records, &index);
        assert!((metrics.avg_confidence_on_ambiguous - 0.85).abs() < 1e-9);
        assert!((metrics.ideal_avg_confidence - 0.25).abs() < 1e-9);
        assert!((metrics.calibration_gap - 0.60).abs() < 1e-9);
        assert_eq!(metrics.overconfidence_rate, 1.0);
        assert_eq!(metrics.n_questions, 2);
    }

    #[test]
    fn unknown_question_id_falls_back_to_default() {
        let records = vec![record("unknown", 0.5)];
        let metrics = compute_ambiguous_metrics(&records, &HashMap::new());
        assert_eq!(metrics.ideal_avg_confidence, DEFAULT_EXPECTED_CONFIDENCE);
    }

    #[test]
    fn empty_input_yields_zeroed_metrics() {
        let metrics = compute_ambiguous_metrics(&[], &HashMap::new());
        assert_eq!(metrics.n_questions, 0);
        assert_eq!(metrics.calibration_gap, 0.0);
    }
}
