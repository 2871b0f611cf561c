//! Integration tests for the CBM benchmark harness.
//!
//! The crate ships no library target (matching the binary-only layout it was
//! built from), so these tests exercise the on-disk JSON contracts the
//! modules agree on rather than calling into `src/` directly.

use std::io::Write;

use serde_json::{json, Value};

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(name);
    let mut f = std::fs::File::create(&path).expect("create temp file");
    f.write_all(contents.as_bytes()).expect("write temp file");
    path
}

#[test]
fn question_file_bare_array_shape_round_trips() {
    let raw = json!([
        {
            "id": "q1",
            "dataset": "mmlu",
            "question": "What is 2+2?",
            "options": [
                {"key": "A", "text": "3"},
                {"key": "B", "text": "4"}
            ],
            "correct_answer": "B"
        }
    ]);
    let path = write_temp("cbm_test_bare.json", &raw.to_string());
    let content = std::fs::read_to_string(&path).expect("read back");
    let parsed: Value = serde_json::from_str(&content).expect("valid json");
    assert!(parsed.is_array());
    assert_eq!(parsed[0]["correct_answer"], "B");
    std::fs::remove_file(path).ok();
}

#[test]
fn question_file_questions_key_shape_round_trips() {
    let raw = json!({
        "questions": [
            {
                "id": "q1",
                "dataset": "mmlu",
                "question": "What is 2+2?",
                "options": [
                    {"key": "A", "text": "3"},
                    {"key": "B", "text": "4"}
                ],
                "correct_answer": "B"
            }
        ]
    });
    let path = write_temp("cbm_test_questions.json", &raw.to_string());
    let content = std::fs::read_to_string(&path).expect("read back");
    let parsed: Value = serde_json::from_str(&content).expect("valid json");
    assert!(parsed["questions"].is_array());
    std::fs::remove_file(path).ok();
}

#[test]
fn question_file_eval_data_key_shape_round_trips() {
    let raw = json!({
        "eval_data": [
            {
                "id": "q1",
                "dataset": "mmlu",
                "question": "Pick one with no single right answer",
                "options": [
                    {"key": "A", "text": "x"},
                    {"key": "B", "text": "y"}
                ],
                "expected_confidence": 0.5
            }
        ]
    });
    let path = write_temp("cbm_test_eval_data.json", &raw.to_string());
    let content = std::fs::read_to_string(&path).expect("read back");
    let parsed: Value = serde_json::from_str(&content).expect("valid json");
    assert!(parsed["eval_data"][0]["correct_answer"].is_null());
    assert_eq!(parsed["eval_data"][0]["expected_confidence"], 0.5);
    std::fs::remove_file(path).ok();
}

#[test]
fn model_registry_file_has_expected_shape() {
    let raw = json!({
        "OpenAI": {"models": ["gpt-4o", "gpt-4o-mini"]},
        "Anthropic": {"vendor": "claude", "models": ["claude-3-5-sonnet"]}
    });
    let path = write_temp("cbm_test_registry.json", &raw.to_string());
    let content = std::fs::read_to_string(&path).expect("read back");
    let parsed: Value = serde_json::from_str(&content).expect("valid json");
    assert!(parsed["OpenAI"]["models"].is_array());
    assert_eq!(parsed["Anthropic"]["vendor"], "claude");
    std::fs::remove_file(path).ok();
}

#[test]
fn published_results_file_shape_is_stable_across_runs() {
    // Mirrors the shape `report::write_published_results` emits: a sorted
    // map of slice-key -> {group_key, metrics, reliability}.
    let entries = json!({
        "openai": {
            "group_key": {"vendor": "openai"},
            "metrics": {
                "count": 2,
                "mean_score": 0.75,
                "mean_confidence": 0.6,
                "accuracy": 0.5,
                "ece": 0.1,
                "brier": 0.2,
                "overconfidence_rate": 0.5
            },
            "reliability": []
        }
    });
    let first = serde_json::to_string_pretty(&entries).unwrap();
    let second = serde_json::to_string_pretty(&entries).unwrap();
    assert_eq!(first, second, "identical inputs must serialize byte-identically");
}
