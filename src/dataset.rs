//! Question-file and model-registry loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{ModelRegistryEntry, Question, Vendor};

/// Top-level shapes the unified question file may take: `{"questions":
/// [...]}`, `{"eval_data": [...]}`, or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionFile {
    Questions { questions: Vec<Question> },
    EvalData { eval_data: Vec<Question> },
    Bare(Vec<Question>),
}

impl QuestionFile {
    fn into_questions(self) -> Vec<Question> {
        match self {
            QuestionFile::Questions { questions } => questions,
            QuestionFile::EvalData { eval_data } => eval_data,
            QuestionFile::Bare(questions) => questions,
        }
    }
}

/// Loads the unified question file, accepting any of the three top-level
/// shapes it may take, and drops questions that violate the option-count
/// or correct-answer invariant (logged, not fatal — the file itself may
/// still be well-formed JSON).
pub async fn load_questions(path: impl AsRef<Path>) -> Result<Vec<Question>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read question file {path:?}"))?;
    let parsed: QuestionFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse question file {path:?}"))?;

    let mut questions = parsed.into_questions();
    let before = questions.len();
    questions.retain(|q| {
        let ok = q.is_well_formed();
        if !ok {
            tracing::warn!(question_id = %q.id, "dropping malformed question: options/correct_answer invariant violated");
        }
        ok
    });
    tracing::info!("loaded {} questions ({} dropped as malformed)", questions.len(), before - questions.len());

    Ok(questions)
}

/// Applies the per-subject sample cap, grouping by
/// `subject` (questions with no subject are grouped under their dataset
/// tag) and truncating each group deterministically by question id.
pub fn apply_sample_cap(mut questions: Vec<Question>, cap: Option<usize>) -> Vec<Question> {
    let Some(cap) = cap else { return questions };

    questions.sort_by(|a, b| a.id.cmp(&b.id));
    let mut by_group: HashMap<String, Vec<Question>> = HashMap::new();
    for q in questions.drain(..) {
        let key = q.subject.clone().unwrap_or_else(|| q.dataset.clone());
        by_group.entry(key).or_default().push(q);
    }

    let mut capped: Vec<Question> = by_group
        .into_values()
        .flat_map(|group| group.into_iter().take(cap))
        .collect();
    capped.sort_by(|a, b| a.id.cmp(&b.id));
    capped
}

/// The model registry file: vendor-display-name → vendor key + model list.
pub async fn load_model_registry(path: impl AsRef<Path>) -> Result<HashMap<Vendor, Vec<String>>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read model registry {path:?}"))?;
    let raw: HashMap<String, ModelRegistryEntry> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse model registry {path:?}"))?;

    let mut registry: HashMap<Vendor, Vec<String>> = HashMap::new();
    for (display_name, entry) in raw {
        let vendor_str = entry.vendor.unwrap_or_else(|| display_name.to_lowercase());
        match vendor_str.parse::<Vendor>() {
            Ok(vendor) => registry.entry(vendor).or_default().extend(entry.models),
            Err(e) => tracing::warn!("skipping unknown vendor in model registry: {e}"),
        }
    }
    Ok(registry)
}
