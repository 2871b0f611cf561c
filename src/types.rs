//! Core data model for the CBM benchmark.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five supported LLM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    OpenAi,
    Claude,
    Gemini,
    DeepSeek,
    Xai,
}

impl Vendor {
    /// Default bounded-concurrency cap for this vendor.
    pub fn default_rate_limit(&self) -> usize {
        match self {
            Vendor::OpenAi => 50,
            Vendor::Claude => 20,
            Vendor::Gemini => 30,
            Vendor::DeepSeek => 20,
            Vendor::Xai => 10,
        }
    }

    /// Name of the environment variable holding this vendor's API key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "OPENAI_API_KEY_CBM",
            Vendor::Claude => "ANTHROPIC_API_KEY_CBM",
            Vendor::Gemini => "GEMINI_API_KEY_CBM",
            Vendor::DeepSeek => "DEEPSEEK_API_KEY_CBM",
            Vendor::Xai => "XAI_API_KEY_CBM",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "openai",
            Vendor::Claude => "claude",
            Vendor::Gemini => "gemini",
            Vendor::DeepSeek => "deepseek",
            Vendor::Xai => "xai",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Vendor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Vendor::OpenAi),
            "claude" | "anthropic" => Ok(Vendor::Claude),
            "gemini" => Ok(Vendor::Gemini),
            "deepseek" => Ok(Vendor::DeepSeek),
            "xai" | "grok" => Ok(Vendor::Xai),
            _ => anyhow::bail!(
                "unknown vendor: {}. Use one of openai, claude, gemini, deepseek, xai",
                s
            ),
        }
    }
}

/// One of the four prompting/scoring combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    DiscreteCombined,
    DiscreteLinear,
    HlccCombined,
    HlccLinear,
}

impl Variant {
    pub fn all() -> [Variant; 4] {
        [
            Variant::DiscreteCombined,
            Variant::DiscreteLinear,
            Variant::HlccCombined,
            Variant::HlccLinear,
        ]
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, Variant::DiscreteCombined | Variant::DiscreteLinear)
    }

    pub fn is_multi_turn(&self) -> bool {
        matches!(self, Variant::DiscreteLinear | Variant::HlccLinear)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::DiscreteCombined => "discrete_combined",
            Variant::DiscreteLinear => "discrete_linear",
            Variant::HlccCombined => "hlcc_combined",
            Variant::HlccLinear => "hlcc_linear",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discrete_combined" => Ok(Variant::DiscreteCombined),
            "discrete_linear" => Ok(Variant::DiscreteLinear),
            "hlcc_combined" => Ok(Variant::HlccCombined),
            "hlcc_linear" => Ok(Variant::HlccLinear),
            _ => anyhow::bail!(
                "unknown variant: {}. Use one of discrete_combined, discrete_linear, hlcc_combined, hlcc_linear",
                s
            ),
        }
    }
}

/// Either discrete (1/2/3) or continuous ([0,1]) confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceType {
    Discrete,
    Continuous,
}

/// A single (`key`, `text`) option of a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub key: String,
    pub text: String,
}

/// A multiple-choice question drawn from one of the supported datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub dataset: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<QuestionOption>,
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub expected_confidence: Option<f64>,
}

impl Question {
    /// True when `correct_answer`/`options` satisfy the data-model invariant.
    pub fn is_well_formed(&self) -> bool {
        let option_count = self.options.len();
        if !(2..=10).contains(&option_count) {
            return false;
        }
        match &self.correct_answer {
            Some(key) => self.options.iter().any(|o| &o.key == key),
            None => true,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.expected_confidence.is_some()
    }
}

/// One unit of scheduled work: a question run through one variant/vendor/
/// model/temperature at one repetition index.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub question: Question,
    pub variant: Variant,
    pub vendor: Vendor,
    pub model: String,
    pub temperature: f64,
    pub iteration: u32,
}

/// How a result's answer/confidence were extracted from raw model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    Json,
    CodeblockJson,
    Regex,
    Fallback,
    Linear,
    None,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Json => "json",
            ParseMethod::CodeblockJson => "codeblock_json",
            ParseMethod::Regex => "regex",
            ParseMethod::Fallback => "fallback",
            ParseMethod::Linear => "linear",
            ParseMethod::None => "none",
        }
    }
}

/// One completed TaskSpec's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub question_id: String,
    pub dataset: String,
    pub vendor: Vendor,
    pub model: String,
    pub variant: Variant,
    pub temperature: f64,
    pub iteration: u32,
    pub answer_letter: String,
    pub confidence_raw: f64,
    pub confidence_normalized: f64,
    /// Omitted (`null`) for ambiguous-dataset records; see DESIGN.md open
    /// question 3.
    pub score: Option<f64>,
    pub is_correct: bool,
    pub parse_method: ParseMethod,
    pub raw_response: String,
    pub timestamp: DateTime<Utc>,
    pub latency_seconds: f64,
}

/// Maximum stored length of `raw_response`, in bytes.
pub const RAW_RESPONSE_BYTE_CAP: usize = 500;

/// Truncates `s` to at most `RAW_RESPONSE_BYTE_CAP` bytes on a char boundary.
pub fn truncate_raw_response(s: &str) -> String {
    if s.len() <= RAW_RESPONSE_BYTE_CAP {
        return s.to_string();
    }
    let mut end = RAW_RESPONSE_BYTE_CAP;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// A single vendor's entry in the model registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelRegistryEntry {
    pub vendor: Option<String>,
    pub models: Vec<String>,
}

/// Counts surfaced in the run summary.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    pub tasks_completed: usize,
    pub tasks_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_invariant_rejects_too_few_options() {
        let q = Question {
            id: "q1".into(),
            dataset: "mmlu".into(),
            subject: None,
            text: "stem".into(),
            options: vec![QuestionOption { key: "A".into(), text: "one".into() }],
            correct_answer: Some("A".into()),
            expected_confidence: None,
        };
        assert!(!q.is_well_formed());
    }

    #[test]
    fn question_invariant_rejects_unknown_correct_answer() {
        let q = Question {
            id: "q1".into(),
            dataset: "mmlu".into(),
            subject: None,
            text: "stem".into(),
            options: vec![
                QuestionOption { key: "A".into(), text: "one".into() },
                QuestionOption { key: "B".into(), text: "two".into() },
            ],
            correct_answer: Some("C".into()),
            expected_confidence: None,
        };
        assert!(!q.is_well_formed());
    }

    #[test]
    fn variant_round_trips_through_str() {
        for v in Variant::all() {
            assert_eq!(v.as_str().parse::<Variant>().unwrap(), v);
        }
    }

    #[test]
    fn vendor_round_trips_through_str() {
        for v in [Vendor::OpenAi, Vendor::Claude, Vendor::Gemini, Vendor::DeepSeek, Vendor::Xai] {
            assert_eq!(v.as_str().parse::<Vendor>().unwrap(), v);
        }
    }

    #[test]
    fn truncate_respects_cap_and_char_boundaries() {
        let s = "a".repeat(600);
        let t = truncate_raw_response(&s);
        assert_eq!(t.len(), RAW_RESPONSE_BYTE_CAP);
    }
}
