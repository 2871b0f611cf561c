//! Prompt construction: builds the initial prompt and, for
//! two-turn variants, the follow-up confidence prompt.

use crate::types::{Question, Variant};

fn format_options(question: &Question) -> String {
    question
        .options
        .iter()
        .map(|opt| format!("  {}) {}", opt.key, opt.text))
        .collect::<Vec<_>>()
        .join("\n")
}

const DISCRETE_COMBINED_PROMPT: &str = "Answer the following multiple choice question and state your confidence level.

Question: {question}

Options:
{options}

Respond in JSON format exactly like this:
{{\"answer\": \"A\", \"confidence\": 2}}

Where confidence is:
  1 = Low (you are guessing; correct +1.0, incorrect 0)
  2 = Medium (you are somewhat confident; correct +1.5, incorrect -0.5)
  3 = High (you are very confident; correct +2.0, incorrect -2.0)

Respond ONLY with the JSON object, no other text.";

const DISCRETE_LINEAR_PROMPT_Q: &str = "Answer the following multiple choice question.

Question: {question}

Options:
{options}

Respond with ONLY a single letter (e.g., A), no other text.";

const DISCRETE_LINEAR_PROMPT_C: &str = "Now rate your confidence in your previous answer.

The confidence level will change your score on the question:
  1 = Low (correct +1.0, incorrect 0)
  2 = Medium (correct +1.5, incorrect -0.5)
  3 = High (correct +2.0, incorrect -2.0)

Respond with ONLY a single number (1, 2, or 3), no other text.";

const HLCC_COMBINED_PROMPT: &str = "Answer the following multiple choice question and state your confidence as a decimal between 0.0 and 1.0.

Question: {question}

Options:
{options}

Respond in JSON format exactly like this:
{{\"answer\": \"A\", \"confidence\": 0.85}}

Your confidence score (x) affects your mark:
  - If correct: score = x + 1 (range: 1.0 to 2.0)
  - If incorrect: score = -2 * x^2 (range: 0 to -2.0)

Your optimal strategy is to set confidence equal to your true probability of being correct.

Respond ONLY with the JSON object, no other text.";

const HLCC_LINEAR_PROMPT_Q: &str = "Answer the following multiple choice question.

Question: {question}

Options:
{options}

Respond with ONLY a single letter (e.g., A), no other text.";

const HLCC_LINEAR_PROMPT_C: &str = "Now rate your confidence in your previous answer as a decimal between 0.0 and 1.0.

Your confidence score (x) affects your mark:
  - If correct: score = x + 1 (range: 1.0 to 2.0)
  - If incorrect: score = -2 * x^2 (range: 0 to -2.0)

Your optimal strategy is to set confidence equal to your true probability of being correct.

Respond with ONLY a single decimal number between 0.0 and 1.0, no other text.";

fn fill(template: &str, question: &Question) -> String {
    template
        .replace("{question}", &question.text)
        .replace("{options}", &format_options(question))
}

/// Confidence elicitation strategy: builds the initial prompt and, for
/// two-turn variants, the follow-up prompt.
pub trait PromptStrategy {
    fn build_prompt(&self, question: &Question) -> String;
    fn build_followup(&self, question: &Question) -> Option<String>;
    fn is_multi_turn(&self) -> bool;
    fn name(&self) -> &'static str;
}

pub struct CombinedStrategy {
    discrete: bool,
}

impl PromptStrategy for CombinedStrategy {
    fn build_prompt(&self, question: &Question) -> String {
        let template = if self.discrete {
            DISCRETE_COMBINED_PROMPT
        } else {
            HLCC_COMBINED_PROMPT
        };
        fill(template, question)
    }

    fn build_followup(&self, _question: &Question) -> Option<String> {
        None
    }

    fn is_multi_turn(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        if self.discrete {
            "discrete_combined"
        } else {
            "hlcc_combined"
        }
    }
}

pub struct LinearStrategy {
    discrete: bool,
}

impl PromptStrategy for LinearStrategy {
    fn build_prompt(&self, question: &Question) -> String {
        let template = if self.discrete {
            DISCRETE_LINEAR_PROMPT_Q
        } else {
            HLCC_LINEAR_PROMPT_Q
        };
        fill(template, question)
    }

    fn build_followup(&self, _question: &Question) -> Option<String> {
        Some(
            if self.discrete {
                DISCRETE_LINEAR_PROMPT_C
            } else {
                HLCC_LINEAR_PROMPT_C
            }
            .to_string(),
        )
    }

    fn is_multi_turn(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        if self.discrete {
            "discrete_linear"
        } else {
            "hlcc_linear"
        }
    }
}

/// Returns the strategy for a given variant.
pub fn strategy_for_variant(variant: Variant) -> Box<dyn PromptStrategy> {
    match variant {
        Variant::DiscreteCombined => Box::new(CombinedStrategy { discrete: true }),
        Variant::DiscreteLinear => Box::new(LinearStrategy { discrete: true }),
        Variant::HlccCombined => Box::new(CombinedStrategy { discrete: false }),
        Variant::HlccLinear => Box::new(LinearStrategy { discrete: false }),
    }
}
