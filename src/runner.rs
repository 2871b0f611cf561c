//! Run planner / executor: enumerates the TaskSpec Cartesian
//! product, dispatches it in bounded-concurrency batches, and collects the
//! resulting records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::config::{BenchmarkConfig, ProviderConfig, BATCH_SIZE};
use crate::parser::{parse_answer_only, parse_combined_response, parse_confidence_only};
use crate::prompting::strategy_for_variant;
use crate::provider::{Message, VendorCaller};
use crate::scoring::scorer_for_variant;
use crate::types::{truncate_raw_response, ParseMethod, Question, ResultRecord, RunSummary, TaskSpec, Variant, Vendor};

/// Resolves, for a run configuration and a loaded model registry, which
/// vendors are eligible (allow-listed AND API key present) and the
/// (vendor, model) pairs to schedule, applying the model allow-list.
pub fn eligible_vendor_models(
    config: &BenchmarkConfig,
    registry: &HashMap<Vendor, Vec<String>>,
) -> (HashMap<Vendor, ProviderConfig>, Vec<(Vendor, String)>) {
    let mut provider_configs = HashMap::new();
    let mut pairs = Vec::new();

    for (&vendor, models) in registry {
        if !config.vendor_allow_list.is_empty() && !config.vendor_allow_list.contains(&vendor) {
            continue;
        }
        let provider_config = ProviderConfig::for_vendor(vendor);
        if !provider_config.is_available() {
            continue;
        }
        for model in models {
            if !config.model_allow_list.is_empty() && !config.model_allow_list.contains(model) {
                continue;
            }
            pairs.push((vendor, model.clone()));
        }
        provider_configs.insert(vendor, provider_config);
    }

    (provider_configs, pairs)
}

/// Enumerates TaskSpecs as the full Cartesian product of questions, variants,
/// (vendor, model) pairs, and temperatures, repeated `repetitions` times.
/// Concurrent dispatch may complete them in any order — the ordering here is
/// only an enumeration artifact.
pub fn enumerate_tasks(
    questions: &[Question],
    variants: &[Variant],
    vendor_models: &[(Vendor, String)],
    temperatures: &[f64],
    repetitions: u32,
) -> Vec<TaskSpec> {
    let mut tasks = Vec::new();
    for question in questions {
        for &variant in variants {
            for (vendor, model) in vendor_models {
                for &temperature in temperatures {
                    for iteration in 0..repetitions {
                        tasks.push(TaskSpec {
                            question: question.clone(),
                            variant,
                            vendor: *vendor,
                            model: model.clone(),
                            temperature,
                            iteration,
                        });
                    }
                }
            }
        }
    }
    tasks
}

/// Runs one TaskSpec to completion: builds the prompt(s), calls the vendor
/// adapter through the rate limiter, parses the reply, and scores it.
/// Returns `None` on any adapter-reported failure — the caller counts this
/// as a failed task, never as an error.
async fn execute_task(
    client: &dyn VendorCaller,
    provider_configs: &HashMap<Vendor, ProviderConfig>,
    limiter: &crate::rate_limiter::RateLimiter,
    task: TaskSpec,
) -> Option<ResultRecord> {
    let provider_config = provider_configs.get(&task.vendor)?;
    let strategy = strategy_for_variant(task.variant);
    let scorer = scorer_for_variant(task.variant);

    // Held across both turns of a two-turn variant: turn 2 must not race
    // turn 1 on the same conversation, and both count against the same
    // vendor slot.
    let _permit = limiter.acquire(task.vendor).await;
    let start = Instant::now();

    let (answer, confidence_raw, parse_method, raw_text) = if strategy.is_multi_turn() {
        let turn1 = strategy.build_prompt(&task.question);
        let mut messages = vec![Message::user(turn1)];
        let reply1 = client.call_boxed(provider_config, &messages, &task.model, task.temperature).await?;
        let answer = parse_answer_only(&reply1);

        messages.push(Message::assistant(reply1));
        let followup = strategy
            .build_followup(&task.question)
            .expect("multi-turn strategy always has a followup prompt");
        messages.push(Message::user(followup));
        let reply2 = client.call_boxed(provider_config, &messages, &task.model, task.temperature).await?;
        let confidence = parse_confidence_only(&reply2, scorer.confidence_type());

        (answer, confidence, ParseMethod::Linear, reply2)
    } else {
        let prompt = strategy.build_prompt(&task.question);
        let messages = vec![Message::user(prompt)];
        let reply = client.call_boxed(provider_config, &messages, &task.model, task.temperature).await?;
        let parsed = parse_combined_response(&reply, scorer.confidence_type());
        (parsed.answer, parsed.confidence, parsed.parse_method, reply)
    };

    let latency_seconds = start.elapsed().as_secs_f64();
    let confidence_normalized = scorer.normalize(confidence_raw);
    let is_ambiguous = task.question.is_ambiguous();
    let is_correct = !is_ambiguous
        && task
            .question
            .correct_answer
            .as_deref()
            .map(|correct| correct == answer)
            .unwrap_or(false);
    let score = if is_ambiguous { None } else { Some(scorer.score(confidence_raw, is_correct)) };

    Some(ResultRecord {
        question_id: task.question.id,
        dataset: task.question.dataset,
        vendor: task.vendor,
        model: task.model,
        variant: task.variant,
        temperature: task.temperature,
        iteration: task.iteration,
        answer_letter: answer,
        confidence_raw,
        confidence_normalized,
        score,
        is_correct,
        parse_method,
        raw_response: truncate_raw_response(&raw_text),
        timestamp: Utc::now(),
        latency_seconds,
    })
}

pub struct RunOutcome {
    pub records: Vec<ResultRecord>,
    pub summary: RunSummary,
}

/// Dispatches `tasks` in batches of [`BATCH_SIZE`], all tasks within a
/// batch concurrently, invoking `on_progress(completed, total)` after each
/// batch. `completed` counts both successes and failures.
///
/// `cancel`, when set to `true` by the caller (e.g. a ctrl-c handler), takes
/// effect at the next batch boundary: the in-flight batch runs to
/// completion, but no further batches are dispatched. Checked once before
/// each batch, never mid-batch.
pub async fn execute(
    tasks: Vec<TaskSpec>,
    client: Arc<dyn VendorCaller>,
    provider_configs: Arc<HashMap<Vendor, ProviderConfig>>,
    limiter: Arc<crate::rate_limiter::RateLimiter>,
    cancel: Arc<AtomicBool>,
    mut on_progress: impl FnMut(usize, usize),
) -> RunOutcome {
    let total = tasks.len();
    let mut records = Vec::with_capacity(total);
    let mut summary = RunSummary::default();

    for batch in tasks.chunks(BATCH_SIZE) {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        let concurrency = batch.len().max(1);
        let results: Vec<Option<ResultRecord>> = stream::iter(batch.to_vec())
            .map(|task| {
                let client = client.clone();
                let provider_configs = provider_configs.clone();
                let limiter = limiter.clone();
                async move { execute_task(&client, &provider_configs, &limiter, task).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for outcome in results {
            match outcome {
                Some(record) => {
                    records.push(record);
                    summary.tasks_completed += 1;
                }
                None => summary.tasks_failed += 1,
            }
        }

        on_progress(summary.tasks_completed + summary.tasks_failed, total);
    }

    RunOutcome { records, summary }
}
