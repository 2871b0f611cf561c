//! Response parsing: extracts an answer letter and a
//! confidence value from raw model text, falling back through JSON,
//! fenced-codeblock JSON, and plain regex extraction in turn.

use regex::Regex;
use serde_json::Value;

use crate::types::{ConfidenceType, ParseMethod};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub answer: String,
    pub confidence: f64,
    pub parse_method: ParseMethod,
}

fn default_confidence(confidence_type: ConfidenceType) -> f64 {
    match confidence_type {
        ConfidenceType::Discrete => 2.0,
        ConfidenceType::Continuous => 0.5,
    }
}

fn leading_letter(answer: &str) -> String {
    let upper = answer.trim().to_uppercase();
    if upper.chars().count() > 1 {
        let re = Regex::new(r"^([A-J])").unwrap();
        match re.captures(&upper) {
            Some(caps) => caps[1].to_string(),
            None => upper.chars().next().map(|c| c.to_string()).unwrap_or_default(),
        }
    } else {
        upper
    }
}

fn try_json_parse(content: &str, confidence_type: ConfidenceType) -> Option<ParsedResponse> {
    let text = content.trim();
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let data: Value = serde_json::from_str(&text[start..=end]).ok()?;

    let raw_answer = data
        .get("answer")
        .or_else(|| data.get("selected_option"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let answer = leading_letter(&raw_answer);

    let confidence = match data.get("confidence").or_else(|| data.get("confidence_level")) {
        Some(v) => {
            let mut c = v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))?;
            if confidence_type == ConfidenceType::Continuous && c > 1.0 {
                c /= 100.0;
            }
            c
        }
        None => default_confidence(confidence_type),
    };

    Some(ParsedResponse {
        answer,
        confidence,
        parse_method: ParseMethod::Json,
    })
}

fn try_json_from_codeblock(content: &str, confidence_type: ConfidenceType) -> Option<ParsedResponse> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
    let inner = re.captures(content)?.get(1)?.as_str().to_string();
    try_json_parse(&inner, confidence_type).map(|p| ParsedResponse {
        parse_method: ParseMethod::CodeblockJson,
        ..p
    })
}

/// Extracts a single answer letter from a response expected to contain
/// only the answer (two-turn variants, turn 1).
pub fn parse_answer_only(content: &str) -> String {
    let text = content.trim().to_uppercase();

    if text.chars().count() == 1 {
        if let Some(c) = text.chars().next() {
            if ('A'..='J').contains(&c) {
                return c.to_string();
            }
        }
    }

    let leading = Regex::new(r"^([A-J])[.):\s]").unwrap();
    if let Some(caps) = leading.captures(&text) {
        return caps[1].to_string();
    }

    let phrase = Regex::new(r"(?i)(?:answer|option|choice)\s*(?:is|:)\s*([A-J])").unwrap();
    if let Some(caps) = phrase.captures(&text) {
        return caps[1].to_uppercase();
    }

    let standalone = Regex::new(r"\b([A-J])\b").unwrap();
    if let Some(caps) = standalone.captures(&text) {
        return caps[1].to_uppercase();
    }

    String::new()
}

/// Extracts a confidence value from a response expected to contain only
/// the confidence (two-turn variants, turn 2).
pub fn parse_confidence_only(content: &str, confidence_type: ConfidenceType) -> f64 {
    let text = content.trim();

    match confidence_type {
        ConfidenceType::Discrete => {
            let re = Regex::new(r"\b([123])\b").unwrap();
            re.captures(text)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(2.0)
        }
        ConfidenceType::Continuous => {
            let exact = Regex::new(r"\b(0\.\d+|1\.0|0|1)\b").unwrap();
            if let Some(caps) = exact.captures(text) {
                if let Ok(v) = caps[1].parse::<f64>() {
                    return v;
                }
            }
            let any_number = Regex::new(r"(\d+\.?\d*)").unwrap();
            if let Some(caps) = any_number.captures(text) {
                if let Ok(mut v) = caps[1].parse::<f64>() {
                    if v > 1.0 {
                        v /= 100.0;
                    }
                    return v.clamp(0.0, 1.0);
                }
            }
            0.5
        }
    }
}

fn regex_extract_combined(content: &str, confidence_type: ConfidenceType) -> ParsedResponse {
    let answer = parse_answer_only(content);
    let confidence = parse_confidence_only(content, confidence_type);
    let parse_method = if answer.is_empty() {
        ParseMethod::Fallback
    } else {
        ParseMethod::Regex
    };
    ParsedResponse {
        answer,
        confidence,
        parse_method,
    }
}

/// Parses a single-turn (combined) response, trying JSON, then
/// codeblock-fenced JSON, then falling back to plain regex extraction.
pub fn parse_combined_response(content: &str, confidence_type: ConfidenceType) -> ParsedResponse {
    if let Some(parsed) = try_json_parse(content, confidence_type) {
        return parsed;
    }
    if let Some(parsed) = try_json_from_codeblock(content, confidence_type) {
        return parsed;
    }
    regex_extract_combined(content, confidence_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_json() {
        let p = parse_combined_response(r#"{"answer": "A", "confidence": 2}"#, ConfidenceType::Discrete);
        assert_eq!(p.answer, "A");
        assert_eq!(p.confidence, 2.0);
        assert_eq!(p.parse_method, ParseMethod::Json);
    }

    #[test]
    fn coerces_string_valued_confidence_in_json() {
        let p = parse_combined_response(r#"{"answer": "A", "confidence": "2"}"#, ConfidenceType::Discrete);
        assert_eq!(p.answer, "A");
        assert_eq!(p.confidence, 2.0);
        assert_eq!(p.parse_method, ParseMethod::Json);
    }

    #[test]
    fn parses_json_wrapped_in_codeblock() {
        let content = "Here is my answer:\n```json\n{\"answer\": \"B\", \"confidence\": 0.75}\n```";
        let p = parse_combined_response(content, ConfidenceType::Continuous);
        assert_eq!(p.answer, "B");
        assert_eq!(p.confidence, 0.75);
        assert_eq!(p.parse_method, ParseMethod::CodeblockJson);
    }

    #[test]
    fn normalizes_continuous_confidence_given_as_percentage() {
        let p = parse_combined_response(r#"{"answer": "C", "confidence": 85}"#, ConfidenceType::Continuous);
        assert_eq!(p.confidence, 0.85);
    }

    #[test]
    fn falls_back_to_regex_when_json_absent() {
        let p = parse_combined_response("The answer is D, and I'm fairly confident: 3", ConfidenceType::Discrete);
        assert_eq!(p.answer, "D");
        assert_eq!(p.confidence, 3.0);
        assert_eq!(p.parse_method, ParseMethod::Regex);
    }

    #[test]
    fn fallback_parse_method_when_no_answer_found() {
        let p = parse_combined_response("I cannot determine an answer.", ConfidenceType::Discrete);
        assert_eq!(p.answer, "");
        assert_eq!(p.parse_method, ParseMethod::Fallback);
    }

    #[test]
    fn answer_only_handles_bare_letter() {
        assert_eq!(parse_answer_only("A"), "A");
        assert_eq!(parse_answer_only("b)"), "B");
        assert_eq!(parse_answer_only("The answer is: C"), "C");
    }

    #[test]
    fn confidence_only_discrete_defaults_to_medium() {
        assert_eq!(parse_confidence_only("no number here", ConfidenceType::Discrete), 2.0);
        assert_eq!(parse_confidence_only("I'd say 1", ConfidenceType::Discrete), 1.0);
    }

    #[test]
    fn confidence_only_continuous_defaults_to_mid() {
        assert_eq!(parse_confidence_only("unsure", ConfidenceType::Continuous), 0.5);
        assert_eq!(parse_confidence_only("0.9 seems right", ConfidenceType::Continuous), 0.9);
    }
}
