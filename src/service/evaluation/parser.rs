//! Judge reply parsing
//!
//! Judges are asked for a bare JSON object but regularly wrap it in prose or
//! code fences, or leak raw control characters into string values. The reply
//! is run through an ordered list of repair stages; the first stage producing
//! a JSON object wins. Score validation happens after a successful parse and
//! is never repaired.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{CriteriaScores, LabelKind, LabelSpec, LabelValue};

/// Feedback used when the judge omits the field
pub const MISSING_FEEDBACK: &str = "No detailed feedback was returned for this submission.";

/// Feedback attached to the fallback record
pub const FALLBACK_FEEDBACK: &str = "The evaluation response could not be interpreted, so default scores were applied. Please try submitting again.";

/// Structured content of a judge reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub scores: CriteriaScores,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub labels: BTreeMap<String, LabelValue>,
    pub answer: Option<String>,
}

/// Why a reply could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no repair stage produced a JSON object")]
    NotJson,

    #[error("score '{0}' is missing")]
    MissingScore(String),

    #[error("score '{key}' is not an integer in 0..=100: {value}")]
    InvalidScore { key: String, value: String },
}

type RepairStage = fn(&str) -> Option<Map<String, Value>>;

/// Repair strategies, tried in order
const REPAIR_STAGES: [(&str, RepairStage); 3] = [
    ("raw", parse_raw),
    ("strip_control", parse_stripped),
    ("slice_braces", parse_sliced),
];

fn parse_raw(raw: &str) -> Option<Map<String, Value>> {
    serde_json::from_str(raw).ok()
}

fn parse_stripped(raw: &str) -> Option<Map<String, Value>> {
    serde_json::from_str(&strip_control_chars(raw)).ok()
}

fn parse_sliced(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&strip_control_chars(&raw[start..=end])).ok()
}

/// Remove C0 control characters other than tab, newline and carriage return, plus DEL
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| !((c <= '\u{1f}' && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'))
        .collect()
}

/// Run the repair chain and return the first JSON object found
pub fn repair(raw: &str) -> Option<Map<String, Value>> {
    REPAIR_STAGES.iter().find_map(|(name, stage)| {
        let object = stage(raw)?;
        tracing::debug!(stage = name, "Judge reply parsed");
        Some(object)
    })
}

/// Parse a judge reply into scores, feedback and labels
pub fn parse(raw: &str, criteria: &[&str], labels: &[LabelSpec]) -> Result<ParsedReply, ParseFailure> {
    let object = repair(raw).ok_or(ParseFailure::NotJson)?;

    let mut scores = CriteriaScores::new();
    for &key in criteria {
        let value = object
            .get(key)
            .ok_or_else(|| ParseFailure::MissingScore(key.to_string()))?;
        let score = score_value(value).ok_or_else(|| ParseFailure::InvalidScore {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        scores.insert(key.to_string(), score);
    }

    let feedback = object
        .get("feedback")
        .and_then(Value::as_str)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(MISSING_FEEDBACK)
        .to_string();

    let suggestions = object
        .get("suggestions")
        .map(string_items)
        .unwrap_or_default();

    let labels = labels
        .iter()
        .map(|label| (label.name.clone(), label_value(label, object.get(&label.name))))
        .collect();

    let answer = object
        .get("answer")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ParsedReply {
        scores,
        feedback,
        suggestions,
        labels,
        answer,
    })
}

/// Record substituted when a reply cannot be used
pub fn fallback(criteria: &[&str], labels: &[LabelSpec], fallback_score: u8) -> ParsedReply {
    ParsedReply {
        scores: criteria
            .iter()
            .map(|c| (c.to_string(), fallback_score))
            .collect(),
        feedback: FALLBACK_FEEDBACK.to_string(),
        suggestions: Vec::new(),
        labels: labels
            .iter()
            .map(|label| (label.name.clone(), default_label(label)))
            .collect(),
        answer: None,
    }
}

fn score_value(value: &Value) -> Option<u8> {
    if let Some(n) = value.as_u64() {
        return (n <= 100).then_some(n as u8);
    }
    // Some judges emit scores as 80.0
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (0.0..=100.0).contains(&f)).then_some(f as u8)
}

fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn label_value(label: &LabelSpec, value: Option<&Value>) -> LabelValue {
    match (label.kind, value) {
        (LabelKind::Text, Some(Value::String(s))) => LabelValue::Text(s.clone()),
        (LabelKind::List, Some(v @ Value::Array(_))) => LabelValue::List(string_items(v)),
        _ => default_label(label),
    }
}

pub fn default_label(label: &LabelSpec) -> LabelValue {
    match label.kind {
        LabelKind::Text => LabelValue::Text(label.default.clone().unwrap_or_default()),
        LabelKind::List => LabelValue::List(Vec::new()),
    }
}
