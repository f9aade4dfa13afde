//! Evaluation input and output models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::rubric::AssessmentType;

/// Extra labelled text supplied by the candidate alongside the submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserField {
    pub label: String,
    pub value: String,
}

/// Normalized evaluation input, independent of the assessment type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Scenario selector; unknown or empty keys fall back to the default scenario
    pub scenario: String,
    /// The free text being scored
    pub submission: String,
    #[serde(default)]
    pub extras: Vec<UserField>,
}

impl EvaluationRequest {
    pub fn new(scenario: impl Into<String>, submission: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            submission: submission.into(),
            extras: Vec::new(),
        }
    }

    /// Attach an extra field, skipping blank values
    pub fn with_extra(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.extras.push(UserField {
                label: label.into(),
                value,
            });
        }
        self
    }
}

/// Criterion name to score in [0, 100]
pub type CriteriaScores = BTreeMap<String, u8>;

/// Letter grade derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Value of a qualitative label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LabelValue {
    Text(String),
    List(Vec<String>),
}

/// Final, immutable outcome of one evaluation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResult {
    pub assessment: AssessmentType,
    /// Key of the scenario actually used (after default fallback)
    pub scenario: String,
    #[schema(value_type = BTreeMap<String, u8>)]
    pub criteria: CriteriaScores,
    pub overall_score: u8,
    pub passed: bool,
    pub grade: Grade,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, LabelValue>,
    /// Answer produced by running the candidate's prompt (prompt engineering only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// True when the judge reply could not be parsed and fallback scores were used
    pub degraded: bool,
    pub evaluated_at: DateTime<Utc>,
}
