//! Rubric descriptors
//!
//! A rubric is the data that turns the generic evaluator into one assessment
//! type: criteria names, qualitative labels, judge settings, prompt prose and
//! the scenario catalog. Rubrics are loaded from YAML at startup and never
//! modified afterwards.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::catalog::ScenarioCatalog;

/// Keys the parser reserves for itself; criteria and labels may not reuse them.
pub const RESERVED_REPLY_KEYS: &[&str] = &["feedback", "suggestions", "answer"];

/// Assessment types offered by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    PromptEngineering,
    Writing,
    TaskManagement,
    DataAnalysis,
    Presentation,
    Productivity,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 6] = [
        AssessmentType::PromptEngineering,
        AssessmentType::Writing,
        AssessmentType::TaskManagement,
        AssessmentType::DataAnalysis,
        AssessmentType::Presentation,
        AssessmentType::Productivity,
    ];

    /// Snake-case identifier, also the rubric file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::PromptEngineering => "prompt_engineering",
            AssessmentType::Writing => "writing",
            AssessmentType::TaskManagement => "task_management",
            AssessmentType::DataAnalysis => "data_analysis",
            AssessmentType::Presentation => "presentation",
            AssessmentType::Productivity => "productivity",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept kebab-case as well, matching the evaluate-* route names
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AssessmentType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown assessment type '{}'", s))
    }
}

/// One scored dimension
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Criterion {
    /// JSON key the judge must emit
    pub name: String,
    pub title: String,
    pub description: String,
}

/// Shape of a qualitative label in the judge reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Text,
    List,
}

/// Type-specific qualitative field (e.g. `efficiency_rating`, `recommended_tools`)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabelSpec {
    pub name: String,
    pub kind: LabelKind,
    /// Placeholder shown to the judge in the output-format directive
    pub hint: String,
    /// Value used for text labels when the judge omits them
    #[serde(default)]
    pub default: Option<String>,
}

/// Numeric range mapped to a qualitative level, used to calibrate the judge
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoringBand {
    pub min: u8,
    pub max: u8,
    pub level: String,
    pub guidance: String,
}

/// Worked examples of strong and weak answers
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Examples {
    #[serde(default)]
    pub strong: Vec<String>,
    #[serde(default)]
    pub weak: Vec<String>,
}

/// Settings for the answer-generation call made before prompt evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerGeneration {
    pub system_role: String,
    #[serde(default = "default_answer_temperature")]
    pub temperature: f64,
    #[serde(default = "default_answer_max_tokens")]
    pub max_output_tokens: u64,
}

/// Thresholds for the local pre-checks run on prompt submissions
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicSettings {
    /// Share of submission words found in the reference text above which the
    /// submission counts as copied
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    /// Ceiling the judge is told to apply when copying or low effort is detected
    #[serde(default = "default_score_cap")]
    pub score_cap: u8,
    #[serde(default)]
    pub lead_phrases: LeadPhrases,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            overlap_threshold: default_overlap_threshold(),
            min_words: default_min_words(),
            score_cap: default_score_cap(),
            lead_phrases: LeadPhrases::default(),
        }
    }
}

/// Opening phrases of an instruction, compiled once when the rubric loads
///
/// Each phrase matches case-insensitively on word boundaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct LeadPhrases {
    set: RegexSet,
}

impl LeadPhrases {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self, regex::Error> {
        let patterns = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(|p| format!(r"(?i)\b{}\b", regex::escape(p)));
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(text)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.set.len()
    }
}

impl Default for LeadPhrases {
    fn default() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }
}

impl TryFrom<Vec<String>> for LeadPhrases {
    type Error = regex::Error;

    fn try_from(phrases: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(&phrases)
    }
}

/// Labelled piece of scenario context (data table, audience, current process)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContextField {
    pub label: String,
    pub text: String,
}

/// A named context bundle the candidate answers against
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScenarioRecord {
    pub key: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub context: Vec<ContextField>,
    /// The question put to the candidate
    pub instruction: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Reference material for the judge only
    #[serde(default, skip_serializing)]
    pub reference_answer: Option<String>,
    #[serde(default, skip_serializing)]
    pub expectations: Vec<String>,
    /// Literal phrases from the question whose presence signals copying
    #[serde(default, skip_serializing)]
    pub copy_markers: Vec<String>,
}

/// Rubric as written in the YAML file, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RubricFile {
    assessment: AssessmentType,
    title: String,
    preamble: String,
    system_role: String,
    #[serde(default = "default_temperature")]
    temperature: f64,
    max_output_tokens: u64,
    #[serde(default = "default_fallback_score")]
    fallback_score: u8,
    submission_label: String,
    default_scenario: String,
    criteria: Vec<Criterion>,
    #[serde(default)]
    suggestions: bool,
    #[serde(default)]
    labels: Vec<LabelSpec>,
    #[serde(default)]
    scoring_bands: Vec<ScoringBand>,
    #[serde(default)]
    examples: Examples,
    #[serde(default)]
    answer_generation: Option<AnswerGeneration>,
    #[serde(default)]
    heuristics: Option<HeuristicSettings>,
    scenarios: Vec<ScenarioRecord>,
}

/// Validated descriptor of one assessment type
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RubricFile")]
pub struct Rubric {
    pub assessment: AssessmentType,
    pub title: String,
    pub preamble: String,
    pub system_role: String,
    pub temperature: f64,
    pub max_output_tokens: u64,
    pub fallback_score: u8,
    pub submission_label: String,
    pub criteria: Vec<Criterion>,
    /// Whether the judge is asked for a `suggestions` list
    pub suggestions: bool,
    pub labels: Vec<LabelSpec>,
    pub scoring_bands: Vec<ScoringBand>,
    pub examples: Examples,
    pub answer_generation: Option<AnswerGeneration>,
    pub heuristics: Option<HeuristicSettings>,
    pub catalog: ScenarioCatalog,
}

impl Rubric {
    /// Criterion names in declaration order
    pub fn criterion_names(&self) -> Vec<&str> {
        self.criteria.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Rubric data that cannot drive an evaluation
#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("rubric defines no criteria")]
    NoCriteria,

    #[error("name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("name '{0}' is reserved by the reply format")]
    ReservedName(String),

    #[error("scenario key '{0}' is used more than once")]
    DuplicateScenario(String),

    #[error("default scenario '{0}' is not defined")]
    MissingDefaultScenario(String),

    #[error("fallback score {0} is above 100")]
    FallbackOutOfRange(u8),
}

impl TryFrom<RubricFile> for Rubric {
    type Error = RubricError;

    fn try_from(file: RubricFile) -> Result<Self, Self::Error> {
        if file.criteria.is_empty() {
            return Err(RubricError::NoCriteria);
        }

        if file.fallback_score > 100 {
            return Err(RubricError::FallbackOutOfRange(file.fallback_score));
        }

        // Criteria and labels share one JSON object in the judge reply
        let mut seen = HashSet::new();
        let names = file
            .criteria
            .iter()
            .map(|c| c.name.as_str())
            .chain(file.labels.iter().map(|l| l.name.as_str()));
        for name in names {
            if RESERVED_REPLY_KEYS.contains(&name) {
                return Err(RubricError::ReservedName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(RubricError::DuplicateName(name.to_string()));
            }
        }

        let catalog = ScenarioCatalog::new(file.scenarios, &file.default_scenario)?;

        Ok(Self {
            assessment: file.assessment,
            title: file.title,
            preamble: file.preamble,
            system_role: file.system_role,
            temperature: file.temperature,
            max_output_tokens: file.max_output_tokens,
            fallback_score: file.fallback_score,
            submission_label: file.submission_label,
            criteria: file.criteria,
            suggestions: file.suggestions,
            labels: file.labels,
            scoring_bands: file.scoring_bands,
            examples: file.examples,
            answer_generation: file.answer_generation,
            heuristics: file.heuristics,
            catalog,
        })
    }
}

fn default_temperature() -> f64 {
    0.3
}

fn default_fallback_score() -> u8 {
    20
}

fn default_answer_temperature() -> f64 {
    0.1
}

fn default_answer_max_tokens() -> u64 {
    500
}

fn default_overlap_threshold() -> f64 {
    0.6
}

fn default_min_words() -> usize {
    8
}

fn default_score_cap() -> u8 {
    40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_type_round_trips_through_str() {
        for t in AssessmentType::ALL {
            assert_eq!(t.as_str().parse::<AssessmentType>().unwrap(), t);
        }
    }

    #[test]
    fn test_assessment_type_accepts_kebab_case() {
        assert_eq!(
            "data-analysis".parse::<AssessmentType>().unwrap(),
            AssessmentType::DataAnalysis
        );
        assert!("cooking".parse::<AssessmentType>().is_err());
    }

    #[test]
    fn test_scenario_serialization_hides_reference_material() {
        let scenario = ScenarioRecord {
            key: "k".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            context: vec![],
            instruction: "q".to_string(),
            requirements: vec![],
            reference_answer: Some("secret".to_string()),
            expectations: vec!["hidden".to_string()],
            copy_markers: vec!["marker".to_string()],
        };

        let json = serde_json::to_string(&scenario).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("hidden"));
        assert!(!json.contains("marker"));
    }

    fn rubric_yaml(criteria: &str, default_scenario: &str) -> String {
        format!(
            r#"assessment: writing
title: Writing
preamble: Evaluate the writing.
system_role: You are a writing instructor.
max_output_tokens: 800
submission_label: SUBMISSION
default_scenario: {default_scenario}
criteria:
{criteria}
scenarios:
  - key: memo
    title: Memo
    description: Write a memo
    instruction: Write it.
"#
        )
    }

    #[test]
    fn test_lead_phrases_compile_from_yaml() {
        let settings: HeuristicSettings =
            serde_yaml::from_str("lead_phrases: [please, based on, '']").unwrap();

        assert_eq!(settings.lead_phrases.len(), 2);
        assert!(settings.lead_phrases.is_match("Based on the table, group people"));
        assert!(!settings.lead_phrases.is_match("Pleased to meet you"));
        assert_eq!(settings.min_words, 8);
    }

    #[test]
    fn test_valid_rubric_applies_defaults() {
        let yaml = rubric_yaml("  - {name: structure, title: S, description: d}", "memo");
        let rubric: Rubric = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(rubric.fallback_score, 20);
        assert_eq!(rubric.temperature, 0.3);
        assert_eq!(rubric.criterion_names(), vec!["structure"]);
        assert!(rubric.heuristics.is_none());
    }

    #[test]
    fn test_rubric_without_criteria_is_rejected() {
        let yaml = rubric_yaml("  []", "memo").replace("criteria:\n  []", "criteria: []");
        let err = serde_yaml::from_str::<Rubric>(&yaml).unwrap_err();
        assert!(err.to_string().contains("no criteria"));
    }

    #[test]
    fn test_reserved_criterion_name_is_rejected() {
        let yaml = rubric_yaml("  - {name: feedback, title: F, description: d}", "memo");
        let err = serde_yaml::from_str::<Rubric>(&yaml).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_duplicate_criterion_name_is_rejected() {
        let yaml = rubric_yaml(
            "  - {name: tone, title: T, description: d}\n  - {name: tone, title: T, description: d}",
            "memo",
        );
        let err = serde_yaml::from_str::<Rubric>(&yaml).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_default_scenario_is_rejected() {
        let yaml = rubric_yaml("  - {name: tone, title: T, description: d}", "letter");
        let err = serde_yaml::from_str::<Rubric>(&yaml).unwrap_err();
        assert!(err.to_string().contains("letter"));
    }
}
