//! Scenario catalog and rubric registry
//!
//! Rubrics ship embedded in the binary and can be replaced per assessment
//! type from a directory named in the configuration. The registry is built
//! once at startup and shared read-only between request handlers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::model::{AssessmentType, Rubric, RubricError, ScenarioRecord};

/// Embedded rubric files, keyed by assessment type
const EMBEDDED_RUBRICS: [(AssessmentType, &str); 6] = [
    (
        AssessmentType::PromptEngineering,
        include_str!("../../rubrics/prompt_engineering.yaml"),
    ),
    (
        AssessmentType::Writing,
        include_str!("../../rubrics/writing.yaml"),
    ),
    (
        AssessmentType::TaskManagement,
        include_str!("../../rubrics/task_management.yaml"),
    ),
    (
        AssessmentType::DataAnalysis,
        include_str!("../../rubrics/data_analysis.yaml"),
    ),
    (
        AssessmentType::Presentation,
        include_str!("../../rubrics/presentation.yaml"),
    ),
    (
        AssessmentType::Productivity,
        include_str!("../../rubrics/productivity.yaml"),
    ),
];

/// Catalog lookup and loading errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown scenario '{key}' for assessment '{assessment}'")]
    UnknownScenario {
        assessment: AssessmentType,
        key: String,
    },

    #[error("Unknown assessment type: {0}")]
    UnknownAssessment(String),

    #[error("Invalid rubric '{source_name}': {message}")]
    InvalidRubric { source_name: String, message: String },

    #[error("Rubric '{source_name}' declares assessment '{found}', expected '{expected}'")]
    AssessmentMismatch {
        source_name: String,
        expected: AssessmentType,
        found: AssessmentType,
    },

    #[error("Failed to read rubric file {path}: {message}")]
    Io { path: String, message: String },
}

/// Immutable set of scenarios for one assessment type
///
/// Evaluation goes through [`ScenarioCatalog::lookup`], which never fails.
/// The explicit lookup endpoint uses [`ScenarioCatalog::get`].
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<ScenarioRecord>,
    default_index: usize,
}

impl ScenarioCatalog {
    /// Build a catalog; the default key must name one of the scenarios
    pub fn new(scenarios: Vec<ScenarioRecord>, default_key: &str) -> Result<Self, RubricError> {
        for (i, scenario) in scenarios.iter().enumerate() {
            if scenarios[..i].iter().any(|s| s.key == scenario.key) {
                return Err(RubricError::DuplicateScenario(scenario.key.clone()));
            }
        }

        let default_index = scenarios
            .iter()
            .position(|s| s.key == default_key)
            .ok_or_else(|| RubricError::MissingDefaultScenario(default_key.to_string()))?;

        Ok(Self {
            scenarios,
            default_index,
        })
    }

    /// Resolve a scenario key, falling back to the default for unknown or empty keys
    pub fn lookup(&self, key: &str) -> &ScenarioRecord {
        self.find(key).unwrap_or_else(|| self.default_scenario())
    }

    /// Resolve a scenario key exactly
    pub fn get(&self, key: &str) -> Option<&ScenarioRecord> {
        self.find(key)
    }

    /// All scenarios in declaration order
    pub fn list(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    pub fn default_scenario(&self) -> &ScenarioRecord {
        &self.scenarios[self.default_index]
    }

    fn find(&self, key: &str) -> Option<&ScenarioRecord> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.scenarios.iter().find(|s| s.key == key)
    }
}

/// All rubrics known to the service
#[derive(Debug, Clone)]
pub struct RubricRegistry {
    rubrics: HashMap<AssessmentType, Arc<Rubric>>,
}

impl RubricRegistry {
    /// Load the embedded rubrics, replacing any that have a file in `override_dir`
    pub fn load(override_dir: Option<&Path>) -> Result<Self, CatalogError> {
        let mut rubrics = HashMap::new();

        for (assessment, embedded) in EMBEDDED_RUBRICS {
            let override_path = override_dir
                .map(|dir| dir.join(format!("{}.yaml", assessment.as_str())))
                .filter(|p| p.is_file());

            let rubric = match override_path {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path).map_err(|e| CatalogError::Io {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                    tracing::info!(
                        assessment = %assessment,
                        path = %path.display(),
                        "Loaded rubric override"
                    );
                    parse_rubric(&path.display().to_string(), &contents, assessment)?
                }
                None => parse_rubric(assessment.as_str(), embedded, assessment)?,
            };

            tracing::debug!(
                assessment = %assessment,
                criteria = rubric.criteria.len(),
                scenarios = rubric.catalog.list().len(),
                "Rubric registered"
            );

            rubrics.insert(assessment, Arc::new(rubric));
        }

        Ok(Self { rubrics })
    }

    /// Load only the embedded rubrics
    #[cfg(test)]
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::load(None)
    }

    pub fn get(&self, assessment: AssessmentType) -> Option<Arc<Rubric>> {
        self.rubrics.get(&assessment).cloned()
    }

    /// Look up one scenario exactly; the error path of the catalog endpoint
    pub fn scenario(
        &self,
        assessment: AssessmentType,
        key: &str,
    ) -> Result<ScenarioRecord, CatalogError> {
        let rubric = self
            .rubrics
            .get(&assessment)
            .ok_or_else(|| CatalogError::UnknownAssessment(assessment.to_string()))?;

        rubric
            .catalog
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownScenario {
                assessment,
                key: key.to_string(),
            })
    }

    pub fn is_complete(&self) -> bool {
        AssessmentType::ALL
            .iter()
            .all(|t| self.rubrics.contains_key(t))
    }

    pub fn len(&self) -> usize {
        self.rubrics.len()
    }
}

fn parse_rubric(
    source_name: &str,
    contents: &str,
    expected: AssessmentType,
) -> Result<Rubric, CatalogError> {
    let deserializer = serde_yaml::Deserializer::from_str(contents);
    let rubric = Rubric::deserialize(deserializer).map_err(|e| CatalogError::InvalidRubric {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    if rubric.assessment != expected {
        return Err(CatalogError::AssessmentMismatch {
            source_name: source_name.to_string(),
            expected,
            found: rubric.assessment,
        });
    }

    Ok(rubric)
}
