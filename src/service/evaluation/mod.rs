//! Rubric-driven evaluation
//!
//! One [`Evaluator`] per assessment type. The evaluator resolves the scenario,
//! composes the judge instruction, calls the judge, parses the reply (falling
//! back to fixed scores when the reply is unusable) and aggregates the result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::model::{
    AnswerGeneration, AssessmentType, EvaluationRequest, EvaluationResult, Rubric, ScenarioRecord,
};
use crate::service::catalog::RubricRegistry;
use crate::service::evaluation::prompts::{Evidence, build_answer_prompt, compose};
use crate::service::judge::{Judge, JudgeRequest};

pub mod error;
pub mod heuristics;
pub mod parser;
pub mod prompts;
pub mod scoring;

pub use error::EvaluationError;

/// Evaluator for one assessment type
pub struct Evaluator {
    rubric: Arc<Rubric>,
    judge: Arc<dyn Judge>,
}

impl Evaluator {
    pub fn new(rubric: Arc<Rubric>, judge: Arc<dyn Judge>) -> Self {
        Self { rubric, judge }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Score one submission
    ///
    /// Fails only when the judge cannot be reached; unusable replies produce
    /// a degraded result with fallback scores.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let start_time = std::time::Instant::now();
        let assessment = self.rubric.assessment;
        let scenario = self.rubric.catalog.lookup(&request.scenario);

        if scenario.key != request.scenario.trim() {
            tracing::debug!(
                assessment = %assessment,
                requested = %request.scenario,
                scenario = %scenario.key,
                "Scenario key not found, using default scenario"
            );
        }

        let answer = match &self.rubric.answer_generation {
            Some(settings) => Some(
                self.generate_answer(settings, scenario, &request.submission)
                    .await?,
            ),
            None => None,
        };

        let report = self
            .rubric
            .heuristics
            .as_ref()
            .map(|settings| heuristics::analyze(&request.submission, scenario, settings));

        if let Some(report) = &report {
            tracing::debug!(
                assessment = %assessment,
                overlap = report.overlap,
                copied = report.copied,
                too_short = report.too_short,
                has_lead_phrase = report.has_lead_phrase,
                "Heuristic pre-checks completed"
            );
        }

        let instruction = compose(
            &self.rubric,
            scenario,
            request,
            Evidence {
                answer: answer.as_deref(),
                heuristics: report.as_ref(),
            },
        );

        let raw = self
            .judge
            .judge(JudgeRequest {
                instruction: &instruction,
                system_role: &self.rubric.system_role,
                max_output_tokens: self.rubric.max_output_tokens,
                temperature: self.rubric.temperature,
            })
            .await?;

        let criteria = self.rubric.criterion_names();
        let (reply, degraded) = match parser::parse(&raw, &criteria, &self.rubric.labels) {
            Ok(reply) => (reply, false),
            Err(failure) => {
                tracing::warn!(
                    assessment = %assessment,
                    scenario = %scenario.key,
                    model = %self.judge.model(),
                    reply_length = raw.len(),
                    failure = %failure,
                    "Judge reply unusable, applying fallback scores"
                );
                let fallback =
                    parser::fallback(&criteria, &self.rubric.labels, self.rubric.fallback_score);
                (fallback, true)
            }
        };

        let aggregate = scoring::aggregate(&reply.scores);

        tracing::info!(
            assessment = %assessment,
            scenario = %scenario.key,
            overall_score = aggregate.overall,
            grade = %aggregate.grade,
            degraded = degraded,
            elapsed_ms = start_time.elapsed().as_millis(),
            "Evaluation completed"
        );

        Ok(EvaluationResult {
            assessment,
            scenario: scenario.key.clone(),
            criteria: reply.scores,
            overall_score: aggregate.overall,
            passed: aggregate.passed,
            grade: aggregate.grade,
            feedback: reply.feedback,
            suggestions: if self.rubric.suggestions {
                reply.suggestions
            } else {
                Vec::new()
            },
            labels: reply.labels,
            answer: answer.or(reply.answer),
            degraded,
            evaluated_at: Utc::now(),
        })
    }

    /// Run the candidate's prompt against the scenario data
    async fn generate_answer(
        &self,
        settings: &AnswerGeneration,
        scenario: &ScenarioRecord,
        submission: &str,
    ) -> Result<String, EvaluationError> {
        let instruction = build_answer_prompt(scenario, submission);

        tracing::debug!(
            assessment = %self.rubric.assessment,
            scenario = %scenario.key,
            prompt_length = instruction.len(),
            "Generating answer from submitted prompt"
        );

        let answer = self
            .judge
            .judge(JudgeRequest {
                instruction: &instruction,
                system_role: &settings.system_role,
                max_output_tokens: settings.max_output_tokens,
                temperature: settings.temperature,
            })
            .await?;

        Ok(answer.trim().to_string())
    }
}

/// All evaluators, one per registered rubric
pub struct AssessmentService {
    evaluators: HashMap<AssessmentType, Evaluator>,
    judge_model: String,
}

impl AssessmentService {
    pub fn new(registry: &RubricRegistry, judge: Arc<dyn Judge>) -> Self {
        let judge_model = judge.model().to_string();
        let evaluators = AssessmentType::ALL
            .into_iter()
            .filter_map(|assessment| {
                let rubric = registry.get(assessment)?;
                Some((assessment, Evaluator::new(rubric, judge.clone())))
            })
            .collect();

        Self {
            evaluators,
            judge_model,
        }
    }

    pub fn evaluator(&self, assessment: AssessmentType) -> Option<&Evaluator> {
        self.evaluators.get(&assessment)
    }

    /// Whether every assessment type has an evaluator
    pub fn is_complete(&self) -> bool {
        AssessmentType::ALL
            .iter()
            .all(|t| self.evaluators.contains_key(t))
    }

    pub fn judge_model(&self) -> &str {
        &self.judge_model
    }
}
