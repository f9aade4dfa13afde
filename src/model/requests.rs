//! Inbound request bodies, one per assessment type
//!
//! Field names follow the assessment client. Each body converts into the
//! type-independent [`EvaluationRequest`].

use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::evaluation::EvaluationRequest;

/// Implemented by every inbound evaluation body
pub trait Submission {
    /// The free text being scored
    fn submission_text(&self) -> &str;

    fn into_evaluation_request(self) -> EvaluationRequest;
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .filter(|i| !i.trim().is_empty())
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub context_data: String,
    /// Scenario key (defaults to the rubric's default scenario)
    #[serde(default)]
    pub scenario: String,
}

impl Submission for PromptRequest {
    fn submission_text(&self) -> &str {
        &self.prompt
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        EvaluationRequest::new(self.scenario, self.prompt)
            .with_extra("Context data described by the candidate", self.context_data)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WritingRequest {
    /// Writing task key (business_email, project_report, proposal)
    pub task_type: String,
    pub content: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl Submission for WritingRequest {
    fn submission_text(&self) -> &str {
        &self.content
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        let requirements = bullet_list(&self.requirements);
        EvaluationRequest::new(self.task_type, self.content)
            .with_extra("Requirements acknowledged by the candidate", requirements)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskManagementRequest {
    pub scenario_type: String,
    pub user_response: String,
    #[serde(default)]
    pub scenario_data: String,
}

impl Submission for TaskManagementRequest {
    fn submission_text(&self) -> &str {
        &self.user_response
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        EvaluationRequest::new(self.scenario_type, self.user_response)
            .with_extra("Scenario as seen by the candidate", self.scenario_data)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DataAnalysisRequest {
    pub analysis_type: String,
    pub user_approach: String,
    #[serde(default)]
    pub dataset_context: String,
    #[serde(default)]
    pub visualization_requirements: Vec<String>,
}

impl Submission for DataAnalysisRequest {
    fn submission_text(&self) -> &str {
        &self.user_approach
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        let requirements = bullet_list(&self.visualization_requirements);
        EvaluationRequest::new(self.analysis_type, self.user_approach)
            .with_extra("Dataset context", self.dataset_context)
            .with_extra("Visualization requirements", requirements)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PresentationRequest {
    pub presentation_type: String,
    pub content_approach: String,
    #[serde(default)]
    pub audience_context: String,
    #[serde(default)]
    pub presentation_requirements: Vec<String>,
}

impl Submission for PresentationRequest {
    fn submission_text(&self) -> &str {
        &self.content_approach
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        let requirements = bullet_list(&self.presentation_requirements);
        EvaluationRequest::new(self.presentation_type, self.content_approach)
            .with_extra("Audience context", self.audience_context)
            .with_extra("Presentation requirements", requirements)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductivityRequest {
    pub automation_type: String,
    pub workflow_description: String,
}

impl Submission for ProductivityRequest {
    fn submission_text(&self) -> &str {
        &self.workflow_description
    }

    fn into_evaluation_request(self) -> EvaluationRequest {
        EvaluationRequest::new(self.automation_type, self.workflow_description)
    }
}
