//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::error::ApiError;
use crate::api::{assessment, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI Literacy Assessment API",
        description = "Scores free-text assessment submissions against fixed rubrics using an LLM judge"
    ),
    paths(
        health::index,
        health::liveness,
        health::readiness,
        assessment::list_scenarios,
        assessment::get_scenario,
        assessment::get_scenario_legacy,
        assessment::evaluate_prompt,
        assessment::evaluate_writing,
        assessment::evaluate_task_management,
        assessment::evaluate_data_analysis,
        assessment::evaluate_presentation,
        assessment::evaluate_productivity,
    ),
    components(schemas(
        crate::model::EvaluationResult,
        crate::model::Grade,
        crate::model::LabelValue,
        crate::model::AssessmentType,
        crate::model::ScenarioRecord,
        crate::model::ContextField,
        crate::model::requests::PromptRequest,
        crate::model::requests::WritingRequest,
        crate::model::requests::TaskManagementRequest,
        crate::model::requests::DataAnalysisRequest,
        crate::model::requests::PresentationRequest,
        crate::model::requests::ProductivityRequest,
        assessment::ScenarioList,
        crate::api::error::ErrorResponse,
        health::ServiceInfo,
        health::HealthStatus,
        health::ReadinessStatus,
        health::DependencyHealth,
    )),
    tags(
        (name = "assessment", description = "Assessment evaluation and scenario catalogs"),
        (name = "health", description = "Service info and health probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> Result<HttpResponse, ApiError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| ApiError::Internal(format!("Failed to render OpenAPI YAML: {}", e)))?;

    Ok(HttpResponse::Ok().content_type("text/yaml").body(yaml))
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/health/ready",
            "/assessment/{assessment_type}/scenarios/{key}",
            "/assessment/evaluate-prompt",
            "/assessment/evaluate-writing",
            "/assessment/evaluate-task-management",
            "/assessment/evaluate-data-analysis",
            "/assessment/evaluate-presentation",
            "/assessment/evaluate-productivity",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
