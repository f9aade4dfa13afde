//! REST API endpoints for assessments and their scenario catalogs

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::requests::{
    DataAnalysisRequest, PresentationRequest, ProductivityRequest, PromptRequest, Submission,
    TaskManagementRequest, WritingRequest,
};
use crate::model::{AssessmentType, ScenarioRecord};
use crate::service::catalog::RubricRegistry;
use crate::service::evaluation::AssessmentService;

/// Scenarios offered for one assessment type
#[derive(Debug, Serialize, ToSchema)]
pub struct ScenarioList {
    pub assessment: AssessmentType,
    /// Scenario used when a request names an unknown key
    pub default_scenario: String,
    pub scenarios: Vec<ScenarioRecord>,
}

fn parse_assessment(raw: &str) -> Result<AssessmentType, ApiError> {
    raw.parse().map_err(ApiError::NotFound)
}

/// List the scenarios of an assessment type
#[utoipa::path(
    get,
    path = "/assessment/{assessment_type}/scenarios",
    params(
        ("assessment_type" = String, Path, description = "Assessment type, e.g. data_analysis")
    ),
    responses(
        (status = 200, description = "Scenarios retrieved successfully", body = ScenarioList),
        (status = 404, description = "Unknown assessment type", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[get("/assessment/{assessment_type}/scenarios")]
pub async fn list_scenarios(
    registry: web::Data<RubricRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let assessment = parse_assessment(&path)?;
    let rubric = registry
        .get(assessment)
        .ok_or_else(|| ApiError::NotFound(format!("no rubric for {}", assessment)))?;

    Ok(HttpResponse::Ok().json(ScenarioList {
        assessment,
        default_scenario: rubric.catalog.default_scenario().key.clone(),
        scenarios: rubric.catalog.list().to_vec(),
    }))
}

/// Get one scenario by key
#[utoipa::path(
    get,
    path = "/assessment/{assessment_type}/scenarios/{key}",
    params(
        ("assessment_type" = String, Path, description = "Assessment type, e.g. data_analysis"),
        ("key" = String, Path, description = "Scenario key")
    ),
    responses(
        (status = 200, description = "Scenario retrieved successfully", body = ScenarioRecord),
        (status = 404, description = "Unknown assessment type or scenario", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[get("/assessment/{assessment_type}/scenarios/{key}")]
pub async fn get_scenario(
    registry: web::Data<RubricRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (assessment, key) = path.into_inner();
    scenario_response(&registry, &assessment, &key)
}

/// Get one scenario using the single-segment path of earlier clients
#[utoipa::path(
    get,
    path = "/assessment/{assessment_type}-scenario/{key}",
    params(
        ("assessment_type" = String, Path, description = "Assessment type in kebab case, e.g. task-management"),
        ("key" = String, Path, description = "Scenario key")
    ),
    responses(
        (status = 200, description = "Scenario retrieved successfully", body = ScenarioRecord),
        (status = 404, description = "Unknown assessment type or scenario", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[get("/assessment/{assessment_type}-scenario/{key}")]
pub async fn get_scenario_legacy(
    registry: web::Data<RubricRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (assessment, key) = path.into_inner();
    scenario_response(&registry, &assessment, &key)
}

fn scenario_response(
    registry: &RubricRegistry,
    assessment: &str,
    key: &str,
) -> Result<HttpResponse, ApiError> {
    let assessment = parse_assessment(assessment)?;
    let scenario = registry.scenario(assessment, key)?;
    Ok(HttpResponse::Ok().json(scenario))
}

async fn run_evaluation<S: Submission>(
    service: &AssessmentService,
    assessment: AssessmentType,
    body: S,
) -> Result<HttpResponse, ApiError> {
    if body.submission_text().trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{} submission must not be empty",
            assessment
        )));
    }

    let evaluator = service
        .evaluator(assessment)
        .ok_or_else(|| ApiError::Internal(format!("no evaluator registered for {}", assessment)))?;

    let request = body.into_evaluation_request();
    tracing::debug!(
        assessment = %assessment,
        rubric = %evaluator.rubric().title,
        scenario = %request.scenario,
        submission_length = request.submission.len(),
        "Evaluation requested"
    );

    let result = evaluator.evaluate(&request).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Evaluate a prompt written for the scenario's data table
#[utoipa::path(
    post,
    path = "/assessment/evaluate-prompt",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Prompt evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty prompt", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-prompt")]
pub async fn evaluate_prompt(
    service: web::Data<AssessmentService>,
    body: web::Json<PromptRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::PromptEngineering, body.into_inner()).await
}

/// Evaluate a piece of business writing
#[utoipa::path(
    post,
    path = "/assessment/evaluate-writing",
    request_body = WritingRequest,
    responses(
        (status = 200, description = "Writing evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty content", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-writing")]
pub async fn evaluate_writing(
    service: web::Data<AssessmentService>,
    body: web::Json<WritingRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::Writing, body.into_inner()).await
}

/// Evaluate a task management plan
#[utoipa::path(
    post,
    path = "/assessment/evaluate-task-management",
    request_body = TaskManagementRequest,
    responses(
        (status = 200, description = "Plan evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty response", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-task-management")]
pub async fn evaluate_task_management(
    service: web::Data<AssessmentService>,
    body: web::Json<TaskManagementRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::TaskManagement, body.into_inner()).await
}

/// Evaluate a data analysis approach
#[utoipa::path(
    post,
    path = "/assessment/evaluate-data-analysis",
    request_body = DataAnalysisRequest,
    responses(
        (status = 200, description = "Approach evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty approach", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-data-analysis")]
pub async fn evaluate_data_analysis(
    service: web::Data<AssessmentService>,
    body: web::Json<DataAnalysisRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::DataAnalysis, body.into_inner()).await
}

/// Evaluate a presentation approach
#[utoipa::path(
    post,
    path = "/assessment/evaluate-presentation",
    request_body = PresentationRequest,
    responses(
        (status = 200, description = "Approach evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty approach", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-presentation")]
pub async fn evaluate_presentation(
    service: web::Data<AssessmentService>,
    body: web::Json<PresentationRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::Presentation, body.into_inner()).await
}

/// Evaluate a workflow automation design
#[utoipa::path(
    post,
    path = "/assessment/evaluate-productivity",
    request_body = ProductivityRequest,
    responses(
        (status = 200, description = "Workflow evaluated", body = crate::model::EvaluationResult),
        (status = 400, description = "Empty workflow description", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Judge unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "assessment"
)]
#[post("/assessment/evaluate-productivity")]
pub async fn evaluate_productivity(
    service: web::Data<AssessmentService>,
    body: web::Json<ProductivityRequest>,
) -> Result<HttpResponse, ApiError> {
    run_evaluation(&service, AssessmentType::Productivity, body.into_inner()).await
}

/// Configure assessment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(list_scenarios)
    .service(get_scenario)
    .service(get_scenario_legacy)
    .service(evaluate_prompt)
    .service(evaluate_writing)
    .service(evaluate_task_management)
    .service(evaluate_data_analysis)
    .service(evaluate_presentation)
    .service(evaluate_productivity);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::service::judge::JudgeError;
    use crate::service::judge::testing::ScriptedJudge;

    fn state(judge: Arc<ScriptedJudge>) -> (web::Data<AssessmentService>, web::Data<RubricRegistry>) {
        let registry = RubricRegistry::embedded().unwrap();
        let service = AssessmentService::new(&registry, judge);
        (web::Data::new(service), web::Data::new(registry))
    }

    macro_rules! app {
        ($judge:expr) => {{
            let (service, registry) = state($judge);
            test::init_service(
                App::new()
                    .app_data(service)
                    .app_data(registry)
                    .configure(configure),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_evaluate_data_analysis() {
        let judge = Arc::new(ScriptedJudge::replying(&[r#"{"data_understanding": 80,
            "analytical_approach": 70, "ai_tool_usage": 60, "visualization_quality": 90,
            "insights_generation": 70, "feedback": "Good", "suggestions": []}"#]));
        let app = app!(judge.clone());

        let req = test::TestRequest::post()
            .uri("/assessment/evaluate-data-analysis")
            .set_json(json!({
                "analysis_type": "employee_analysis",
                "user_approach": "Load the table into pandas and chart salary by department",
                "visualization_requirements": ["Bar chart of salaries"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["overall_score"], 74);
        assert_eq!(body["passed"], false);
        assert_eq!(body["grade"], "C");
        assert_eq!(body["assessment"], "data_analysis");
        assert_eq!(body["degraded"], false);
        assert!(body.get("answer").is_none());

        let instructions = judge.instructions.lock().unwrap();
        assert!(instructions[0].contains("- Bar chart of salaries"));
    }

    #[actix_web::test]
    async fn test_blank_submission_is_rejected() {
        let judge = Arc::new(ScriptedJudge::default());
        let app = app!(judge.clone());

        let req = test::TestRequest::post()
            .uri("/assessment/evaluate-productivity")
            .set_json(json!({"automation_type": "email_automation", "workflow_description": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "bad_request");
        assert!(body["request_id"].as_str().is_some());
        assert_eq!(judge.calls(), 0);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app!(Arc::new(ScriptedJudge::default()));

        let req = test::TestRequest::post()
            .uri("/assessment/evaluate-writing")
            .set_json(json!({"content": "Dear team"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_judge_failure_is_bad_gateway() {
        let judge = Arc::new(ScriptedJudge::default());
        judge.push(Err(JudgeError::Unavailable {
            attempts: 3,
            source: Box::new(JudgeError::RequestFailed("invalid api key".to_string())),
        }));
        let app = app!(judge);

        let req = test::TestRequest::post()
            .uri("/assessment/evaluate-writing")
            .set_json(json!({"task_type": "proposal", "content": "We propose...", "requirements": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "judge_unavailable");
    }

    #[actix_web::test]
    async fn test_prompt_evaluation_returns_answer() {
        let judge = Arc::new(ScriptedJudge::replying(&[
            "Gasabo: Jean Bosco Nkurunziza, Eric Habimana",
            r#"{"clarity": 90, "specificity": 85, "completeness": 80, "relevance": 95, "feedback": "Clear"}"#,
        ]));
        let app = app!(judge);

        let req = test::TestRequest::post()
            .uri("/assessment/evaluate-prompt")
            .set_json(json!({
                "prompt": "Based on the data table, group people by district and list full names",
                "scenario": "district_listing"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["overall_score"], 87);
        assert_eq!(body["grade"], "B");
        assert_eq!(body["passed"], true);
        assert_eq!(body["scenario"], "district_listing");
        assert_eq!(body["answer"], "Gasabo: Jean Bosco Nkurunziza, Eric Habimana");
    }

    #[actix_web::test]
    async fn test_list_scenarios_hides_reference_material() {
        let app = app!(Arc::new(ScriptedJudge::default()));

        let req = test::TestRequest::get()
            .uri("/assessment/prompt-engineering/scenarios")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["assessment"], "prompt_engineering");
        assert_eq!(body["default_scenario"], "employee_report");
        let scenarios = body["scenarios"].as_array().unwrap();
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios.iter().all(|s| s.get("reference_answer").is_none()));
        assert!(scenarios.iter().all(|s| s.get("copy_markers").is_none()));
    }

    #[actix_web::test]
    async fn test_get_scenario() {
        let app = app!(Arc::new(ScriptedJudge::default()));

        let req = test::TestRequest::get()
            .uri("/assessment/writing/scenarios/proposal")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["key"], "proposal");

        let req = test::TestRequest::get()
            .uri("/assessment/writing/scenarios/limerick")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unknown_scenario");
    }

    #[actix_web::test]
    async fn test_get_scenario_by_single_segment_path() {
        let app = app!(Arc::new(ScriptedJudge::default()));

        for (uri, key) in [
            ("/assessment/task-management-scenario/project_planning", "project_planning"),
            ("/assessment/data-analysis-scenario/employee_analysis", "employee_analysis"),
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["key"], key);
        }

        let req = test::TestRequest::get()
            .uri("/assessment/presentation-scenario/karaoke")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unknown_assessment_type() {
        let app = app!(Arc::new(ScriptedJudge::default()));

        let req = test::TestRequest::get()
            .uri("/assessment/cooking/scenarios")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_found");
    }
}
