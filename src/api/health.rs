//! Service info and health check endpoints for liveness and readiness probes

use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::AssessmentType;
use crate::service::catalog::RubricRegistry;
use crate::service::evaluation::AssessmentService;

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub assessments: Vec<AssessmentType>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessStatus {
    pub status: String,
    pub version: String,
    pub dependencies: DependencyHealth,
}

#[derive(Serialize, ToSchema)]
pub struct DependencyHealth {
    pub rubrics: String,
    pub judge: String,
}

/// Service name, version and offered assessment types
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "health"
)]
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        assessments: AssessmentType::ALL.to_vec(),
    })
}

/// Liveness probe endpoint
///
/// Always returns 200 OK if the service is running.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthStatus)
    ),
    tag = "health"
)]
#[get("/health/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe endpoint
///
/// Returns 200 OK once every rubric is loaded and each has an evaluator
/// bound to the judge.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessStatus),
        (status = 503, description = "Service is not ready", body = ReadinessStatus)
    ),
    tag = "health"
)]
#[get("/health/ready")]
pub async fn readiness(
    registry: web::Data<RubricRegistry>,
    service: web::Data<AssessmentService>,
) -> impl Responder {
    let rubrics_status = if registry.is_complete() {
        "loaded"
    } else {
        tracing::error!(loaded = registry.len(), "Rubric registry is incomplete");
        "incomplete"
    };

    let judge_status = if service.is_complete() {
        service.judge_model().to_string()
    } else {
        "unconfigured".to_string()
    };

    let all_healthy = registry.is_complete() && service.is_complete();

    let status = ReadinessStatus {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: DependencyHealth {
            rubrics: rubrics_status.to_string(),
            judge: judge_status,
        },
    };

    if all_healthy {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

/// Configure service info and health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(liveness).service(readiness);
}
