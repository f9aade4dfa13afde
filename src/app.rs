//! Application state and service initialization
//!
//! This module centralizes service initialization and dependency injection,
//! so startup failures surface before the server binds.

use std::sync::Arc;

use actix_web::web;

use crate::model::Config;
use crate::service::{AssessmentService, LlmClient, LlmJudge, RubricRegistry};

/// Application state containing all services and shared resources
pub struct AppState {
    /// Immutable rubric registry
    pub registry: web::Data<RubricRegistry>,
    /// Evaluators for every assessment type
    pub assessment_service: web::Data<AssessmentService>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Rubric loading and validation (embedded, with optional overrides)
    /// 2. LLM client initialization (requires OPENAI_API_KEY)
    /// 3. Evaluator construction for every assessment type
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let registry = RubricRegistry::load(config.rubrics_dir.as_deref())
            .map_err(|e| AppError::Rubrics(e.to_string()))?;

        tracing::info!(
            rubrics = registry.len(),
            override_dir = ?config.rubrics_dir,
            "Rubric registry loaded"
        );

        let api_key = require_api_key(std::env::var("OPENAI_API_KEY").ok())?;

        let llm_client = LlmClient::new(&api_key)
            .map_err(|_| AppError::InvalidConfig("Invalid OPENAI_API_KEY"))?;

        let judge = Arc::new(LlmJudge::new(llm_client, &config.judge));
        let assessment_service = AssessmentService::new(&registry, judge);

        Ok(Self {
            registry: web::Data::new(registry),
            assessment_service: web::Data::new(assessment_service),
        })
    }
}

/// Reject a missing or blank API key before any client is built
fn require_api_key(value: Option<String>) -> Result<String, AppError> {
    value
        .filter(|k| !k.trim().is_empty())
        .ok_or(AppError::MissingConfig("OPENAI_API_KEY"))
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Rubric data could not be loaded or failed validation
    #[error("Rubric loading failed: {0}")]
    Rubrics(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
