//! Shared LLM client
//!
//! Thin wrapper around the OpenAI provider; every outbound judge call goes
//! through [`LlmClient::complete`].

use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::service::judge::{JudgeError, JudgeRequest};

/// Provider error markers that no retry can fix
const PERMANENT_ERROR_MARKERS: [&str; 8] = [
    "invalid_api_key",
    "insufficient_quota",
    "invalid_request_error",
    "model_not_found",
    "context_length_exceeded",
    "401 Unauthorized",
    "403 Forbidden",
    "404 Not Found",
];

/// Shared LLM client wrapper
#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
}

impl LlmClient {
    /// Create a new LLM client with the provided API key
    pub fn new(api_key: &str) -> Result<Self, String> {
        let client = openai::Client::new(api_key)
            .map_err(|e| format!("Failed to create OpenAI client: {}", e))?;

        Ok(Self { client })
    }

    /// Send one instruction and return the raw reply text
    pub async fn complete(&self, model: &str, request: JudgeRequest<'_>) -> Result<String, JudgeError> {
        let agent = self
            .client
            .agent(model)
            .preamble(request.system_role)
            .temperature(request.temperature)
            .max_tokens(request.max_output_tokens)
            .build();

        agent
            .prompt(request.instruction)
            .await
            .map_err(|e| classify_error(e.to_string()))
    }
}

/// Split provider failures into rejected requests and transient failures
fn classify_error(message: String) -> JudgeError {
    if PERMANENT_ERROR_MARKERS.iter().any(|m| message.contains(m)) {
        JudgeError::Rejected(message)
    } else {
        JudgeError::RequestFailed(message)
    }
}
