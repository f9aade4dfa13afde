//! Judge abstraction
//!
//! A judge receives one fully rendered instruction and returns the raw reply
//! text. The evaluator only sees the [`Judge`] trait, so tests script replies
//! without a network.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::JudgeConfig;
use crate::service::llm::LlmClient;

/// One outbound judge call
#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    pub instruction: &'a str,
    pub system_role: &'a str,
    pub max_output_tokens: u64,
    pub temperature: f64,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    RequestFailed(String),

    /// The provider refused the request; retrying cannot help
    #[error("judge request rejected: {0}")]
    Rejected(String),

    #[error("judge request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("judge unavailable after {attempts} attempts: {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: Box<JudgeError>,
    },
}

impl JudgeError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, JudgeError::Rejected(_))
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Return the raw reply text for one instruction
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<String, JudgeError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Bounded retry with exponential backoff and a per-attempt timeout
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_retry_delay(),
            timeout: config.timeout(),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds or the retry budget is spent
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T, JudgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, JudgeError>>,
    {
        let mut attempt = 0;

        loop {
            let error = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt, "Judge call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => JudgeError::TimedOut(self.timeout),
            };

            if !error.is_retryable() {
                tracing::warn!(error = %error, "Judge call rejected, not retrying");
                return Err(JudgeError::Unavailable {
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            if attempt >= self.max_retries {
                return Err(JudgeError::Unavailable {
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis(),
                error = %error,
                "Judge call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Judge backed by the OpenAI chat completion API
pub struct LlmJudge {
    llm_client: LlmClient,
    model: String,
    retry: RetryPolicy,
}

impl LlmJudge {
    pub fn new(llm_client: LlmClient, config: &JudgeConfig) -> Self {
        tracing::info!(
            model = %config.model,
            timeout_secs = config.timeout_secs,
            max_retries = config.max_retries,
            "LLM judge initialized"
        );

        Self {
            llm_client,
            model: config.model.clone(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<String, JudgeError> {
        let start_time = std::time::Instant::now();
        let prompt_length = request.instruction.len();

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt_length,
            max_output_tokens = request.max_output_tokens,
            "Initiating OpenAI API call for judge"
        );

        let result = self
            .retry
            .run(|| self.llm_client.complete(&self.model, request))
            .await;

        let elapsed = start_time.elapsed();
        match &result {
            Ok(reply) => tracing::info!(
                model = %self.model,
                elapsed_ms = elapsed.as_millis(),
                prompt_length = prompt_length,
                reply_length = reply.len(),
                "OpenAI API call for judge completed successfully"
            ),
            Err(e) => tracing::error!(
                model = %self.model,
                elapsed_ms = elapsed.as_millis(),
                prompt_length = prompt_length,
                error = %e,
                "OpenAI API call for judge failed"
            ),
        }

        result
    }

    fn model(&self) -> &str {
        &self.model
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn policy(max_retries: u32, timeout_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);

        let result = policy(2, 1000)
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(JudgeError::RequestFailed("503".to_string()))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy(2, 1000)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(JudgeError::RequestFailed("connection refused".to_string()))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            JudgeError::Unavailable { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, JudgeError::RequestFailed(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy(2, 1000)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(JudgeError::Rejected("invalid_api_key".to_string()))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result.unwrap_err() {
            JudgeError::Unavailable { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*source, JudgeError::Rejected(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let result: Result<(), _> = policy(0, 10)
            .run(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        match result.unwrap_err() {
            JudgeError::Unavailable { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*source, JudgeError::TimedOut(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }
}
