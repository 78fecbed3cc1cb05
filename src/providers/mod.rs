/*!
 * Provider implementations for the hosted chat-completion services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - OpenAI: Chat Completions API (and OpenAI-compatible servers)
 * - Anthropic: Messages API
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use log::warn;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

/// A provider-neutral single-turn completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// System instruction
    pub system: Option<String>,
    /// The user message
    pub user: String,
    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,
    /// Completion token cap, provider default when unset
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            user: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the user message
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token cap
    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// The text a provider returned, with token usage when reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the feedback generator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Human readable provider name
    fn name(&self) -> &'static str;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<CompletionResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider with a minimal request
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = CompletionRequest::new(model)
            .user("Hello")
            .max_tokens(Some(10));
        self.complete(request).await.map(|_| ())
    }
}

/// Build the HTTP client shared by the hosted providers
///
/// Every request through it fails once `timeout` has elapsed.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))
}

/// Map a reqwest transport failure onto a provider error
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::ConnectionError(format!("{} request timed out: {}", provider, error))
    } else if error.is_connect() || error.is_request() {
        ProviderError::ConnectionError(format!("Failed to reach {}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{} request failed: {}", provider, error))
    }
}

/// Map a non-success HTTP status onto a provider error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Run `operation`, retrying transient failures with exponential backoff
pub(crate) async fn with_retry<T, F, Fut>(
    provider: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let backoff_ms = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
                warn!(
                    "{} error: {} - retrying in {}ms (attempt {}/{})",
                    provider,
                    e,
                    backoff_ms,
                    attempt + 1,
                    max_retries + 1
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

pub mod anthropic;
pub mod mock;
pub mod openai;
