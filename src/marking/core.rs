/*!
 * Feedback generation.
 *
 * `FeedbackGenerator` owns a provider and the request settings taken from the
 * configuration at construction. It keeps no state between calls.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app_config::{Config, ModelProvider};
use crate::errors::FeedbackError;
use crate::marking::prompts::{MarkingContext, MarkingPromptBuilder, DEFAULT_SYSTEM_PROMPT};
use crate::marking::SampleLevel;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider};
use crate::rubric::Rubric;

/// Generated feedback plus request metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    /// Completion text, trimmed
    pub text: String,
    /// Model that produced it
    pub model: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    /// Wall time of the provider call, retries included
    pub elapsed: Duration,
}

/// Turns a submission and rubric into feedback text
#[derive(Debug, Clone)]
pub struct FeedbackGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    system_prompt: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl FeedbackGenerator {
    /// Build a generator for the active provider in `config`
    ///
    /// The API key must already be resolved into the configuration.
    pub fn from_config(config: &Config) -> Result<Self, FeedbackError> {
        let marking = &config.marking;
        let api_key = marking.get_api_key();
        if api_key.trim().is_empty() {
            return Err(FeedbackError::MissingApiKey(
                marking.provider.display_name().to_string(),
            ));
        }

        let timeout = Duration::from_secs(marking.get_timeout_secs());
        let retry_count = marking.common.retry_count;
        let retry_backoff_ms = marking.common.retry_backoff_ms;

        let provider: Arc<dyn Provider> = match marking.provider {
            ModelProvider::OpenAI => Arc::new(
                OpenAI::new(api_key, marking.get_endpoint(), timeout)?
                    .with_retry(retry_count, retry_backoff_ms),
            ),
            ModelProvider::Anthropic => Arc::new(
                Anthropic::new(api_key, marking.get_endpoint(), timeout)?
                    .with_retry(retry_count, retry_backoff_ms),
            ),
        };

        Ok(Self::with_provider(provider, marking.get_model())
            .system_prompt(marking.common.system_prompt.clone())
            .temperature(marking.common.temperature)
            .max_tokens(marking.get_max_tokens()))
    }

    /// Build a generator around an existing provider
    pub fn with_provider(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        if !system_prompt.trim().is_empty() {
            self.system_prompt = system_prompt;
        }
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Generate feedback for a submission
    pub async fn generate(
        &self,
        submission: &str,
        rubric: &Rubric,
        sample_level: SampleLevel,
    ) -> Result<Feedback, FeedbackError> {
        self.generate_with_context(submission, rubric, sample_level, &MarkingContext::default())
            .await
    }

    /// Generate feedback, adding assessment context to the prompt
    pub async fn generate_with_context(
        &self,
        submission: &str,
        rubric: &Rubric,
        sample_level: SampleLevel,
        context: &MarkingContext,
    ) -> Result<Feedback, FeedbackError> {
        let prompt = MarkingPromptBuilder::new(submission, rubric)
            .with_sample_level(sample_level)
            .with_context(context)
            .build();

        let request = CompletionRequest::new(self.model.clone())
            .system(self.system_prompt.clone())
            .user(prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        debug!(
            "Requesting feedback from {} ({}) at sample level {}",
            self.provider.name(),
            self.model,
            sample_level
        );

        let start = Instant::now();
        let response = self.provider.complete(request).await?;
        let elapsed = start.elapsed();

        let text = response.text.trim();
        if text.is_empty() {
            return Err(FeedbackError::EmptyResponse);
        }

        info!("Feedback generated in {:.1}s", elapsed.as_secs_f64());
        debug!(
            "Token usage: prompt={:?} completion={:?}",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(Feedback {
            text: text.to_string(),
            model: self.model.clone(),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            elapsed,
        })
    }

    /// Send a minimal request to check credentials and endpoint
    pub async fn test_connection(&self) -> Result<(), FeedbackError> {
        self.provider.test_connection(&self.model).await?;
        Ok(())
    }
}
