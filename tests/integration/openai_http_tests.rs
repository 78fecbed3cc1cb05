/*!
 * Provider clients against a local HTTP stub
 */

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use markwai::app_config::ModelProvider;
use markwai::errors::ProviderError;
use markwai::marking::{FeedbackGenerator, SampleLevel};
use markwai::providers::anthropic::Anthropic;
use markwai::providers::openai::OpenAI;
use markwai::providers::{CompletionRequest, Provider};
use markwai::rubric::{Rubric, RubricSchema};

use crate::common::{openai_body, spawn_http_stub, spawn_silent_stub, test_config, SCENARIO_RUBRIC};

fn request() -> CompletionRequest {
    CompletionRequest::new("gpt-3.5-turbo")
        .system("You are a helpful academic marking assistant.")
        .user("Mark this essay")
}

#[tokio::test]
async fn test_openai_complete_withSuccessfulResponse_shouldReturnTextAndUsage() {
    let (base, handle) = spawn_http_stub(vec![("200 OK", openai_body("Clarity: 8/10"))]).await;
    let client = OpenAI::new("test-key", base, Duration::from_secs(5)).unwrap();

    let response = client.complete(request()).await.unwrap();

    assert_eq!(response.text, "Clarity: 8/10");
    assert_eq!(response.prompt_tokens, Some(42));
    assert_eq!(response.completion_tokens, Some(7));

    let raw = handle.await.unwrap();
    assert_eq!(raw.len(), 1);
    assert!(raw[0].starts_with("POST /v1/chat/completions "));
    assert!(raw[0].to_lowercase().contains("authorization: bearer test-key"));
    assert!(raw[0].contains("\"model\":\"gpt-3.5-turbo\""));
    assert!(!raw[0].contains("\"temperature\""));
}

#[tokio::test]
async fn test_openai_complete_withUnauthorized_shouldNotRetry() {
    let (base, handle) = spawn_http_stub(vec![(
        "401 Unauthorized",
        r#"{"error":{"message":"Incorrect API key"}}"#.to_string(),
    )])
    .await;
    let client = OpenAI::new("wrong", base, Duration::from_secs(5)).unwrap().with_retry(3, 1);

    let result = client.complete(request()).await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
    assert_eq!(handle.await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_openai_complete_withServerErrorThenSuccess_shouldRetry() {
    let (base, handle) = spawn_http_stub(vec![
        ("500 Internal Server Error", r#"{"error":"overloaded"}"#.to_string()),
        ("200 OK", openai_body("Recovered")),
    ])
    .await;
    let client = OpenAI::new("test-key", base, Duration::from_secs(5)).unwrap().with_retry(1, 1);

    let response = client.complete(request()).await.unwrap();

    assert_eq!(response.text, "Recovered");
    assert_eq!(handle.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_openai_complete_withEmptyChoices_shouldReturnParseError() {
    let (base, _handle) = spawn_http_stub(vec![("200 OK", r#"{"choices":[]}"#.to_string())]).await;
    let client = OpenAI::new("test-key", base, Duration::from_secs(5)).unwrap();

    let result = client.complete(request()).await;

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

#[tokio::test]
async fn test_openai_complete_withClosedPort_shouldReturnConnectionError() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = OpenAI::new("test-key", format!("http://{}/v1", addr), Duration::from_secs(5)).unwrap();

    let result = client.complete(request()).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

#[tokio::test]
async fn test_openai_complete_withSilentServer_shouldTimeOutAndRetry() {
    let (base, accepted) = spawn_silent_stub().await;
    let client = OpenAI::new("test-key", base, Duration::from_secs(1))
        .unwrap()
        .with_retry(1, 1);

    let start = Instant::now();
    let result = client.complete(request()).await;
    let elapsed = start.elapsed();

    match result {
        Err(ProviderError::ConnectionError(message)) => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    assert!(elapsed >= Duration::from_secs(2), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(10), "returned after {:?}", elapsed);
}

#[tokio::test]
async fn test_anthropic_complete_shouldUseMessagesApi() {
    let body = serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": "Evidence: 7/10" }],
        "usage": { "input_tokens": 30, "output_tokens": 5 }
    })
    .to_string();
    let (base, handle) = spawn_http_stub(vec![("200 OK", body)]).await;
    let endpoint = base.trim_end_matches("/v1").to_string();
    let client = Anthropic::new("sk-ant", endpoint, Duration::from_secs(5)).unwrap();

    let response = client.complete(request()).await.unwrap();

    assert_eq!(response.text, "Evidence: 7/10");
    let raw = handle.await.unwrap();
    assert!(raw[0].starts_with("POST /v1/messages "));
    let lowered = raw[0].to_lowercase();
    assert!(lowered.contains("x-api-key: sk-ant"));
    assert!(lowered.contains("anthropic-version: 2023-06-01"));
    assert!(raw[0].contains("\"max_tokens\":4096"));
}

#[tokio::test]
async fn test_generator_fromConfig_shouldSendPromptToConfiguredEndpoint() {
    let (base, handle) = spawn_http_stub(vec![("200 OK", openai_body("  Clarity: 9/10\n"))]).await;
    let mut config = test_config();
    assert_eq!(config.marking.provider, ModelProvider::OpenAI);
    config.marking.available_providers[0].endpoint = base;
    let rubric = Rubric::from_csv_bytes(SCENARIO_RUBRIC.as_bytes(), &RubricSchema::default()).unwrap();

    let generator = FeedbackGenerator::from_config(&config).unwrap();
    let feedback = generator
        .generate("My essay", &rubric, SampleLevel::High)
        .await
        .unwrap();

    assert_eq!(feedback.text, "Clarity: 9/10");
    assert_eq!(feedback.prompt_tokens, Some(42));
    let raw = handle.await.unwrap();
    assert!(raw[0].contains("sample level (high)"));
    assert!(raw[0].contains("My essay"));
}
