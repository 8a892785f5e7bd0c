//! HTTP-level tests for the OpenAI-compatible backends.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graphbot::config::BotConfig;
use graphbot::error::{BackendError, BotError};
use graphbot::models::LanguageModel;
use graphbot::provider::groq::GroqBackend;
use graphbot::provider::openai::OpenAiBackend;
use graphbot::provider::{create_backend, ModelBackend, ModelRequest, ToolDefinition};
use graphbot::models::groq::GroqModel;
use graphbot::types::{Message, MessageHistory, Role, ToolCallRequest};
use graphbot::util::retry::RetryPolicy;

fn completion(message: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
    }))
}

fn search_definition() -> ToolDefinition {
    ToolDefinition {
        name: "tavily_search".into(),
        description: "search".into(),
        parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
    }
}

#[tokio::test]
async fn plain_reply_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(completion(json!({"role": "assistant", "content": "Hello!"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk-test".into(), Some(server.uri()));
    let reply = backend.complete(&ModelRequest::prompt("hi")).await.unwrap();

    assert_eq!(reply.role(), Role::Model);
    assert_eq!(reply.text(), "Hello!");
    assert!(!reply.has_tool_calls());
}

#[tokio::test]
async fn tool_calls_are_parsed_with_decoded_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "tavily_search"}}]
        })))
        .respond_with(completion(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "tavily_search", "arguments": "{\"query\":\"us president\"}"}
            }]
        })))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk-test".into(), Some(server.uri()));
    let request = ModelRequest::history(
        &MessageHistory::from_question("Who is the president?"),
        vec![search_definition()],
    );
    let reply = backend.complete(&request).await.unwrap();

    assert_eq!(
        reply.tool_calls(),
        [ToolCallRequest::new("call_1", "tavily_search", json!({"query": "us president"}))]
    );
    assert_eq!(reply.text(), "");
}

#[tokio::test]
async fn chunked_content_is_flattened() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "The president"},
                {"type": "refusal", "refusal": "n/a"},
                {"type": "text", "text": "is Joe Biden."}
            ]
        })))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk-test".into(), Some(server.uri()));
    let reply = backend.complete(&ModelRequest::prompt("q")).await.unwrap();
    assert_eq!(reply.text(), "The president is Joe Biden.");
}

#[tokio::test]
async fn tool_results_are_sent_one_message_per_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "q"},
                {"role": "assistant"},
                {"role": "tool", "tool_call_id": "call_a", "content": "A"},
                {"role": "tool", "tool_call_id": "call_b", "content": "B"}
            ]
        })))
        .respond_with(completion(json!({"role": "assistant", "content": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let history = MessageHistory::from(vec![
        Message::user("q"),
        Message::model_with_tool_calls(
            "",
            vec![
                ToolCallRequest::new("call_a", "tavily_search", json!({"query": "a"})),
                ToolCallRequest::new("call_b", "tavily_search", json!({"query": "b"})),
            ],
        ),
        Message::tool_results(vec![
            ("call_a".into(), "A".into()),
            ("call_b".into(), "B".into()),
        ]),
    ]);
    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk-test".into(), Some(server.uri()));
    let reply = backend
        .complete(&ModelRequest::history(&history, vec![search_definition()]))
        .await
        .unwrap();
    assert_eq!(reply.text(), "ok");
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "bad".into(), Some(server.uri()));
    let err = backend.complete(&ModelRequest::prompt("hi")).await.unwrap_err();

    match err {
        BotError::ModelBackend { provider, source } => {
            assert_eq!(provider, "openai");
            assert!(matches!(source, BackendError::Authentication(ref body) if body == "invalid key"));
        }
        other => panic!("expected ModelBackend, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_then_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(2)
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 2,
        initial_backoff: std::time::Duration::from_millis(1),
        ..RetryPolicy::default()
    };
    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk".into(), Some(server.uri()))
        .with_retry_policy(policy);
    let err = backend.complete(&ModelRequest::prompt("hi")).await.unwrap_err();

    assert!(matches!(
        err,
        BotError::ModelBackend { source: BackendError::Api { status: 503, .. }, .. }
    ));
}

#[tokio::test]
async fn empty_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new("gpt-4o-mini".into(), "sk".into(), Some(server.uri()));
    let err = backend.complete(&ModelRequest::prompt("hi")).await.unwrap_err();
    assert!(matches!(
        err,
        BotError::ModelBackend { source: BackendError::InvalidResponse(_), .. }
    ));
}

#[tokio::test]
async fn groq_backend_reports_its_own_provider_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gemma2-9b-it"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let backend = GroqBackend::new(GroqModel::Gemma2_9bIt, "gsk".into(), Some(server.uri()))
        .with_retry_policy(RetryPolicy::none());
    assert_eq!(backend.provider_name(), "groq");
    assert_eq!(backend.model_id(), "gemma2-9b-it");

    let err = backend.complete(&ModelRequest::prompt("hi")).await.unwrap_err();
    assert!(matches!(err, BotError::ModelBackend { ref provider, .. } if provider == "groq"));
}

#[test]
fn create_backend_uses_configured_credentials() {
    let model: LanguageModel = "groq:gemma2-9b-it".parse().unwrap();
    let mut config = BotConfig::new();
    config.set_api_key("groq", "gsk_test".to_string());

    let backend = create_backend(&model, &config).unwrap();
    assert_eq!(backend.provider_name(), "groq");
    assert_eq!(backend.model_id(), "gemma2-9b-it");
}

#[test]
fn create_backend_requires_credentials() {
    let model: LanguageModel = "openai:gpt-4o-mini".parse().unwrap();
    let err = match create_backend(&model, &BotConfig::new()) {
        Ok(_) => panic!("expected missing key error"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("OPENAI_API_KEY"), "unexpected error: {err}");
}

#[test]
fn create_backend_rejects_unknown_provider() {
    let model: LanguageModel = "mistral:large".parse().unwrap();
    let err = match create_backend(&model, &BotConfig::new()) {
        Ok(_) => panic!("expected configuration error"),
        Err(err) => err,
    };
    assert!(matches!(err, BotError::Configuration(_)));
}

#[tokio::test]
async fn client_timeout_is_classified_as_timeout() {
    use graphbot::error::ErrorCategory;
    use graphbot::provider::http::{transport_error, REQUEST_TIMEOUT};
    use std::time::Duration;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!({"role": "assistant", "content": "late"})).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    let err = client
        .post(format!("{}/chat/completions", server.uri()))
        .send()
        .await
        .unwrap_err();

    let classified = transport_error(err);
    assert!(matches!(classified, BackendError::Timeout(ms) if ms == REQUEST_TIMEOUT.as_millis() as u64));
    assert_eq!(classified.category(), ErrorCategory::Timeout);
    assert!(classified.is_retryable());
}
