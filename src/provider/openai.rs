//! OpenAI Chat Completions API backend.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BackendError, BotError, Result};
use crate::types::{ContentChunk, Message, MessageContent, Role, ToolCallRequest};
use crate::util::retry::RetryPolicy;

use super::http::{bearer_headers, read_error_body, shared_client, transport_error};
use super::{ModelBackend, ModelRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiBackend {
    provider_name: String,
    model_id: String,
    api_key: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl OpenAiBackend {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            provider_name: "openai".to_string(),
            model_id,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Report errors under a different provider name (OpenAI-compatible APIs).
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(&self, request: &ModelRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .flat_map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model_id.clone().into());
        body.insert("messages".into(), messages.into());

        if let Some(max) = request.settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = request.settings.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = request.settings.user {
            body.insert("user".into(), user.clone().into());
        }

        if let Some(ref tools) = request.tools {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body.insert("tools".into(), tool_defs.into());
        }

        serde_json::Value::Object(body)
    }

    async fn send_once(
        &self,
        body: &serde_json::Value,
    ) -> std::result::Result<OpenAiChatResponse, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(read_error_body(status, resp).await);
        }
        resp.json::<OpenAiChatResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &ModelRequest) -> Result<Message> {
        let body = self.build_request_body(request);

        debug!(
            provider = %self.provider_name,
            model = %self.model_id,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "chat completion"
        );

        let data = self
            .retry_policy
            .execute(|| self.send_once(&body))
            .await
            .map_err(|e| BotError::model_backend(self.provider_name.clone(), e))?;

        let choice = data.choices.into_iter().next().ok_or_else(|| {
            BotError::model_backend(
                self.provider_name.clone(),
                BackendError::InvalidResponse("No choices in response".into()),
            )
        })?;

        Ok(openai_to_message(choice.message))
    }
}

fn openai_to_message(message: OpenAiMessage) -> Message {
    let content = match message.content {
        Some(serde_json::Value::String(text)) => MessageContent::Text(text),
        Some(serde_json::Value::Array(parts)) => MessageContent::Chunks(
            parts
                .into_iter()
                .map(|part| serde_json::from_value(part).unwrap_or(ContentChunk::Other))
                .collect(),
        ),
        Some(serde_json::Value::Null) | None => MessageContent::default(),
        Some(other) => MessageContent::Text(other.to_string()),
    };

    let tool_calls: Vec<ToolCallRequest> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let arguments = serde_json::from_str(&tc.function.arguments)
                .unwrap_or(serde_json::Value::String(tc.function.arguments));
            ToolCallRequest::new(tc.id, tc.function.name, arguments)
        })
        .collect();

    if tool_calls.is_empty() {
        Message::model(content)
    } else {
        Message::model_with_tool_calls(content, tool_calls)
    }
}

fn message_to_openai(msg: &Message) -> Vec<serde_json::Value> {
    match msg.role() {
        Role::User => vec![serde_json::json!({ "role": "user", "content": msg.text() })],
        Role::Model if msg.has_tool_calls() => {
            let tool_calls: Vec<serde_json::Value> = msg
                .tool_calls()
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            let text = msg.text();
            vec![serde_json::json!({
                "role": "assistant",
                "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
                "tool_calls": tool_calls,
            })]
        }
        Role::Model => vec![serde_json::json!({ "role": "assistant", "content": msg.text() })],
        Role::Tool => tool_result_to_openai(msg),
    }
}

/// One wire message per answered call; the API pairs them by `tool_call_id`.
fn tool_result_to_openai(msg: &Message) -> Vec<serde_json::Value> {
    let ids = msg.tool_call_ids();
    let outputs: Vec<String> = match msg.content() {
        MessageContent::Text(text) => vec![text.clone()],
        MessageContent::Chunks(chunks) => chunks
            .iter()
            .filter_map(|c| match c {
                ContentChunk::Text { text } => Some(text.clone()),
                ContentChunk::Other => None,
            })
            .collect(),
    };

    if ids.len() > 1 && ids.len() == outputs.len() {
        return ids
            .iter()
            .zip(outputs)
            .map(|(id, content)| {
                serde_json::json!({ "role": "tool", "tool_call_id": id, "content": content })
            })
            .collect();
    }

    let mut wire = serde_json::json!({ "role": "tool", "content": msg.text() });
    if let Some(id) = ids.first() {
        wire["tool_call_id"] = id.clone().into();
    }
    vec![wire]
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<serde_json::Value>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_calls_are_parsed_with_json_arguments() {
        let message: OpenAiMessage = serde_json::from_value(json!({
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "tavily_search", "arguments": "{\"query\":\"rust\"}"}
            }]
        }))
        .unwrap();

        let msg = openai_to_message(message);
        assert_eq!(msg.role(), Role::Model);
        assert_eq!(msg.tool_calls().len(), 1);
        assert_eq!(msg.tool_calls()[0].arguments, json!({"query": "rust"}));
        assert!(msg.content().is_empty());
    }

    #[test]
    fn chunked_content_is_preserved() {
        let message: OpenAiMessage = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "a"}, {"type": "refusal"}, {"type": "text", "text": "b"}]
        }))
        .unwrap();

        let msg = openai_to_message(message);
        assert!(!msg.has_tool_calls());
        assert_eq!(msg.text(), "a b");
    }

    #[test]
    fn multi_result_tool_message_expands_per_call() {
        let msg = Message::tool_results(vec![
            ("call_1".to_string(), "one".to_string()),
            ("call_2".to_string(), "two".to_string()),
        ]);
        let wire = message_to_openai(&msg);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["tool_call_id"], "call_1");
        assert_eq!(wire[1]["content"], "two");
    }

    #[test]
    fn assistant_tool_call_has_null_content_when_empty() {
        let msg = Message::model_with_tool_calls(
            "",
            vec![ToolCallRequest::new("call_1", "search", json!({"query": "x"}))],
        );
        let wire = message_to_openai(&msg);
        assert_eq!(wire[0]["content"], serde_json::Value::Null);
        assert_eq!(wire[0]["tool_calls"][0]["function"]["arguments"], "{\"query\":\"x\"}");
    }
}
