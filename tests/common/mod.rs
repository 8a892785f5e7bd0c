//! Shared test helpers: scripted model and tool backends.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use graphbot::error::{BackendError, BotError, Result};
use graphbot::provider::{ModelBackend, ModelRequest, ToolDefinition};
use graphbot::tools::{ToolBackend, ToolExecutionContext};
use graphbot::types::{Message, ToolCallRequest};

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Message(Message),
    Fail(u16),
}

/// A model that replays queued replies in order and records every request.
///
/// When the queue runs dry it falls back to `fallback` if set, otherwise to
/// a plain "Mock response".
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Message>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    on_call: Mutex<Option<Box<dyn Fn(usize) + Send + Sync>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_text(&self, text: &str) -> &Self {
        self.push(Reply::Message(Message::model(text)));
        self
    }

    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) -> &Self {
        self.push(Reply::Message(Message::model_with_tool_calls(
            "",
            vec![ToolCallRequest::new(id, name, args)],
        )));
        self
    }

    pub fn queue_message(&self, message: Message) -> &Self {
        self.push(Reply::Message(message));
        self
    }

    pub fn queue_failure(&self, status: u16) -> &Self {
        self.push(Reply::Fail(status));
        self
    }

    /// Reply with this message forever once the queue is empty.
    pub fn always(&self, message: Message) -> &Self {
        *self.fallback.lock().unwrap() = Some(message);
        self
    }

    /// Run `hook` with the 1-based call number on every call.
    pub fn on_call(&self, hook: impl Fn(usize) + Send + Sync + 'static) -> &Self {
        *self.on_call.lock().unwrap() = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<Message> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        if let Some(hook) = self.on_call.lock().unwrap().as_ref() {
            hook(n);
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Reply::Message(message)) => Ok(message),
            Some(Reply::Fail(status)) => Err(BotError::model_backend(
                "scripted",
                BackendError::api(status, "scripted failure"),
            )),
            None => Ok(self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Message::model("Mock response"))),
        }
    }
}

/// A tool backend returning fixed outputs per tool name.
#[derive(Default)]
pub struct StubTools {
    outputs: Mutex<Vec<(String, std::result::Result<String, String>)>>,
    executed: Mutex<Vec<(String, serde_json::Value)>>,
    call_ids: Mutex<Vec<Option<String>>>,
}

impl StubTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, name: &str, output: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push((name.to_string(), Ok(output.to_string())));
        self
    }

    pub fn with_failure(self, name: &str, message: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push((name.to_string(), Err(message.to_string())));
        self
    }

    pub fn executed(&self) -> Vec<(String, serde_json::Value)> {
        self.executed.lock().unwrap().clone()
    }

    /// Tool call ids seen by `execute`, in order.
    pub fn call_ids(&self) -> Vec<Option<String>> {
        self.call_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolBackend for StubTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.outputs
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| ToolDefinition {
                name: name.clone(),
                description: format!("stub {name}"),
                parameters: json!({"type": "object", "properties": {}}),
            })
            .collect()
    }

    async fn execute(
        &self,
        name: &str,
        arguments: &serde_json::Value,
        ctx: &ToolExecutionContext,
    ) -> Result<String> {
        self.call_ids.lock().unwrap().push(ctx.tool_call_id.clone());
        self.executed
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        let found = self
            .outputs
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, out)| out.clone());
        match found {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(BotError::tool_backend(name, message)),
            None => Err(BotError::tool_backend(name, format!("Tool '{name}' not found"))),
        }
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
