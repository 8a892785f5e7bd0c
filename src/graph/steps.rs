//! The three step executors. Each reads the history and produces exactly one
//! message; appending it is the executor's job.

use std::sync::Arc;

use tracing::{debug, warn};

use super::definition::Step;
use crate::error::{BotError, Result};
use crate::provider::{ModelBackend, ModelRequest};
use crate::tools::{ToolBackend, ToolExecutionContext};
use crate::types::{GenerationSettings, Message, MessageHistory, Role};

const SUMMARY_INSTRUCTION: &str =
    "You are an assistant. Convert the following tool result into a short human-readable answer:";

/// Single-turn prompt asking the model to rewrite raw tool output.
pub fn summary_prompt(tool_output: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{tool_output}")
}

/// What `invoke_tool` does when the tool backend fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Record `{"error": ...}` as the call's output and let the model react.
    #[default]
    FeedBack,
    /// Abort the run with [`BotError::ToolBackend`].
    Fail,
}

/// Collaborators shared by all steps. Holds no per-run state.
#[derive(Clone)]
pub struct StepContext {
    pub model: Arc<dyn ModelBackend>,
    pub tools: Arc<dyn ToolBackend>,
    pub settings: GenerationSettings,
    pub tool_error_policy: ToolErrorPolicy,
}

impl StepContext {
    pub fn new(model: Arc<dyn ModelBackend>, tools: Arc<dyn ToolBackend>) -> Self {
        Self {
            model,
            tools,
            settings: GenerationSettings::default(),
            tool_error_policy: ToolErrorPolicy::default(),
        }
    }

    pub async fn run(&self, step: Step, history: &MessageHistory) -> Result<Message> {
        match step {
            Step::Respond => respond(self, history).await,
            Step::InvokeTool => invoke_tool(self, history).await,
            Step::Summarize => summarize(self, history).await,
        }
    }
}

/// Ask the model to answer given the whole history, with tools bound.
pub async fn respond(ctx: &StepContext, history: &MessageHistory) -> Result<Message> {
    let request = ModelRequest::history(history, ctx.tools.definitions())
        .with_settings(ctx.settings.clone());
    ctx.model.complete(&request).await
}

/// Run every tool call requested by the last message.
pub async fn invoke_tool(ctx: &StepContext, history: &MessageHistory) -> Result<Message> {
    let last = history.last()?;
    if !last.has_tool_calls() {
        return Err(BotError::PreconditionViolation(
            "invoke_tool reached without a pending tool call".into(),
        ));
    }

    let mut outputs = Vec::with_capacity(last.tool_calls().len());
    for call in last.tool_calls() {
        debug!(tool = %call.name, call_id = %call.id, "invoking tool");
        let call_ctx = ToolExecutionContext::for_call(&call.id);
        let output = match ctx.tools.execute(&call.name, &call.arguments, &call_ctx).await {
            Ok(text) => text,
            Err(err) => match ctx.tool_error_policy {
                ToolErrorPolicy::FeedBack => {
                    warn!(tool = %call.name, error = %err, "tool failed; reporting to model");
                    serde_json::json!({ "error": err.to_string() }).to_string()
                }
                ToolErrorPolicy::Fail => return Err(as_tool_error(&call.name, err)),
            },
        };
        outputs.push((call.id.clone(), output));
    }

    Ok(Message::tool_results(outputs))
}

/// Rewrite the last (tool) message as a short answer, without history.
pub async fn summarize(ctx: &StepContext, history: &MessageHistory) -> Result<Message> {
    let last = history.last()?;
    if last.role() != Role::Tool {
        return Err(BotError::PreconditionViolation(
            "summarize reached without a tool result".into(),
        ));
    }
    let request = ModelRequest::prompt(summary_prompt(&last.text()))
        .with_settings(ctx.settings.clone());
    let reply = ctx.model.complete(&request).await?;
    Ok(Message::model(reply.content().clone()))
}

fn as_tool_error(tool_name: &str, err: BotError) -> BotError {
    match err {
        err @ BotError::ToolBackend { .. } => err,
        other => BotError::tool_backend(tool_name, other.to_string()),
    }
}
