//! The caller-facing chatbot: one question in, full history out.

use std::sync::Arc;

use tracing::debug;

use crate::config::{BotConfig, DEFAULT_MAX_HOPS};
use crate::error::{BotError, Result};
use crate::graph::{Executor, GraphDefinition, RunControl, RunEventSink, StepContext, ToolErrorPolicy};
use crate::models::LanguageModel;
use crate::provider::{self, ModelBackend};
use crate::tools::{ToolBackend, Toolset};
use crate::types::{GenerationSettings, Message, MessageHistory};

/// Knobs for a [`ChatBot`].
#[derive(Clone, bon::Builder)]
pub struct ChatBotOptions {
    #[builder(default = DEFAULT_MAX_HOPS)]
    pub max_hops: usize,
    #[builder(default)]
    pub tool_error_policy: ToolErrorPolicy,
    #[builder(default)]
    pub settings: GenerationSettings,
    pub event_sink: Option<RunEventSink>,
}

impl Default for ChatBotOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for ChatBotOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBotOptions")
            .field("max_hops", &self.max_hops)
            .field("tool_error_policy", &self.tool_error_policy)
            .field("settings", &self.settings)
            .field("event_sink", &self.event_sink.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeInput {
    pub question: String,
}

impl InvokeInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOutput {
    pub history: MessageHistory,
}

impl InvokeOutput {
    /// The last message of the run.
    pub fn final_message(&self) -> Result<&Message> {
        self.history.last()
    }

    /// Flattened text of the last message.
    pub fn answer(&self) -> Result<String> {
        Ok(self.final_message()?.text())
    }
}

/// A graph executor wired to a model and a tool backend.
///
/// Cloning is cheap and clones share backends, so a single bot can serve
/// concurrent callers.
#[derive(Clone)]
pub struct ChatBot {
    executor: Executor,
}

impl ChatBot {
    pub fn new(
        model: Arc<dyn ModelBackend>,
        tools: Arc<dyn ToolBackend>,
        options: ChatBotOptions,
    ) -> Self {
        let ctx = StepContext {
            model,
            tools,
            settings: options.settings,
            tool_error_policy: options.tool_error_policy,
        };
        let mut executor =
            Executor::new(Arc::new(GraphDefinition::chatbot()), ctx).with_max_hops(options.max_hops);
        if let Some(sink) = options.event_sink {
            executor = executor.with_event_sink(sink);
        }
        Self { executor }
    }

    /// Build the configured model backend and the web search tool.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let model: LanguageModel = config.model.parse()?;
        let backend = provider::create_backend(&model, config)?;
        let tools = default_toolset(config)?;
        debug!(model = %model, tools = tools.len(), "chatbot configured");

        let options = ChatBotOptions::builder()
            .max_hops(config.max_hops)
            .settings(config.settings.clone())
            .build();
        Ok(Self::new(backend, Arc::new(tools), options))
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn invoke(&self, input: InvokeInput) -> Result<InvokeOutput> {
        self.invoke_with(input, &RunControl::default()).await
    }

    pub async fn invoke_with(&self, input: InvokeInput, control: &RunControl) -> Result<InvokeOutput> {
        if input.question.trim().is_empty() {
            return Err(BotError::InvalidArgument(
                "Please enter a question to get an answer.".into(),
            ));
        }
        let history = self
            .executor
            .invoke_with(MessageHistory::from_question(input.question), control)
            .await?;
        Ok(InvokeOutput { history })
    }

    /// Run one question and return the final answer as text.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String> {
        self.invoke(InvokeInput::new(question)).await?.answer()
    }
}

#[cfg(feature = "tavily")]
fn default_toolset(config: &BotConfig) -> Result<Toolset> {
    let search = crate::tools::search::TavilySearch::from_config(config)?;
    Ok(Toolset::default().with_tool(Arc::new(search)))
}

#[cfg(not(feature = "tavily"))]
fn default_toolset(_config: &BotConfig) -> Result<Toolset> {
    Ok(Toolset::default())
}

/// Text shown to the user for a finished `ask`.
pub fn render_answer(result: &Result<String>) -> String {
    match result {
        Ok(answer) => answer.clone(),
        Err(err) => format!("Error: {err}"),
    }
}
