//! Model backend trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "groq")]
pub mod groq;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::models::LanguageModel;
use crate::types::{GenerationSettings, Message, MessageHistory};

/// A request sent to a model backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub settings: GenerationSettings,
}

impl ModelRequest {
    /// The whole conversation so far, with the given tools bound.
    pub fn history(history: &MessageHistory, tools: Vec<ToolDefinition>) -> Self {
        Self {
            messages: history.messages().to_vec(),
            tools: (!tools.is_empty()).then_some(tools),
            settings: GenerationSettings::default(),
        }
    }

    /// A single-turn request with no history and no tools.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(text)],
            tools: None,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The language-model side of the graph.
///
/// Implementations must surface requested tool calls as structured
/// [`crate::types::ToolCallRequest`]s on the returned message.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider name (e.g., "groq", "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this backend serves.
    fn model_id(&self) -> &str;

    /// Send a request and return the model's reply.
    async fn complete(&self, request: &ModelRequest) -> Result<Message>;
}

/// Create a backend for the given model, using the provided config.
#[allow(unused_variables)]
pub fn create_backend(model: &LanguageModel, config: &BotConfig) -> Result<Arc<dyn ModelBackend>> {
    match model {
        #[cfg(feature = "groq")]
        LanguageModel::Groq(m) => {
            let api_key = config.require_api_key("groq")?;
            Ok(Arc::new(groq::GroqBackend::new(
                m.clone(),
                api_key,
                config.get_base_url("groq").map(str::to_string),
            )))
        }
        #[cfg(feature = "openai")]
        LanguageModel::OpenAi(model_id) => {
            let api_key = config.require_api_key("openai")?;
            Ok(Arc::new(openai::OpenAiBackend::new(
                model_id.clone(),
                api_key,
                config.get_base_url("openai").map(str::to_string),
            )))
        }
        LanguageModel::Custom { provider, .. } => Err(BotError::Configuration(format!(
            "No built-in backend for provider '{provider}'"
        ))),
    }
}
