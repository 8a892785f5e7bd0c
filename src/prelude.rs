//! Convenience re-exports for common use.

pub use crate::bot::{render_answer, ChatBot, ChatBotOptions, InvokeInput, InvokeOutput};
pub use crate::config::BotConfig;
pub use crate::error::{BotError, Result};
pub use crate::graph::{
    Executor, GraphDefinition, Route, RunControl, RunEvent, RunEventPayload, Step, StepContext,
    ToolErrorPolicy,
};
pub use crate::models::LanguageModel;
pub use crate::provider::{ModelBackend, ModelRequest, ToolDefinition};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolBackend, Toolset};
pub use crate::types::{
    ContentChunk, GenerationSettings, Message, MessageContent, MessageHistory, Role,
    ToolCallRequest,
};
