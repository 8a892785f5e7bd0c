//! Tool system for function calling.

pub mod arguments;
#[cfg(feature = "tavily")]
pub mod search;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
#[cfg(feature = "tavily")]
pub use search::TavilySearch;
pub use tool::{AgentTool, Tool, ToolBackend, ToolExecutionContext, Toolset};
pub use types::AgentToolParameters;
