//! Routing decision after a `respond` step.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Result;
use crate::types::{Message, MessageHistory, Role};

/// Label chosen by the router; a conditional edge maps each label to a target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Route {
    Tools,
    Summarize,
    Terminate,
}

/// What the last message is, for routing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    HasToolCall,
    IsToolResult,
    Plain,
}

impl MessageKind {
    /// Tool calls win over role: a model turn carrying calls is never plain.
    pub fn of(message: &Message) -> Self {
        if message.has_tool_calls() {
            Self::HasToolCall
        } else if message.role() == Role::Tool {
            Self::IsToolResult
        } else {
            Self::Plain
        }
    }
}

/// Pick the next label from the latest message.
pub fn route(history: &MessageHistory) -> Result<Route> {
    Ok(route_message(history.last()?))
}

pub fn route_message(message: &Message) -> Route {
    match MessageKind::of(message) {
        MessageKind::HasToolCall => Route::Tools,
        MessageKind::IsToolResult => Route::Summarize,
        MessageKind::Plain => Route::Terminate,
    }
}
