//! Message types exchanged between the graph, the model and the tools.

use serde::{Deserialize, Serialize};

/// A single conversation turn.
///
/// Fields are private so a message cannot change after it is built; use the
/// constructors and accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    role: Role,
    content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_call_ids: Vec<String>,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
            tool_calls: Vec::new(),
            tool_call_ids: Vec::new(),
        }
    }

    /// Create a plain model reply.
    pub fn model(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_ids: Vec::new(),
        }
    }

    /// Create a model reply that requests one or more tool invocations.
    pub fn model_with_tool_calls(
        content: impl Into<MessageContent>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            tool_calls,
            tool_call_ids: Vec::new(),
        }
    }

    /// Create the result of a single tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Text(output.into()),
            tool_calls: Vec::new(),
            tool_call_ids: vec![tool_call_id.into()],
        }
    }

    /// Create the combined result of several tool calls from one model turn.
    ///
    /// A single output keeps plain text content; several outputs become one
    /// text chunk each, in the order given.
    pub fn tool_results(mut outputs: Vec<(String, String)>) -> Self {
        if outputs.len() == 1 {
            let (id, output) = outputs.remove(0);
            return Self::tool_result(id, output);
        }
        let (tool_call_ids, chunks): (Vec<_>, Vec<_>) = outputs
            .into_iter()
            .map(|(id, text)| (id, ContentChunk::Text { text }))
            .unzip();
        Self {
            role: Role::Tool,
            content: MessageContent::Chunks(chunks),
            tool_calls: Vec::new(),
            tool_call_ids,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Tool calls requested by the model on this turn (empty when none).
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        &self.tool_calls
    }

    /// Ids of the tool calls this message answers (tool results only).
    pub fn tool_call_ids(&self) -> &[String] {
        &self.tool_call_ids
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Display text of this message. See [`MessageContent::flatten`].
    pub fn text(&self) -> String {
        self.content.flatten()
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Tool,
}

/// Message body: either one string or an ordered list of typed chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Chunks(Vec<ContentChunk>),
}

impl MessageContent {
    /// Flatten into display text.
    ///
    /// Text chunks are joined with a single space; non-text chunks are
    /// skipped entirely.
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Chunks(chunks) => chunks
                .iter()
                .filter_map(|chunk| match chunk {
                    ContentChunk::Text { text } => Some(text.as_str()),
                    ContentChunk::Other => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Chunks(chunks) => chunks.is_empty(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<ContentChunk>> for MessageContent {
    fn from(chunks: Vec<ContentChunk>) -> Self {
        Self::Chunks(chunks)
    }
}

/// A single typed piece of chunked content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentChunk {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ContentChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunk_flattening_skips_other_chunks() {
        let content = MessageContent::Chunks(vec![
            ContentChunk::text("a"),
            ContentChunk::Other,
            ContentChunk::text("b"),
        ]);
        assert_eq!(content.flatten(), "a b");
    }

    #[test]
    fn chunks_deserialize_from_typed_objects() {
        let content: MessageContent = serde_json::from_value(json!([
            {"type": "text", "text": "hello"},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": "world"}
        ]))
        .unwrap();
        assert_eq!(content.flatten(), "hello world");
    }

    #[test]
    fn multiple_tool_outputs_become_chunks_in_order() {
        let msg = Message::tool_results(vec![
            ("call_1".to_string(), "first".to_string()),
            ("call_2".to_string(), "second".to_string()),
        ]);
        assert_eq!(msg.role(), Role::Tool);
        assert_eq!(msg.tool_call_ids(), ["call_1", "call_2"]);
        assert_eq!(msg.text(), "first second");
    }

    #[test]
    fn single_tool_output_keeps_raw_text() {
        let msg = Message::tool_results(vec![("call_1".to_string(), "raw".to_string())]);
        assert_eq!(msg.content(), &MessageContent::Text("raw".to_string()));
    }
}
