//! Anthropic Messages API wire types used by the tool loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// A plain text message from the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message carrying tool results.
    #[must_use]
    pub const fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results),
        }
    }

    /// The model's turn, echoed back verbatim.
    #[must_use]
    pub const fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// Plain text or a list of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Tool call requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Outcome of a tool call, sent back in the next user message.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Result block for the tool call `tool_use_id`.
    #[must_use]
    pub fn tool_result(tool_use_id: impl Into<String>, content: String, is_error: bool) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: is_error.then_some(true),
        }
    }
}

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool input.
    pub input_schema: serde_json::Value,
}

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [Tool],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn no_tools(tools: &&[Tool]) -> bool {
    tools.is_empty()
}

/// A complete (non-streaming) model response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub stop_reason: Option<StopReason>,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Concatenated text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the model is waiting on tool results.
    #[must_use]
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == Some(StopReason::ToolUse)
            && self
                .content
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_text_serializes_as_string() {
        let value = serde_json::to_value(Message::user("Hello")).expect("serialize");
        assert_eq!(value, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_tool_result_omits_success_flag() {
        let ok = serde_json::to_value(ContentBlock::tool_result("tu_1", "done".to_string(), false))
            .expect("serialize");
        assert_eq!(ok, json!({"type": "tool_result", "tool_use_id": "tu_1", "content": "done"}));

        let failed = serde_json::to_value(ContentBlock::tool_result("tu_2", "bad".to_string(), true))
            .expect("serialize");
        assert_eq!(failed["is_error"], json!(true));
    }

    #[test]
    fn test_request_skips_empty_tools() {
        let messages = [Message::user("hi")];
        let request = ChatRequest {
            model: "claude-test",
            max_tokens: 16,
            messages: &messages,
            system: None,
            tools: &[],
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert!(value.get("tools").is_none());
        assert!(value.get("system").is_none());
    }

    #[test]
    fn test_tool_use_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "model": "claude-test",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Searching."},
                {"type": "tool_use", "id": "tu_1", "name": "search", "input": {"keywords": "mug"}}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .expect("deserialize");

        assert!(response.wants_tools());
        assert_eq!(response.text(), "Searching.");
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_end_turn_does_not_want_tools() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "msg_2",
            "model": "claude-test",
            "stop_reason": "end_turn",
            "content": [{"type": "text", "text": "Here you go."}]
        }))
        .expect("deserialize");

        assert!(!response.wants_tools());
        assert_eq!(response.usage, Usage::default());
    }
}
