//! Services built on top of a session.
//!
//! - `chat` - Claude conversation loop with tool execution

pub mod chat;

pub use chat::{Assistant, ChatError, MAX_TOOL_ITERATIONS, ToolCall, Turn};
