//! Claude API integration.
//!
//! The conversation loop talks to the model through [`ChatModel`], which
//! [`ClaudeClient`] implements over the Anthropic Messages API. Tests and
//! offline evaluation can substitute a scripted model.

mod client;
mod error;
pub mod types;

use std::future::Future;

pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use types::{ChatResponse, ContentBlock, Message, MessageContent, Role, StopReason, Tool};

/// A model that answers a conversation, possibly by requesting tool calls.
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant turn for `messages`.
    fn respond(
        &self,
        messages: &[Message],
        system: &str,
        tools: &[Tool],
    ) -> impl Future<Output = Result<ChatResponse, ClaudeError>> + Send;
}
