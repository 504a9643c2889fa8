//! Conversation loop between the customer, the model and the shop.
//!
//! Each customer message is appended to the history and sent to the model
//! with the shopping tools. While the model asks for tools, every `tool_use`
//! block is executed in order against the session and the results go back
//! as the next user message. The turn ends when the model answers without
//! tool use.

use askama::Template;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::artifacts::ArtifactStore;
use crate::claude::{ChatModel, ClaudeError, ContentBlock, Message, Tool};
use crate::payment::PaymentDisplay;
use crate::session::Session;
use crate::tools::{ToolExecutor, shopping_tools};

/// System prompt for the shopping assistant.
#[derive(Template)]
#[template(path = "claude/system_prompt.txt")]
struct SystemPromptTemplate;

fn render_system_prompt() -> String {
    // Static template; rendering cannot fail in practice.
    SystemPromptTemplate.render().unwrap_or_else(|_| {
        String::from("You are a shopping assistant. Use the search and click tools to help the customer buy a product.")
    })
}

/// Model round trips allowed per customer message.
pub const MAX_TOOL_ITERATIONS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Claude API error: {0}")]
    Claude(#[from] ClaudeError),

    #[error("too many tool iterations")]
    TooManyToolIterations,
}

/// A tool call made during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub input: serde_json::Value,
}

/// The assistant's answer to one customer message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// Text of the model's final response.
    pub reply: String,
    /// Tool calls in the order they were executed.
    pub tool_calls: Vec<ToolCall>,
}

/// A shopping conversation over one session.
pub struct Assistant<M, A> {
    model: M,
    session: Session,
    artifacts: A,
    payment: PaymentDisplay,
    tools: Vec<Tool>,
    system_prompt: String,
    history: Vec<Message>,
}

impl<M: ChatModel, A: ArtifactStore> Assistant<M, A> {
    #[must_use]
    pub fn new(model: M, session: Session, artifacts: A, payment: PaymentDisplay) -> Self {
        Self {
            model,
            session,
            artifacts,
            payment,
            tools: shopping_tools(),
            system_prompt: render_system_prompt(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn artifacts(&self) -> &A {
        &self.artifacts
    }

    /// Messages exchanged with the model so far.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Handle one customer message.
    ///
    /// Tool failures are reported to the model as error results and do not
    /// end the turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or the model keeps asking
    /// for tools past [`MAX_TOOL_ITERATIONS`].
    #[instrument(skip(self, text), fields(session = %self.session.id()))]
    pub async fn send_message(&mut self, text: &str) -> Result<Turn, ChatError> {
        self.history.push(Message::user(text));
        let mut tool_calls = Vec::new();

        for iteration in 1..=MAX_TOOL_ITERATIONS {
            let response = self
                .model
                .respond(&self.history, &self.system_prompt, &self.tools)
                .await?;

            info!(
                iteration,
                stop_reason = ?response.stop_reason,
                content_blocks = response.content.len(),
                "Model response received"
            );

            if !response.wants_tools() {
                let reply = response.text();
                self.history.push(Message::assistant(response.content));
                return Ok(Turn { reply, tool_calls });
            }

            let mut results = Vec::new();
            let mut executor =
                ToolExecutor::new(&mut self.session, &self.artifacts, &self.payment);
            for block in &response.content {
                let ContentBlock::ToolUse { id, name, input } = block else {
                    continue;
                };
                tool_calls.push(ToolCall {
                    name: name.clone(),
                    input: input.clone(),
                });

                let (content, is_error) = match executor.execute(name, input).await {
                    Ok(content) => (content, false),
                    Err(e) => {
                        warn!(tool = %name, error = %e, "Tool call failed");
                        (format!("Error: {e}"), true)
                    }
                };
                results.push(ContentBlock::tool_result(id.clone(), content, is_error));
            }

            self.history.push(Message::assistant(response.content));
            self.history.push(Message::tool_results(results));
        }

        warn!("Too many tool iterations, stopping");
        Err(ChatError::TooManyToolIterations)
    }
}
