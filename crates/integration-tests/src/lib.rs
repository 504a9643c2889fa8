//! Integration tests for the shopping assistant.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopping-assistant-integration-tests
//! ```
//!
//! No API key or network access is needed: the catalogue comes from
//! `fixtures/items.json` and the model is a [`ScriptedModel`] that replays
//! canned responses.
//!
//! # Test Categories
//!
//! - `navigation` - Sessions driving the webshop end to end
//! - `tools` - Tool execution, artifacts and the payment QR
//! - `assistant` - The chat loop with tool use
//! - `evaluation` - Scenario replay and report files

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use shopping_assistant::claude::types::Usage;
use shopping_assistant::claude::{
    ChatModel, ChatResponse, ClaudeError, ContentBlock, Message, StopReason, Tool,
};
use shopping_assistant::{Assistant, InMemoryArtifacts, PaymentDisplay, Session};
use shopping_assistant_webshop::{CatalogueConfig, ShopData};

/// Origin used for page URLs in tests.
pub const BASE_URL: &str = "http://127.0.0.1:3000";

/// Directory holding the test fixtures.
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Catalogue settings pointing at `fixtures/items.json`.
#[must_use]
pub fn catalogue_config() -> CatalogueConfig {
    CatalogueConfig {
        data_dir: fixtures_dir(),
        num_products: 0,
        file_override: Some(fixtures_dir().join("items.json")),
    }
}

/// Load and index the fixture catalogue.
///
/// # Panics
///
/// Panics if the fixture catalogue cannot be loaded.
#[must_use]
pub fn shop_data() -> Arc<ShopData> {
    Arc::new(ShopData::load(&catalogue_config()).expect("fixture catalogue loads"))
}

/// A fresh session on `data`.
///
/// # Panics
///
/// Panics if the shop cannot render its start page.
#[must_use]
pub fn session(data: &Arc<ShopData>) -> Session {
    Session::from_data(Arc::clone(data), BASE_URL).expect("session opens")
}

/// An assistant over the fixture shop driven by `model`.
#[must_use]
pub fn assistant(
    data: &Arc<ShopData>,
    model: &ScriptedModel,
    payment: PaymentDisplay,
) -> Assistant<ScriptedModel, InMemoryArtifacts> {
    Assistant::new(
        model.clone(),
        session(data),
        InMemoryArtifacts::new(),
        payment,
    )
}

/// Chat model that answers with queued responses and records every request.
///
/// Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    responses: Arc<Mutex<VecDeque<ChatResponse>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedModel {
    #[must_use]
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    /// Messages sent with each request so far.
    ///
    /// # Panics
    ///
    /// Panics if the request log is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().expect("request log").clone()
    }

    /// Responses not yet consumed.
    ///
    /// # Panics
    ///
    /// Panics if the script is poisoned.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.lock().expect("script").len()
    }
}

impl ChatModel for ScriptedModel {
    async fn respond(
        &self,
        messages: &[Message],
        _system: &str,
        _tools: &[Tool],
    ) -> Result<ChatResponse, ClaudeError> {
        self.requests
            .lock()
            .map_err(|_| ClaudeError::Parse("request log poisoned".to_string()))?
            .push(messages.to_vec());
        self.responses
            .lock()
            .map_err(|_| ClaudeError::Parse("script poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| ClaudeError::Parse("script exhausted".to_string()))
    }
}

/// A final text answer.
#[must_use]
pub fn answer(text: &str) -> ChatResponse {
    response(StopReason::EndTurn, vec![ContentBlock::text(text)])
}

/// A response asking for one tool call.
#[must_use]
pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ChatResponse {
    response(
        StopReason::ToolUse,
        vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
    )
}

fn response(stop_reason: StopReason, content: Vec<ContentBlock>) -> ChatResponse {
    ChatResponse {
        id: "msg_scripted".to_string(),
        model: "scripted".to_string(),
        stop_reason: Some(stop_reason),
        content,
        usage: Usage::default(),
    }
}
