//! Integration tests for the chat loop.
//!
//! A scripted model stands in for Claude, so each test fixes the tool calls
//! the model asks for and checks what the shop and the history end up with.

use serde_json::json;
use shopping_assistant::artifacts::{HTML_ARTIFACT, PAYMENT_QR_ARTIFACT};
use shopping_assistant::claude::{ContentBlock, MessageContent, Role};
use shopping_assistant::services::{ChatError, MAX_TOOL_ITERATIONS};
use shopping_assistant::PaymentDisplay;
use shopping_assistant_integration_tests::{ScriptedModel, answer, assistant, shop_data, tool_call};

/// Tool results carried by the last user message of a request.
fn tool_results(messages: &[shopping_assistant::claude::Message]) -> Vec<(String, bool)> {
    let Some(last) = messages.last() else {
        return Vec::new();
    };
    assert_eq!(last.role, Role::User);
    let MessageContent::Blocks(blocks) = &last.content else {
        return Vec::new();
    };
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                content, is_error, ..
            } => Some((content.clone(), is_error.unwrap_or(false))),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_shopping_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let qr = dir.path().join("qr1.jpg");
    std::fs::write(&qr, [0xFF, 0xD8, 0xFF, 0xD9]).expect("write qr");

    let model = ScriptedModel::new(vec![
        tool_call("t1", "search", json!({"keywords": "blue t-shirt"})),
        answer("I found a Blue Cotton T-Shirt (B0BLUETEE) for $12.99."),
        tool_call("t2", "click", json!({"button_name": "B0BLUETEE"})),
        tool_call("t3", "click", json!({"button_name": "large"})),
        tool_call("t4", "click", json!({"button_name": "Buy Now"})),
        tool_call("t5", "show_payment_qr", json!({})),
        answer("Your order is placed. Please scan the QR code to pay."),
    ]);
    let data = shop_data();
    let mut assistant = assistant(&data, &model, PaymentDisplay::new(&qr));

    let first = assistant.send_message("I need a blue t-shirt").await.expect("turn 1");
    assert_eq!(first.reply, "I found a Blue Cotton T-Shirt (B0BLUETEE) for $12.99.");
    assert_eq!(first.tool_calls.len(), 1);

    let second = assistant
        .send_message("Large please, buy it")
        .await
        .expect("turn 2");
    let names: Vec<&str> = second.tool_calls.iter().map(|call| call.name.as_str()).collect();
    assert_eq!(names, vec!["click", "click", "click", "show_payment_qr"]);
    assert!(second.reply.contains("scan the QR code"));

    let state = assistant.session().state();
    assert!(state.done);
    assert!(state.url.ends_with("/done/B0BLUETEE"));
    assert!(assistant.artifacts().latest(PAYMENT_QR_ARTIFACT).is_some());
    assert_eq!(assistant.artifacts().version_count(HTML_ARTIFACT), 4);
    assert_eq!(model.remaining(), 0);

    let requests = model.requests();
    assert_eq!(requests.len(), 7);
    let search_result = tool_results(requests.get(1).expect("second request"));
    assert_eq!(search_result.len(), 1);
    let (content, is_error) = search_result.first().expect("search result");
    assert!(!is_error);
    assert!(content.contains("Product ID (ASIN): B0BLUETEE"));
}

#[tokio::test]
async fn test_failed_tool_is_reported_to_model() {
    let model = ScriptedModel::new(vec![
        tool_call("t1", "click", json!({})),
        answer("Which product would you like to open?"),
    ]);
    let data = shop_data();
    let mut assistant = assistant(&data, &model, PaymentDisplay::default());

    let turn = assistant.send_message("open it").await.expect("turn");

    assert_eq!(turn.reply, "Which product would you like to open?");
    let requests = model.requests();
    let results = tool_results(requests.last().expect("follow-up request"));
    let (content, is_error) = results.first().expect("tool result");
    assert!(is_error);
    assert!(content.starts_with("Error: missing required field 'button_name'"));
}

#[tokio::test]
async fn test_tool_loop_is_bounded() {
    let script = (0..=MAX_TOOL_ITERATIONS)
        .map(|i| tool_call(&format!("t{i}"), "click", json!({"button_name": "Next >"})))
        .collect();
    let model = ScriptedModel::new(script);
    let data = shop_data();
    let mut assistant = assistant(&data, &model, PaymentDisplay::default());

    let result = assistant.send_message("keep going").await;

    assert!(matches!(result, Err(ChatError::TooManyToolIterations)));
    assert_eq!(model.requests().len(), MAX_TOOL_ITERATIONS);
}

#[tokio::test]
async fn test_history_alternates_roles() {
    let model = ScriptedModel::new(vec![
        tool_call("t1", "search", json!({"keywords": "mug"})),
        answer("Here is a red mug."),
    ]);
    let data = shop_data();
    let mut assistant = assistant(&data, &model, PaymentDisplay::default());

    assistant.send_message("a mug").await.expect("turn");

    let roles: Vec<Role> = assistant.history().iter().map(|message| message.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}
