//! Shopping Assistant - interactive terminal chat.
//!
//! Reads customer messages from stdin, one per line, and prints the
//! assistant's replies. Page snapshots and the payment QR are written to
//! `ARTIFACT_DIR` when it is set.
//!
//! See [`shopping_assistant::config`] for the environment variables.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use shopping_assistant::claude::{ChatModel, ClaudeClient};
use shopping_assistant::telemetry::{self, DEFAULT_LOG_FILTER};
use shopping_assistant::{
    ArtifactStore, Assistant, AssistantConfig, DirectoryArtifacts, InMemoryArtifacts,
    PaymentDisplay, Session,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

#[tokio::main]
async fn main() {
    let config = AssistantConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(DEFAULT_LOG_FILTER);

    let claude_config = config.claude().expect("CLAUDE_API_KEY is required for chat");
    let claude = ClaudeClient::new(claude_config).expect("Failed to build Claude client");
    let session =
        Session::open(&config.catalogue, &config.base_url).expect("Failed to open the webshop");
    let payment = PaymentDisplay::new(&config.payment_qr_path);

    tracing::info!(session = %session.id(), model = claude.model(), "Shopping assistant ready");

    if let Some(dir) = &config.artifact_dir {
        converse(Assistant::new(claude, session, DirectoryArtifacts::new(dir), payment)).await;
    } else {
        converse(Assistant::new(claude, session, InMemoryArtifacts::new(), payment)).await;
    }
}

async fn converse<M: ChatModel, A: ArtifactStore>(mut assistant: Assistant<M, A>) {
    println!("Shopping assistant. Type a message, or 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let _ = stdout.write_all(b"> ").await;
        let _ = stdout.flush().await;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&message.to_lowercase().as_str()) {
            break;
        }

        match assistant.send_message(message).await {
            Ok(turn) => {
                for call in &turn.tool_calls {
                    tracing::debug!(tool = %call.name, input = %call.input, "Tool called");
                }
                println!("{}\n", turn.reply);
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                println!("Sorry, something went wrong: {e}\n");
            }
        }
    }
}
