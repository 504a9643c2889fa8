//! Interactive shop browsing.
//!
//! Reads one action per line and prints the observation it leads to.
//!
//! # Usage
//!
//! ```bash
//! sa-cli browse
//! > search[blue t-shirt]
//! > click[B0SHIRT]
//! > click[Buy Now]
//! ```

#![allow(clippy::print_stdout)]

use shopping_assistant::{AssistantConfig, Session, SessionError};
use shopping_assistant_core::Action;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Run the browse loop until stdin closes or `exit` is typed.
///
/// # Errors
///
/// Returns an error if the shop cannot be opened or stdin fails.
pub async fn run(config: &AssistantConfig) -> Result<(), BrowseError> {
    let mut session = Session::open(&config.catalogue, &config.base_url)?;
    tracing::info!(session = %session.id(), "Browsing");

    println!("Type search[keywords] or click[control], or 'exit' to quit.");
    println!("{}\n", session.state().url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            break;
        }

        let action = match Action::parse(line) {
            Ok(action) => action,
            Err(e) => {
                println!("{e}\n");
                continue;
            }
        };

        match session.perform(&action) {
            Ok(observation) => {
                println!("{}", observation.text);
                println!(
                    "\n[url: {} | reward: {:.3} | done: {}]\n",
                    session.state().url,
                    observation.reward,
                    observation.done
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Action failed");
                println!("Error: {e}\n");
            }
        }
    }

    tracing::info!(steps = session.steps(), "Browsing finished");
    Ok(())
}
