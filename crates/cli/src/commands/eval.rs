//! Scenario evaluation against Claude.
//!
//! Requires `CLAUDE_API_KEY`. The catalogue is loaded once and every
//! scenario file gets a fresh session on it.
//!
//! # Usage
//!
//! ```bash
//! sa-cli eval --dir eval/eval_data --results eval/test_results --name simple
//! ```
//!
//! Exits non-zero when the averaged scores fall below the criteria.

#![allow(clippy::print_stdout)]

use std::path::Path;
use std::sync::Arc;

use shopping_assistant::claude::{ClaudeClient, ClaudeError};
use shopping_assistant::eval::{self, EvalError, EvalStatus};
use shopping_assistant::{
    Assistant, AssistantConfig, ConfigError, InMemoryArtifacts, PaymentDisplay, Session,
};
use shopping_assistant_webshop::{ShopData, ShopError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("evaluation failed: scores below criteria")]
    BelowCriteria,
}

/// Run the scenarios in `dir` and write the report into `results`.
///
/// # Errors
///
/// Returns an error if setup fails, the run fails, or the report does not
/// meet its criteria.
pub async fn run(
    config: &AssistantConfig,
    dir: &Path,
    results: &Path,
    name: &str,
) -> Result<(), EvalCommandError> {
    let claude_config = config.claude()?;
    let claude = ClaudeClient::new(claude_config)?;
    let data = Arc::new(ShopData::load(&config.catalogue)?);
    let base_url = config.base_url.as_str();
    let qr_path = config.payment_qr_path.as_path();

    let report = eval::run(dir, name, || {
        let session = Session::from_data(Arc::clone(&data), base_url)?;
        Ok::<_, EvalError>(Assistant::new(
            claude.clone(),
            session,
            InMemoryArtifacts::new(),
            PaymentDisplay::new(qr_path),
        ))
    })
    .await?;

    let path = report.write(results)?;
    println!("{}", report.summary()?);
    println!("Report written to {}", path.display());

    if report.status == EvalStatus::Failed {
        return Err(EvalCommandError::BelowCriteria);
    }
    Ok(())
}
