//! Scenario evaluation.
//!
//! A directory of `*.test.json` scenarios is replayed against fresh
//! assistants, one per file. Each turn is scored on its tool trajectory and
//! on how closely the reply matches the recorded reference; the averages are
//! checked against the criteria in `test_config.json`.

mod report;
mod scenario;
mod score;

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::artifacts::ArtifactStore;
use crate::claude::ChatModel;
use crate::services::chat::Assistant;
use crate::session::SessionError;

pub use report::{CaseResult, EvalReport, EvalStatus, Metrics, TIMESTAMP_FORMAT};
pub use scenario::{CONFIG_FILE, Criteria, ExpectedToolUse, SCENARIO_SUFFIX, Scenario, ScenarioTurn};
pub use score::{rouge1_f1, trajectory_score};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no *.test.json scenarios in {}", .0.display())]
    NoScenarios(PathBuf),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render summary: {0}")]
    Render(#[from] askama::Error),
}

/// Replay every scenario in `dir` and score the results.
///
/// `new_assistant` is called once per scenario file so each starts from a
/// fresh session. A turn whose model call fails is recorded with zero scores
/// and the run continues.
///
/// # Errors
///
/// Returns an error if the scenarios or criteria cannot be loaded or an
/// assistant cannot be created.
#[instrument(skip(new_assistant), fields(dir = %dir.display()))]
pub async fn run<M, A, F>(
    dir: &Path,
    test_name: &str,
    mut new_assistant: F,
) -> Result<EvalReport, EvalError>
where
    M: ChatModel,
    A: ArtifactStore,
    F: FnMut() -> Result<Assistant<M, A>, EvalError>,
{
    let criteria = Criteria::load(dir)?;
    let scenarios = Scenario::load_dir(dir)?;
    info!(scenarios = scenarios.len(), "Running evaluation");

    let mut cases = Vec::new();
    for scenario in &scenarios {
        let mut assistant = new_assistant()?;
        for turn in &scenario.turns {
            cases.push(run_turn(&mut assistant, &scenario.name, turn).await);
        }
    }

    let report = EvalReport::new(test_name, cases, criteria, Local::now());
    info!(
        status = report.status.as_str(),
        tool_trajectory_avg_score = report.metrics.tool_trajectory_avg_score,
        response_match_score = report.metrics.response_match_score,
        "Evaluation finished"
    );
    Ok(report)
}

async fn run_turn<M: ChatModel, A: ArtifactStore>(
    assistant: &mut Assistant<M, A>,
    scenario: &str,
    turn: &ScenarioTurn,
) -> CaseResult {
    let (response, actual_tool_calls, error) = match assistant.send_message(&turn.query).await {
        Ok(reply) => (reply.reply, reply.tool_calls, None),
        Err(e) => {
            warn!(scenario, query = %turn.query, error = %e, "Turn failed");
            (String::new(), Vec::new(), Some(e.to_string()))
        }
    };

    let (tool_trajectory_score, response_match_score) = if error.is_some() {
        (0.0, 0.0)
    } else {
        (
            trajectory_score(&actual_tool_calls, &turn.expected_tool_use),
            rouge1_f1(&turn.reference, &response),
        )
    };

    CaseResult {
        scenario: scenario.to_string(),
        query: turn.query.clone(),
        expected_tool_use: turn.expected_tool_use.clone(),
        actual_tool_calls,
        reference: turn.reference.clone(),
        response,
        tool_trajectory_score,
        response_match_score,
        error,
    }
}
