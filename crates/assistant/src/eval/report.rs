//! Evaluation results and their on-disk report.

use std::path::{Path, PathBuf};

use askama::Template;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::services::chat::ToolCall;

use super::EvalError;
use super::scenario::{Criteria, ExpectedToolUse};

/// Timestamp format used in reports and their file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Outcome of one scenario turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub scenario: String,
    pub query: String,
    pub expected_tool_use: Vec<ExpectedToolUse>,
    pub actual_tool_calls: Vec<ToolCall>,
    pub reference: String,
    pub response: String,
    pub tool_trajectory_score: f64,
    pub response_match_score: f64,
    /// Set when the turn failed before the model answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvalStatus {
    Passed,
    Failed,
}

impl EvalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }
}

/// Average scores over every case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub tool_trajectory_avg_score: f64,
    pub response_match_score: f64,
}

impl Metrics {
    #[must_use]
    pub fn average(cases: &[CaseResult]) -> Self {
        if cases.is_empty() {
            return Self {
                tool_trajectory_avg_score: 0.0,
                response_match_score: 0.0,
            };
        }
        #[allow(clippy::cast_precision_loss)]
        let count = cases.len() as f64;
        Self {
            tool_trajectory_avg_score: cases.iter().map(|c| c.tool_trajectory_score).sum::<f64>()
                / count,
            response_match_score: cases.iter().map(|c| c.response_match_score).sum::<f64>() / count,
        }
    }

    #[must_use]
    pub fn meets(&self, criteria: &Criteria) -> bool {
        self.tool_trajectory_avg_score >= criteria.tool_trajectory_avg_score
            && self.response_match_score >= criteria.response_match_score
    }
}

/// A complete evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub timestamp: String,
    pub test_name: String,
    pub status: EvalStatus,
    pub metrics: Metrics,
    pub criteria: Criteria,
    pub cases: Vec<CaseResult>,
}

#[derive(Template)]
#[template(path = "eval/summary.txt")]
struct SummaryTemplate<'a> {
    report: &'a EvalReport,
}

impl EvalReport {
    #[must_use]
    pub fn new(
        test_name: &str,
        cases: Vec<CaseResult>,
        criteria: Criteria,
        at: DateTime<Local>,
    ) -> Self {
        let metrics = Metrics::average(&cases);
        let status = if metrics.meets(&criteria) {
            EvalStatus::Passed
        } else {
            EvalStatus::Failed
        };
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            test_name: test_name.to_string(),
            status,
            metrics,
            criteria,
            cases,
        }
    }

    /// Human-readable summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary template fails to render.
    pub fn summary(&self) -> Result<String, EvalError> {
        Ok(SummaryTemplate { report: self }.render()?)
    }

    /// Write `{test_name}_{timestamp}.json` and its `_summary.txt` into
    /// `dir`, returning the JSON path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or files cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, EvalError> {
        std::fs::create_dir_all(dir).map_err(|source| EvalError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let stem = format!("{}_{}", self.test_name, self.timestamp);
        let json_path = dir.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(self)?;
        write_file(&json_path, &json)?;

        let summary_path = dir.join(format!("{stem}_summary.txt"));
        write_file(&summary_path, &self.summary()?)?;

        info!(path = %json_path.display(), status = self.status.as_str(), "Evaluation report written");
        Ok(json_path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), EvalError> {
    std::fs::write(path, contents).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn case(trajectory: f64, response: f64) -> CaseResult {
        CaseResult {
            scenario: "greeting".to_string(),
            query: "hi".to_string(),
            expected_tool_use: Vec::new(),
            actual_tool_calls: Vec::new(),
            reference: "hello".to_string(),
            response: "hello".to_string(),
            tool_trajectory_score: trajectory,
            response_match_score: response,
            error: None,
        }
    }

    fn at() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 4, 5, 6, 7)
            .single()
            .expect("unambiguous time")
    }

    #[test]
    fn test_status_follows_criteria() {
        let passed = EvalReport::new("simple", vec![case(1.0, 0.9)], Criteria::default(), at());
        assert_eq!(passed.status, EvalStatus::Passed);

        let failed =
            EvalReport::new("simple", vec![case(1.0, 1.0), case(0.0, 1.0)], Criteria::default(), at());
        assert_eq!(failed.status, EvalStatus::Failed);
        assert!((failed.metrics.tool_trajectory_avg_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_cases_fail() {
        let report = EvalReport::new("empty", Vec::new(), Criteria::default(), at());
        assert_eq!(report.status, EvalStatus::Failed);
    }

    #[test]
    fn test_write_names_files_by_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = EvalReport::new("simple", vec![case(1.0, 1.0)], Criteria::default(), at());

        let path = report.write(&dir.path().join("results")).expect("write");

        assert!(path.ends_with("simple_20250304_050607.json"));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(written["status"], json!("PASSED"));
        assert_eq!(written["timestamp"], json!("20250304_050607"));
        assert_eq!(written["test_name"], json!("simple"));
        assert!(written["cases"][0].get("error").is_none());

        let summary = std::fs::read_to_string(dir.path().join("results/simple_20250304_050607_summary.txt"))
            .expect("summary");
        assert!(summary.contains("Status: PASSED"));
        assert!(summary.contains("hi"));
    }
}
