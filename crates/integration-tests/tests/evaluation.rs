//! Integration tests for scenario evaluation.
//!
//! Replays `fixtures/eval` with scripted assistants and checks the scores,
//! the status and the report files.

use std::sync::Arc;

use serde_json::json;
use shopping_assistant::eval::{self, EvalError, EvalStatus, Scenario};
use shopping_assistant::{Assistant, InMemoryArtifacts, PaymentDisplay, Session};
use shopping_assistant_integration_tests::{
    BASE_URL, ScriptedModel, answer, fixtures_dir, shop_data, tool_call,
};

fn eval_dir() -> std::path::PathBuf {
    fixtures_dir().join("eval")
}

#[test]
fn test_fixture_scenarios_load_in_name_order() {
    let scenarios = Scenario::load_dir(&eval_dir()).expect("scenarios");

    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["blue_tee", "greeting"]);
    let expected = &scenarios
        .first()
        .and_then(|s| s.turns.first())
        .expect("first turn")
        .expected_tool_use;
    assert_eq!(expected.len(), 1);
}

#[tokio::test]
async fn test_matching_assistant_passes() {
    // Scenario files run in name order: blue_tee, then greeting.
    let model = ScriptedModel::new(vec![
        tool_call("t1", "search", json!({"keywords": "blue t-shirt"})),
        answer("I found two blue t-shirts for you."),
        answer("Hello! What are you shopping for today?"),
    ]);
    let data = shop_data();
    let mut created = 0;

    let report = eval::run(&eval_dir(), "simple", || {
        created += 1;
        Ok::<_, EvalError>(Assistant::new(
            model.clone(),
            Session::from_data(Arc::clone(&data), BASE_URL)?,
            InMemoryArtifacts::new(),
            PaymentDisplay::default(),
        ))
    })
    .await
    .expect("run");

    assert_eq!(created, 2);
    assert_eq!(report.status, EvalStatus::Passed);
    assert_eq!(report.cases.len(), 2);
    assert!((report.metrics.tool_trajectory_avg_score - 1.0).abs() < f64::EPSILON);
    assert!((report.metrics.response_match_score - 1.0).abs() < f64::EPSILON);
    assert!((report.criteria.response_match_score - 0.5).abs() < f64::EPSILON);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = report.write(dir.path()).expect("write report");
    let name = path.file_name().expect("file name").to_string_lossy().into_owned();
    assert!(name.starts_with("simple_") && name.ends_with(".json"), "{name}");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(written["status"], json!("PASSED"));
    assert_eq!(
        written["cases"][0]["actual_tool_calls"][0]["input"]["keywords"],
        json!("blue t-shirt")
    );
}

#[tokio::test]
async fn test_wrong_trajectory_fails() {
    let model = ScriptedModel::new(vec![
        answer("I found two blue t-shirts for you."),
        answer("Hello! What are you shopping for today?"),
    ]);
    let data = shop_data();

    let report = eval::run(&eval_dir(), "simple", || {
        Ok::<_, EvalError>(Assistant::new(
            model.clone(),
            Session::from_data(Arc::clone(&data), BASE_URL)?,
            InMemoryArtifacts::new(),
            PaymentDisplay::default(),
        ))
    })
    .await
    .expect("run");

    assert_eq!(report.status, EvalStatus::Failed);
    assert!((report.metrics.tool_trajectory_avg_score - 0.5).abs() < f64::EPSILON);
    let summary = report.summary().expect("summary");
    assert!(summary.contains("Status: FAILED"));
}

#[tokio::test]
async fn test_model_failure_is_recorded_per_case() {
    // Only the first scenario gets an answer; the second exhausts the script.
    let model = ScriptedModel::new(vec![
        tool_call("t1", "search", json!({"keywords": "blue t-shirt"})),
        answer("I found two blue t-shirts for you."),
    ]);
    let data = shop_data();

    let report = eval::run(&eval_dir(), "simple", || {
        Ok::<_, EvalError>(Assistant::new(
            model.clone(),
            Session::from_data(Arc::clone(&data), BASE_URL)?,
            InMemoryArtifacts::new(),
            PaymentDisplay::default(),
        ))
    })
    .await
    .expect("run");

    let failed = report.cases.get(1).expect("second case");
    assert_eq!(failed.scenario, "greeting");
    assert!(failed.error.as_deref().is_some_and(|e| e.contains("script exhausted")));
    assert!(failed.response_match_score.abs() < f64::EPSILON);
    assert_eq!(report.status, EvalStatus::Failed);
}

#[tokio::test]
async fn test_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = shop_data();

    let result = eval::run(dir.path(), "simple", || {
        Ok::<_, EvalError>(Assistant::new(
            ScriptedModel::default(),
            Session::from_data(Arc::clone(&data), BASE_URL)?,
            InMemoryArtifacts::new(),
            PaymentDisplay::default(),
        ))
    })
    .await;

    assert!(matches!(result, Err(EvalError::NoScenarios(_))));
}
