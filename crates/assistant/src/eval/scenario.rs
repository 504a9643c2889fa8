//! Recorded conversations with the tool calls they should produce.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::EvalError;

/// Suffix of scenario files.
pub const SCENARIO_SUFFIX: &str = ".test.json";

/// Optional criteria file next to the scenarios.
pub const CONFIG_FILE: &str = "test_config.json";

/// A tool call a turn is expected to make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedToolUse {
    pub tool_name: String,
    #[serde(default = "empty_object")]
    pub tool_input: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// One customer message with its expected outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTurn {
    pub query: String,
    #[serde(default)]
    pub expected_tool_use: Vec<ExpectedToolUse>,
    /// Expected reply, compared by word overlap.
    #[serde(default)]
    pub reference: String,
}

/// A scenario file; its turns run in order in one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// File name without the `.test.json` suffix.
    pub name: String,
    pub path: PathBuf,
    pub turns: Vec<ScenarioTurn>,
}

impl Scenario {
    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// turns.
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let turns = read_json(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = file_name
            .strip_suffix(SCENARIO_SUFFIX)
            .unwrap_or(&file_name)
            .to_string();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            turns,
        })
    }

    /// Load every `*.test.json` file in `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, a file is invalid,
    /// or there are no scenario files.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, EvalError> {
        let entries = std::fs::read_dir(dir).map_err(|source| EvalError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| EvalError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_scenario = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(SCENARIO_SUFFIX));
            if is_scenario && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(EvalError::NoScenarios(dir.to_path_buf()));
        }
        paths.iter().map(|path| Self::load(path)).collect()
    }
}

/// Minimum average scores for a run to pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    pub tool_trajectory_avg_score: f64,
    pub response_match_score: f64,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            tool_trajectory_avg_score: 1.0,
            response_match_score: 0.8,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EvalConfig {
    #[serde(default)]
    criteria: Criteria,
}

impl Criteria {
    /// Criteria from `dir/test_config.json`, or the defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self, EvalError> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let config: EvalConfig = read_json(&path)?;
        Ok(config.criteria)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EvalError> {
    let raw = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| EvalError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).expect("write");
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "b.test.json", &json!([{"query": "hi", "reference": "hello"}]));
        write(
            dir.path(),
            "a.test.json",
            &json!([{
                "query": "find a mug",
                "expected_tool_use": [
                    {"tool_name": "search", "tool_input": {"keywords": "mug"}},
                    {"tool_name": "show_payment_qr"}
                ],
                "reference": "Here are some mugs."
            }]),
        );
        write(dir.path(), "notes.json", &json!({}));

        let scenarios = Scenario::load_dir(dir.path()).expect("load");

        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        let first = scenarios.first().and_then(|s| s.turns.first()).expect("turn");
        assert_eq!(first.expected_tool_use.len(), 2);
        assert_eq!(first.expected_tool_use.get(1).map(|t| &t.tool_input), Some(&json!({})));
        let second = scenarios.get(1).and_then(|s| s.turns.first()).expect("turn");
        assert!(second.expected_tool_use.is_empty());
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            Scenario::load_dir(dir.path()),
            Err(EvalError::NoScenarios(_))
        ));
    }

    #[test]
    fn test_invalid_scenario_names_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("bad.test.json"), "{not json").expect("write");

        let err = Scenario::load_dir(dir.path()).expect_err("invalid");

        assert!(err.to_string().contains("bad.test.json"));
    }

    #[test]
    fn test_criteria_defaults_and_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Criteria::load(dir.path()).expect("defaults"), Criteria::default());

        write(
            dir.path(),
            CONFIG_FILE,
            &json!({"criteria": {"response_match_score": 0.5}}),
        );
        let criteria = Criteria::load(dir.path()).expect("config");
        assert!((criteria.tool_trajectory_avg_score - 1.0).abs() < f64::EPSILON);
        assert!((criteria.response_match_score - 0.5).abs() < f64::EPSILON);
    }
}
