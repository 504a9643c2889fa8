//! The contract between a session and a simulated shop.
//!
//! A shop accepts an encoded action string and moves to a new page. It exposes
//! the resulting page as text, as raw HTML and as a URL, plus the episode's
//! reward and terminal flag. The trait is synchronous: a step
//! runs to completion without yielding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionError;

/// Errors raised by a shop while executing a step.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The action string could not be decoded.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] ActionError),

    /// The shop failed to search its catalogue.
    #[error("search failed: {0}")]
    Search(String),

    /// The shop failed to render the next page.
    #[error("render failed: {0}")]
    Render(String),

    /// Any other failure inside the simulation.
    #[error("simulation error: {0}")]
    Simulation(String),
}

/// Snapshot of the page the shop is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Textual rendering of the page.
    pub observation: String,
    /// Raw HTML of the page.
    pub html: String,
    pub url: String,
    /// Whether the episode has reached a terminal state.
    pub done: bool,
    /// Reward of the last step.
    pub reward: f64,
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: String,
    pub reward: f64,
    pub done: bool,
}

impl From<&EnvironmentState> for StepOutcome {
    fn from(state: &EnvironmentState) -> Self {
        Self {
            observation: state.observation.clone(),
            reward: state.reward,
            done: state.done,
        }
    }
}

/// A simulated shop driven by `verb[argument]` action strings.
///
/// Implementations define their own behaviour for controls that are not on
/// the current page; callers must not rely on it.
pub trait Environment {
    /// Start a new episode on the search page.
    ///
    /// # Errors
    ///
    /// Returns an error if the start page cannot be produced.
    fn reset(&mut self) -> Result<StepOutcome, EnvironmentError>;

    /// Execute one encoded action.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be decoded or the simulation fails.
    fn step(&mut self, action: &str) -> Result<StepOutcome, EnvironmentError>;

    /// The page currently shown.
    fn state(&self) -> &EnvironmentState;

    /// The goal instruction the shop scores purchases against.
    fn instruction(&self) -> &str {
        ""
    }

    /// Replace the goal instruction the shop scores purchases against.
    fn set_instruction(&mut self, _instruction: &str) {}
}
