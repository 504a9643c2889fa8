//! Actions understood by the shop.
//!
//! On the wire an action is a single bracketed directive, `verb[argument]`,
//! with the verbs `search` and `click`. This module is the only place that
//! builds or reads those strings; everything else passes [`Action`] values.
//!
//! ```rust
//! use shopping_assistant_core::Action;
//!
//! let action = Action::search("blue t-shirt");
//! assert_eq!(action.encode(), "search[blue t-shirt]");
//! assert_eq!(Action::parse("click[Buy Now]").ok(), Some(Action::click("Buy Now")));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Navigation control that returns to the search page.
pub const BACK_TO_SEARCH: &str = "Back to Search";
/// Navigation control for the previous page.
pub const PREV_PAGE: &str = "< Prev";
/// Navigation control for the next results page.
pub const NEXT_PAGE: &str = "Next >";
/// Item page control showing the long description.
pub const DESCRIPTION: &str = "Description";
/// Item page control showing the bullet-point features.
pub const FEATURES: &str = "Features";
/// Item page control showing customer reviews.
pub const REVIEWS: &str = "Reviews";
/// Item page control that completes the purchase.
pub const BUY_NOW: &str = "Buy Now";

const SEARCH_VERB: &str = "search";
const CLICK_VERB: &str = "click";

/// Errors produced while decoding an action string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The string is not of the form `verb[argument]`.
    #[error("malformed action: {0}")]
    Malformed(String),

    /// The verb is neither `search` nor `click`.
    #[error("unknown action verb: {0}")]
    UnknownVerb(String),
}

/// A single step the agent asks the shop to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "argument", rename_all = "snake_case")]
pub enum Action {
    /// Run a keyword search. Keywords must already be in the catalogue's language.
    Search(String),
    /// Click a control by its visible name (a catalogue key, a navigation
    /// label or an option value).
    Click(String),
}

impl Action {
    /// Build a search action.
    #[must_use]
    pub fn search(keywords: impl Into<String>) -> Self {
        Self::Search(keywords.into())
    }

    /// Build a click action.
    #[must_use]
    pub fn click(control: impl Into<String>) -> Self {
        Self::Click(control.into())
    }

    /// The verb used on the wire.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Search(_) => SEARCH_VERB,
            Self::Click(_) => CLICK_VERB,
        }
    }

    /// The raw argument (keywords or control name).
    #[must_use]
    pub fn argument(&self) -> &str {
        match self {
            Self::Search(arg) | Self::Click(arg) => arg,
        }
    }

    /// Encode the action as `verb[argument]`.
    ///
    /// The argument is passed through unescaped; the shop's own tokenizer is
    /// responsible for interpreting it.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}[{}]", self.verb(), self.argument())
    }

    /// Decode a `verb[argument]` string.
    ///
    /// The verb is matched case-insensitively. The argument is everything
    /// between the first `[` and the last `]`, so control names that contain
    /// brackets survive a round trip.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Malformed`] if the brackets are missing and
    /// [`ActionError::UnknownVerb`] for verbs other than `search` and `click`.
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let raw = raw.trim();
        let (Some(open), Some(close)) = (raw.find('['), raw.rfind(']')) else {
            return Err(ActionError::Malformed(raw.to_string()));
        };
        if close < open || close != raw.len() - 1 {
            return Err(ActionError::Malformed(raw.to_string()));
        }

        let verb = raw.get(..open).unwrap_or_default().trim().to_lowercase();
        let argument = raw.get(open + 1..close).unwrap_or_default().to_string();

        match verb.as_str() {
            SEARCH_VERB => Ok(Self::Search(argument)),
            CLICK_VERB => Ok(Self::Click(argument)),
            _ => Err(ActionError::UnknownVerb(verb)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.verb(), self.argument())
    }
}

/// Encode a search for `keywords`.
#[must_use]
pub fn encode_search(keywords: &str) -> String {
    Action::search(keywords).encode()
}

/// Encode a click on `control`.
#[must_use]
pub fn encode_click(control: &str) -> String {
    Action::click(control).encode()
}
