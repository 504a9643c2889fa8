//! Shopping Assistant Core - Shared types library.
//!
//! This crate provides the pieces of the assistant/webshop interaction loop
//! that do not touch I/O. It is shared by:
//! - `webshop` - Catalogue-backed shop simulation (implements [`Environment`])
//! - `assistant` - Sessions, tools and the conversation loop
//! - `cli` - Command-line tools for browsing, conversion and evaluation
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no
//! filesystem, no network, no logging. Every function here can be tested
//! against fixed strings.
//!
//! # Modules
//!
//! - [`types`] - Catalogue keys, product summaries and product details
//! - [`action`] - The `verb[argument]` action codec
//! - [`page`] - Best-effort HTML scraping into [`PageData`]
//! - [`observation`] - Builds the text handed back to the agent
//! - [`environment`] - The contract a simulated shop must satisfy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod action;
pub mod environment;
pub mod observation;
pub mod page;
pub mod types;

pub use action::{Action, ActionError};
pub use environment::{Environment, EnvironmentError, EnvironmentState, StepOutcome};
pub use observation::{RESET_MARKER, compose};
pub use page::{PageData, parse};
pub use types::*;
