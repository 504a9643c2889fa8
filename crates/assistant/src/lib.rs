//! Shopping Assistant - conversational shopping over a simulated webshop.
//!
//! A customer talks to Claude; Claude shops on their behalf through three
//! tools: `search`, `click` and `show_payment_qr`. Every tool call runs
//! against a [`Session`](session::Session) that owns one shop episode.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`session`] - Shop episodes and composed observations
//! - [`artifacts`] - Page snapshots and images handed to the UI
//! - [`payment`] - Payment QR display
//! - [`tools`] - Tool definitions and executor
//! - [`claude`] - Anthropic Messages API client
//! - [`services`] - The conversation loop
//! - [`eval`] - Scenario replay and scoring
//! - [`telemetry`] - Tracing and Sentry setup for the binaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod artifacts;
pub mod claude;
pub mod config;
pub mod eval;
pub mod payment;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod tools;

pub use artifacts::{Artifact, ArtifactError, ArtifactStore, DirectoryArtifacts, InMemoryArtifacts};
pub use config::{AssistantConfig, ConfigError};
pub use payment::{PaymentDisplay, PaymentError};
pub use services::{Assistant, ChatError, Turn};
pub use session::{Observation, Session, SessionError};
