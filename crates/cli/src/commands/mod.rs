//! CLI command implementations.

pub mod browse;
pub mod convert;
pub mod eval;
