//! Core types for the shopping assistant.
//!
//! This module provides type-safe wrappers for the values scraped from shop pages.

pub mod key;
pub mod product;

pub use key::CatalogueKey;
pub use product::{NOT_AVAILABLE, OptionGroup, ProductDetail, ProductSummary};
