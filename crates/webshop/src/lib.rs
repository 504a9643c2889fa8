//! Shopping Assistant Webshop - catalogue-backed shop simulation.
//!
//! A [`WebShop`] serves search, results, item, item sub and purchase pages
//! rendered from a product catalogue, and implements the core
//! [`Environment`](shopping_assistant_core::Environment) contract so a
//! session can drive it with `search[...]` and `click[...]` actions.
//!
//! The catalogue and its search index are loaded once into a [`ShopData`]
//! that any number of shops share through an `Arc`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalogue;
pub mod pages;
pub mod reward;
pub mod search;
pub mod shop;

pub use catalogue::{Catalogue, CatalogueConfig, CatalogueError, Product, export_documents};
pub use pages::RenderError;
pub use search::{SearchError, SearchIndex};
pub use shop::{DEFAULT_BASE_URL, ShopData, ShopError, WebShop, normalise_base_url};
