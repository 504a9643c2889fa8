//! Products as they appear on shop pages.
//!
//! These are transient values: they are scraped from the HTML of the page the
//! shop just returned and are never stored.

use serde::{Deserialize, Serialize};

use super::CatalogueKey;

/// Placeholder used for any field that could not be found on the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// A product as listed on a search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Catalogue key shown on the product link.
    pub id: CatalogueKey,
    pub title: String,
    /// Display string, e.g. `$12.99` or `$10.00 to $20.00`.
    pub price: String,
    /// Results pages carry no rating, so this is usually [`NOT_AVAILABLE`].
    pub rating: String,
    pub image_url: Option<String>,
}

/// A named group of selectable values (e.g. `size: small, medium, large`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    /// Values in page order.
    pub values: Vec<String>,
}

/// A product as shown on its item page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    /// Taken from the page URL; `None` when the URL does not carry it.
    pub id: Option<CatalogueKey>,
    pub title: String,
    pub price: String,
    pub rating: String,
    pub image_url: Option<String>,
    pub options: Vec<OptionGroup>,
}

impl ProductDetail {
    /// Look up an option group by name (case-insensitive).
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionGroup> {
        self.options
            .iter()
            .find(|group| group.name.eq_ignore_ascii_case(name))
    }
}
