//! Catalogue keys.
//!
//! The shop identifies every product by an opaque string (an ASIN in the
//! WebShop dataset). Wrapping it keeps product ids from being confused with
//! the free-form control names that travel next to them.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Opaque catalogue identifier of a product (ASIN).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogueKey(String);

impl CatalogueKey {
    /// Create a key from any string-like value, trimming surrounding whitespace.
    #[must_use]
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_string())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ::core::fmt::Display for CatalogueKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogueKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CatalogueKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl AsRef<str> for CatalogueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CatalogueKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
