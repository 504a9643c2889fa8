//! Product catalogue loading.
//!
//! The catalogue is a JSON array of scraped product records. Records are
//! normalised into [`Product`] values on load: option names and values are
//! lowercased, prices are parsed into decimals and duplicate keys are dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopping_assistant_core::CatalogueKey;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Number of products loaded when nothing else is configured.
pub const DEFAULT_NUM_PRODUCTS: usize = 1000;

/// Catalogue file used for small runs.
pub const SMALL_CATALOGUE_FILE: &str = "items_shuffle_1000.json";

/// Catalogue file holding every scraped product.
pub const FULL_CATALOGUE_FILE: &str = "items_shuffle.json";

/// Largest product count served from the small file.
pub const SMALL_CATALOGUE_LIMIT: usize = 10_000;

/// Price shown for products whose listing carries none.
const FALLBACK_PRICE: Decimal = Decimal::ONE_HUNDRED;

/// Document-export tiers: product count and output directory name.
pub const EXPORT_TIERS: [(usize, &str); 4] = [
    (100, "resources_100"),
    (1_000, "resources_1k"),
    (10_000, "resources_10k"),
    (50_000, "resources_50k"),
];

#[allow(clippy::expect_used)]
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)").expect("valid price pattern")
});

/// Catalogue errors.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalogue {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalogue {0} contains no usable products")]
    Empty(PathBuf),

    #[error("failed to write documents: {0}")]
    Export(String),
}

/// Where the catalogue comes from and how much of it to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueConfig {
    pub data_dir: PathBuf,
    /// Product count; `0` loads the whole file.
    pub num_products: usize,
    /// Explicit catalogue file, bypassing size-based selection.
    pub file_override: Option<PathBuf>,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            num_products: DEFAULT_NUM_PRODUCTS,
            file_override: None,
        }
    }
}

impl CatalogueConfig {
    /// Pick the catalogue file for the configured product count.
    ///
    /// Counts up to [`SMALL_CATALOGUE_LIMIT`] are served from the small file.
    /// Larger runs use the full file, falling back to the small one when the
    /// full file is absent.
    #[must_use]
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(path) = &self.file_override {
            return path.clone();
        }

        let small = self.data_dir.join(SMALL_CATALOGUE_FILE);
        if self.num_products != 0 && self.num_products <= SMALL_CATALOGUE_LIMIT {
            return small;
        }

        let full = self.data_dir.join(FULL_CATALOGUE_FILE);
        if full.exists() {
            full
        } else {
            warn!(
                missing = %full.display(),
                fallback = %small.display(),
                "Full catalogue not found, using small catalogue"
            );
            small
        }
    }
}

/// A customer review attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Review {
    pub title: String,
    pub score: Option<String>,
    pub body: String,
}

/// A normalised catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub asin: CatalogueKey,
    pub title: String,
    pub description: String,
    pub bullet_points: Vec<String>,
    /// Lowest listed price.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Price as displayed on the item page, e.g. `$12.99` or `$5.00 to $8.00`.
    pub price_display: String,
    pub rating: Option<String>,
    pub main_image: Option<String>,
    /// Option groups keyed by lowercased name.
    pub options: IndexMap<String, Vec<String>>,
    pub reviews: Vec<Review>,
    pub category: Option<String>,
    pub query: Option<String>,
}

impl Product {
    /// Lowercased searchable text: title, description, first bullet and
    /// option text.
    #[must_use]
    pub fn contents(&self) -> String {
        let option_text = self
            .options
            .iter()
            .map(|(name, values)| format!("{name}: {}", values.join(", ")))
            .collect::<Vec<_>>()
            .join(", and ");

        [
            self.title.as_str(),
            self.description.as_str(),
            self.bullet_points.first().map_or("", String::as_str),
            option_text.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Find an option value of this product, ignoring case.
    ///
    /// Returns the option group name and the canonical value.
    #[must_use]
    pub fn find_option(&self, value: &str) -> Option<(&str, &str)> {
        let wanted = value.trim().to_lowercase();
        self.options.iter().find_map(|(name, values)| {
            values
                .iter()
                .find(|candidate| **candidate == wanted)
                .map(|candidate| (name.as_str(), candidate.as_str()))
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawOption {
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReview {
    title: Option<String>,
    score: Option<serde_json::Value>,
    body: Option<String>,
}

impl From<RawReview> for Review {
    fn from(raw: RawReview) -> Self {
        Self {
            title: raw.title.unwrap_or_default().trim().to_string(),
            score: raw.score.as_ref().and_then(rating_text),
            body: raw.body.unwrap_or_default().trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProductRecord {
    asin: Option<String>,
    name: Option<String>,
    full_description: Option<String>,
    small_description: Option<Vec<String>>,
    pricing: Option<String>,
    images: Option<Vec<String>>,
    average_rating: Option<serde_json::Value>,
    customization_options: Option<IndexMap<String, Option<Vec<RawOption>>>>,
    category: Option<String>,
    query: Option<String>,
    reviews: Option<Vec<RawReview>>,
}

impl RawProductRecord {
    fn into_product(self) -> Option<Product> {
        let asin = CatalogueKey::new(self.asin?);
        if asin.is_empty() {
            return None;
        }

        let (price, price_display) = parse_pricing(self.pricing.as_deref());

        let options = self
            .customization_options
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, values)| {
                let values: Vec<String> = values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|option| normalise_option(&option.value))
                    .filter(|value| !value.is_empty())
                    .collect();
                (!values.is_empty()).then(|| (normalise_option(&name), values))
            })
            .collect();

        Some(Product {
            asin,
            title: self.name.unwrap_or_default().trim().to_string(),
            description: self.full_description.unwrap_or_default().trim().to_string(),
            bullet_points: self.small_description.unwrap_or_default(),
            price,
            price_display,
            rating: self.average_rating.as_ref().and_then(rating_text),
            main_image: self.images.and_then(|images| images.into_iter().find(|i| !i.is_empty())),
            options,
            reviews: self
                .reviews
                .unwrap_or_default()
                .into_iter()
                .map(Review::from)
                .collect(),
            category: self.category,
            query: self.query,
        })
    }
}

fn normalise_option(raw: &str) -> String {
    raw.trim().to_lowercase().replace('/', " | ")
}

fn rating_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::String(text) if !text.trim().is_empty() => {
            Some(text.trim().to_string())
        }
        _ => None,
    }
}

/// Parse a listing price such as `$12.99` or `$5.00 - $8.00`.
///
/// Returns the lowest price and the display text. Listings without a price
/// get a fixed fallback.
fn parse_pricing(raw: Option<&str>) -> (Decimal, String) {
    let amounts: Vec<Decimal> = raw
        .map(|text| {
            PRICE_PATTERN
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .filter_map(|m| Decimal::from_str(&m.as_str().replace(',', "")).ok())
                .collect()
        })
        .unwrap_or_default();

    match amounts.as_slice() {
        [] => (FALLBACK_PRICE, format!("${FALLBACK_PRICE:.2}")),
        [single] => (*single, format!("${single:.2}")),
        [low, high, ..] => {
            let (low, high) = if low <= high { (*low, *high) } else { (*high, *low) };
            (low, format!("${low:.2} to ${high:.2}"))
        }
    }
}

/// The loaded product catalogue.
#[derive(Debug, Default)]
pub struct Catalogue {
    products: Vec<Product>,
    by_key: HashMap<String, usize>,
}

impl Catalogue {
    /// Build a catalogue from already-normalised products.
    ///
    /// Later duplicates of a key are dropped.
    #[must_use]
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalogue = Self::default();
        for product in products {
            catalogue.insert(product);
        }
        catalogue
    }

    fn insert(&mut self, product: Product) -> bool {
        let key = product.asin.as_str().to_lowercase();
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.by_key.insert(key, self.products.len());
        self.products.push(product);
        true
    }

    /// Load the catalogue described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it holds
    /// no product with a key.
    #[instrument(skip_all, fields(num_products = config.num_products))]
    pub fn load(config: &CatalogueConfig) -> Result<Self, CatalogueError> {
        let path = config.resolve_path();
        Self::load_file(&path, config.num_products)
    }

    /// Load at most `limit` products from `path` (`0` for no limit).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it holds
    /// no product with a key.
    pub fn load_file(path: &Path, limit: usize) -> Result<Self, CatalogueError> {
        info!(path = %path.display(), "Loading catalogue");
        let file = File::open(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<RawProductRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CatalogueError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let total = records.len();
        let mut catalogue = Self::default();
        let mut skipped = 0usize;
        for record in records {
            if limit != 0 && catalogue.len() >= limit {
                break;
            }
            let Some(product) = record.into_product() else {
                skipped += 1;
                continue;
            };
            if !catalogue.insert(product) {
                skipped += 1;
            }
        }

        if catalogue.is_empty() {
            return Err(CatalogueError::Empty(path.to_path_buf()));
        }
        if skipped > 0 {
            warn!(skipped, "Skipped records without a key or with a duplicate key");
        }
        info!(total, loaded = catalogue.len(), "Catalogue loaded");
        Ok(catalogue)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by key, ignoring case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Product> {
        self.by_key
            .get(&key.trim().to_lowercase())
            .and_then(|&index| self.products.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }
}

/// One line of the exported `documents.jsonl`.
#[derive(Debug, Serialize)]
pub struct SearchDocument<'a> {
    pub id: &'a str,
    pub contents: String,
    pub product: &'a Product,
}

impl<'a> From<&'a Product> for SearchDocument<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: product.asin.as_str(),
            contents: product.contents(),
            product,
        }
    }
}

/// Write `documents.jsonl` for every export tier the catalogue can fill.
///
/// Returns the path and document count of each written file. Tiers larger
/// than the catalogue are skipped.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
#[instrument(skip(catalogue), fields(products = catalogue.len()))]
pub fn export_documents(
    catalogue: &Catalogue,
    out_dir: &Path,
) -> Result<Vec<(PathBuf, usize)>, CatalogueError> {
    let mut written = Vec::with_capacity(EXPORT_TIERS.len());
    for (tier, name) in EXPORT_TIERS {
        if tier > catalogue.len() {
            debug!(tier = name, products = catalogue.len(), "Catalogue too small for tier");
            continue;
        }
        let dir = out_dir.join(name);
        std::fs::create_dir_all(&dir)
            .map_err(|e| CatalogueError::Export(format!("{}: {e}", dir.display())))?;
        let path = dir.join("documents.jsonl");
        let count = write_documents(catalogue.iter().take(tier), &path)?;
        info!(tier = name, count, "Wrote search documents");
        written.push((path, count));
    }
    Ok(written)
}

fn write_documents<'a>(
    products: impl Iterator<Item = &'a Product>,
    path: &Path,
) -> Result<usize, CatalogueError> {
    let export_error = |e: &dyn std::fmt::Display| {
        CatalogueError::Export(format!("{}: {e}", path.display()))
    };

    let file = File::create(path).map_err(|e| export_error(&e))?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;
    for product in products {
        serde_json::to_writer(&mut writer, &SearchDocument::from(product))
            .map_err(|e| export_error(&e))?;
        writer.write_all(b"\n").map_err(|e| export_error(&e))?;
        count += 1;
    }
    writer.flush().map_err(|e| export_error(&e))?;
    Ok(count)
}
