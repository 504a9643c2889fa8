//! Best-effort scraping of shop pages.
//!
//! [`parse`] turns the raw HTML of the current page (plus its URL) into
//! [`PageData`]. It has no side effects and never fails: every field falls
//! back to [`NOT_AVAILABLE`] (or to an empty list) on its own, so a page with
//! missing or malformed structure still yields whatever could be found.
//!
//! Two page shapes are recognised:
//!
//! - **Item page** - has an element with id `product-image`.
//! - **Results page** - has one or more `.product-link` elements, each inside
//!   a `div.item` container.
//!
//! Anything else is [`PageData::Other`].

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::types::{CatalogueKey, NOT_AVAILABLE, OptionGroup, ProductDetail, ProductSummary};

/// Marker in item page URLs; the catalogue key follows the host.
const ITEM_PAGE_PATH: &str = "/item_page/";
/// Index of the catalogue key in `url.split('/')`:
/// `["http:", "", "host", "item_page", KEY, ...]`.
const URL_KEY_INDEX: usize = 4;
const ITEM_CONTAINER_CLASS: &str = "item";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must be valid CSS")
}

static PRODUCT_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("#product-image"));
static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| selector(".product-link"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static H3: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static H4: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static P: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector("span.rating"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector("label"));
static HEADING_OR_OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| selector("h4, div.radio-toolbar"));

/// Structured content of a shop page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", content = "data", rename_all = "snake_case")]
pub enum PageData {
    /// A search results page, products in page (relevance) order.
    Results(Vec<ProductSummary>),
    /// A single product's item page.
    Detail(ProductDetail),
    /// Search page, sub pages, purchase confirmation, or unrecognised markup.
    Other,
}

impl PageData {
    /// Products listed on a results page; empty for other pages.
    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        match self {
            Self::Results(products) => products,
            _ => &[],
        }
    }

    /// The product shown on an item page.
    #[must_use]
    pub const fn detail(&self) -> Option<&ProductDetail> {
        match self {
            Self::Detail(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Parse a page into structured data.
#[must_use]
pub fn parse(html: &str, url: &str) -> PageData {
    let document = Html::parse_document(html);

    if let Some(image) = document.select(&PRODUCT_IMAGE).next() {
        return PageData::Detail(parse_detail(&document, image, url));
    }

    let products = parse_results(&document);
    if products.is_empty() {
        PageData::Other
    } else {
        PageData::Results(products)
    }
}

fn parse_results(document: &Html) -> Vec<ProductSummary> {
    document
        .select(&PRODUCT_LINK)
        .filter_map(|link| {
            let container = enclosing_item(link)?;
            Some(ProductSummary {
                id: CatalogueKey::new(text_of(link)),
                title: first_text(container, &H4),
                price: first_text(container, &P),
                rating: NOT_AVAILABLE.to_string(),
                image_url: container
                    .select(&IMG)
                    .find_map(|img| img.value().attr("src"))
                    .map(String::from),
            })
        })
        .collect()
}

/// Nearest ancestor `div.item` of a product link.
fn enclosing_item(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    link.ancestors().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "div"
            && el
                .value()
                .classes()
                .any(|class| class == ITEM_CONTAINER_CLASS)
    })
}

fn parse_detail(document: &Html, image: ElementRef<'_>, url: &str) -> ProductDetail {
    let root = document.root_element();
    ProductDetail {
        id: key_from_url(url),
        title: first_text(root, &H2),
        price: first_text(root, &H3),
        rating: first_text(root, &RATING),
        image_url: image.value().attr("src").map(String::from),
        options: parse_option_groups(document),
    }
}

/// Pair every `div.radio-toolbar` with the closest `h4` before it.
fn parse_option_groups(document: &Html) -> Vec<OptionGroup> {
    let mut groups = Vec::new();
    let mut heading: Option<String> = None;

    // Selection order is document order, so the last heading seen precedes
    // the current toolbar.
    for element in document.select(&HEADING_OR_OPTIONS) {
        if element.value().name() == "h4" {
            heading = Some(text_of(element).trim_end_matches(':').trim().to_string());
            continue;
        }

        let Some(name) = heading.as_ref().filter(|name| !name.is_empty()) else {
            continue;
        };
        let values: Vec<String> = element
            .select(&LABEL)
            .map(text_of)
            .filter(|value| !value.is_empty())
            .collect();
        if !values.is_empty() {
            groups.push(OptionGroup {
                name: name.clone(),
                values,
            });
        }
    }

    groups
}

fn key_from_url(url: &str) -> Option<CatalogueKey> {
    if !url.contains(ITEM_PAGE_PATH) {
        return None;
    }
    url.split('/')
        .nth(URL_KEY_INDEX)
        .and_then(|segment| segment.split(['?', '#']).next())
        .map(CatalogueKey::new)
        .filter(|key| !key.is_empty())
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Element text with runs of whitespace collapsed.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
