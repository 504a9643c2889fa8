//! HTML page rendering.
//!
//! Every page starts with the shop header (brand and goal instruction). The
//! markup carries the hooks the assistant's scraper relies on: result
//! entries are `div.item` blocks containing a `.product-link`, and item pages
//! carry `#product-image`, pairs of `h4` headings and `div.radio-toolbar`
//! option lists, and a `span.rating` when the product has a rating.

use std::sync::LazyLock;

use askama::Template;
use indexmap::IndexMap;
use scraper::{Html, Selector};
use shopping_assistant_core::action;
use thiserror::Error;

use crate::catalogue::Product;

/// Separator between text nodes in the textual observation.
pub const TEXT_SEPARATOR: &str = " [SEP] ";

/// Page rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to serialize selected options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Informational sub page of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Description,
    Features,
    Reviews,
}

impl Section {
    /// The control label that opens this section.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Description => action::DESCRIPTION,
            Self::Features => action::FEATURES,
            Self::Reviews => action::REVIEWS,
        }
    }

    const fn id(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Features => "features",
            Self::Reviews => "reviews",
        }
    }

    /// Match a clicked control against the section labels, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Description, Self::Features, Self::Reviews]
            .into_iter()
            .find(|section| section.label().eq_ignore_ascii_case(label))
    }
}

/// Values shared by every page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub base_url: &'a str,
    pub instruction: &'a str,
}

#[derive(Template)]
#[template(path = "search_page.html")]
struct SearchPage<'a> {
    base_url: &'a str,
    instruction: &'a str,
}

struct ResultItem<'a> {
    asin: &'a str,
    title: &'a str,
    price: &'a str,
    image: Option<&'a str>,
    url: String,
}

#[derive(Template)]
#[template(path = "results_page.html")]
struct ResultsPage<'a> {
    base_url: &'a str,
    instruction: &'a str,
    keywords: &'a str,
    page: usize,
    total: usize,
    has_prev: bool,
    has_next: bool,
    items: Vec<ResultItem<'a>>,
}

struct Choice<'a> {
    id: String,
    value: &'a str,
    checked: bool,
}

struct ChoiceGroup<'a> {
    name: &'a str,
    choices: Vec<Choice<'a>>,
}

#[derive(Template)]
#[template(path = "item_page.html")]
struct ItemPage<'a> {
    base_url: &'a str,
    instruction: &'a str,
    asin: &'a str,
    title: &'a str,
    price: &'a str,
    rating: Option<&'a str>,
    image: Option<&'a str>,
    options: Vec<ChoiceGroup<'a>>,
}

#[derive(Template)]
#[template(path = "item_sub_page.html")]
struct SubPage<'a> {
    base_url: &'a str,
    instruction: &'a str,
    section: &'a str,
    section_id: &'a str,
    lines: Vec<String>,
}

#[derive(Template)]
#[template(path = "done_page.html")]
struct DonePage<'a> {
    base_url: &'a str,
    instruction: &'a str,
    asin: &'a str,
    options: String,
    reward: String,
}

/// One results page worth of products.
#[derive(Debug, Clone, Copy)]
pub struct ResultsView<'a> {
    pub keywords: &'a str,
    /// 1-based page number.
    pub page: usize,
    pub total: usize,
    pub has_next: bool,
    /// Products with the URL of their item page.
    pub products: &'a [(&'a Product, String)],
}

/// Render the search page.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn search_page(ctx: PageContext<'_>) -> Result<String, RenderError> {
    SearchPage {
        base_url: ctx.base_url,
        instruction: ctx.instruction,
    }
    .render()
    .map_err(RenderError::from)
}

/// Render a page of search results.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn results_page(ctx: PageContext<'_>, view: ResultsView<'_>) -> Result<String, RenderError> {
    ResultsPage {
        base_url: ctx.base_url,
        instruction: ctx.instruction,
        keywords: view.keywords,
        page: view.page,
        total: view.total,
        has_prev: view.page > 1,
        has_next: view.has_next,
        items: view
            .products
            .iter()
            .map(|(product, url)| ResultItem {
                asin: product.asin.as_str(),
                title: &product.title,
                price: &product.price_display,
                image: product.main_image.as_deref(),
                url: url.clone(),
            })
            .collect(),
    }
    .render()
    .map_err(RenderError::from)
}

/// Render an item page with the current option selection.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn item_page(
    ctx: PageContext<'_>,
    product: &Product,
    selected: &IndexMap<String, String>,
) -> Result<String, RenderError> {
    let options = product
        .options
        .iter()
        .enumerate()
        .map(|(group_index, (name, values))| ChoiceGroup {
            name,
            choices: values
                .iter()
                .enumerate()
                .map(|(value_index, value)| Choice {
                    id: format!("option-{group_index}-{value_index}"),
                    value,
                    checked: selected.get(name) == Some(value),
                })
                .collect(),
        })
        .collect();

    ItemPage {
        base_url: ctx.base_url,
        instruction: ctx.instruction,
        asin: product.asin.as_str(),
        title: &product.title,
        price: &product.price_display,
        rating: product.rating.as_deref(),
        image: product.main_image.as_deref(),
        options,
    }
    .render()
    .map_err(RenderError::from)
}

/// Render a description, features or reviews page.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn sub_page(
    ctx: PageContext<'_>,
    product: &Product,
    section: Section,
) -> Result<String, RenderError> {
    let lines = match section {
        Section::Description => vec![product.description.clone()],
        Section::Features => product.bullet_points.clone(),
        Section::Reviews => product
            .reviews
            .iter()
            .flat_map(|review| {
                [
                    review.title.clone(),
                    review
                        .score
                        .as_ref()
                        .map(|score| format!("Score: {score}"))
                        .unwrap_or_default(),
                    review.body.clone(),
                ]
            })
            .collect(),
    };

    SubPage {
        base_url: ctx.base_url,
        instruction: ctx.instruction,
        section: section.label(),
        section_id: section.id(),
        lines: lines.into_iter().filter(|line| !line.trim().is_empty()).collect(),
    }
    .render()
    .map_err(RenderError::from)
}

/// Render the purchase confirmation.
///
/// # Errors
///
/// Returns an error if the selection cannot be serialized or the template
/// fails to render.
pub fn done_page(
    ctx: PageContext<'_>,
    asin: &str,
    selected: &IndexMap<String, String>,
    reward: f64,
) -> Result<String, RenderError> {
    let options = serde_json::to_string(selected)?;
    DonePage {
        base_url: ctx.base_url,
        instruction: ctx.instruction,
        asin,
        options,
        reward: format!("{reward:.2}"),
    }
    .render()
    .map_err(RenderError::from)
}

#[allow(clippy::expect_used)]
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("static selector must be valid CSS"));

/// Textual rendering of a page: the body's text nodes joined by
/// [`TEXT_SEPARATOR`].
#[must_use]
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Some(body) = document.select(&BODY).next() else {
        return String::new();
    };
    body.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}
