//! The webshop simulation.
//!
//! [`WebShop`] is a page state machine over a shared, read-only
//! [`ShopData`]. Each step decodes one `verb[argument]` action, moves to the
//! next page and renders it. Controls that the current page does not offer
//! leave the shop where it is.

use std::sync::Arc;

use indexmap::IndexMap;
use shopping_assistant_core::action::{BACK_TO_SEARCH, BUY_NOW, NEXT_PAGE, PREV_PAGE};
use shopping_assistant_core::{
    Action, CatalogueKey, Environment, EnvironmentError, EnvironmentState, StepOutcome,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::catalogue::{Catalogue, CatalogueConfig, CatalogueError, Product};
use crate::pages::{self, PageContext, RenderError, ResultsView, Section};
use crate::reward::purchase_reward;
use crate::search::{MAX_RESULTS, SearchError, SearchIndex};

/// Results shown per page.
pub const PAGE_SIZE: usize = 10;

/// Origin used in page URLs when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Errors raised while preparing the shop.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("invalid base URL {url}: {reason}")]
    BaseUrl { url: String, reason: &'static str },
}

/// Check that `base_url` is a bare `http(s)` origin and drop any trailing `/`.
///
/// Item page URLs carry the catalogue key at a fixed segment, so the origin
/// must not add a path of its own.
///
/// # Errors
///
/// Returns [`ShopError::BaseUrl`] for other schemes, a missing host, or a
/// path, query or fragment after the host.
pub fn normalise_base_url(base_url: &str) -> Result<String, ShopError> {
    let invalid = |reason| ShopError::BaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let trimmed = base_url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| invalid("must start with http:// or https://"))?;
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    if host.contains(['/', '?', '#']) {
        return Err(invalid("must be an origin without a path"));
    }
    Ok(trimmed.to_string())
}

/// Catalogue plus search index, shared by every shop instance.
#[derive(Debug)]
pub struct ShopData {
    catalogue: Catalogue,
    index: SearchIndex,
}

impl ShopData {
    /// Load the catalogue described by `config` and index it.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be loaded or indexed.
    pub fn load(config: &CatalogueConfig) -> Result<Self, ShopError> {
        Self::from_catalogue(Catalogue::load(config)?)
    }

    /// Index an already loaded catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be built.
    pub fn from_catalogue(catalogue: Catalogue) -> Result<Self, ShopError> {
        let index = SearchIndex::build(&catalogue)?;
        Ok(Self { catalogue, index })
    }

    #[must_use]
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Keys of the products matching `keywords`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query fails.
    pub fn search(&self, keywords: &str) -> Result<Vec<CatalogueKey>, SearchError> {
        Ok(self
            .index
            .search(keywords, MAX_RESULTS)?
            .into_iter()
            .map(|hit| hit.asin)
            .collect())
    }
}

/// Position within the current search results.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cursor {
    keywords: String,
    page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Search,
    Results(Cursor),
    Item {
        from: Cursor,
        asin: CatalogueKey,
    },
    Sub {
        from: Cursor,
        asin: CatalogueKey,
        section: Section,
    },
    Done {
        asin: CatalogueKey,
    },
}

/// What a click does on the current page.
enum Transition {
    Goto(Location),
    /// Open an item from the results, starting with no options selected.
    Open(Location),
    Select { group: String, value: String },
    Buy(CatalogueKey),
    Unavailable,
}

/// A single shopping episode over shared catalogue data.
pub struct WebShop {
    data: Arc<ShopData>,
    base_url: String,
    instruction: String,
    location: Location,
    hits: Vec<CatalogueKey>,
    selected: IndexMap<String, String>,
    state: EnvironmentState,
}

impl std::fmt::Debug for WebShop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebShop")
            .field("base_url", &self.base_url)
            .field("instruction", &self.instruction)
            .field("location", &self.location)
            .field("hits", &self.hits.len())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

fn same_control(control: &str, label: &str) -> bool {
    control.trim().eq_ignore_ascii_case(label)
}

impl WebShop {
    /// Create a shop on the search page. Call [`Environment::reset`] to
    /// render it.
    #[must_use]
    pub fn new(data: Arc<ShopData>) -> Self {
        Self {
            data,
            base_url: DEFAULT_BASE_URL.to_string(),
            instruction: String::new(),
            location: Location::Search,
            hits: Vec::new(),
            selected: IndexMap::new(),
            state: EnvironmentState::default(),
        }
    }

    /// Use `base_url` (an origin such as `http://localhost:3000`) in page URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a bare origin; see
    /// [`normalise_base_url`].
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ShopError> {
        self.base_url = normalise_base_url(base_url)?;
        Ok(self)
    }

    /// Options selected on the current item.
    #[must_use]
    pub const fn selected_options(&self) -> &IndexMap<String, String> {
        &self.selected
    }

    fn product(&self, asin: &CatalogueKey) -> Result<&Product, EnvironmentError> {
        self.data
            .catalogue
            .get(asin.as_str())
            .ok_or_else(|| EnvironmentError::Simulation(format!("unknown product {asin}")))
    }

    fn page_hits(&self, page: usize) -> &[CatalogueKey] {
        let start = page.saturating_sub(1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.hits.len());
        self.hits.get(start..end).unwrap_or_default()
    }

    fn has_next(&self, page: usize) -> bool {
        page * PAGE_SIZE < self.hits.len()
    }

    fn results_url(&self, cursor: &Cursor) -> String {
        format!(
            "{}/search_results/{}/{}",
            self.base_url,
            urlencoding::encode(&cursor.keywords),
            cursor.page
        )
    }

    fn item_url(&self, asin: &CatalogueKey, cursor: &Cursor) -> String {
        format!(
            "{}/item_page/{asin}/{}/{}",
            self.base_url,
            urlencoding::encode(&cursor.keywords),
            cursor.page
        )
    }

    /// Render the current location into `(html, url)`.
    fn render(&self, reward: f64) -> Result<(String, String), EnvironmentError> {
        let ctx = PageContext {
            base_url: &self.base_url,
            instruction: &self.instruction,
        };
        let render_error = |e: RenderError| EnvironmentError::Render(e.to_string());

        match &self.location {
            Location::Search => Ok((
                pages::search_page(ctx).map_err(render_error)?,
                format!("{}/index", self.base_url),
            )),
            Location::Results(cursor) => {
                let products = self
                    .page_hits(cursor.page)
                    .iter()
                    .map(|asin| Ok((self.product(asin)?, self.item_url(asin, cursor))))
                    .collect::<Result<Vec<_>, EnvironmentError>>()?;
                let view = ResultsView {
                    keywords: &cursor.keywords,
                    page: cursor.page,
                    total: self.hits.len(),
                    has_next: self.has_next(cursor.page),
                    products: &products,
                };
                Ok((
                    pages::results_page(ctx, view).map_err(render_error)?,
                    self.results_url(cursor),
                ))
            }
            Location::Item { from, asin } => Ok((
                pages::item_page(ctx, self.product(asin)?, &self.selected)
                    .map_err(render_error)?,
                self.item_url(asin, from),
            )),
            Location::Sub {
                from,
                asin,
                section,
            } => Ok((
                pages::sub_page(ctx, self.product(asin)?, *section).map_err(render_error)?,
                format!(
                    "{}/{}",
                    self.item_url(asin, from)
                        .replacen("/item_page/", "/item_sub_page/", 1),
                    section.label().to_lowercase()
                ),
            )),
            Location::Done { asin } => Ok((
                pages::done_page(ctx, asin.as_str(), &self.selected, reward)
                    .map_err(render_error)?,
                format!("{}/done/{asin}", self.base_url),
            )),
        }
    }

    /// Move to `location` and refresh the visible state.
    fn show(&mut self, location: Location, reward: f64) -> Result<StepOutcome, EnvironmentError> {
        let previous = std::mem::replace(&mut self.location, location);
        match self.render(reward) {
            Ok((html, url)) => {
                self.state = EnvironmentState {
                    observation: pages::page_text(&html),
                    html,
                    url,
                    done: matches!(self.location, Location::Done { .. }),
                    reward,
                };
                Ok(StepOutcome::from(&self.state))
            }
            Err(e) => {
                self.location = previous;
                Err(e)
            }
        }
    }

    fn search(&mut self, keywords: &str) -> Result<StepOutcome, EnvironmentError> {
        let keywords = keywords.trim().to_lowercase();
        self.hits = self
            .data
            .search(&keywords)
            .map_err(|e| EnvironmentError::Search(e.to_string()))?;
        self.selected.clear();
        info!(keywords = %keywords, hits = self.hits.len(), "Search");
        self.show(Location::Results(Cursor { keywords, page: 1 }), 0.0)
    }

    fn transition(&self, control: &str) -> Result<Transition, EnvironmentError> {
        let transition = match &self.location {
            Location::Search | Location::Done { .. } => Transition::Unavailable,
            Location::Results(cursor) => {
                if same_control(control, BACK_TO_SEARCH) {
                    Transition::Goto(Location::Search)
                } else if same_control(control, NEXT_PAGE) && self.has_next(cursor.page) {
                    Transition::Goto(Location::Results(Cursor {
                        keywords: cursor.keywords.clone(),
                        page: cursor.page + 1,
                    }))
                } else if same_control(control, PREV_PAGE) && cursor.page > 1 {
                    Transition::Goto(Location::Results(Cursor {
                        keywords: cursor.keywords.clone(),
                        page: cursor.page - 1,
                    }))
                } else {
                    self.page_hits(cursor.page)
                        .iter()
                        .find(|asin| same_control(control, asin.as_str()))
                        .map_or(Transition::Unavailable, |asin| {
                            Transition::Open(Location::Item {
                                from: cursor.clone(),
                                asin: asin.clone(),
                            })
                        })
                }
            }
            Location::Item { from, asin } => {
                if same_control(control, BACK_TO_SEARCH) {
                    Transition::Goto(Location::Search)
                } else if same_control(control, PREV_PAGE) {
                    Transition::Goto(Location::Results(from.clone()))
                } else if same_control(control, BUY_NOW) {
                    Transition::Buy(asin.clone())
                } else if let Some((group, value)) = self.product(asin)?.find_option(control) {
                    // Option values take precedence over section labels.
                    Transition::Select {
                        group: group.to_string(),
                        value: value.to_string(),
                    }
                } else {
                    Section::from_label(control.trim()).map_or(Transition::Unavailable, |section| {
                        Transition::Goto(Location::Sub {
                            from: from.clone(),
                            asin: asin.clone(),
                            section,
                        })
                    })
                }
            }
            Location::Sub { from, asin, .. } => {
                if same_control(control, BACK_TO_SEARCH) {
                    Transition::Goto(Location::Search)
                } else if same_control(control, PREV_PAGE) {
                    Transition::Goto(Location::Item {
                        from: from.clone(),
                        asin: asin.clone(),
                    })
                } else {
                    Transition::Unavailable
                }
            }
        };
        Ok(transition)
    }

    fn click(&mut self, control: &str) -> Result<StepOutcome, EnvironmentError> {
        match self.transition(control)? {
            Transition::Goto(location) => {
                if location == Location::Search {
                    self.hits.clear();
                    self.selected.clear();
                }
                self.show(location, 0.0)
            }
            Transition::Open(location) => {
                self.selected.clear();
                self.show(location, 0.0)
            }
            Transition::Select { group, value } => {
                debug!(group = %group, value = %value, "Option selected");
                self.selected.insert(group, value);
                let location = self.location.clone();
                self.show(location, 0.0)
            }
            Transition::Buy(asin) => {
                let reward = purchase_reward(&self.instruction, self.product(&asin)?, &self.selected);
                info!(asin = %asin, reward, "Purchase complete");
                self.show(Location::Done { asin }, reward)
            }
            Transition::Unavailable => {
                debug!(control, "Control not available on this page");
                self.state.reward = 0.0;
                Ok(StepOutcome::from(&self.state))
            }
        }
    }
}

impl Environment for WebShop {
    fn reset(&mut self) -> Result<StepOutcome, EnvironmentError> {
        self.hits.clear();
        self.selected.clear();
        self.show(Location::Search, 0.0)
    }

    #[instrument(skip(self), fields(location = ?self.location))]
    fn step(&mut self, action: &str) -> Result<StepOutcome, EnvironmentError> {
        match Action::parse(action)? {
            Action::Search(keywords) => self.search(&keywords),
            Action::Click(control) => self.click(&control),
        }
    }

    fn state(&self) -> &EnvironmentState {
        &self.state
    }

    fn instruction(&self) -> &str {
        &self.instruction
    }

    fn set_instruction(&mut self, instruction: &str) {
        instruction.clone_into(&mut self.instruction);
    }
}
