//! Shopping sessions.
//!
//! A [`Session`] owns one simulated shop and turns each [`Action`] into a
//! composed [`Observation`]: it encodes the action, steps the shop, parses
//! the resulting page and builds the text handed back to the model. Methods
//! take `&mut self`, so a session runs one action at a time.

use std::sync::Arc;

use serde::Serialize;
use shopping_assistant_core::{
    Action, Environment, EnvironmentError, EnvironmentState, PageData, compose, parse,
};
use shopping_assistant_webshop::{CatalogueConfig, ShopData, ShopError, WebShop};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open shop: {0}")]
    Open(#[from] ShopError),

    #[error("shop step failed: {0}")]
    Step(#[from] EnvironmentError),
}

/// The page reached by an action, as text and as structured data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Page text with the product details block appended.
    pub text: String,
    pub page: PageData,
    pub reward: f64,
    pub done: bool,
}

/// One shopping episode.
pub struct Session {
    id: Uuid,
    env: Box<dyn Environment + Send + Sync>,
    steps: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("steps", &self.steps)
            .field("url", &self.env.state().url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session over any environment, resetting it to the search page.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot reset.
    pub fn new(mut env: Box<dyn Environment + Send + Sync>) -> Result<Self, SessionError> {
        env.reset()?;
        let id = Uuid::new_v4();
        debug!(%id, "Session started");
        Ok(Self { id, env, steps: 0 })
    }

    /// Load the catalogue described by `config` and start a session on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be loaded or the shop cannot
    /// render its start page.
    #[instrument(skip(config), fields(num_products = config.num_products))]
    pub fn open(config: &CatalogueConfig, base_url: &str) -> Result<Self, SessionError> {
        let data = ShopData::load(config)?;
        info!(products = data.catalogue().len(), "Catalogue loaded");
        Self::from_data(Arc::new(data), base_url)
    }

    /// Start a session on already loaded shop data.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a bare origin or the shop cannot
    /// render its start page.
    pub fn from_data(data: Arc<ShopData>, base_url: &str) -> Result<Self, SessionError> {
        Self::new(Box::new(WebShop::new(data).with_base_url(base_url)?))
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Actions performed since the session started.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// The page the shop is currently showing.
    #[must_use]
    pub fn state(&self) -> &EnvironmentState {
        self.env.state()
    }

    /// Perform one action and describe the page it leads to.
    ///
    /// A search also makes `"Find me {keywords}."` the instruction the shop
    /// scores purchases against.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Step`] if the shop rejects the action. The
    /// session stays usable and keeps its previous instruction.
    #[instrument(skip(self), fields(session = %self.id, action = %action))]
    pub fn perform(&mut self, action: &Action) -> Result<Observation, SessionError> {
        let previous = match action {
            Action::Search(keywords) => {
                let previous = self.env.instruction().to_string();
                self.env.set_instruction(&format!("Find me {keywords}."));
                Some(previous)
            }
            Action::Click(_) => None,
        };

        let outcome = match self.env.step(&action.encode()) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(previous) = previous {
                    self.env.set_instruction(&previous);
                }
                return Err(e.into());
            }
        };
        self.steps += 1;

        let state = self.env.state();
        let page = parse(&state.html, &state.url);
        let text = compose(&outcome.observation, &page);
        debug!(url = %state.url, products = page.products().len(), done = outcome.done, "Step complete");

        Ok(Observation {
            text,
            page,
            reward: outcome.reward,
            done: outcome.done,
        })
    }

    /// Search the catalogue.
    ///
    /// # Errors
    ///
    /// See [`Session::perform`].
    pub fn search(&mut self, keywords: &str) -> Result<Observation, SessionError> {
        self.perform(&Action::search(keywords))
    }

    /// Click a control on the current page.
    ///
    /// # Errors
    ///
    /// See [`Session::perform`].
    pub fn click(&mut self, control: &str) -> Result<Observation, SessionError> {
        self.perform(&Action::click(control))
    }
}
