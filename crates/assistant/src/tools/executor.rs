use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::artifacts::{Artifact, ArtifactStore, HTML_ARTIFACT};
use crate::payment::PaymentDisplay;
use crate::session::{Observation, Session, SessionError};

use super::{CLICK, SEARCH, SHOW_PAYMENT_QR};

/// Errors reported to the model as failed tool calls.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required field '{field}' for tool {tool}")]
    MissingField { tool: &'static str, field: &'static str },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Runs tool calls against one session.
pub struct ToolExecutor<'a, A> {
    session: &'a mut Session,
    artifacts: &'a A,
    payment: &'a PaymentDisplay,
}

impl<'a, A: ArtifactStore> ToolExecutor<'a, A> {
    #[must_use]
    pub const fn new(
        session: &'a mut Session,
        artifacts: &'a A,
        payment: &'a PaymentDisplay,
    ) -> Self {
        Self {
            session,
            artifacts,
            payment,
        }
    }

    /// Execute the tool `name` with JSON `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown, a required field is missing,
    /// or the session rejects the action.
    #[instrument(skip(self, input), fields(session = %self.session.id()))]
    pub async fn execute(&mut self, name: &str, input: &Value) -> Result<String, ToolError> {
        match name {
            SEARCH => {
                let keywords = required_str(input, SEARCH, "keywords")?;
                let observation = self.session.search(keywords)?;
                Ok(self.publish(observation).await)
            }
            CLICK => {
                let button = required_str(input, CLICK, "button_name")?;
                let observation = self.session.click(button)?;
                Ok(self.publish(observation).await)
            }
            SHOW_PAYMENT_QR => Ok(self.payment.show(self.artifacts).await),
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    /// Save the current page as the `html` artifact and return the page text.
    async fn publish(&self, observation: Observation) -> String {
        let state = self.session.state();
        info!(url = %state.url, reward = observation.reward, done = observation.done, "Page reached");

        if let Err(e) = self
            .artifacts
            .save(HTML_ARTIFACT, Artifact::html(&state.html))
            .await
        {
            warn!(error = %e, "Failed to save page artifact");
        }
        observation.text
    }
}

fn required_str<'v>(
    input: &'v Value,
    tool: &'static str,
    field: &'static str,
) -> Result<&'v str, ToolError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingField { tool, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{InMemoryArtifacts, PAYMENT_QR_ARTIFACT};
    use indexmap::IndexMap;
    use serde_json::json;
    use shopping_assistant_core::CatalogueKey;
    use shopping_assistant_webshop::{Catalogue, Product, ShopData};
    use std::sync::Arc;

    fn mug() -> Product {
        Product {
            asin: CatalogueKey::new("B0MUG"),
            title: "Red Ceramic Mug".to_string(),
            description: "A red mug".to_string(),
            bullet_points: Vec::new(),
            price: rust_decimal::Decimal::ONE,
            price_display: "$1.00".to_string(),
            rating: None,
            main_image: None,
            options: IndexMap::new(),
            reviews: Vec::new(),
            category: None,
            query: None,
        }
    }

    fn session() -> Session {
        let data = ShopData::from_catalogue(Catalogue::from_products([mug()])).expect("data");
        Session::from_data(Arc::new(data), "http://shop.test").expect("session")
    }

    #[tokio::test]
    async fn test_search_publishes_page() {
        let mut session = session();
        let artifacts = InMemoryArtifacts::new();
        let payment = PaymentDisplay::default();
        let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

        let text = executor
            .execute(SEARCH, &json!({"keywords": "red mug"}))
            .await
            .expect("search");

        assert!(text.starts_with("Back to Search"));
        assert!(text.contains("Product ID (ASIN): B0MUG"));
        let page = artifacts.latest(HTML_ARTIFACT).expect("html artifact");
        assert_eq!(page.mime_type, "text/html");
    }

    #[tokio::test]
    async fn test_missing_field() {
        let mut session = session();
        let artifacts = InMemoryArtifacts::new();
        let payment = PaymentDisplay::default();
        let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

        let result = executor.execute(CLICK, &json!({})).await;

        assert!(matches!(
            result,
            Err(ToolError::MissingField { field: "button_name", .. })
        ));
        assert_eq!(artifacts.version_count(HTML_ARTIFACT), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mut session = session();
        let artifacts = InMemoryArtifacts::new();
        let payment = PaymentDisplay::default();
        let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

        let result = executor.execute("checkout", &json!({})).await;

        assert!(matches!(result, Err(ToolError::UnknownTool(name)) if name == "checkout"));
    }

    #[tokio::test]
    async fn test_payment_qr_missing_is_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session();
        let artifacts = InMemoryArtifacts::new();
        let payment = PaymentDisplay::new(dir.path().join("qr1.jpg"));
        let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

        let text = executor
            .execute(SHOW_PAYMENT_QR, &json!({}))
            .await
            .expect("tool result");

        assert!(text.contains("not found"));
        assert_eq!(artifacts.version_count(PAYMENT_QR_ARTIFACT), 0);
    }
}
