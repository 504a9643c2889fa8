//! Shopping tools offered to the model.
//!
//! `search` and `click` drive the session and return the composed page
//! text; `show_payment_qr` publishes the payment QR image.

mod executor;

use serde_json::json;

use crate::claude::Tool;

pub use executor::{ToolError, ToolExecutor};

pub const SEARCH: &str = "search";
pub const CLICK: &str = "click";
pub const SHOW_PAYMENT_QR: &str = "show_payment_qr";

/// Definitions of every tool the assistant can call.
#[must_use]
pub fn shopping_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: SEARCH.to_string(),
            description: "Search the webshop for products. Returns the results page with each product's ID (ASIN), title, price and image URL. Keywords must be in English.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "keywords": {
                        "type": "string",
                        "description": "English search keywords, e.g. 'blue t-shirt'"
                    }
                },
                "required": ["keywords"]
            }),
        },
        Tool {
            name: CLICK.to_string(),
            description: "Click a button on the current page: a product ID, 'Back to Search', '< Prev', 'Next >', 'Description', 'Features', 'Reviews', an option value such as a size or colour, or 'Buy Now'. Returns the page reached.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "button_name": {
                        "type": "string",
                        "description": "Exact label of a button visible on the current page"
                    }
                },
                "required": ["button_name"]
            }),
        },
        Tool {
            name: SHOW_PAYMENT_QR.to_string(),
            description: "Show the payment QR code to the user. Call this right after 'Buy Now'.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}
