//! Builds the text returned to the agent after every action.
//!
//! The shop prepends the same header (brand and goal instruction) to every
//! page. Everything before the first [`RESET_MARKER`] is dropped, then the
//! structured fields scraped by [`crate::page::parse`] are appended one per
//! line.

use std::fmt::Write as _;

use crate::page::PageData;
use crate::types::{ProductDetail, ProductSummary};

/// Text that marks the start of the useful part of an observation.
pub const RESET_MARKER: &str = "Back to Search";

const DETAILS_HEADER: &str = "\n\n=== PRODUCT DETAILS ===\n";

/// Compose the agent-facing text for a page.
#[must_use]
pub fn compose(observation: &str, page: &PageData) -> String {
    let mut text = truncate_noise(observation).to_string();

    match page {
        PageData::Results(products) if !products.is_empty() => {
            text.push_str(DETAILS_HEADER);
            for (index, product) in products.iter().enumerate() {
                write_summary(&mut text, index + 1, product);
            }
        }
        PageData::Detail(detail) => {
            text.push_str(DETAILS_HEADER);
            write_detail(&mut text, detail);
        }
        PageData::Results(_) | PageData::Other => {}
    }

    text
}

/// Drop everything before the first [`RESET_MARKER`], if present.
#[must_use]
pub fn truncate_noise(observation: &str) -> &str {
    observation
        .find(RESET_MARKER)
        .and_then(|index| observation.get(index..))
        .unwrap_or(observation)
}

// Writing into a String cannot fail.
fn write_summary(out: &mut String, position: usize, product: &ProductSummary) {
    let _ = writeln!(out, "\n{position}. Product ID (ASIN): {}", product.id);
    let _ = writeln!(out, "   Title: {}", product.title);
    let _ = writeln!(out, "   Price: {}", product.price);
    if let Some(image_url) = &product.image_url {
        let _ = writeln!(out, "   Image URL: {image_url}");
    }
}

fn write_detail(out: &mut String, detail: &ProductDetail) {
    if let Some(id) = &detail.id {
        let _ = writeln!(out, "Product ID (ASIN): {id}");
    }
    let _ = writeln!(out, "Title: {}", detail.title);
    let _ = writeln!(out, "Price: {}", detail.price);
    let _ = writeln!(out, "Rating: {}", detail.rating);
    if let Some(image_url) = &detail.image_url {
        let _ = writeln!(out, "Image URL: {image_url}");
    }

    if !detail.options.is_empty() {
        out.push_str("\nAvailable Options:\n");
        for group in &detail.options {
            let _ = writeln!(out, "   {}: {}", group.name, group.values.join(", "));
        }
    }
}
