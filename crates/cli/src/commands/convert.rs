//! Search document export.
//!
//! Writes `documents.jsonl` for each catalogue tier the loaded catalogue
//! can fill. Pass `--num-products 0` to load every product first.
//!
//! # Usage
//!
//! ```bash
//! sa-cli --num-products 0 convert --out search_documents
//! ```

#![allow(clippy::print_stdout)]

use std::path::Path;

use shopping_assistant::AssistantConfig;
use shopping_assistant_webshop::{Catalogue, CatalogueError, export_documents};

/// Load the catalogue and export its search documents into `out`.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be loaded or a file cannot be
/// written.
pub fn run(config: &AssistantConfig, out: &Path) -> Result<(), CatalogueError> {
    let catalogue = Catalogue::load(&config.catalogue)?;
    let written = export_documents(&catalogue, out)?;

    if written.is_empty() {
        println!(
            "Catalogue has {} products, too few for any export tier.",
            catalogue.len()
        );
        return Ok(());
    }

    for (path, count) in &written {
        println!("{count:>8} documents  {}", path.display());
    }
    Ok(())
}
