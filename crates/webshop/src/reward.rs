//! Purchase scoring.
//!
//! A purchase scores the fraction of the instruction's keywords that appear
//! in the bought product: its title, description, bullet points and the
//! options the buyer selected. Options left unselected do not count.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::catalogue::Product;

/// Words that carry no information about the wanted product.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "any", "for", "find", "i", "in", "is", "it", "looking", "me", "need",
    "of", "on", "or", "please", "some", "that", "the", "to", "want", "with",
];

fn normalise(word: &str) -> String {
    let word = word.to_lowercase();
    match word.strip_suffix('s') {
        Some(stem) if stem.chars().count() >= 3 && !stem.ends_with('s') => stem.to_string(),
        _ => word,
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(normalise)
}

/// Keyword tokens of an instruction, in order and without repeats.
#[must_use]
pub fn instruction_keywords(instruction: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words(instruction)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Score a purchase of `product` with `selected` options against
/// `instruction`, between 0.0 and 1.0.
#[must_use]
pub fn purchase_reward(
    instruction: &str,
    product: &Product,
    selected: &IndexMap<String, String>,
) -> f64 {
    let keywords = instruction_keywords(instruction);
    if keywords.is_empty() {
        return 0.0;
    }

    let mut vocabulary: HashSet<String> = words(&product.title).collect();
    vocabulary.extend(words(&product.description));
    for bullet in &product.bullet_points {
        vocabulary.extend(words(bullet));
    }
    for value in selected.values() {
        vocabulary.extend(words(value));
    }

    let matched = keywords
        .iter()
        .filter(|keyword| vocabulary.contains(*keyword))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let reward = matched as f64 / keywords.len() as f64;
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopping_assistant_core::CatalogueKey;

    fn shirt() -> Product {
        let mut options = IndexMap::new();
        options.insert("size".to_string(), vec!["small".to_string(), "large".to_string()]);
        Product {
            asin: CatalogueKey::new("B1"),
            title: "Blue Cotton T-Shirt".to_string(),
            description: String::new(),
            bullet_points: Vec::new(),
            price: Decimal::TEN,
            price_display: "$10.00".to_string(),
            rating: None,
            main_image: None,
            options,
            reviews: Vec::new(),
            category: None,
            query: None,
        }
    }

    #[test]
    fn test_keywords_drop_filler_and_repeats() {
        assert_eq!(
            instruction_keywords("Find me a blue t-shirt, blue shirts please."),
            vec!["blue", "t", "shirt"]
        );
    }

    #[test]
    fn test_full_match_scores_one() {
        let reward = purchase_reward("Find me blue t-shirts.", &shirt(), &IndexMap::new());
        assert!((reward - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selected_option_counts() {
        let mut selected = IndexMap::new();
        selected.insert("size".to_string(), "large".to_string());
        let without = purchase_reward("Find me a large red shirt.", &shirt(), &IndexMap::new());
        let with = purchase_reward("Find me a large red shirt.", &shirt(), &selected);
        assert!((without - 1.0 / 3.0).abs() < 1e-9);
        assert!((with - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_keywords_scores_zero() {
        assert!(purchase_reward("Find me.", &shirt(), &IndexMap::new()).abs() < f64::EPSILON);
        assert!(purchase_reward("", &shirt(), &IndexMap::new()).abs() < f64::EPSILON);
    }
}
