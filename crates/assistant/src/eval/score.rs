//! Per-turn scores.

use std::collections::HashMap;

use crate::services::chat::ToolCall;

use super::scenario::ExpectedToolUse;

/// 1.0 when `actual` makes exactly the `expected` calls, in order, with equal
/// inputs; 0.0 otherwise.
#[must_use]
pub fn trajectory_score(actual: &[ToolCall], expected: &[ExpectedToolUse]) -> f64 {
    let matches = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(call, want)| call.name == want.tool_name && call.input == want.tool_input);
    if matches { 1.0 } else { 0.0 }
}

fn tokens(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
    {
        *counts.entry(token.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// ROUGE-1 F1 between `reference` and `candidate` on lowercase word tokens.
///
/// Two empty texts match perfectly; an empty text never matches a
/// non-empty one.
#[must_use]
pub fn rouge1_f1(reference: &str, candidate: &str) -> f64 {
    let reference = tokens(reference);
    let candidate = tokens(candidate);
    if reference.is_empty() && candidate.is_empty() {
        return 1.0;
    }

    let overlap: usize = reference
        .iter()
        .map(|(token, count)| candidate.get(token).map_or(0, |c| (*c).min(*count)))
        .sum();
    if overlap == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let (overlap, reference_len, candidate_len) = (
        overlap as f64,
        reference.values().sum::<usize>() as f64,
        candidate.values().sum::<usize>() as f64,
    );
    let precision = overlap / candidate_len;
    let recall = overlap / reference_len;
    2.0 * precision * recall / (precision + recall)
}
