//! Human-readable differences between two documents.

use serde_json::Value;
use similar::TextDiff;

use super::canonical::exact_form;

/// Number of unchanged lines shown around each change.
const CONTEXT_LINES: usize = 3;

/// Unified diff between two texts, labelled `expected` and `actual`.
///
/// Returns an empty string when the texts are identical.
#[must_use]
pub fn unified(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::new();
    }

    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header("expected", "actual")
        .to_string()
}

/// Unified diff of the exact canonical forms of two documents.
#[must_use]
pub fn json_diff(expected: &Value, actual: &Value) -> String {
    unified(&exact_form(expected), &exact_form(actual))
}
