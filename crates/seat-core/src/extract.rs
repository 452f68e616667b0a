//! Participant-count extraction from raw page text.

use std::sync::LazyLock;

use regex::Regex;

static COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Teilnehmer[^0-9]*([0-9]+)").expect("valid regex"));

/// Find every `Teilnehmer` label followed by a number and return the largest
/// number. The page repeats the label in decorative places, so the maximum
/// is the count that matters.
///
/// Returns `None` when the label never appears with a number after it.
/// Numbers too large for `u64` saturate to `u64::MAX`.
pub fn extract_count(text: &str) -> Option<u64> {
    COUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|digits| digits.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .max()
}
