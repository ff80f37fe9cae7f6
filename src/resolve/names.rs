//! Small text helpers for card names: whitespace cleanup, point-cost extraction and
//! the bracketed tags that disambiguate same-name cards.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POINTS: Regex = Regex::new(r"\((\d+)\)").expect("points regex");
    static ref ZERO_COST_SUFFIX: Regex = Regex::new(r"\s*\(\s*0\s*\)\s*$").expect("zero cost regex");
    static ref TRAILING_POINTS: Regex =
        Regex::new(r"\s*\(\s*\d+\s*(?:pts)?\s*\)\s*$").expect("trailing points regex");
    static ref SQUADRON_TAG: Regex = Regex::new(r"(?i)\(\s*squadron\s*\)").expect("squadron tag regex");
    static ref REPEAT_PREFIX: Regex =
        Regex::new(r"(?i)^(\d+)\s*[x×]\s+(.+)$").expect("repeat prefix regex");
}

/// Largest `N x` multiplier taken at face value. Anything larger is a typo, and the entry is
/// kept whole so it surfaces as unresolved.
pub const MAX_REPEAT_COUNT: usize = 99;

/// Collapse newlines and runs of whitespace into single spaces and trim.
pub fn clean_field(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup key: cleaned and lowercased.
pub fn normalize_name(raw: &str) -> String {
    clean_field(raw).to_lowercase()
}

/// First parenthesised integer in the string, e.g. `"Chimaera (4)"` -> `Some(4)`.
/// Tags such as `(Officer)` never match.
pub fn extract_points(text: &str) -> Option<u32> {
    POINTS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Drop a trailing `(0)`: a zero suffix in hand-typed data means "no explicit cost".
pub fn strip_zero_cost_suffix(text: &str) -> String {
    ZERO_COST_SUFFIX.replace(text, "").trim().to_string()
}

/// Remove a trailing point cost (`(8)`, `( 8 pts )`) from a display string.
pub fn strip_trailing_points(text: &str) -> String {
    TRAILING_POINTS.replace(text, "").trim().to_string()
}

/// Remove every `(Squadron)` tag, case-insensitive.
pub fn strip_squadron_tag(text: &str) -> String {
    clean_field(&SQUADRON_TAG.replace_all(text, ""))
}

pub fn has_commander_tag(text: &str) -> bool {
    text.to_lowercase().contains("(commander)")
}

pub fn has_squadron_tag(text: &str) -> bool {
    text.to_lowercase().contains("(squadron)")
}

pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit())
}

/// Split an `"3 x Name"` entry into its count and name. The multiplier must be followed by
/// whitespace, so `"2 X-wing Squadron"` is a name, not two `-wing Squadron`s. Counts outside
/// `1..=MAX_REPEAT_COUNT` are not multipliers.
pub fn parse_repeat_prefix(text: &str) -> Option<(usize, &str)> {
    let caps = REPEAT_PREFIX.captures(text)?;
    let count: usize = caps.get(1)?.as_str().parse().ok()?;
    if !(1..=MAX_REPEAT_COUNT).contains(&count) {
        return None;
    }
    let name = caps.get(2)?.as_str().trim();
    Some((count, name))
}

/// Declared totals are free text in the export; only a clean integer counts.
pub fn parse_declared_points(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
