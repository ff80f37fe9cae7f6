//! Re-derives ship builds and squadron picks from canonical fleet text.
//!
//! The text is the formatter's own output, so the scan is line based: a ship line (priced,
//! unresolved, or the first non-keyword line after a blank) opens a build, `• ` bullets are
//! its upgrades, and a subtotal line or any keyword line closes it.

use serde::Serialize;

use crate::resolve::names::{extract_points, parse_repeat_prefix, strip_trailing_points};
use crate::resolve::UNRESOLVED_PREFIX;

/// Bullets priced above this are hulls or objectives captured by mistake, not upgrade picks.
pub const MAX_UPGRADE_POINTS: i64 = 20;

const BULLET: &str = "• ";
const KEYWORDS: [&str; 8] = [
    "Name:",
    "Faction:",
    "Commander:",
    "Assault:",
    "Defense:",
    "Navigation:",
    "Squadrons:",
    "Total Points:",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipBuild {
    pub ship_name: String,
    pub upgrades: Vec<String>,
}

impl ShipBuild {
    fn new(ship_name: &str) -> Self {
        Self {
            ship_name: ship_name.to_string(),
            upgrades: Vec::new(),
        }
    }
}

fn is_keyword(line: &str) -> bool {
    KEYWORDS.iter().any(|keyword| line.starts_with(keyword))
}

fn is_subtotal(line: &str) -> bool {
    line.starts_with("= ") && line.ends_with(" Points")
}

fn is_ship_line(line: &str) -> bool {
    extract_points(line).is_some() || line.starts_with(UNRESOLVED_PREFIX)
}

/// Number inside the last parenthesised group, e.g. `"Vader (Officer) (36)"` -> `36`.
pub fn trailing_paren_points(text: &str) -> Option<i64> {
    let open = text.rfind('(')?;
    let close = text.rfind(')')?;
    if close <= open {
        return None;
    }
    let inner = text[open + 1..close].trim();
    let digits: String = inner.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn extract_builds(fleet_text: &str) -> Vec<ShipBuild> {
    let mut builds = Vec::new();
    let mut current: Option<ShipBuild> = None;
    let mut commander: Option<String> = None;
    let mut ships_seen = 0usize;
    let mut commander_dropped = false;
    let mut after_blank = false;

    for line in fleet_text.lines() {
        let line = line.trim();
        let follows_blank = std::mem::replace(&mut after_blank, line.is_empty());
        if line.is_empty() || is_keyword(line) {
            close(&mut builds, &mut current);
            if let Some(value) = line.strip_prefix("Commander:") {
                let value = value.trim();
                commander = (!value.is_empty()).then(|| value.to_string());
            }
            continue;
        }
        if let Some(upgrade) = line.strip_prefix(BULLET) {
            let Some(build) = current.as_mut() else {
                continue;
            };
            let upgrade = upgrade.trim();
            if ships_seen == 1 && !commander_dropped && commander.as_deref() == Some(upgrade) {
                commander_dropped = true;
                continue;
            }
            if trailing_paren_points(upgrade).is_some_and(|points| points > MAX_UPGRADE_POINTS) {
                continue;
            }
            build.upgrades.push(upgrade.to_string());
            continue;
        }
        close(&mut builds, &mut current);
        // Unpriced hulls carry no `(N)`, but every ship block starts right after a blank line.
        if !is_subtotal(line) && (follows_blank || is_ship_line(line)) {
            ships_seen += 1;
            current = Some(ShipBuild::new(line));
        }
    }
    close(&mut builds, &mut current);
    builds
}

fn close(builds: &mut Vec<ShipBuild>, current: &mut Option<ShipBuild>) {
    if let Some(build) = current.take() {
        builds.push(build);
    }
}

/// Squadron names from the `Squadrons:` block, one entry per squadron (`N x` expanded,
/// line totals stripped).
pub fn extract_squadrons(fleet_text: &str) -> Vec<String> {
    let mut squadrons = Vec::new();
    let mut in_section = false;
    for line in fleet_text.lines() {
        let line = line.trim();
        if line.starts_with("Squadrons:") {
            in_section = true;
            continue;
        }
        if is_keyword(line) || is_subtotal(line) {
            in_section = false;
            continue;
        }
        let Some(entry) = line.strip_prefix(BULLET).filter(|_| in_section) else {
            continue;
        };
        let (count, name) = parse_repeat_prefix(entry.trim()).unwrap_or((1, entry.trim()));
        let name = strip_trailing_points(name);
        if name.is_empty() {
            continue;
        }
        squadrons.extend(std::iter::repeat(name).take(count));
    }
    squadrons
}
