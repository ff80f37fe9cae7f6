//! Resolves hand-typed card names to one canonical display string.
//!
//! Stages, first hit wins:
//! 1. clean the token (whitespace, trailing `(0)`); empty or purely numeric is unresolved
//! 2. nickname map -> candidate canonical IDs -> every alias display string for them
//! 3. alias search: every display string whose normalized text contains the input
//!
//! Each stage pool is filtered by [UsageContext::admits], upgrade slots prefer officer cards,
//! and a priceless pick is swapped for a priced variant of the same card. Ties are broken by
//! table order (nickname order, then alias order), which keeps output deterministic.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::data::lookup::{AliasEntry, LookupTables};
use crate::resolve::context::UsageContext;
use crate::resolve::names::{
    clean_field, extract_points, is_numeric, normalize_name, strip_trailing_points,
    strip_zero_cost_suffix,
};

/// Prefix of the placeholder rendered for tokens with no acceptable match.
pub const UNRESOLVED_PREFIX: &str = "match not found for ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Nickname,
    AliasSearch,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nickname => write!(f, "nickname"),
            Self::AliasSearch => write!(f, "alias_search"),
        }
    }
}

/// Outcome of one resolution. `points` is only ever read off a display string; `None`
/// means the cost is unknown, not zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedName {
    Matched {
        display: String,
        canonical_id: String,
        points: Option<u32>,
        stage: MatchStage,
    },
    Unresolved {
        text: String,
    },
}

impl ResolvedName {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }

    pub fn points(&self) -> Option<u32> {
        match self {
            Self::Matched { points, .. } => *points,
            Self::Unresolved { .. } => None,
        }
    }

    /// Full display string, or the visible placeholder for an unresolved token.
    pub fn display_text(&self) -> String {
        match self {
            Self::Matched { display, .. } => display.clone(),
            Self::Unresolved { text } => format!("{UNRESOLVED_PREFIX}{text}"),
        }
    }

    /// Display text with its trailing point cost removed.
    pub fn name_text(&self) -> String {
        match self {
            Self::Matched { display, .. } => strip_trailing_points(display),
            Self::Unresolved { .. } => self.display_text(),
        }
    }
}

/// Stateless resolver over shared read-only tables; cheap to copy into worker threads.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    tables: &'a LookupTables,
}

impl<'a> NameResolver<'a> {
    pub fn new(tables: &'a LookupTables) -> Self {
        Self { tables }
    }

    pub fn resolve(&self, raw: &str, context: UsageContext) -> ResolvedName {
        let cleaned = clean_field(raw);
        let cleaned = strip_zero_cost_suffix(&cleaned);
        if cleaned.is_empty() || is_numeric(&cleaned) {
            debug!(%context, input = %raw, cleaned = %cleaned, "token empty or numeric after cleaning");
            return ResolvedName::Unresolved { text: cleaned };
        }

        if let Some(resolved) = self.resolve_via_nickname(&cleaned, context) {
            return resolved;
        }
        if let Some(resolved) = self.resolve_via_alias_search(&cleaned, context) {
            return resolved;
        }

        warn!(%context, input = %cleaned, "no alias or nickname match");
        ResolvedName::Unresolved { text: cleaned }
    }

    fn resolve_via_nickname(&self, cleaned: &str, context: UsageContext) -> Option<ResolvedName> {
        let Some(canonical_ids) = self.tables.nicknames.lookup(cleaned) else {
            trace!(%context, input = %cleaned, "nickname not found");
            return None;
        };
        debug!(%context, input = %cleaned, candidates = ?canonical_ids, "nickname map hit");

        let mut seen = HashSet::new();
        let pool: Vec<&AliasEntry> = canonical_ids
            .iter()
            .flat_map(|id| self.tables.aliases.displays_for(id))
            .filter(|entry| seen.insert(entry.display.as_str()))
            .collect();
        if pool.is_empty() {
            debug!(%context, input = %cleaned, "nickname ids have no alias display strings");
            return None;
        }

        let selected = self.select(&pool, cleaned, context, MatchStage::Nickname);
        if selected.is_none() {
            debug!(
                %context,
                input = %cleaned,
                pool = ?pool.iter().map(|e| e.display.as_str()).collect::<Vec<_>>(),
                "nickname candidates rejected by context"
            );
        }
        selected
    }

    fn resolve_via_alias_search(&self, cleaned: &str, context: UsageContext) -> Option<ResolvedName> {
        let needle = normalize_name(cleaned);
        let pool: Vec<&AliasEntry> = self
            .tables
            .aliases
            .entries()
            .iter()
            .filter(|entry| entry.normalized().contains(&needle))
            .collect();
        if pool.is_empty() {
            return None;
        }
        debug!(%context, input = %cleaned, matches = pool.len(), "alias search hit");
        self.select(&pool, cleaned, context, MatchStage::AliasSearch)
    }

    fn select(
        &self,
        pool: &[&'a AliasEntry],
        cleaned: &str,
        context: UsageContext,
        stage: MatchStage,
    ) -> Option<ResolvedName> {
        let survivors: Vec<&AliasEntry> = pool
            .iter()
            .copied()
            .filter(|entry| context.admits(&entry.display))
            .collect();
        let mut chosen = *survivors.first()?;

        if survivors.len() > 1 && context.prefers_officer() {
            if let Some(officer) = survivors
                .iter()
                .find(|entry| entry.canonical_id.to_lowercase().contains("officer"))
            {
                debug!(%context, input = %cleaned, selected = %officer.display, "preferring officer variant");
                chosen = *officer;
            }
        }

        let priced = self.priced_variant(chosen);
        if priced.display != chosen.display {
            debug!(
                %context,
                input = %cleaned,
                from = %chosen.display,
                to = %priced.display,
                "swapped for priced variant"
            );
        }

        debug!(%context, input = %cleaned, %stage, selected = %priced.display, canonical_id = %priced.canonical_id, "resolved");
        Some(ResolvedName::Matched {
            display: priced.display.clone(),
            canonical_id: priced.canonical_id.clone(),
            points: extract_points(&priced.display),
            stage,
        })
    }

    /// A pick with no cost or a zero cost yields to the first priced string for the same card.
    fn priced_variant(&self, chosen: &'a AliasEntry) -> &'a AliasEntry {
        if matches!(extract_points(&chosen.display), Some(points) if points > 0) {
            return chosen;
        }
        self.tables
            .aliases
            .displays_for(&chosen.canonical_id)
            .find(|entry| matches!(extract_points(&entry.display), Some(points) if points > 0))
            .unwrap_or(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lookup::{AliasMap, NicknameMap};

    fn tables() -> LookupTables {
        let aliases = AliasMap::from_pairs([
            ("Imperial II-class Star Destroyer (120)", "imperial-ii-class-star-destroyer"),
            ("Darth Vader (Commander) (36)", "darth-vader-commander"),
            ("Darth Vader (Squadron) (21)", "darth-vader-squadron"),
            ("Darth Vader (Boarding Team) (3)", "darth-vader-boarding-team"),
            ("Darth Vader (Officer) (1)", "darth-vader-officer"),
            ("Suppressor (0)", "suppressor-title"),
            ("Suppressor (4)", "suppressor-title"),
            ("Advanced Gunnery", "advanced-gunnery"),
            ("Comms Net (2)", "comms-net"),
        ]);
        let vader = vec![
            "darth-vader-commander".to_string(),
            "darth-vader-squadron".to_string(),
            "darth-vader-boarding-team".to_string(),
            "darth-vader-officer".to_string(),
        ];
        let nicknames = NicknameMap::from_entries([
            ("ISD 2", vec!["imperial-ii-class-star-destroyer".to_string()]),
            ("Vader", vader),
            ("Phantom", vec!["no-such-card".to_string()]),
        ]);
        LookupTables::new(aliases, nicknames)
    }

    fn display(resolved: &ResolvedName) -> String {
        resolved.display_text()
    }

    #[test]
    fn nickname_resolves_to_priced_display() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("isd\n2", UsageContext::Ship);
        assert_eq!(display(&resolved), "Imperial II-class Star Destroyer (120)");
        assert_eq!(resolved.points(), Some(120));
        assert!(matches!(resolved, ResolvedName::Matched { stage: MatchStage::Nickname, .. }));
    }

    #[test]
    fn same_nickname_resolves_per_context() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        assert_eq!(
            display(&resolver.resolve("Vader", UsageContext::Commander)),
            "Darth Vader (Commander) (36)"
        );
        assert_eq!(
            display(&resolver.resolve("Vader", UsageContext::Squadron)),
            "Darth Vader (Squadron) (21)"
        );
        assert_eq!(
            display(&resolver.resolve("Vader", UsageContext::ShipUpgrade)),
            "Darth Vader (Officer) (1)"
        );
        assert_eq!(
            display(&resolver.resolve("Vader", UsageContext::FlagshipUpgrade)),
            "Darth Vader (Officer) (1)"
        );
        // No officer preference outside upgrade slots: first admissible in table order.
        assert_eq!(
            display(&resolver.resolve("Vader", UsageContext::Ship)),
            "Darth Vader (Boarding Team) (3)"
        );
    }

    #[test]
    fn zero_cost_pick_is_enhanced_with_priced_variant() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("Suppressor", UsageContext::ShipUpgrade);
        assert_eq!(display(&resolved), "Suppressor (4)");
        assert_eq!(resolved.points(), Some(4));
        assert!(matches!(resolved, ResolvedName::Matched { stage: MatchStage::AliasSearch, .. }));
    }

    #[test]
    fn unpriced_display_keeps_unknown_points() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("advanced gunnery", UsageContext::Objective);
        assert_eq!(display(&resolved), "Advanced Gunnery");
        assert_eq!(resolved.points(), None);
    }

    #[test]
    fn trailing_zero_cost_is_ignored_on_input() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        assert_eq!(
            display(&resolver.resolve("Comms Net (0)", UsageContext::ShipUpgrade)),
            "Comms Net (2)"
        );
    }

    #[test]
    fn nickname_without_aliases_falls_back_to_alias_search() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("Phantom", UsageContext::Ship);
        assert_eq!(resolved, ResolvedName::Unresolved { text: "Phantom".to_string() });
        assert_eq!(display(&resolved), "match not found for Phantom");
    }

    #[test]
    fn empty_and_numeric_tokens_are_unresolved() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        assert!(resolver.resolve("   ", UsageContext::Ship).is_unresolved());
        assert!(resolver.resolve("42", UsageContext::Squadron).is_unresolved());
        assert!(resolver.resolve("(0)", UsageContext::ShipUpgrade).is_unresolved());
    }

    #[test]
    fn commander_card_excluded_from_squadron_alias_search() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("Darth Vader (Commander)", UsageContext::Squadron);
        assert!(resolved.is_unresolved());
        let resolved = resolver.resolve("Darth Vader (Commander)", UsageContext::Commander);
        assert_eq!(display(&resolved), "Darth Vader (Commander) (36)");
    }

    #[test]
    fn name_text_strips_points_only() {
        let tables = tables();
        let resolver = NameResolver::new(&tables);
        let resolved = resolver.resolve("Vader", UsageContext::Commander);
        assert_eq!(resolved.name_text(), "Darth Vader (Commander)");
    }
}
