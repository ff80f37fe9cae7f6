//! Renders a parsed [FleetRecord] as canonical fleet text.
//!
//! ```text
//! Name: <fleet name>
//! Faction: <faction>
//! Commander: <name> (<points>)
//!
//! Assault: <objective>
//! Defense: <objective>
//! Navigation: <objective>
//!
//! <ship display>
//! • <commander, flagship only>
//! • <upgrade display>
//! = <ship subtotal> Points
//!
//! Squadrons:
//! • <n> x <squadron> (<n * points>)
//! = <squadron subtotal> Points
//!
//! Total Points: <declared list total>
//! ```
//!
//! Declared totals are echoed, never reconciled; the computed total is returned beside the text.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::fleet::record::FleetRecord;
use crate::resolve::names::{strip_squadron_tag, strip_trailing_points};
use crate::resolve::{NameResolver, ResolvedName, UsageContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShip {
    pub name: ResolvedName,
    pub upgrades: Vec<ResolvedName>,
    pub subtotal: u32,
}

/// One deduplicated squadron line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadronLine {
    pub name: String,
    pub count: usize,
    pub unit_points: Option<u32>,
}

impl SquadronLine {
    pub fn line_points(&self) -> u32 {
        let count = u32::try_from(self.count).unwrap_or(u32::MAX);
        self.unit_points.unwrap_or(0).saturating_mul(count)
    }

    fn render(&self) -> String {
        match (self.count, self.unit_points) {
            (1, Some(points)) => format!("• {} ({})", self.name, points),
            (1, None) => format!("• {}", self.name),
            (count, Some(_)) => format!("• {} x {} ({})", count, self.name, self.line_points()),
            (count, None) => format!("• {} x {}", count, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedFleet {
    pub text: String,
    /// `None` when the slot was empty.
    pub commander: Option<ResolvedName>,
    pub objectives: [Option<ResolvedName>; 3],
    pub ships: Vec<ResolvedShip>,
    pub squadrons: Vec<ResolvedName>,
    pub squadron_lines: Vec<SquadronLine>,
    pub squadron_points: u32,
    pub computed_total: u32,
}

impl FormattedFleet {
    /// Every resolution that fell through to the placeholder.
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedName> {
        self.commander
            .iter()
            .chain(self.objectives.iter().flatten())
            .chain(
                self.ships
                    .iter()
                    .flat_map(|ship| std::iter::once(&ship.name).chain(ship.upgrades.iter())),
            )
            .chain(self.squadrons.iter())
            .filter(|resolved| resolved.is_unresolved())
    }

    pub fn has_unresolved(&self) -> bool {
        self.unresolved().next().is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FleetFormatter<'a> {
    resolver: NameResolver<'a>,
}

impl<'a> FleetFormatter<'a> {
    pub fn new(resolver: NameResolver<'a>) -> Self {
        Self { resolver }
    }

    pub fn format(&self, record: &FleetRecord) -> FormattedFleet {
        let commander = self.resolve_slot(&record.commander, UsageContext::Commander);
        let commander_line = commander.as_ref().map(render_commander).unwrap_or_default();

        let [assault, defense, navigation] = record.objectives();
        let objectives = [
            self.resolve_slot(assault, UsageContext::Objective),
            self.resolve_slot(defense, UsageContext::Objective),
            self.resolve_slot(navigation, UsageContext::Objective),
        ];

        let mut out = String::new();
        let _ = writeln!(out, "Name: {}", record.fleet_name);
        let _ = writeln!(out, "Faction: {}", record.faction);
        let _ = writeln!(out, "Commander: {}", commander_line);
        let _ = writeln!(out);
        for (label, objective) in ["Assault", "Defense", "Navigation"].iter().zip(&objectives) {
            let text = objective.as_ref().map(ResolvedName::name_text).unwrap_or_default();
            let _ = writeln!(out, "{}: {}", label, text);
        }
        let _ = writeln!(out);

        let mut ships = Vec::with_capacity(record.ships.len());
        for (index, block) in record.ships.iter().enumerate() {
            let name = self.resolver.resolve(&block.name, UsageContext::Ship);
            let mut subtotal = name.points().unwrap_or(0);
            let _ = writeln!(out, "{}", name.display_text());

            if index == 0 {
                if let Some(commander) = &commander {
                    subtotal = subtotal.saturating_add(commander.points().unwrap_or(0));
                    let _ = writeln!(out, "• {}", commander_line);
                }
            }

            let context = if index == 0 {
                UsageContext::FlagshipUpgrade
            } else {
                UsageContext::ShipUpgrade
            };
            let mut upgrades = Vec::with_capacity(block.upgrades.len());
            for raw in &block.upgrades {
                let upgrade = self.resolver.resolve(raw, context);
                let display = upgrade.display_text();
                if display.trim().is_empty() {
                    continue;
                }
                subtotal = subtotal.saturating_add(upgrade.points().unwrap_or(0));
                let _ = writeln!(out, "• {}", display);
                upgrades.push(upgrade);
            }

            let _ = writeln!(out, "= {} Points", subtotal);
            let _ = writeln!(out);
            ships.push(ResolvedShip {
                name,
                upgrades,
                subtotal,
            });
        }

        let squadrons: Vec<ResolvedName> = record
            .squadrons
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| self.resolver.resolve(raw, UsageContext::Squadron))
            .collect();
        let squadron_lines = dedupe_squadrons(&squadrons);
        let squadron_points = squadron_lines
            .iter()
            .map(SquadronLine::line_points)
            .fold(0u32, u32::saturating_add);

        let _ = writeln!(out, "Squadrons:");
        for line in &squadron_lines {
            let _ = writeln!(out, "{}", line.render());
        }
        let _ = writeln!(out, "= {} Points", squadron_points);
        let _ = writeln!(out);
        let _ = write!(out, "Total Points: {}", record.totals.list);

        let computed_total = ships
            .iter()
            .map(|ship| ship.subtotal)
            .fold(squadron_points, u32::saturating_add);
        FormattedFleet {
            text: out.trim().to_string(),
            commander,
            objectives,
            ships,
            squadrons,
            squadron_lines,
            squadron_points,
            computed_total,
        }
    }

    fn resolve_slot(&self, raw: &str, context: UsageContext) -> Option<ResolvedName> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(self.resolver.resolve(raw, context))
        }
    }
}

fn render_commander(commander: &ResolvedName) -> String {
    match commander.points() {
        Some(points) => format!("{} ({})", commander.name_text(), points),
        None => commander.name_text(),
    }
}

/// Collapse identical (base name, unit points) pairs; keys sort lexicographically.
fn dedupe_squadrons(squadrons: &[ResolvedName]) -> Vec<SquadronLine> {
    let mut counts: BTreeMap<(String, Option<u32>), usize> = BTreeMap::new();
    for squadron in squadrons {
        let key = (squadron_base_name(squadron), squadron.points());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((name, unit_points), count)| SquadronLine {
            name,
            count,
            unit_points,
        })
        .collect()
}

fn squadron_base_name(squadron: &ResolvedName) -> String {
    let display = squadron.display_text();
    if squadron.is_unresolved() {
        return display;
    }
    let base = strip_trailing_points(&strip_squadron_tag(&display));
    if !base.is_empty() {
        return base;
    }
    let base = strip_trailing_points(&display);
    if base.is_empty() {
        display.trim().to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lookup::{AliasMap, LookupTables, NicknameMap};
    use crate::fleet::record::{DeclaredTotals, ShipBlock};

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn tables() -> LookupTables {
        let aliases = AliasMap::from_pairs([
            ("Imperial II-class Star Destroyer (120)", "imperial-ii-class-star-destroyer"),
            ("Gozanti-class Cruisers (23)", "gozanti-class-cruisers"),
            ("Moff Jerjerrod (23)", "moff-jerjerrod"),
            ("Expert Shield Tech (5)", "expert-shield-tech"),
            ("Comms Net (2)", "comms-net"),
            ("Advanced Gunnery", "advanced-gunnery"),
            ("TIE Fighter Squadron (8)", "tie-fighter-squadron"),
            ("Howlrunner (16)", "howlrunner"),
            ("Darth Vader (Squadron) (21)", "darth-vader-squadron"),
            ("Darth Vader (Officer) (1)", "darth-vader-officer"),
            ("Mystery Squadron", "mystery-squadron"),
        ]);
        let nicknames = NicknameMap::from_entries([
            ("ISD 2", ids(&["imperial-ii-class-star-destroyer"])),
            ("Gozanti Cruisers", ids(&["gozanti-class-cruisers"])),
            ("Jerjerrod", ids(&["moff-jerjerrod"])),
            ("EST", ids(&["expert-shield-tech"])),
            ("TIEs", ids(&["tie-fighter-squadron"])),
            ("Vader", ids(&["darth-vader-squadron", "darth-vader-officer"])),
        ]);
        LookupTables::new(aliases, nicknames)
    }

    fn example_record() -> FleetRecord {
        FleetRecord {
            faction: "Empire".to_string(),
            commander: "Moff Jerjerrod".to_string(),
            assault: "Advanced Gunnery".to_string(),
            ships: vec![
                ShipBlock {
                    name: "ISD 2".to_string(),
                    upgrades: vec!["Expert Shield Tech".to_string()],
                },
                ShipBlock {
                    name: "Gozanti Cruisers".to_string(),
                    upgrades: vec!["Comms Net".to_string()],
                },
            ],
            totals: DeclaredTotals {
                list: "210".to_string(),
                ..DeclaredTotals::default()
            },
            ..FleetRecord::default()
        }
    }

    #[test]
    fn formats_example_fleet() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let fleet = formatter.format(&example_record());
        let expected = [
            "Name: ",
            "Faction: Empire",
            "Commander: Moff Jerjerrod (23)",
            "",
            "Assault: Advanced Gunnery",
            "Defense: ",
            "Navigation: ",
            "",
            "Imperial II-class Star Destroyer (120)",
            "• Moff Jerjerrod (23)",
            "• Expert Shield Tech (5)",
            "= 148 Points",
            "",
            "Gozanti-class Cruisers (23)",
            "• Comms Net (2)",
            "= 25 Points",
            "",
            "Squadrons:",
            "= 0 Points",
            "",
            "Total Points: 210",
        ]
        .join("\n");
        assert_eq!(fleet.text, expected);
        assert_eq!(
            fleet.ships.iter().map(|s| s.subtotal).collect::<Vec<_>>(),
            vec![148, 25]
        );
        assert_eq!(fleet.computed_total, 173);
        assert!(!fleet.has_unresolved());
    }

    #[test]
    fn formatting_is_idempotent() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = example_record();
        assert_eq!(formatter.format(&record).text, formatter.format(&record).text);
    }

    #[test]
    fn squadrons_collapse_into_multiplier_lines() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = FleetRecord {
            squadrons: ids(&["TIE Fighter Squadron (8)", "TIEs", "Howlrunner", "Vader"]),
            ..FleetRecord::default()
        };
        let fleet = formatter.format(&record);
        assert!(fleet.text.contains(
            "Squadrons:\n• Darth Vader (21)\n• Howlrunner (16)\n• 2 x TIE Fighter Squadron (16)\n= 53 Points"
        ));
        assert_eq!(fleet.squadron_points, 53);
        assert_eq!(fleet.squadron_lines.len(), 3);
    }

    #[test]
    fn oversized_squadron_multiplier_is_visible_not_expanded() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = FleetRecord {
            squadrons: crate::fleet::parser::split_squadron_cell("4000000000 x TIEs"),
            ..FleetRecord::default()
        };
        let fleet = formatter.format(&record);
        assert_eq!(fleet.squadrons.len(), 1);
        assert!(fleet
            .text
            .contains("• match not found for 4000000000 x TIEs\n= 0 Points"));
    }

    #[test]
    fn line_points_saturate_instead_of_overflowing() {
        let line = SquadronLine {
            name: "TIE Fighter Squadron".to_string(),
            count: usize::MAX,
            unit_points: Some(8),
        };
        assert_eq!(line.line_points(), u32::MAX);
    }

    #[test]
    fn squadron_without_points_contributes_nothing() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = FleetRecord {
            squadrons: ids(&["Mystery Squadron", "Mystery Squadron"]),
            ..FleetRecord::default()
        };
        let fleet = formatter.format(&record);
        assert!(fleet.text.contains("• 2 x Mystery Squadron\n= 0 Points"));
    }

    #[test]
    fn unresolved_tokens_stay_visible() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = FleetRecord {
            commander: "Grand Moff Nobody".to_string(),
            ships: vec![ShipBlock {
                name: "Death Star".to_string(),
                upgrades: vec!["Superlaser".to_string()],
            }],
            ..FleetRecord::default()
        };
        let fleet = formatter.format(&record);
        assert!(fleet.text.contains("Commander: match not found for Grand Moff Nobody"));
        assert!(fleet.text.contains(
            "match not found for Death Star\n• match not found for Grand Moff Nobody\n• match not found for Superlaser\n= 0 Points"
        ));
        assert_eq!(fleet.unresolved().count(), 3);
    }

    #[test]
    fn flagship_upgrades_prefer_officer_cards() {
        let tables = tables();
        let formatter = FleetFormatter::new(NameResolver::new(&tables));
        let record = FleetRecord {
            ships: vec![ShipBlock {
                name: "ISD 2".to_string(),
                upgrades: vec!["Vader".to_string()],
            }],
            ..FleetRecord::default()
        };
        let fleet = formatter.format(&record);
        assert!(fleet.text.contains("• Darth Vader (Officer) (1)\n= 121 Points"));
    }
}
