//! Positional grammar of the tournament export header.
//!
//! `FLAGSHIP` opens the first ship, each `UPGRADE` belongs to the ship opened most recently,
//! each `SHIP #n` opens the next one. `SQUADRON #n` cells may hold several bullet-separated
//! entries with an optional `N x` multiplier. Totals are recorded verbatim.

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, StarforgeError};
use crate::fleet::record::{AlignmentAnomaly, DeclaredTotals, FleetRecord, ShipBlock};
use crate::resolve::names::{clean_field, is_numeric, parse_repeat_prefix};

const SQUADRON_SEPARATOR: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    FleetName,
    Faction,
    Commander,
    AssaultObjective,
    DefenseObjective,
    NavigationObjective,
    Flagship,
    Ship,
    Upgrade,
    Squadron,
    ShipTotal,
    SquadronTotal,
    ListTotal,
    Ignored,
}

impl Column {
    pub fn classify(header: &str) -> Self {
        let header = clean_field(header).to_ascii_uppercase();
        // Totals share prefixes with ship and squadron columns; match them first.
        match header.as_str() {
            "FLEET NAME" => return Self::FleetName,
            "FACTION" => return Self::Faction,
            "COMMANDER" => return Self::Commander,
            "ASSAULT OBJECTIVE" => return Self::AssaultObjective,
            "DEFENSE OBJECTIVE" => return Self::DefenseObjective,
            "NAVIGATION OBJECTIVE" => return Self::NavigationObjective,
            "SHIP TOTAL" => return Self::ShipTotal,
            "SQUADRON TOTAL" => return Self::SquadronTotal,
            "LIST TOTAL" => return Self::ListTotal,
            _ => {}
        }
        if header.starts_with("FLAGSHIP") {
            Self::Flagship
        } else if header.starts_with("SHIP") {
            Self::Ship
        } else if header.starts_with("UPGRADE") {
            Self::Upgrade
        } else if header.starts_with("SQUADRON") {
            Self::Squadron
        } else {
            Self::Ignored
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FleetName => "fleet_name",
            Self::Faction => "faction",
            Self::Commander => "commander",
            Self::AssaultObjective => "assault_objective",
            Self::DefenseObjective => "defense_objective",
            Self::NavigationObjective => "navigation_objective",
            Self::Flagship => "flagship",
            Self::Ship => "ship",
            Self::Upgrade => "upgrade",
            Self::Squadron => "squadron",
            Self::ShipTotal => "ship_total",
            Self::SquadronTotal => "squadron_total",
            Self::ListTotal => "list_total",
            Self::Ignored => "ignored",
        }
    }
}

const REQUIRED: [(Column, &str); 7] = [
    (Column::Faction, "FACTION"),
    (Column::Commander, "COMMANDER"),
    (Column::AssaultObjective, "ASSAULT OBJECTIVE"),
    (Column::DefenseObjective, "DEFENSE OBJECTIVE"),
    (Column::NavigationObjective, "NAVIGATION OBJECTIVE"),
    (Column::Flagship, "FLAGSHIP"),
    (Column::ListTotal, "LIST TOTAL"),
];

/// Classified header row. Validated once per batch; rows are parsed against it.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    headers: Vec<String>,
    columns: Vec<Column>,
}

impl HeaderSchema {
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(StarforgeError::MalformedHeader(
                "header row is empty".to_string(),
            ));
        }
        let columns: Vec<Column> = headers.iter().map(|h| Column::classify(h)).collect();
        for (column, name) in REQUIRED {
            if !columns.contains(&column) {
                return Err(StarforgeError::MissingColumn(name));
            }
        }
        let first_ship = columns
            .iter()
            .position(|c| matches!(c, Column::Flagship | Column::Ship));
        let first_upgrade = columns.iter().position(|c| *c == Column::Upgrade);
        if let (Some(upgrade), Some(ship)) = (first_upgrade, first_ship) {
            if upgrade < ship {
                return Err(StarforgeError::MalformedHeader(format!(
                    "UPGRADE column {} appears before any ship column",
                    upgrade + 1
                )));
            }
        }
        Ok(Self {
            headers: headers.to_vec(),
            columns,
        })
    }

    /// Single left-to-right scan. Missing trailing cells read as empty.
    pub fn parse_row(&self, values: &[String]) -> FleetRecord {
        let mut record = FleetRecord::default();
        let mut current: Option<ShipBlock> = None;

        for (index, column) in self.columns.iter().enumerate() {
            let cell = clean_field(values.get(index).map(String::as_str).unwrap_or(""));
            match column {
                Column::FleetName => set_once(&mut record.fleet_name, cell),
                Column::Faction => set_once(&mut record.faction, cell),
                Column::Commander => set_once(&mut record.commander, cell),
                Column::AssaultObjective => set_once(&mut record.assault, cell),
                Column::DefenseObjective => set_once(&mut record.defense, cell),
                Column::NavigationObjective => set_once(&mut record.navigation, cell),
                Column::ShipTotal => set_once(&mut record.totals.ships, cell),
                Column::SquadronTotal => set_once(&mut record.totals.squadrons, cell),
                Column::ListTotal => set_once(&mut record.totals.list, cell),
                Column::Flagship | Column::Ship => {
                    flush_ship(&mut record.ships, current.take());
                    current = Some(ShipBlock::new(cell));
                }
                Column::Upgrade => {
                    if cell.is_empty() {
                        continue;
                    }
                    match current.as_mut().filter(|ship| !ship.name.is_empty()) {
                        Some(ship) => ship.upgrades.push(cell),
                        None => {
                            let header = self.headers[index].clone();
                            warn!(column = index + 1, header = %header, value = %cell, "upgrade without a ship; dropped");
                            record.anomalies.push(AlignmentAnomaly {
                                column: index + 1,
                                header,
                                value: cell,
                            });
                        }
                    }
                }
                Column::Squadron => record.squadrons.extend(split_squadron_cell(&cell)),
                Column::Ignored => {}
            }
        }
        flush_ship(&mut record.ships, current);
        record
    }
}

/// Parse one row against a header; validates the header every call.
pub fn parse_row(values: &[String], headers: &[String]) -> Result<FleetRecord> {
    Ok(HeaderSchema::from_headers(headers)?.parse_row(values))
}

/// Expand `"2 x TIE Fighter Squadron • Howlrunner"` into individual squadron entries.
pub fn split_squadron_cell(cell: &str) -> Vec<String> {
    let mut squadrons = Vec::new();
    if cell.is_empty() || cell == "0" {
        return squadrons;
    }
    for part in cell.split(SQUADRON_SEPARATOR) {
        let part = part.trim();
        if part.is_empty() || is_numeric(part) {
            continue;
        }
        match parse_repeat_prefix(part) {
            Some((count, name)) => {
                squadrons.extend(std::iter::repeat(name.to_string()).take(count));
            }
            None => squadrons.push(part.to_string()),
        }
    }
    squadrons
}

fn flush_ship(ships: &mut Vec<ShipBlock>, ship: Option<ShipBlock>) {
    if let Some(ship) = ship.filter(|ship| !ship.name.is_empty()) {
        ships.push(ship);
    }
}

fn set_once(slot: &mut String, value: String) {
    if slot.is_empty() {
        *slot = value;
    }
}
