//! One tournament row after parsing, before any name is resolved.

use serde::Serialize;

use crate::resolve::names::parse_declared_points;

/// A ship name and the raw upgrade tokens typed beside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipBlock {
    pub name: String,
    pub upgrades: Vec<String>,
}

impl ShipBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upgrades: Vec::new(),
        }
    }
}

/// Totals exactly as typed in the export. Never recomputed by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeclaredTotals {
    pub ships: String,
    pub squadrons: String,
    pub list: String,
}

impl DeclaredTotals {
    pub fn list_points(&self) -> Option<i64> {
        parse_declared_points(&self.list)
    }
}

/// Upgrade cell with no ship to attach it to; the cell is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentAnomaly {
    pub column: usize,
    pub header: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetRecord {
    pub fleet_name: String,
    pub faction: String,
    pub commander: String,
    pub assault: String,
    pub defense: String,
    pub navigation: String,
    pub ships: Vec<ShipBlock>,
    pub squadrons: Vec<String>,
    pub totals: DeclaredTotals,
    pub anomalies: Vec<AlignmentAnomaly>,
}

impl FleetRecord {
    pub fn objectives(&self) -> [&str; 3] {
        [&self.assault, &self.defense, &self.navigation]
    }
}
