pub mod formatter;
pub mod parser;
pub mod record;

pub use formatter::{FleetFormatter, FormattedFleet, ResolvedShip, SquadronLine};
pub use parser::{parse_row, Column, HeaderSchema};
pub use record::{AlignmentAnomaly, DeclaredTotals, FleetRecord, ShipBlock};
