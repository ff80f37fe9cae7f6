use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::resolve::names::{has_commander_tag, has_squadron_tag};

/// Structural slot a raw token came from. Supplied by the caller, never inferred from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageContext {
    Ship,
    Commander,
    ShipUpgrade,
    FlagshipUpgrade,
    Squadron,
    Objective,
    Unknown,
}

impl UsageContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ship => "ship",
            Self::Commander => "commander",
            Self::ShipUpgrade => "ship_upgrade",
            Self::FlagshipUpgrade => "flagship_upgrade",
            Self::Squadron => "squadron",
            Self::Objective => "objective",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a display string may be chosen in this slot.
    ///
    /// `(commander)` cards only fit the commander slot or the flagship's upgrades;
    /// `(squadron)` cards only fit squadron slots. Squadron slots take anything that is not
    /// a commander card. Untagged strings fit everywhere.
    pub fn admits(&self, display: &str) -> bool {
        let commander = has_commander_tag(display);
        let squadron = has_squadron_tag(display);
        match self {
            Self::Commander | Self::FlagshipUpgrade => commander || !squadron,
            Self::Squadron => !commander,
            Self::Ship | Self::ShipUpgrade | Self::Objective | Self::Unknown => {
                !commander && !squadron
            }
        }
    }

    /// Upgrade slots collide with officer cards of the same name; prefer the officer.
    pub fn prefers_officer(&self) -> bool {
        matches!(self, Self::ShipUpgrade | Self::FlagshipUpgrade)
    }
}

impl fmt::Display for UsageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UsageContext {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ship" => Ok(Self::Ship),
            "commander" => Ok(Self::Commander),
            "ship_upgrade" | "upgrade" => Ok(Self::ShipUpgrade),
            "flagship_upgrade" => Ok(Self::FlagshipUpgrade),
            "squadron" => Ok(Self::Squadron),
            "objective" => Ok(Self::Objective),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown usage context '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commander_tag_only_admitted_in_commander_slots() {
        let display = "Darth Vader (Commander) (36)";
        assert!(UsageContext::Commander.admits(display));
        assert!(UsageContext::FlagshipUpgrade.admits(display));
        assert!(!UsageContext::Squadron.admits(display));
        assert!(!UsageContext::ShipUpgrade.admits(display));
        assert!(!UsageContext::Ship.admits(display));
    }

    #[test]
    fn squadron_tag_only_admitted_in_squadron_slots() {
        let display = "Darth Vader (Squadron) (21)";
        assert!(UsageContext::Squadron.admits(display));
        assert!(!UsageContext::Commander.admits(display));
        assert!(!UsageContext::ShipUpgrade.admits(display));
        assert!(!UsageContext::Objective.admits(display));
    }

    #[test]
    fn untagged_strings_admitted_everywhere() {
        for ctx in [
            UsageContext::Ship,
            UsageContext::Commander,
            UsageContext::ShipUpgrade,
            UsageContext::FlagshipUpgrade,
            UsageContext::Squadron,
            UsageContext::Objective,
            UsageContext::Unknown,
        ] {
            assert!(ctx.admits("Comms Net (2)"), "{ctx} should admit untagged");
        }
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("flagship-upgrade".parse(), Ok(UsageContext::FlagshipUpgrade));
        assert_eq!("Upgrade".parse(), Ok(UsageContext::ShipUpgrade));
        assert!("hull".parse::<UsageContext>().is_err());
    }
}
