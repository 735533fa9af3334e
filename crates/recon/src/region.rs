//! Region heuristics for routes.
//!
//! Evaluated as an ordered rule table, first match wins. Rules 3-5 carry an
//! AND clause that the adjoining OR clauses already cover; they are kept as
//! written so the table reads the same as the business rules it encodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    SaoPaulo,
    RioDeJaneiro,
    Nespresso,
    Dafiti,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::SaoPaulo,
        Region::RioDeJaneiro,
        Region::Nespresso,
        Region::Dafiti,
    ];

    /// Label used in reports and exports.
    pub fn label(self) -> &'static str {
        match self {
            Region::SaoPaulo => "São Paulo",
            Region::RioDeJaneiro => "Rio De Janeiro",
            Region::Nespresso => "Nespresso",
            Region::Dafiti => "Dafiti",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = String;

    /// Accepts the snake_case name or the display label, ignoring case and accents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = crate::text::fold(s).replace(['_', '-'], " ");
        match key.as_str() {
            "sao paulo" | "sp" => Ok(Region::SaoPaulo),
            "rio de janeiro" | "rj" => Ok(Region::RioDeJaneiro),
            "nespresso" => Ok(Region::Nespresso),
            "dafiti" => Ok(Region::Dafiti),
            _ => Err(format!(
                "unknown region '{s}' (expected one of: all, sao_paulo, rio_de_janeiro, nespresso, dafiti)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Narrows aggregate output to one region, or keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(Region),
}

impl RegionFilter {
    pub fn admits(self, region: Region) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Only(r) => r == region,
        }
    }
}

impl FromStr for RegionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::text::fold(s).as_str() {
            "all" | "todos" | "" => Ok(RegionFilter::All),
            _ => s.parse().map(RegionFilter::Only),
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionFilter::All => f.write_str("all"),
            RegionFilter::Only(r) => write!(f, "{r}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Inputs to the rule table, vehicle and origin already upper-cased.
#[derive(Debug, Clone)]
pub struct RegionInput {
    pub is_broker: bool,
    pub vehicle: String,
    pub origin: String,
}

impl RegionInput {
    pub fn new(is_broker: bool, vehicle: &str, origin: &str) -> Self {
        Self {
            is_broker,
            vehicle: vehicle.to_uppercase(),
            origin: origin.to_uppercase(),
        }
    }
}

pub struct RegionRule {
    pub name: &'static str,
    pub matches: fn(&RegionInput) -> bool,
    pub region: Region,
}

fn broker_driver(i: &RegionInput) -> bool {
    i.is_broker
}

fn nespresso(i: &RegionInput) -> bool {
    i.vehicle.contains("NESPRESSO") || i.origin.contains("NESPRESSO")
}

fn sao_paulo_pari(i: &RegionInput) -> bool {
    (i.vehicle.contains("SP") && i.origin.contains("PARI"))
        || i.vehicle.contains("PARI")
        || i.origin.contains("SP")
}

fn sao_paulo_barueri(i: &RegionInput) -> bool {
    (i.vehicle.contains("BARUERI") && i.origin.contains("BARUERI"))
        || i.vehicle.contains("BARUERI")
        || i.origin.contains("BARUERI")
}

fn rio_de_janeiro(i: &RegionInput) -> bool {
    (i.vehicle.contains("RJ") && i.origin.contains("CRISTOVAO"))
        || i.vehicle.contains("RJ")
        || i.origin.contains("RJ")
}

pub const REGION_RULES: &[RegionRule] = &[
    RegionRule { name: "broker", matches: broker_driver, region: Region::Dafiti },
    RegionRule { name: "nespresso", matches: nespresso, region: Region::Nespresso },
    RegionRule { name: "sao_paulo_pari", matches: sao_paulo_pari, region: Region::SaoPaulo },
    RegionRule { name: "sao_paulo_barueri", matches: sao_paulo_barueri, region: Region::SaoPaulo },
    RegionRule { name: "rio_de_janeiro", matches: rio_de_janeiro, region: Region::RioDeJaneiro },
];

/// Region when no rule matches.
pub const FALLBACK_REGION: Region = Region::Dafiti;

/// Name of the first matching rule, or `None` for the fallback.
pub fn matching_rule(input: &RegionInput) -> Option<&'static str> {
    REGION_RULES.iter().find(|r| (r.matches)(input)).map(|r| r.name)
}

pub fn classify_input(input: &RegionInput) -> Region {
    REGION_RULES
        .iter()
        .find(|r| (r.matches)(input))
        .map(|r| r.region)
        .unwrap_or(FALLBACK_REGION)
}

/// Region for a route given its driver's broker status and final vehicle/origin text.
pub fn classify(is_broker: bool, vehicle: &str, origin: &str) -> Region {
    classify_input(&RegionInput::new(is_broker, vehicle, origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(is_broker: bool, vehicle: &str, origin: &str) -> Option<&'static str> {
        matching_rule(&RegionInput::new(is_broker, vehicle, origin))
    }

    #[test]
    fn broker_beats_everything() {
        assert_eq!(classify(true, "NESPRESSO SP", "PARI"), Region::Dafiti);
        assert_eq!(rule(true, "", ""), Some("broker"));
    }

    #[test]
    fn nespresso_in_either_field() {
        assert_eq!(classify(false, "Fiorino Nespresso", ""), Region::Nespresso);
        assert_eq!(classify(false, "", "cd nespresso"), Region::Nespresso);
    }

    #[test]
    fn sao_paulo_variants() {
        assert_eq!(rule(false, "VAN SP", "Pari"), Some("sao_paulo_pari"));
        assert_eq!(rule(false, "base pari", "x"), Some("sao_paulo_pari"));
        assert_eq!(rule(false, "x", "Armazém SP"), Some("sao_paulo_pari"));
        // SP in the vehicle alone is not enough
        assert_eq!(rule(false, "VAN SP", "Centro"), None);
        assert_eq!(rule(false, "Barueri 01", "x"), Some("sao_paulo_barueri"));
        assert_eq!(classify(false, "x", "barueri"), Region::SaoPaulo);
    }

    #[test]
    fn rio_de_janeiro_variants() {
        assert_eq!(classify(false, "Van RJ", "São Cristovao"), Region::RioDeJaneiro);
        assert_eq!(classify(false, "x", "Base RJ"), Region::RioDeJaneiro);
        assert_eq!(rule(false, "rj-01", ""), Some("rio_de_janeiro"));
    }

    #[test]
    fn first_match_wins_in_table_order() {
        // origin matches both SP and RJ rules
        assert_eq!(classify(false, "", "SP/RJ"), Region::SaoPaulo);
        assert_eq!(classify(false, "NESPRESSO", "BARUERI"), Region::Nespresso);
    }

    #[test]
    fn fallback_is_dafiti() {
        assert_eq!(classify(false, "", ""), Region::Dafiti);
        assert_eq!(rule(false, "Fiorino", "Guarulhos"), None);
    }

    #[test]
    fn filter_parsing_and_admission() {
        assert_eq!("all".parse::<RegionFilter>(), Ok(RegionFilter::All));
        assert_eq!("Todos".parse::<RegionFilter>(), Ok(RegionFilter::All));
        assert_eq!(
            "São Paulo".parse::<RegionFilter>(),
            Ok(RegionFilter::Only(Region::SaoPaulo))
        );
        assert_eq!(
            "rio_de_janeiro".parse::<RegionFilter>(),
            Ok(RegionFilter::Only(Region::RioDeJaneiro))
        );
        assert!("atlantis".parse::<RegionFilter>().is_err());

        let only = RegionFilter::Only(Region::Nespresso);
        assert!(only.admits(Region::Nespresso));
        assert!(!only.admits(Region::Dafiti));
        assert!(RegionFilter::All.admits(Region::Dafiti));
    }
}
