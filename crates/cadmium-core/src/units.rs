//! Length units of the JSON source

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Length unit the JSON coordinates are expressed in.
///
/// The kernel works in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Meters (scale by 100)
    #[default]
    Meters,
    /// Centimeters (no scaling)
    Centimeters,
    /// Millimeters (scale by 0.1)
    Millimeters,
    /// Inches (scale by 2.54)
    Inches,
}

impl LengthUnit {
    /// Multiplier from this unit to kernel centimeters
    pub fn scale_to_kernel(&self) -> f64 {
        match self {
            LengthUnit::Meters => 100.0,
            LengthUnit::Centimeters => 1.0,
            LengthUnit::Millimeters => 0.1,
            LengthUnit::Inches => 2.54,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LengthUnit::Meters => "Meters",
            LengthUnit::Centimeters => "Centimeters",
            LengthUnit::Millimeters => "Millimeters",
            LengthUnit::Inches => "Inches",
        }
    }

    /// Short symbol accepted on the command line
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Meters => "m",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Millimeters => "mm",
            LengthUnit::Inches => "in",
        }
    }

    /// Whether `text` (lowercase) names this unit, in singular or plural
    fn matches(&self, text: &str) -> bool {
        let plural = self.name().to_ascii_lowercase();
        text == self.symbol()
            || text == plural
            || plural.strip_suffix("es") == Some(text)
            || plural.strip_suffix('s') == Some(text)
    }

    pub const ALL: &'static [LengthUnit] = &[
        LengthUnit::Meters,
        LengthUnit::Centimeters,
        LengthUnit::Millimeters,
        LengthUnit::Inches,
    ];
}

/// Unknown unit name
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown length unit '{0}' (expected {expected})", expected = expected_symbols())]
pub struct UnknownUnit(pub String);

fn expected_symbols() -> String {
    let symbols: Vec<_> = LengthUnit::ALL.iter().map(LengthUnit::symbol).collect();
    match symbols.split_last() {
        Some((last, [])) => last.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        None => String::new(),
    }
}

impl FromStr for LengthUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        LengthUnit::ALL
            .iter()
            .find(|unit| unit.matches(&text))
            .copied()
            .ok_or_else(|| UnknownUnit(s.to_string()))
    }
}
