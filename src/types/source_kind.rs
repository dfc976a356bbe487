//! Where a parameter's values come from.

use crate::resolve::derived::DerivedFormula;
use crate::types::fraction::Fraction;
use std::fmt;

/// Payload-free discriminant of [`SourceKind`], used to bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceBucket {
    /// Ground-station records.
    Station,
    /// Gridded reanalysis product.
    Gridded,
    /// Solar zenith/azimuth model.
    SolarPosition,
    /// A fixed share of another parameter.
    FractionalSplit,
    /// Closed-form function of two other parameters.
    Derived,
}

impl SourceBucket {
    pub const ALL: [SourceBucket; 5] = [
        SourceBucket::Station,
        SourceBucket::Gridded,
        SourceBucket::SolarPosition,
        SourceBucket::FractionalSplit,
        SourceBucket::Derived,
    ];

    /// Direct buckets are copied from a source table; the others are computed from them.
    pub fn is_direct(self) -> bool {
        matches!(
            self,
            SourceBucket::Station | SourceBucket::Gridded | SourceBucket::SolarPosition
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceBucket::Station => "station",
            SourceBucket::Gridded => "gridded",
            SourceBucket::SolarPosition => "solar-position",
            SourceBucket::FractionalSplit => "fractional-split",
            SourceBucket::Derived => "derived",
        }
    }
}

impl fmt::Display for SourceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved source of one parameter, with the data each kind needs.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Column `key` (or the parameter name) of the station table.
    Station { key: Option<String> },
    /// Column `key` (or the parameter name) of the gridded table.
    Gridded { key: Option<String> },
    /// `zenith` or `azimuth` from the solar-position table.
    SolarPosition { key: Option<String> },
    /// `base * fraction`.
    FractionalSplit { base: String, fraction: Fraction },
    /// `formula(inputs[0], inputs[1])`.
    Derived {
        formula: DerivedFormula,
        inputs: [String; 2],
    },
}

impl SourceKind {
    pub fn bucket(&self) -> SourceBucket {
        match self {
            SourceKind::Station { .. } => SourceBucket::Station,
            SourceKind::Gridded { .. } => SourceBucket::Gridded,
            SourceKind::SolarPosition { .. } => SourceBucket::SolarPosition,
            SourceKind::FractionalSplit { .. } => SourceBucket::FractionalSplit,
            SourceKind::Derived { .. } => SourceBucket::Derived,
        }
    }

    /// Parameters this one is computed from. Empty for direct sources.
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            SourceKind::Station { .. }
            | SourceKind::Gridded { .. }
            | SourceKind::SolarPosition { .. } => Vec::new(),
            SourceKind::FractionalSplit { base, .. } => vec![base.as_str()],
            SourceKind::Derived { inputs, .. } => inputs.iter().map(String::as_str).collect(),
        }
    }
}

/// A named physical quantity and where it comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub source: SourceKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, source: SourceKind) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn station(name: impl Into<String>, key: Option<&str>) -> Self {
        Self::new(
            name,
            SourceKind::Station {
                key: key.map(str::to_string),
            },
        )
    }

    pub fn gridded(name: impl Into<String>) -> Self {
        Self::new(name, SourceKind::Gridded { key: None })
    }

    pub fn solar_position(name: impl Into<String>) -> Self {
        Self::new(name, SourceKind::SolarPosition { key: None })
    }

    pub fn fractional(name: impl Into<String>, base: impl Into<String>, fraction: Fraction) -> Self {
        Self::new(
            name,
            SourceKind::FractionalSplit {
                base: base.into(),
                fraction,
            },
        )
    }

    /// Derived with the formula's standard inputs.
    pub fn derived(name: impl Into<String>, formula: DerivedFormula) -> Self {
        let [first, second] = formula.default_inputs();
        Self::new(
            name,
            SourceKind::Derived {
                formula,
                inputs: [first.to_string(), second.to_string()],
            },
        )
    }

    /// Column name to look up in the source table, for direct sources.
    pub fn lookup_key(&self) -> &str {
        match &self.source {
            SourceKind::Station { key }
            | SourceKind::Gridded { key }
            | SourceKind::SolarPosition { key } => key.as_deref().unwrap_or(&self.name),
            SourceKind::FractionalSplit { .. } | SourceKind::Derived { .. } => &self.name,
        }
    }
}
