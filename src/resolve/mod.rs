//! Resolvers for parameters computed from other, already fused parameters.
//!
//! Resolvers are pure: they check which columns a [`crate::FusedTable`] holds, return
//! polars expressions computing the new columns together with a [`ResolutionRecord`], and
//! leave evaluation and logging to the caller.

pub mod derived;
pub mod error;
pub mod fractional;

use crate::resolve::derived::DerivedFormula;
use crate::resolve::error::UnsupportedParameterError;
use crate::types::fraction::Fraction;
use polars::prelude::Expr;
use std::collections::BTreeSet;
use std::fmt;

/// How a computed column was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFrom {
    Fraction { base: String, fraction: Fraction },
    Formula { formula: DerivedFormula, inputs: [String; 2] },
}

impl fmt::Display for ResolvedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedFrom::Fraction { base, fraction } => write!(f, "{} of {}", fraction, base),
            ResolvedFrom::Formula { formula, inputs } => {
                write!(f, "{}({}, {})", formula, inputs[0], inputs[1])
            }
        }
    }
}

/// What a resolver produced, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolutionRecord {
    pub resolved: Vec<(String, ResolvedFrom)>,
}

impl ResolutionRecord {
    pub fn names(&self) -> BTreeSet<&str> {
        self.resolved.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl fmt::Display for ResolutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .resolved
            .iter()
            .map(|(name, from)| format!("{} = {}", name, from))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Output of a resolver: one aliased expression per computed column, and the record.
///
/// The expressions only reference columns of the table they were resolved against.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub columns: Vec<Expr>,
    pub record: ResolutionRecord,
}

/// Shared completeness check: every requested name must have been resolved.
pub(crate) fn ensure_complete<'a>(
    requested: impl IntoIterator<Item = &'a str>,
    record: &ResolutionRecord,
) -> Result<(), UnsupportedParameterError> {
    let resolved = record.names();
    let missing: BTreeSet<String> = requested
        .into_iter()
        .filter(|name| !resolved.contains(name))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(UnsupportedParameterError { missing })
    }
}
