//! Parameters that are a fixed share of another parameter, e.g. direct shortwave as 80% of
//! global shortwave.

use crate::resolve::error::UnsupportedParameterError;
use crate::resolve::{ensure_complete, Resolution, ResolvedFrom};
use crate::types::fraction::Fraction;
use crate::types::fused_table::FusedTable;
use polars::prelude::{col, lit};

#[derive(Debug, Clone, PartialEq)]
pub struct FractionalSplit {
    pub name: String,
    pub base: String,
    pub fraction: Fraction,
}

/// Computes `base * fraction` for every request whose base column is in `table`.
///
/// Siblings are independent: their fractions need not add up to 1.
///
/// # Errors
///
/// [`UnsupportedParameterError`] listing every request whose base column is absent.
/// No columns are returned in that case.
pub fn resolve(
    requests: &[FractionalSplit],
    table: &FusedTable,
) -> Result<Resolution, UnsupportedParameterError> {
    let mut resolution = Resolution::default();

    for request in requests {
        if table.column(&request.base).is_none() {
            continue;
        }
        resolution.columns.push(
            (col(request.base.as_str()) * lit(request.fraction.get())).alias(request.name.as_str()),
        );
        resolution.record.resolved.push((
            request.name.clone(),
            ResolvedFrom::Fraction {
                base: request.base.clone(),
                fraction: request.fraction,
            },
        ));
    }

    ensure_complete(requests.iter().map(|r| r.name.as_str()), &resolution.record)?;
    Ok(resolution)
}
