//! Puts a fused table onto the regular output grid.
//!
//! Each column is interpolated only between its first and last observation. Grid
//! points outside that span stay missing and are reported, never extrapolated. The work
//! is a polars join of the grid into the table followed by per-column fill expressions.

use crate::registry::error::ConfigurationError;
use crate::types::frequency::Frequency;
use crate::types::fused_table::{FusedTable, DATETIME_COLUMN};
use crate::types::time_range::TimeRange;
use crate::types::time_series::index_frame;
use chrono::NaiveDateTime;
use log::debug;
use polars::prelude::{
    col, lit, when, DataFrame, DataType, Expr, IntoLazy, JoinArgs, JoinCoalesce, JoinType,
    PolarsResult, SortMultipleOptions, NULL,
};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How gaps inside a column's observed span are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum InterpolationMethod {
    /// Linear in time between the neighbouring observations.
    #[default]
    Time,
    /// Closest observation; ties go to the earlier one.
    Nearest,
    /// Last observation at or before the grid point.
    Previous,
    /// Only grid points with an exact record get a value.
    Exact,
}

impl FromStr for InterpolationMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" | "linear" => Ok(InterpolationMethod::Time),
            "nearest" => Ok(InterpolationMethod::Nearest),
            "previous" | "pad" | "ffill" => Ok(InterpolationMethod::Previous),
            "exact" | "none" => Ok(InterpolationMethod::Exact),
            _ => Err(ConfigurationError::UnknownInterpolation(s.to_string())),
        }
    }
}

impl TryFrom<String> for InterpolationMethod {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationMethod::Time => "time",
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Previous => "previous",
            InterpolationMethod::Exact => "exact",
        };
        f.write_str(name)
    }
}

/// Grid points of one column that fell outside its observed span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentWarning {
    pub column: String,
    /// Number of grid points left missing because they precede the first or follow
    /// the last observation.
    pub outside_span: usize,
    /// `None` when the column has no observations at all.
    pub observed: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.observed {
            Some((first, last)) => write!(
                f,
                "'{}': {} grid points outside the observed span {} to {} were left missing",
                self.column, self.outside_span, first, last
            ),
            None => write!(
                f,
                "'{}': no observations, all {} grid points are missing",
                self.column, self.outside_span
            ),
        }
    }
}

/// The table on the output grid, plus any span warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub table: FusedTable,
    pub warnings: Vec<AlignmentWarning>,
}

impl InterpolationMethod {
    /// Expression filling the gaps of column `name` in a frame sorted by `datetime`.
    ///
    /// Rows before the column's first or after its last observation are left null.
    fn fill(self, name: &str) -> Expr {
        let observed = col(DATETIME_COLUMN).filter(col(name).is_not_null());
        let inside_span = col(DATETIME_COLUMN)
            .gt_eq(observed.clone().min())
            .and(col(DATETIME_COLUMN).lt_eq(observed.max()));
        let filled = match self {
            InterpolationMethod::Time => col(name).interpolate_by(col(DATETIME_COLUMN)),
            InterpolationMethod::Nearest => {
                let at = col(DATETIME_COLUMN).cast(DataType::Int64);
                let observed_at = when(col(name).is_not_null())
                    .then(at.clone())
                    .otherwise(lit(NULL));
                let since_before = at.clone() - observed_at.clone().forward_fill(None);
                let until_after = observed_at.backward_fill(None) - at;
                when(since_before.lt_eq(until_after))
                    .then(col(name).forward_fill(None))
                    .otherwise(col(name).backward_fill(None))
            }
            InterpolationMethod::Previous => col(name).forward_fill(None),
            InterpolationMethod::Exact => col(name),
        };
        when(inside_span)
            .then(filled)
            .otherwise(lit(NULL))
            .alias(name)
    }
}

/// Interpolates every non-`datetime` column of `frame` onto `grid`.
///
/// `frame` must be sorted by `datetime`. The grid timestamps are joined into the frame,
/// gaps are filled with `method`, and only the grid rows are kept. Column order is
/// preserved.
pub fn regrid(
    frame: &DataFrame,
    grid: &[NaiveDateTime],
    method: InterpolationMethod,
) -> PolarsResult<DataFrame> {
    let fills: Vec<Expr> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATETIME_COLUMN)
        .map(|name| method.fill(name.as_str()))
        .collect();
    let grid_frame = index_frame(grid)?;
    let filled = grid_frame
        .clone()
        .lazy()
        .join(
            frame.clone().lazy(),
            [col(DATETIME_COLUMN)],
            [col(DATETIME_COLUMN)],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .sort([DATETIME_COLUMN], SortMultipleOptions::default())
        .with_columns(fills);
    grid_frame
        .lazy()
        .join(
            filled,
            [col(DATETIME_COLUMN)],
            [col(DATETIME_COLUMN)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([DATETIME_COLUMN], SortMultipleOptions::default())
        .collect()
}

/// Resamples every column of `table` onto `time_range.grid(frequency)`.
pub fn align(
    table: &FusedTable,
    time_range: &TimeRange,
    frequency: Frequency,
    method: InterpolationMethod,
) -> PolarsResult<Alignment> {
    let grid = time_range.grid(frequency);
    let aligned = FusedTable::from_frame(regrid(table.frame(), &grid, method)?);

    let mut warnings = Vec::new();
    for name in table.column_names() {
        let observed = observed_span(table.frame(), name)?;
        let outside_span = match observed {
            Some((first, last)) => grid.iter().filter(|ts| **ts < first || **ts > last).count(),
            None => grid.len(),
        };
        if outside_span > 0 {
            warnings.push(AlignmentWarning {
                column: name.to_string(),
                outside_span,
                observed,
            });
        }
    }

    debug!(
        "Aligned {} columns onto {} points every {} ({} interpolation)",
        aligned.width(),
        grid.len(),
        frequency,
        method
    );
    Ok(Alignment {
        table: aligned,
        warnings,
    })
}

/// First and last timestamps at which column `name` has a value.
fn observed_span(
    frame: &DataFrame,
    name: &str,
) -> PolarsResult<Option<(NaiveDateTime, NaiveDateTime)>> {
    let observed = col(DATETIME_COLUMN).filter(col(name).is_not_null());
    let span = frame
        .clone()
        .lazy()
        .select([
            observed.clone().min().alias("first"),
            observed.max().alias("last"),
        ])
        .collect()?;
    let first = span.column("first")?.datetime()?.as_datetime_iter().next().flatten();
    let last = span.column("last")?.datetime()?.as_datetime_iter().next().flatten();
    Ok(first.zip(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn range(start: NaiveDateTime, end: NaiveDateTime) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_parse_methods() -> Result<(), ConfigurationError> {
        assert_eq!("linear".parse::<InterpolationMethod>()?, InterpolationMethod::Time);
        assert_eq!("ffill".parse::<InterpolationMethod>()?, InterpolationMethod::Previous);
        assert_eq!("None".parse::<InterpolationMethod>()?, InterpolationMethod::Exact);
        assert!(matches!(
            "cubic".parse::<InterpolationMethod>(),
            Err(ConfigurationError::UnknownInterpolation(_))
        ));
        assert_eq!(InterpolationMethod::default(), InterpolationMethod::Time);
        Ok(())
    }

    fn assert_close(actual: Option<Vec<Option<f64>>>, expected: &[Option<f64>]) {
        let actual = actual.expect("column exists");
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            match (a, e) {
                (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected),
                (None, None) => {}
                _ => panic!("{:?} vs {:?}", actual, expected),
            }
        }
    }

    fn regrid_values(
        index: &[NaiveDateTime],
        values: Vec<Option<f64>>,
        grid: &[NaiveDateTime],
        method: InterpolationMethod,
    ) -> Option<Vec<Option<f64>>> {
        let table = FusedTable::from_columns(index, &[("value", values)]).unwrap();
        FusedTable::from_frame(regrid(table.frame(), grid, method).unwrap()).values("value")
    }

    #[test]
    fn test_time_interpolation_inside_span() {
        let index = [at(0, 0), at(1, 0), at(3, 0)];
        let values = vec![Some(10.0), None, Some(16.0)];
        let grid = [at(0, 0), at(0, 30), at(1, 0), at(2, 0), at(3, 0)];
        assert_close(
            regrid_values(&index, values, &grid, InterpolationMethod::Time),
            &[Some(10.0), Some(11.0), Some(12.0), Some(14.0), Some(16.0)],
        );
    }

    #[test]
    fn test_other_methods() {
        let index = [at(0, 0), at(1, 0)];
        let values = vec![Some(1.0), Some(2.0)];
        let grid = [at(0, 20), at(0, 30), at(0, 40)];
        assert_eq!(
            regrid_values(&index, values.clone(), &grid, InterpolationMethod::Nearest),
            Some(vec![Some(1.0), Some(1.0), Some(2.0)])
        );
        assert_eq!(
            regrid_values(&index, values.clone(), &grid, InterpolationMethod::Previous),
            Some(vec![Some(1.0), Some(1.0), Some(1.0)])
        );
        assert_eq!(
            regrid_values(&index, values, &grid, InterpolationMethod::Exact),
            Some(vec![None, None, None])
        );
    }

    #[test]
    fn test_regrid_keeps_only_grid_rows() -> Result<(), Box<dyn std::error::Error>> {
        let table = FusedTable::from_columns(
            &[at(0, 10), at(0, 50), at(1, 10)],
            &[("pressure", vec![Some(1000.0), Some(1004.0), Some(1008.0)])],
        )?;
        let grid = [at(0, 30), at(1, 0)];
        let frame = regrid(table.frame(), &grid, InterpolationMethod::Time)?;
        let regridded = FusedTable::from_frame(frame);
        assert_eq!(regridded.index()?, grid.to_vec());
        assert_close(regridded.values("pressure"), &[Some(1002.0), Some(1006.0)]);
        Ok(())
    }

    #[test]
    fn test_never_extrapolates() -> Result<(), Box<dyn std::error::Error>> {
        let table = FusedTable::from_columns(
            &[at(2, 0), at(3, 0), at(4, 0)],
            &[
                ("temperature", vec![Some(20.0), Some(21.0), Some(22.0)]),
                ("precipitation", vec![None, None, None]),
            ],
        )?;

        let alignment = align(
            &table,
            &range(at(0, 0), at(6, 0)),
            Frequency::hours(1),
            InterpolationMethod::Time,
        )?;
        assert_eq!(alignment.table.height(), 7);
        assert_close(
            alignment.table.values("temperature"),
            &[None, None, Some(20.0), Some(21.0), Some(22.0), None, None],
        );

        assert_eq!(alignment.warnings.len(), 2);
        let temperature = &alignment.warnings[0];
        assert_eq!(temperature.column, "temperature");
        assert_eq!(temperature.outside_span, 4);
        assert_eq!(temperature.observed, Some((at(2, 0), at(4, 0))));
        let precipitation = &alignment.warnings[1];
        assert_eq!(precipitation.observed, None);
        assert_eq!(precipitation.outside_span, 7);
        assert!(precipitation.to_string().contains("no observations"));
        Ok(())
    }

    #[test]
    fn test_previous_does_not_run_past_last_observation() -> Result<(), Box<dyn std::error::Error>> {
        let table = FusedTable::from_columns(
            &[at(1, 0), at(2, 0)],
            &[("wind_speed", vec![Some(3.0), Some(4.0)])],
        )?;
        let alignment = align(
            &table,
            &range(at(0, 0), at(3, 0)),
            Frequency::hours(1),
            InterpolationMethod::Previous,
        )?;
        assert_eq!(
            alignment.table.values("wind_speed"),
            Some(vec![None, Some(3.0), Some(4.0), None])
        );
        assert_eq!(alignment.warnings[0].outside_span, 2);
        Ok(())
    }

    #[test]
    fn test_full_coverage_has_no_warnings() -> Result<(), Box<dyn std::error::Error>> {
        let table = FusedTable::from_columns(
            &[at(0, 0), at(1, 0)],
            &[("pressure", vec![Some(1000.0), Some(1002.0)])],
        )?;
        let alignment = align(
            &table,
            &range(at(0, 0), at(1, 0)),
            Frequency::minutes(15),
            InterpolationMethod::Time,
        )?;
        assert!(alignment.warnings.is_empty());
        assert_close(
            alignment.table.values("pressure"),
            &[Some(1000.0), Some(1000.5), Some(1001.0), Some(1001.5), Some(1002.0)],
        );
        Ok(())
    }

    #[test]
    fn test_columns_keep_order() -> Result<(), Box<dyn std::error::Error>> {
        let table = FusedTable::from_columns(
            &[at(0, 0)],
            &[("zenith", vec![Some(80.0)]), ("azimuth", vec![Some(90.0)])],
        )?;
        let alignment = align(
            &table,
            &range(at(0, 0), at(0, 0)),
            Frequency::hours(1),
            InterpolationMethod::Time,
        )?;
        assert_eq!(alignment.table.column_names(), vec!["zenith", "azimuth"]);
        Ok(())
    }
}
