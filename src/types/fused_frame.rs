//! Contains the `FusedLazyFrame` wrapper used to hand a fused table to downstream consumers.

use crate::error::MetforceError;
use crate::types::any_datetime::AnyDateTime;
use crate::types::fused_table::DATETIME_COLUMN;
use polars::prelude::{col, lit, Expr, LazyFrame};

/// A wrapper around a Polars `LazyFrame` holding fused (and usually aligned) data.
///
/// The frame has a timezone-naive UTC `datetime` column followed by one `f64` column per
/// parameter. Instances are obtained via [`crate::FusedTable::into_lazy`].
///
/// # Errors
///
/// Operations that trigger computation on the underlying `LazyFrame` (e.g. `.collect()`)
/// can return a [`polars::prelude::PolarsError`]. The range methods return
/// [`MetforceError::DateParsing`] if a bound cannot be resolved to a timestamp.
#[derive(Clone)]
pub struct FusedLazyFrame {
    /// The underlying Polars LazyFrame.
    pub frame: LazyFrame,
}

impl FusedLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Applies an arbitrary Polars predicate lazily, returning a new frame.
    ///
    /// ```no_run
    /// # use metforce::FusedLazyFrame;
    /// use polars::prelude::{col, lit};
    /// # fn run(fused: FusedLazyFrame) -> Result<(), Box<dyn std::error::Error>> {
    /// let daylight = fused.filter(col("zenith").lt(lit(90.0f64)));
    /// println!("{}", daylight.frame.collect()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> FusedLazyFrame {
        FusedLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Rows with `start <= datetime <= end`.
    pub fn get_range(
        &self,
        start: impl AnyDateTime,
        end: impl AnyDateTime,
    ) -> Result<FusedLazyFrame, MetforceError> {
        let start_naive = start.to_naive_utc().ok_or(MetforceError::DateParsing)?;
        let end_naive = end.to_naive_utc().ok_or(MetforceError::DateParsing)?;

        Ok(self.filter(
            col(DATETIME_COLUMN)
                .gt_eq(lit(start_naive))
                .and(col(DATETIME_COLUMN).lt_eq(lit(end_naive))),
        ))
    }

    /// The row stamped exactly at `datetime`, if any.
    pub fn get_at(&self, datetime: impl AnyDateTime) -> Result<FusedLazyFrame, MetforceError> {
        let at = datetime.to_naive_utc().ok_or(MetforceError::DateParsing)?;
        Ok(self.filter(col(DATETIME_COLUMN).eq(lit(at))))
    }
}

#[cfg(test)]
mod tests {
    use crate::types::fused_table::FusedTable;
    use chrono::{NaiveDate, NaiveDateTime};
    use polars::prelude::*;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> FusedTable {
        let index: Vec<_> = (0..6).map(hour).collect();
        FusedTable::from_columns(
            &index,
            &[("temperature", (0..6).map(|h| Some(h as f64)).collect())],
        )
        .unwrap()
    }

    #[test]
    fn test_get_range_inclusive() -> Result<(), Box<dyn std::error::Error>> {
        let lazy = sample().into_lazy();
        let df = lazy.get_range("2023-06-01 01:00", "2023-06-01 03:00")?.frame.collect()?;
        assert_eq!(df.height(), 3);
        let temps: Vec<Option<f64>> = df.column("temperature")?.f64()?.into_iter().collect();
        assert_eq!(temps, vec![Some(1.0), Some(2.0), Some(3.0)]);
        Ok(())
    }

    #[test]
    fn test_get_at_and_filter() -> Result<(), Box<dyn std::error::Error>> {
        let lazy = sample().into_lazy();
        let df = lazy.get_at(hour(4))?.frame.collect()?;
        assert_eq!(df.height(), 1);

        let warm = lazy.filter(col("temperature").gt(lit(3.5f64))).frame.collect()?;
        assert_eq!(warm.height(), 2);
        Ok(())
    }

    #[test]
    fn test_bad_bound() -> Result<(), Box<dyn std::error::Error>> {
        let lazy = sample().into_lazy();
        assert!(lazy.get_range("soon", hour(3)).is_err());
        Ok(())
    }
}
