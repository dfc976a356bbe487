use crate::types::error::SeriesError;
use crate::types::fused_frame::FusedLazyFrame;
use crate::types::time_series::{index_frame, read_timestamps};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Name of the timestamp column in every frame this crate builds.
pub const DATETIME_COLUMN: &str = "datetime";

/// All requested parameters on one shared time index.
///
/// Wraps a polars `DataFrame` with a `datetime` column (`Datetime(ms)`, UTC-naive, sorted)
/// followed by one `f64` column per parameter, in registry order. Produced by
/// [`crate::fusion::fuse`] and regridded by [`crate::resample::align`].
#[derive(Debug, Clone, PartialEq)]
pub struct FusedTable {
    frame: DataFrame,
}

impl Default for FusedTable {
    fn default() -> Self {
        let frame = index_frame(&[]).unwrap_or_default();
        Self { frame }
    }
}

impl FusedTable {
    /// Wraps a frame whose first column is `datetime`.
    pub(crate) fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn index(&self) -> Result<Vec<NaiveDateTime>, SeriesError> {
        read_timestamps(self.frame.column(DATETIME_COLUMN)?)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(PlSmallStr::as_str)
            .filter(|name| *name != DATETIME_COLUMN)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Float64Chunked> {
        if name == DATETIME_COLUMN {
            return None;
        }
        self.frame.column(name).ok()?.f64().ok()
    }

    /// Values of column `name` in index order.
    pub fn values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        Some(self.column(name)?.into_iter().collect())
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width().saturating_sub(1)
    }

    pub fn value_at(&self, name: &str, timestamp: NaiveDateTime) -> Option<f64> {
        let row = self.index().ok()?.binary_search(&timestamp).ok()?;
        self.column(name)?.get(row)
    }

    pub fn into_lazy(self) -> FusedLazyFrame {
        FusedLazyFrame::new(self.frame.lazy())
    }

    /// A table on `index` with the given columns, for tests.
    #[cfg(test)]
    pub(crate) fn from_columns(
        index: &[NaiveDateTime],
        columns: &[(&str, Vec<Option<f64>>)],
    ) -> PolarsResult<Self> {
        let mut frame = index_frame(index)?;
        for (name, values) in columns {
            frame.with_column(Series::new((*name).into(), values))?;
        }
        Ok(Self { frame })
    }
}
