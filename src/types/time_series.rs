use crate::types::error::SeriesError;
use crate::types::fused_table::DATETIME_COLUMN;
use crate::types::time_range::TimeRange;
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Name of the value column in a [`TimeSeries`] frame.
pub const VALUE_COLUMN: &str = "value";

/// One time-indexed numeric column from a single source.
///
/// Backed by a two-column polars `DataFrame`: `datetime` (`Datetime(ms)`, UTC-naive)
/// and `value` (`f64`). The index is strictly increasing (no duplicate timestamps).
/// Missing values are null; `NaN` readings are stored as null.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    frame: DataFrame,
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self {
            frame: empty_series_frame(),
        }
    }
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<Option<f64>>) -> Result<Self, SeriesError> {
        if index.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                index: index.len(),
                values: values.len(),
            });
        }
        check_increasing(&index)?;
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        let frame = DataFrame::new(vec![
            datetime_column(DATETIME_COLUMN, &index)?,
            Series::new(VALUE_COLUMN.into(), values).into(),
        ])?;
        Ok(Self { frame })
    }

    pub fn from_points(
        points: impl IntoIterator<Item = (NaiveDateTime, Option<f64>)>,
    ) -> Result<Self, SeriesError> {
        let (index, values) = points.into_iter().unzip();
        Self::new(index, values)
    }

    /// Wraps a frame holding a `datetime` and a `value` column.
    ///
    /// The timestamps are cast to milliseconds and the values to `f64`; other columns are
    /// dropped. Fails when a timestamp is missing or the index is not strictly increasing.
    pub fn from_frame(frame: DataFrame) -> Result<Self, SeriesError> {
        let frame = frame
            .lazy()
            .select([
                col(DATETIME_COLUMN).cast(DataType::Datetime(TimeUnit::Milliseconds, None)),
                col(VALUE_COLUMN)
                    .cast(DataType::Float64)
                    .fill_nan(lit(NULL)),
            ])
            .collect()?;
        let index = read_timestamps(frame.column(DATETIME_COLUMN)?)?;
        check_increasing(&index)?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn index(&self) -> Vec<NaiveDateTime> {
        self.frame
            .column(DATETIME_COLUMN)
            .ok()
            .and_then(|column| read_timestamps(column).ok())
            .unwrap_or_default()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.value_column()
            .map(|values| values.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Value recorded at exactly `timestamp`.
    pub fn get(&self, timestamp: NaiveDateTime) -> Option<f64> {
        let row = self.index().binary_search(&timestamp).ok()?;
        self.value_column()?.get(row)
    }

    /// Points inside `range`, plus the nearest point on either side of it so the
    /// range edges can still be interpolated.
    pub fn window(&self, range: &TimeRange) -> TimeSeries {
        let index = self.index();
        let lower = index.partition_point(|ts| *ts < range.start());
        let upper = index.partition_point(|ts| *ts <= range.end());
        let from = lower.saturating_sub(1);
        let to = (upper + 1).min(index.len());
        TimeSeries {
            frame: self.frame.slice(from as i64, to.saturating_sub(from)),
        }
    }

    /// Replaces every value below `floor` with `floor`; missing values stay missing.
    pub fn clamp_min(&self, floor: f64) -> PolarsResult<TimeSeries> {
        let frame = self
            .lazy()
            .with_column(
                when(col(VALUE_COLUMN).lt(lit(floor)))
                    .then(lit(floor))
                    .otherwise(col(VALUE_COLUMN))
                    .alias(VALUE_COLUMN),
            )
            .collect()?;
        Ok(TimeSeries { frame })
    }

    fn value_column(&self) -> Option<&Float64Chunked> {
        self.frame.column(VALUE_COLUMN).ok()?.f64().ok()
    }
}

/// A `Datetime(ms)` column holding `index`.
pub(crate) fn datetime_column(name: &str, index: &[NaiveDateTime]) -> PolarsResult<Column> {
    let millis: Vec<i64> = index
        .iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series.into())
}

/// A frame with only a `datetime` column.
pub(crate) fn index_frame(index: &[NaiveDateTime]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![datetime_column(DATETIME_COLUMN, index)?])
}

pub(crate) fn read_timestamps(column: &Column) -> Result<Vec<NaiveDateTime>, SeriesError> {
    column
        .datetime()?
        .as_datetime_iter()
        .enumerate()
        .map(|(position, ts)| ts.ok_or(SeriesError::MissingTimestamp(position)))
        .collect()
}

fn check_increasing(index: &[NaiveDateTime]) -> Result<(), SeriesError> {
    match index.windows(2).position(|pair| pair[0] >= pair[1]) {
        Some(position) => Err(SeriesError::NonIncreasingIndex {
            position: position + 1,
            previous: index[position],
            current: index[position + 1],
        }),
        None => Ok(()),
    }
}

fn empty_series_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new_empty(
            DATETIME_COLUMN.into(),
            &DataType::Datetime(TimeUnit::Milliseconds, None),
        )
        .into(),
        Series::new_empty(VALUE_COLUMN.into(), &DataType::Float64).into(),
    ])
    .unwrap_or_default()
}
