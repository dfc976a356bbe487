use crate::registry::defaults::PRECIPITATION;
use crate::resample::{regrid, InterpolationMethod};
use crate::sources::error::SourceError;
use crate::types::frequency::Frequency;
use crate::types::fused_table::DATETIME_COLUMN;
use crate::types::time_range::TimeRange;
use crate::types::time_series::{index_frame, TimeSeries, VALUE_COLUMN};
use log::trace;
use polars::prelude::{
    col, lit, when, ClosedWindow, DataType, Duration, DynamicGroupOptions, Expr, IntoLazy, JoinArgs,
    JoinType, Label, SortMultipleOptions, StartBy, NULL,
};

/// How a station column is reduced to one value per output bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    /// Accumulated quantities are summed, state variables averaged.
    pub fn for_parameter(parameter: &str) -> Self {
        if parameter == PRECIPITATION {
            Aggregation::Sum
        } else {
            Aggregation::Mean
        }
    }

    /// A bin without any value reduces to null for both aggregations.
    fn expr(self) -> Expr {
        match self {
            Aggregation::Sum => when(col(VALUE_COLUMN).count().gt(lit(0)))
                .then(col(VALUE_COLUMN).sum())
                .otherwise(lit(NULL))
                .alias(VALUE_COLUMN),
            Aggregation::Mean => col(VALUE_COLUMN).mean().alias(VALUE_COLUMN),
        }
    }
}

/// Brings raw station records onto the output grid.
///
/// Records are first interpolated onto the station's own cadence, then grouped into
/// output-frequency bins labelled by their left edge, and finally looked up at each
/// output timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationPreparation {
    pub station_frequency: Frequency,
    pub output_frequency: Frequency,
    pub method: InterpolationMethod,
}

impl StationPreparation {
    pub fn new(
        station_frequency: Frequency,
        output_frequency: Frequency,
        method: InterpolationMethod,
    ) -> Self {
        Self {
            station_frequency,
            output_frequency,
            method,
        }
    }

    pub fn prepare(
        &self,
        parameter: &str,
        raw: &TimeSeries,
        time_range: &TimeRange,
    ) -> Result<TimeSeries, SourceError> {
        let grid = index_frame(&time_range.grid(self.output_frequency))?;
        let index = raw.index();
        let (Some(first), Some(last)) = (index.first(), index.last()) else {
            let empty = grid
                .lazy()
                .with_column(lit(NULL).cast(DataType::Float64).alias(VALUE_COLUMN))
                .collect()?;
            return Ok(TimeSeries::from_frame(empty)?);
        };

        let cadence = TimeRange::spanning(self.station_frequency.floor(*first), *last)
            .grid(self.station_frequency);
        let filled = regrid(raw.frame(), &cadence, self.method)?;

        let bin = self.output_frequency.polars_duration()?;
        let aggregation = Aggregation::for_parameter(parameter);
        let binned = filled
            .lazy()
            .group_by_dynamic(
                col(DATETIME_COLUMN),
                Vec::<Expr>::new(),
                DynamicGroupOptions {
                    every: bin,
                    period: bin,
                    offset: Duration::try_parse("0s")?,
                    label: Label::Left,
                    include_boundaries: false,
                    closed_window: ClosedWindow::Left,
                    start_by: StartBy::WindowBound,
                    ..Default::default()
                },
            )
            .agg([aggregation.expr()]);

        let prepared = grid
            .lazy()
            .join(
                binned,
                [col(DATETIME_COLUMN)],
                [col(DATETIME_COLUMN)],
                JoinArgs::new(JoinType::Left),
            )
            .sort([DATETIME_COLUMN], SortMultipleOptions::default())
            .collect()?;
        trace!(
            "Station column '{}': {} raw records, {} at {}, {} points every {} ({:?})",
            parameter,
            raw.len(),
            cadence.len(),
            self.station_frequency,
            prepared.height(),
            self.output_frequency,
            aggregation
        );
        Ok(TimeSeries::from_frame(prepared)?)
    }
}
