//! Source tables and the collaborators that fill them.
//!
//! Reading station spreadsheets, decoding gridded files and computing sun angles all
//! happen behind [`StationSource`], [`GriddedSource`] and [`SolarPositionSource`]. The
//! fusion core only ever sees the resulting [`SourceTables`].

pub mod error;
pub mod gridded;
pub mod station;

use crate::registry::defaults::{AZIMUTH, GLOBAL_SHORTWAVE, ZENITH};
use crate::registry::parameter_registry::ParameterRegistry;
use crate::resample::regrid;
use crate::sources::error::SourceError;
use crate::sources::station::StationPreparation;
use crate::types::error::SeriesError;
use crate::types::fused_table::DATETIME_COLUMN;
use crate::types::location::Location;
use crate::types::source_kind::{Parameter, SourceBucket};
use crate::types::time_range::TimeRange;
use crate::types::time_series::{index_frame, read_timestamps, TimeSeries, VALUE_COLUMN};
use bon::bon;
use chrono::NaiveDateTime;
use log::{debug, info};
use polars::prelude::{
    col, DataFrame, DataType, IntoLazy, JoinArgs, JoinType, SortMultipleOptions,
};
use std::collections::BTreeMap;

/// Provides raw station records by spreadsheet column key.
pub trait StationSource {
    fn station_series(&self, key: &str) -> Result<TimeSeries, SourceError>;
}

/// Provides reanalysis values by variable key, already in forcing units.
pub trait GriddedSource {
    fn gridded_series(&self, key: &str, time_range: &TimeRange)
        -> Result<TimeSeries, SourceError>;
}

/// Sun angles (degrees) for a location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolarPosition {
    pub zenith: TimeSeries,
    pub azimuth: TimeSeries,
}

pub trait SolarPositionSource {
    fn solar_position(
        &self,
        time_range: &TimeRange,
        location: &Location,
    ) -> Result<SolarPosition, SourceError>;
}

impl<F> SolarPositionSource for F
where
    F: Fn(&TimeRange, &Location) -> Result<SolarPosition, SourceError>,
{
    fn solar_position(
        &self,
        time_range: &TimeRange,
        location: &Location,
    ) -> Result<SolarPosition, SourceError> {
        self(time_range, location)
    }
}

/// Named columns from one kind of source, each a frame-backed [`TimeSeries`] on its own
/// index.
///
/// Station columns are keyed by spreadsheet column, which the registry keeps unique per
/// station parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTable {
    columns: BTreeMap<String, TimeSeries>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, series: TimeSeries) -> Option<TimeSeries> {
        self.columns.insert(key.into(), series)
    }

    pub fn with_column(mut self, key: impl Into<String>, series: TimeSeries) -> Self {
        self.insert(key, series);
        self
    }

    pub fn get(&self, key: &str) -> Option<&TimeSeries> {
        self.columns.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Reads every numeric column of `frame` as a series indexed by `datetime_column`.
    ///
    /// Non-numeric columns are skipped. Rows must be sorted by time without duplicates.
    pub fn from_frame(frame: &DataFrame, datetime_column: &str) -> Result<Self, SourceError> {
        let dt_col = frame
            .column(datetime_column)
            .map_err(|e| SourceError::ColumnNotFound(datetime_column.to_string(), e))?;
        if !matches!(dt_col.dtype(), DataType::Datetime(..)) {
            return Err(SourceError::InvalidIndexType {
                column: datetime_column.to_string(),
                dtype: dt_col.dtype().to_string(),
            });
        }

        let mut table = SourceTable::new();
        for column in frame.get_columns() {
            let name = column.name().as_str();
            if name == datetime_column || !(column.dtype().is_float() || column.dtype().is_integer())
            {
                continue;
            }
            let pair = frame
                .clone()
                .lazy()
                .select([
                    col(datetime_column).alias(DATETIME_COLUMN),
                    col(name).alias(VALUE_COLUMN),
                ])
                .collect()?;
            table.insert(name, TimeSeries::from_frame(pair)?);
        }
        Ok(table)
    }
}

impl StationSource for SourceTable {
    fn station_series(&self, key: &str) -> Result<TimeSeries, SourceError> {
        self.get(key)
            .cloned()
            .ok_or_else(|| SourceError::DataUnavailable {
                key: key.to_string(),
                reason: "no such column in the station table".to_string(),
            })
    }
}

impl GriddedSource for SourceTable {
    fn gridded_series(
        &self,
        key: &str,
        time_range: &TimeRange,
    ) -> Result<TimeSeries, SourceError> {
        self.get(key)
            .map(|series| series.window(time_range))
            .ok_or_else(|| SourceError::DataUnavailable {
                key: key.to_string(),
                reason: "no such variable in the gridded table".to_string(),
            })
    }
}

/// The station, gridded and solar-position tables of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTables {
    pub station: SourceTable,
    pub gridded: SourceTable,
    pub solar: SourceTable,
}

#[bon]
impl SourceTables {
    /// Fetches exactly the columns `registry` needs from the supplied collaborators.
    ///
    /// Station records go through `station_preparation` when one is given. With
    /// `fill_station_gaps` set as well, output grid points a prepared station column
    /// leaves empty are filled from the gridded source, read under the parameter's
    /// name. Negative station shortwave readings are clamped to zero.
    ///
    /// # Errors
    ///
    /// [`SourceError::MissingProvider`] if a direct parameter's collaborator was not
    /// supplied, or whatever the collaborator itself reports.
    #[builder]
    pub fn gather(
        registry: &ParameterRegistry,
        time_range: &TimeRange,
        location: &Location,
        station: Option<&dyn StationSource>,
        gridded: Option<&dyn GriddedSource>,
        solar: Option<&dyn SolarPositionSource>,
        station_preparation: Option<StationPreparation>,
        #[builder(default)] fill_station_gaps: bool,
    ) -> Result<Self, SourceError> {
        let classes = registry.classify();
        let mut tables = SourceTables::default();

        for parameter in requested(registry, classes.get(SourceBucket::Station)) {
            let provider = station.ok_or_else(|| missing_provider(parameter))?;
            let key = parameter.lookup_key();
            let mut series = provider.station_series(key)?;
            if let Some(preparation) = &station_preparation {
                series = preparation.prepare(&parameter.name, &series, time_range)?;
                if fill_station_gaps {
                    series = backfill(parameter, series, gridded, preparation, time_range)?;
                }
            }
            if parameter.name == GLOBAL_SHORTWAVE {
                series = series.clamp_min(0.0)?;
            }
            debug!("Station '{}' <- column '{}' ({} rows)", parameter.name, key, series.len());
            tables.station.insert(key, series);
        }

        for parameter in requested(registry, classes.get(SourceBucket::Gridded)) {
            let provider = gridded.ok_or_else(|| missing_provider(parameter))?;
            let key = parameter.lookup_key();
            let series = provider.gridded_series(key, time_range)?;
            debug!("Gridded '{}' <- '{}' ({} rows)", parameter.name, key, series.len());
            tables.gridded.insert(key, series);
        }

        let solar_parameters = classes.get(SourceBucket::SolarPosition);
        if let Some(first) = requested(registry, solar_parameters).next() {
            let provider = solar.ok_or_else(|| missing_provider(first))?;
            let position = provider.solar_position(time_range, location)?;
            tables.solar.insert(ZENITH, position.zenith);
            tables.solar.insert(AZIMUTH, position.azimuth);
        }

        info!(
            "Gathered {} station, {} gridded and {} solar-position columns for {}",
            tables.station.len(),
            tables.gridded.len(),
            tables.solar.len(),
            time_range
        );
        Ok(tables)
    }
}

fn requested<'a>(
    registry: &'a ParameterRegistry,
    names: &'a [String],
) -> impl Iterator<Item = &'a Parameter> {
    names.iter().filter_map(|name| registry.get(name))
}

fn missing_provider(parameter: &Parameter) -> SourceError {
    SourceError::MissingProvider {
        parameter: parameter.name.clone(),
        kind: parameter.source.bucket(),
    }
}

const FALLBACK_COLUMN: &str = "fallback";

/// Fills the empty output grid points of a prepared station column from `gridded`.
fn backfill(
    parameter: &Parameter,
    series: TimeSeries,
    gridded: Option<&dyn GriddedSource>,
    preparation: &StationPreparation,
    time_range: &TimeRange,
) -> Result<TimeSeries, SourceError> {
    let gaps = missing_timestamps(&series, &time_range.grid(preparation.output_frequency))?;
    let (Some(first), Some(last)) = (gaps.first(), gaps.last()) else {
        return Ok(series);
    };
    let provider = gridded.ok_or_else(|| SourceError::MissingProvider {
        parameter: parameter.name.clone(),
        kind: SourceBucket::Gridded,
    })?;
    let fallback =
        provider.gridded_series(&parameter.name, &TimeRange::spanning(*first, *last))?;
    let on_gaps = regrid(fallback.frame(), &gaps, preparation.method)?;

    let filled = series
        .lazy()
        .join(
            on_gaps
                .lazy()
                .select([col(DATETIME_COLUMN), col(VALUE_COLUMN).alias(FALLBACK_COLUMN)]),
            [col(DATETIME_COLUMN)],
            [col(DATETIME_COLUMN)],
            JoinArgs::new(JoinType::Left),
        )
        .select([
            col(DATETIME_COLUMN),
            col(VALUE_COLUMN)
                .fill_null(col(FALLBACK_COLUMN))
                .alias(VALUE_COLUMN),
        ])
        .collect()?;
    let filled = TimeSeries::from_frame(filled)?;
    debug!(
        "Station '{}': {} of {} empty grid points filled from the gridded source",
        parameter.name,
        gaps.len() - missing_timestamps(&filled, &gaps)?.len(),
        gaps.len()
    );
    Ok(filled)
}

/// Grid timestamps at which `series` has no value.
pub fn missing_timestamps(
    series: &TimeSeries,
    grid: &[NaiveDateTime],
) -> Result<Vec<NaiveDateTime>, SeriesError> {
    let observed = series.lazy().filter(col(VALUE_COLUMN).is_not_null());
    let missing = index_frame(grid)?
        .lazy()
        .join(
            observed,
            [col(DATETIME_COLUMN)],
            [col(DATETIME_COLUMN)],
            JoinArgs::new(JoinType::Anti),
        )
        .sort([DATETIME_COLUMN], SortMultipleOptions::default())
        .collect()?;
    read_timestamps(missing.column(DATETIME_COLUMN)?)
}
