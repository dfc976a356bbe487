//! The main entry point: one configured run of the fusion engine.

use crate::config::run_config::RunConfig;
use crate::error::MetforceError;
use crate::fusion;
use crate::registry::parameter_registry::ParameterRegistry;
use crate::resample::{self, Alignment, InterpolationMethod};
use crate::sources::station::StationPreparation;
use crate::sources::{GriddedSource, SolarPositionSource, SourceTables, StationSource};
use crate::types::frequency::Frequency;
use crate::types::fused_table::FusedTable;
use crate::types::location::Location;
use crate::types::time_range::TimeRange;
use bon::bon;
use log::{info, warn};

/// A configured fusion run.
///
/// Holds no mutable state: fusing the same [`SourceTables`] twice gives the same table.
///
/// # Examples
///
/// ```
/// use metforce::{Frequency, Metforce, Parameter, ParameterRegistry, TimeRange};
///
/// let registry = ParameterRegistry::new(vec![Parameter::gridded("temperature")])?;
/// let run = Metforce::builder()
///     .registry(registry)
///     .time_range(TimeRange::parse("2023-06-01 00:00", "2023-06-01 12:00")?)
///     .frequency(Frequency::minutes(30))
///     .build();
/// assert_eq!(run.frequency(), Frequency::minutes(30));
/// # Ok::<(), metforce::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Metforce {
    registry: ParameterRegistry,
    time_range: TimeRange,
    location: Location,
    frequency: Frequency,
    station_frequency: Frequency,
    interpolation: InterpolationMethod,
}

#[bon]
impl Metforce {
    /// Defaults: hourly output, 5-minute station cadence, time interpolation and a
    /// location at (0, 0).
    #[builder]
    pub fn new(
        registry: ParameterRegistry,
        time_range: TimeRange,
        location: Option<Location>,
        frequency: Option<Frequency>,
        station_frequency: Option<Frequency>,
        interpolation: Option<InterpolationMethod>,
    ) -> Self {
        Self {
            registry,
            time_range,
            location: location.unwrap_or(Location::new(0.0, 0.0)),
            frequency: frequency.unwrap_or(Frequency::hours(1)),
            station_frequency: station_frequency.unwrap_or(Frequency::minutes(5)),
            interpolation: interpolation.unwrap_or_default(),
        }
    }

    /// Validates `config` completely (sources, fractions, dependencies, time range)
    /// before anything is fetched.
    pub fn from_config(config: &RunConfig) -> Result<Self, MetforceError> {
        let registry = config.registry()?;
        registry.ensure_resolvable()?;
        let time_range = config.time_range()?;
        info!(
            "Run {} for {}: {} parameters every {}",
            config.location_name.as_deref().unwrap_or("<unnamed>"),
            time_range,
            registry.len(),
            config.freq
        );
        Ok(Self::builder()
            .registry(registry)
            .time_range(time_range)
            .location(config.location())
            .frequency(config.freq)
            .station_frequency(config.metstation_freq)
            .interpolation(config.interp_method)
            .build())
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interpolation(&self) -> InterpolationMethod {
        self.interpolation
    }

    pub fn station_preparation(&self) -> StationPreparation {
        StationPreparation::new(self.station_frequency, self.frequency, self.interpolation)
    }

    /// Fetches the source tables this run needs. Station records are prepared onto the
    /// output grid; with `fill_station_gaps` their empty grid points are taken from the
    /// gridded source.
    #[builder]
    pub fn gather(
        &self,
        station: Option<&dyn StationSource>,
        gridded: Option<&dyn GriddedSource>,
        solar: Option<&dyn SolarPositionSource>,
        #[builder(default)] fill_station_gaps: bool,
    ) -> Result<SourceTables, MetforceError> {
        let tables = SourceTables::gather()
            .registry(&self.registry)
            .time_range(&self.time_range)
            .location(&self.location)
            .maybe_station(station)
            .maybe_gridded(gridded)
            .maybe_solar(solar)
            .station_preparation(self.station_preparation())
            .fill_station_gaps(fill_station_gaps)
            .call()?;
        Ok(tables)
    }

    pub fn fuse(&self, tables: &SourceTables) -> Result<FusedTable, MetforceError> {
        Ok(fusion::fuse(&self.registry, &self.time_range, tables)?)
    }

    /// Puts `table` on the output grid, logging a warning for every column that does
    /// not cover the whole time range.
    pub fn align(&self, table: &FusedTable) -> Result<Alignment, MetforceError> {
        let alignment =
            resample::align(table, &self.time_range, self.frequency, self.interpolation)?;
        for warning in &alignment.warnings {
            warn!("{}", warning);
        }
        Ok(alignment)
    }

    /// Fuses and aligns in one go.
    pub fn run(&self, tables: &SourceTables) -> Result<Alignment, MetforceError> {
        let fused = self.fuse(tables)?;
        self.align(&fused)
    }
}
