pub mod config;
mod error;
pub mod fusion;
mod metforce;
pub mod registry;
pub mod resample;
pub mod resolve;
pub mod sources;
mod types;

pub use error::MetforceError;
pub use metforce::*;

pub use config::parameter_config::{FractionSpec, ParameterConfig};
pub use config::run_config::RunConfig;

pub use registry::error::ConfigurationError;
pub use registry::parameter_registry::{Classification, ParameterRegistry};

pub use resolve::derived::DerivedFormula;
pub use resolve::error::UnsupportedParameterError;
pub use resolve::{Resolution, ResolutionRecord, ResolvedFrom};

pub use fusion::error::FusionError;
pub use resample::{Alignment, AlignmentWarning, InterpolationMethod};

pub use sources::error::SourceError;
pub use sources::gridded::GriddedSample;
pub use sources::station::StationPreparation;
pub use sources::{
    GriddedSource, SolarPosition, SolarPositionSource, SourceTable, SourceTables, StationSource,
};

pub use types::any_datetime::AnyDateTime;
pub use types::error::SeriesError;
pub use types::fraction::Fraction;
pub use types::frequency::*;
pub use types::fused_frame::FusedLazyFrame;
pub use types::fused_table::{FusedTable, DATETIME_COLUMN};
pub use types::location::Location;
pub use types::source_kind::{Parameter, SourceBucket, SourceKind};
pub use types::time_range::TimeRange;
pub use types::time_series::{TimeSeries, VALUE_COLUMN};
