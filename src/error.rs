use crate::fusion::error::FusionError;
use crate::registry::error::ConfigurationError;
use crate::sources::error::SourceError;
use crate::types::error::SeriesError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetforceError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed to parse date")]
    DateParsing,
}
