use crate::types::error::SeriesError;
use crate::types::source_kind::SourceBucket;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source data for '{key}' is unavailable: {reason}")]
    DataUnavailable { key: String, reason: String },

    #[error("Parameter '{parameter}' comes from the {kind} source, but no {kind} provider was supplied")]
    MissingProvider {
        parameter: String,
        kind: SourceBucket,
    },

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Column '{column}' has type {dtype}, expected a datetime")]
    InvalidIndexType { column: String, dtype: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
