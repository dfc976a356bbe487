use crate::resolve::error::UnsupportedParameterError;
use crate::types::source_kind::SourceBucket;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error(transparent)]
    UnsupportedParameter(#[from] UnsupportedParameterError),

    #[error("Parameter '{parameter}' expects column '{column}' in the {kind} table, but it is not there")]
    MissingColumn {
        parameter: String,
        kind: SourceBucket,
        column: String,
    },

    #[error("Failed building fused table: {0}")]
    Polars(#[from] PolarsError),
}
