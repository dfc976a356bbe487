use chrono::NaiveDateTime;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Index has {index} timestamps but {values} values were given")]
    LengthMismatch { index: usize, values: usize },

    #[error("Index is not strictly increasing at position {position}: {current} follows {previous}")]
    NonIncreasingIndex {
        position: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("Index has a missing timestamp at position {0}")]
    MissingTimestamp(usize),

    #[error("Failed building series frame: {0}")]
    Frame(#[from] PolarsError),
}
