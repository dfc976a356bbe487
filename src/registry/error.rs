use crate::types::source_kind::SourceBucket;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the run configuration. Always raised before any source is queried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Parameter '{0}' does not declare a source")]
    MissingSourceKind(String),

    #[error("Parameter '{parameter}' declares unsupported source '{source_kind}'")]
    UnknownSourceKind {
        parameter: String,
        source_kind: String,
    },

    #[error("Parameter '{0}' is a fractional split but no fraction was given")]
    MissingFraction(String),

    #[error("Parameter '{parameter}' has an unreadable fraction '{fraction}'")]
    InvalidFraction { parameter: String, fraction: String },

    #[error("Parameter '{parameter}' has fraction {fraction}, expected a ratio in (0, 1]")]
    FractionOutOfRange { parameter: String, fraction: f64 },

    #[error("Parameter '{parameter}' depends on '{dependency}', which is {kind}; only station, gridded or solar-position parameters can be depended on")]
    InvalidDependency {
        parameter: String,
        dependency: String,
        kind: SourceBucket,
    },

    #[error("Derived parameter '{parameter}' mixes inputs from different sources: '{first}' is {first_kind}, '{second}' is {second_kind}")]
    MixedDerivedInputs {
        parameter: String,
        first: String,
        first_kind: SourceBucket,
        second: String,
        second_kind: SourceBucket,
    },

    #[error("Parameter '{parameter}' has no derivation formula named '{formula}'")]
    UnknownFormula { parameter: String, formula: String },

    #[error("Parameter '{0}' is configured more than once")]
    DuplicateParameter(String),

    #[error("Station parameters '{first}' and '{second}' both read column '{key}'")]
    SharedStationKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Parameters depend on unregistered inputs: {}", .missing.iter().cloned().collect::<Vec<_>>().join(", "))]
    UnresolvedDependencies { missing: BTreeSet<String> },

    #[error("Could not parse timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Time range ends ({end}) before it starts ({start})")]
    InvalidTimeRange { start: String, end: String },

    #[error("Unsupported frequency '{0}'")]
    InvalidFrequency(String),

    #[error("Unsupported interpolation method '{0}'")]
    UnknownInterpolation(String),

    #[error("Failed to read configuration file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),
}
