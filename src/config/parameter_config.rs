use crate::registry::defaults::{default_station_key, GLOBAL_SHORTWAVE};
use crate::registry::error::ConfigurationError;
use crate::resolve::derived::DerivedFormula;
use crate::types::fraction::Fraction;
use crate::types::source_kind::{Parameter, SourceKind};
use serde::Deserialize;

/// A fraction written either as a number (`0.8`) or as text (`"80%"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FractionSpec {
    Ratio(f64),
    Text(String),
}

impl FractionSpec {
    fn resolve(&self, parameter: &str) -> Result<Fraction, ConfigurationError> {
        match self {
            FractionSpec::Ratio(ratio) => Fraction::new(parameter, *ratio),
            FractionSpec::Text(text) => Fraction::parse(parameter, text),
        }
    }
}

/// Per-parameter configuration entry, as written in the run configuration.
///
/// `source` is the only field every entry needs (after defaults are applied); the rest
/// depend on the kind of source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterConfig {
    /// `station`/`met`, `gridded`/`grib`, `solar`/`pvlib`, `fractional`, `global_NN%`,
    /// `derived`/`brunt`.
    pub source: Option<String>,
    /// Column name in the source table, when it differs from the parameter name.
    pub key: Option<String>,
    /// Share of `base` for fractional splits.
    pub fraction: Option<FractionSpec>,
    /// Base parameter for fractional splits; defaults to `global_shortwave`.
    pub base: Option<String>,
    /// Formula name for derived parameters.
    pub formula: Option<String>,
    /// Inputs for derived parameters; defaults to the formula's standard inputs.
    pub inputs: Option<[String; 2]>,
}

impl ParameterConfig {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    /// Parses this entry into a typed [`Parameter`]. This is the only place source kinds
    /// exist as strings.
    pub fn to_parameter(&self, name: &str) -> Result<Parameter, ConfigurationError> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingSourceKind(name.to_string()))?;
        let normalized = source.trim().to_ascii_lowercase();

        let kind = match normalized.as_str() {
            "station" | "met" => SourceKind::Station {
                key: self
                    .key
                    .clone()
                    .or_else(|| default_station_key(name).map(str::to_string)),
            },
            "gridded" | "grib" | "reanalysis" => SourceKind::Gridded {
                key: self.key.clone(),
            },
            "solar" | "solar-position" | "solar_position" | "pvlib" => SourceKind::SolarPosition {
                key: self.key.clone(),
            },
            "fractional" | "fractional-split" | "global" => {
                let fraction = self
                    .fraction
                    .as_ref()
                    .ok_or_else(|| ConfigurationError::MissingFraction(name.to_string()))?
                    .resolve(name)?;
                self.fractional(fraction)
            }
            shorthand if shorthand.starts_with("global_") => {
                let fraction = Fraction::parse(name, &shorthand["global_".len()..])?;
                self.fractional(fraction)
            }
            "derived" | "brunt" => {
                let formula = match (&self.formula, normalized.as_str()) {
                    (Some(formula), _) => DerivedFormula::from_name(formula).ok_or_else(|| {
                        ConfigurationError::UnknownFormula {
                            parameter: name.to_string(),
                            formula: formula.clone(),
                        }
                    })?,
                    (None, "brunt") => DerivedFormula::BruntLongwave,
                    (None, _) => DerivedFormula::for_parameter(name).ok_or_else(|| {
                        ConfigurationError::UnknownFormula {
                            parameter: name.to_string(),
                            formula: "<unspecified>".to_string(),
                        }
                    })?,
                };
                let inputs = self
                    .inputs
                    .clone()
                    .unwrap_or_else(|| formula.default_inputs().map(str::to_string));
                SourceKind::Derived { formula, inputs }
            }
            _ => {
                return Err(ConfigurationError::UnknownSourceKind {
                    parameter: name.to_string(),
                    source_kind: source.to_string(),
                })
            }
        };

        Ok(Parameter::new(name, kind))
    }

    fn fractional(&self, fraction: Fraction) -> SourceKind {
        SourceKind::FractionalSplit {
            base: self
                .base
                .clone()
                .unwrap_or_else(|| GLOBAL_SHORTWAVE.to_string()),
            fraction,
        }
    }
}
