use crate::config::parameter_config::ParameterConfig;
use crate::registry::defaults::{default_source, output_rank, STANDARD_PARAMETERS};
use crate::registry::error::ConfigurationError;
use crate::registry::parameter_registry::ParameterRegistry;
use crate::resample::InterpolationMethod;
use crate::types::frequency::Frequency;
use crate::types::location::Location;
use crate::types::time_range::TimeRange;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_freq() -> Frequency {
    Frequency::hours(1)
}

fn default_metstation_freq() -> Frequency {
    Frequency::minutes(5)
}

/// One run of the fusion engine: where, when, how often, and which parameters from where.
///
/// ```json
/// {
///   "latitude": 39.74, "longitude": -105.18, "elevation": 1829,
///   "start_range": "2023-06-01 00:00", "end_range": "2023-06-02 00:00",
///   "freq": "1H",
///   "parameters": {
///     "temperature": {"source": "gridded"},
///     "direct_shortwave": {"source": "global_75%"}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    pub start_range: String,
    pub end_range: String,
    #[serde(default = "default_freq")]
    pub freq: Frequency,
    #[serde(default = "default_metstation_freq")]
    pub metstation_freq: Frequency,
    #[serde(default)]
    pub interp_method: InterpolationMethod,
    #[serde(default)]
    pub metfile: Option<PathBuf>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigurationError::ConfigRead(path.to_path_buf(), e))?;
        Self::from_json_str(&text)
    }

    pub fn time_range(&self) -> Result<TimeRange, ConfigurationError> {
        TimeRange::parse(self.start_range.as_str(), self.end_range.as_str())
    }

    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude).with_elevation(self.elevation)
    }

    pub fn has_station_file(&self) -> bool {
        self.metfile.is_some()
    }

    /// Parameter entries after default filling.
    ///
    /// Standard parameters missing from the table are added, entries without a source
    /// get the default one (station when a station file is configured, gridded
    /// otherwise). Station keys are filled later, when each entry is parsed.
    pub fn filled_parameters(&self) -> BTreeMap<String, ParameterConfig> {
        let with_station = self.has_station_file();
        let mut parameters = self.parameters.clone();

        for name in STANDARD_PARAMETERS {
            parameters.entry(name.to_string()).or_default();
        }
        for (name, entry) in parameters.iter_mut() {
            if entry.source.is_none() {
                entry.source = default_source(name, with_station).map(str::to_string);
            }
        }
        parameters
    }

    /// Builds the registry for this run, in output column order.
    pub fn registry(&self) -> Result<ParameterRegistry, ConfigurationError> {
        let filled = self.filled_parameters();
        let mut parameters = filled
            .iter()
            .map(|(name, entry)| entry.to_parameter(name))
            .collect::<Result<Vec<_>, _>>()?;
        parameters.sort_by(|a, b| {
            output_rank(&a.name)
                .cmp(&output_rank(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(
            "Configured {} parameters ({} from defaults)",
            parameters.len(),
            filled.len() - self.parameters.len()
        );
        ParameterRegistry::new(parameters)
    }
}
