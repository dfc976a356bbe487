use crate::registry::error::ConfigurationError;
use crate::resolve::derived::DerivedRequest;
use crate::resolve::fractional::FractionalSplit;
use crate::types::source_kind::{Parameter, SourceBucket, SourceKind};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Parameter names grouped by source bucket. Every bucket is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    buckets: BTreeMap<SourceBucket, Vec<String>>,
}

impl Classification {
    pub fn get(&self, bucket: SourceBucket) -> &[String] {
        self.buckets
            .get(&bucket)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceBucket, &[String])> {
        self.buckets.iter().map(|(b, names)| (*b, names.as_slice()))
    }

    /// Names copied straight from a source table, in registry order per bucket.
    pub fn direct(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(bucket, _)| bucket.is_direct())
            .flat_map(|(_, names)| names.iter().map(String::as_str))
    }
}

/// Every requested parameter and its source, in output order.
///
/// Built once per run and read-only afterwards. Construction enforces that the
/// dependency graph has exactly two ranks: fractional and derived parameters may only
/// depend on station, gridded or solar-position parameters. Station parameters must
/// read distinct columns.
///
/// Dependencies that are not registered at all are accepted by [`ParameterRegistry::new`]
/// and reported by the resolvers during fusion. Call
/// [`ParameterRegistry::ensure_resolvable`] to reject them before any source is read.
///
/// ```
/// use metforce::{Fraction, Parameter, ParameterRegistry, SourceBucket};
///
/// let registry = ParameterRegistry::new(vec![
///     Parameter::station("global_shortwave", Some("PSP_Total")),
///     Parameter::fractional("direct_shortwave", "global_shortwave", Fraction::new("direct_shortwave", 0.8)?),
/// ])?;
/// let classes = registry.classify();
/// assert_eq!(classes.get(SourceBucket::FractionalSplit), ["direct_shortwave"]);
/// # Ok::<(), metforce::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
}

impl ParameterRegistry {
    pub fn new(parameters: Vec<Parameter>) -> Result<Self, ConfigurationError> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            if positions.insert(parameter.name.as_str(), i).is_some() {
                return Err(ConfigurationError::DuplicateParameter(
                    parameter.name.clone(),
                ));
            }
        }

        let mut station_keys: HashMap<&str, &str> = HashMap::new();
        for parameter in parameters.iter().filter(|p| p.source.bucket() == SourceBucket::Station) {
            if let Some(first) = station_keys.insert(parameter.lookup_key(), &parameter.name) {
                return Err(ConfigurationError::SharedStationKey {
                    key: parameter.lookup_key().to_string(),
                    first: first.to_string(),
                    second: parameter.name.clone(),
                });
            }
        }

        for parameter in &parameters {
            let dependencies = parameter.source.dependencies();
            for dependency in &dependencies {
                // Unregistered dependencies are reported by the resolvers, all at once.
                let Some(&i) = positions.get(dependency) else {
                    continue;
                };
                let kind = parameters[i].source.bucket();
                if !kind.is_direct() {
                    return Err(ConfigurationError::InvalidDependency {
                        parameter: parameter.name.clone(),
                        dependency: dependency.to_string(),
                        kind,
                    });
                }
            }

            if let SourceKind::Derived { inputs, .. } = &parameter.source {
                let [first, second] = inputs;
                if let (Some(&a), Some(&b)) =
                    (positions.get(first.as_str()), positions.get(second.as_str()))
                {
                    let first_kind = parameters[a].source.bucket();
                    let second_kind = parameters[b].source.bucket();
                    if first_kind != second_kind {
                        return Err(ConfigurationError::MixedDerivedInputs {
                            parameter: parameter.name.clone(),
                            first: first.clone(),
                            first_kind,
                            second: second.clone(),
                            second_kind,
                        });
                    }
                }
            }
        }

        Ok(Self { parameters })
    }

    /// Fails naming every fractional or derived parameter with an unregistered input.
    pub fn ensure_resolvable(&self) -> Result<(), ConfigurationError> {
        let missing: BTreeSet<String> = self
            .parameters
            .iter()
            .filter(|p| {
                p.source
                    .dependencies()
                    .iter()
                    .any(|dependency| self.get(dependency).is_none())
            })
            .map(|p| p.name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::UnresolvedDependencies { missing })
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Partitions every parameter into exactly one bucket.
    pub fn classify(&self) -> Classification {
        let mut buckets: BTreeMap<SourceBucket, Vec<String>> = SourceBucket::ALL
            .into_iter()
            .map(|bucket| (bucket, Vec::new()))
            .collect();
        for parameter in &self.parameters {
            buckets
                .entry(parameter.source.bucket())
                .or_default()
                .push(parameter.name.clone());
        }
        Classification { buckets }
    }

    pub fn fractional_requests(&self) -> Vec<FractionalSplit> {
        self.parameters
            .iter()
            .filter_map(|p| match &p.source {
                SourceKind::FractionalSplit { base, fraction } => Some(FractionalSplit {
                    name: p.name.clone(),
                    base: base.clone(),
                    fraction: *fraction,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn derived_requests(&self) -> Vec<DerivedRequest> {
        self.parameters
            .iter()
            .filter_map(|p| match &p.source {
                SourceKind::Derived { formula, inputs } => Some(DerivedRequest {
                    name: p.name.clone(),
                    formula: *formula,
                    inputs: inputs.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::derived::DerivedFormula;
    use crate::types::fraction::Fraction;
    use std::collections::HashSet;

    fn fraction(ratio: f64) -> Fraction {
        Fraction::new("test", ratio).unwrap()
    }

    fn full_registry() -> ParameterRegistry {
        ParameterRegistry::new(vec![
            Parameter::station("pressure", Some("BP_mbar")),
            Parameter::station("temperature", Some("AirT_2M")),
            Parameter::station("relative_humidity", Some("RH_2M")),
            Parameter::gridded("wind_speed"),
            Parameter::station("global_shortwave", Some("PSP_Total")),
            Parameter::fractional("diffuse_shortwave", "global_shortwave", fraction(0.2)),
            Parameter::fractional("direct_shortwave", "global_shortwave", fraction(0.8)),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
            Parameter::solar_position("zenith"),
            Parameter::solar_position("azimuth"),
        ])
        .unwrap()
    }

    #[test]
    fn test_classify_is_complete_and_disjoint() {
        let registry = full_registry();
        let classes = registry.classify();

        let mut seen = HashSet::new();
        for (_, names) in classes.iter() {
            for name in names {
                assert!(seen.insert(name.clone()), "{} classified twice", name);
            }
        }
        assert_eq!(seen.len(), registry.len());
        assert_eq!(
            classes.get(SourceBucket::Station),
            ["pressure", "temperature", "relative_humidity", "global_shortwave"]
        );
        assert_eq!(classes.get(SourceBucket::Gridded), ["wind_speed"]);
        assert_eq!(classes.get(SourceBucket::SolarPosition), ["zenith", "azimuth"]);
        assert_eq!(
            classes.get(SourceBucket::FractionalSplit),
            ["diffuse_shortwave", "direct_shortwave"]
        );
        assert_eq!(classes.get(SourceBucket::Derived), ["downwelling_lwir"]);
        assert_eq!(classes.direct().count(), 7);
    }

    #[test]
    fn test_empty_buckets_are_present() -> Result<(), ConfigurationError> {
        let registry = ParameterRegistry::new(vec![Parameter::gridded("pressure")])?;
        let classes = registry.classify();
        assert!(classes.get(SourceBucket::Derived).is_empty());
        assert_eq!(classes.iter().count(), SourceBucket::ALL.len());
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ParameterRegistry::new(vec![
            Parameter::gridded("pressure"),
            Parameter::station("pressure", None),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateParameter(name)) if name == "pressure"
        ));
    }

    #[test]
    fn test_fraction_of_fraction_rejected() {
        let result = ParameterRegistry::new(vec![
            Parameter::gridded("global_shortwave"),
            Parameter::fractional("direct_shortwave", "global_shortwave", fraction(0.8)),
            Parameter::fractional("beam_core", "direct_shortwave", fraction(0.5)),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidDependency {
                kind: SourceBucket::FractionalSplit,
                ..
            })
        ));
    }

    #[test]
    fn test_fraction_of_derived_rejected() {
        let result = ParameterRegistry::new(vec![
            Parameter::station("temperature", None),
            Parameter::station("relative_humidity", None),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
            Parameter::fractional("lw_half", "downwelling_lwir", fraction(0.5)),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidDependency {
                kind: SourceBucket::Derived,
                ..
            })
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let result = ParameterRegistry::new(vec![Parameter::fractional(
            "loop",
            "loop",
            fraction(0.5),
        )]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn test_derived_inputs_must_share_a_source() {
        let result = ParameterRegistry::new(vec![
            Parameter::station("temperature", None),
            Parameter::gridded("relative_humidity"),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::MixedDerivedInputs {
                first_kind: SourceBucket::Station,
                second_kind: SourceBucket::Gridded,
                ..
            })
        ));
    }

    #[test]
    fn test_unregistered_base_is_left_to_resolution() -> Result<(), ConfigurationError> {
        let registry = ParameterRegistry::new(vec![Parameter::fractional(
            "direct_shortwave",
            "global_shortwave",
            fraction(0.8),
        )])?;
        assert_eq!(registry.fractional_requests().len(), 1);
        Ok(())
    }

    #[test]
    fn test_ensure_resolvable_names_every_unsatisfied_parameter() {
        let registry = ParameterRegistry::new(vec![
            Parameter::station("temperature", None),
            Parameter::fractional("direct_shortwave", "global_shortwave", fraction(0.8)),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
        ])
        .unwrap();
        match registry.ensure_resolvable() {
            Err(ConfigurationError::UnresolvedDependencies { missing }) => {
                let missing: Vec<&str> = missing.iter().map(String::as_str).collect();
                assert_eq!(missing, vec!["direct_shortwave", "downwelling_lwir"]);
            }
            other => panic!("expected UnresolvedDependencies, got {:?}", other),
        }
        assert!(full_registry().ensure_resolvable().is_ok());
    }

    #[test]
    fn test_shared_station_key_rejected() {
        let result = ParameterRegistry::new(vec![
            Parameter::station("precipitation", Some("Rain_mm")),
            Parameter::station("rain_rate", Some("Rain_mm")),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::SharedStationKey { key, first, second })
                if key == "Rain_mm" && first == "precipitation" && second == "rain_rate"
        ));
        // The same key may still be used by a gridded parameter.
        assert!(ParameterRegistry::new(vec![
            Parameter::station("pressure", Some("pressure")),
            Parameter::gridded("surface_pressure"),
        ])
        .is_ok());
    }

    #[test]
    fn test_requests_follow_registry_order() {
        let registry = full_registry();
        let fractional: Vec<_> = registry
            .fractional_requests()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(fractional, vec!["diffuse_shortwave", "direct_shortwave"]);
        let derived = registry.derived_requests();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].inputs[1], "relative_humidity");
    }
}
