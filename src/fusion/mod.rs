//! Assembles the fused table: direct copies first, then fractional and derived columns.

pub mod error;

use crate::fusion::error::FusionError;
use crate::registry::parameter_registry::ParameterRegistry;
use crate::resolve::{derived, fractional, Resolution};
use crate::sources::{SourceTable, SourceTables};
use crate::types::fused_table::{FusedTable, DATETIME_COLUMN};
use crate::types::source_kind::SourceBucket;
use crate::types::time_range::TimeRange;
use crate::types::time_series::{index_frame, VALUE_COLUMN};
use log::{debug, info, trace, warn};
use polars::prelude::{
    col, Expr, IntoLazy, JoinArgs, JoinCoalesce, JoinType, LazyFrame, SortMultipleOptions,
};

impl SourceTables {
    /// Table holding the columns of a direct source bucket.
    pub fn table(&self, bucket: SourceBucket) -> Option<&SourceTable> {
        match bucket {
            SourceBucket::Station => Some(&self.station),
            SourceBucket::Gridded => Some(&self.gridded),
            SourceBucket::SolarPosition => Some(&self.solar),
            SourceBucket::FractionalSplit | SourceBucket::Derived => None,
        }
    }
}

/// Builds one table holding every parameter in `registry`, in registry order.
///
/// Direct parameters are copied from their source table, windowed to `time_range` (plus
/// one neighbour on each side) and full-joined on `datetime`, so the table index is the
/// union of all their timestamps. Fractional and derived parameters are then computed
/// from those direct columns. Either every column is produced or an error is returned;
/// there are no partial tables.
///
/// # Errors
///
/// - [`FusionError::MissingColumn`] when a direct parameter's key is absent from its table.
/// - [`FusionError::UnsupportedParameter`] naming every fractional (or derived)
///   parameter whose inputs are not among the direct columns.
pub fn fuse(
    registry: &ParameterRegistry,
    time_range: &TimeRange,
    tables: &SourceTables,
) -> Result<FusedTable, FusionError> {
    let classes = registry.classify();
    for (bucket, names) in classes.iter() {
        debug!("{}: {:?}", bucket, names);
    }

    let mut direct: Option<LazyFrame> = None;
    for (bucket, names) in classes.iter() {
        let Some(table) = tables.table(bucket) else {
            continue;
        };
        for name in names {
            let Some(parameter) = registry.get(name) else {
                continue;
            };
            let key = parameter.lookup_key();
            let series = table.get(key).ok_or_else(|| FusionError::MissingColumn {
                parameter: name.clone(),
                kind: bucket,
                column: key.to_string(),
            })?;
            let windowed = series.window(time_range);
            trace!("'{}' from {} column '{}': {} points", name, bucket, key, windowed.len());
            let column = windowed
                .lazy()
                .select([col(DATETIME_COLUMN), col(VALUE_COLUMN).alias(name.as_str())]);
            direct = Some(match direct {
                None => column,
                Some(fused) => fused.join(
                    column,
                    [col(DATETIME_COLUMN)],
                    [col(DATETIME_COLUMN)],
                    JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
                ),
            });
        }
    }
    let direct = match direct {
        Some(fused) => fused
            .sort([DATETIME_COLUMN], SortMultipleOptions::default())
            .collect()?,
        None => index_frame(&[])?,
    };
    let direct = FusedTable::from_frame(direct);

    let fractional_requests = registry.fractional_requests();
    let fractions = if fractional_requests.is_empty() {
        Resolution::default()
    } else {
        let resolution = fractional::resolve(&fractional_requests, &direct)
            .inspect_err(|e| warn!("{}", e))?;
        info!("Fractional splits: {}", resolution.record);
        resolution
    };

    let derived_requests = registry.derived_requests();
    let derivations = if derived_requests.is_empty() {
        Resolution::default()
    } else {
        let resolution = derived::resolve(&derived_requests, &direct)
            .inspect_err(|e| warn!("{}", e))?;
        info!("Derived parameters: {}", resolution.record);
        resolution
    };

    let output: Vec<Expr> = std::iter::once(col(DATETIME_COLUMN))
        .chain(registry.names().into_iter().map(col))
        .collect();
    let fused = direct
        .into_frame()
        .lazy()
        .with_columns(
            fractions
                .columns
                .into_iter()
                .chain(derivations.columns)
                .collect::<Vec<_>>(),
        )
        .select(output)
        .collect()?;
    let fused = FusedTable::from_frame(fused);
    debug!(
        "Fused {} parameters over {} timestamps",
        fused.width(),
        fused.height()
    );
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::derived::{brunt_longwave, DerivedFormula};
    use crate::types::fraction::Fraction;
    use crate::types::source_kind::Parameter;
    use crate::types::time_series::TimeSeries;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn hour(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::hours(h)
    }

    fn hourly(from: i64, values: &[Option<f64>]) -> TimeSeries {
        TimeSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (hour(from + i as i64), *v)),
        )
        .unwrap()
    }

    fn fraction(ratio: f64) -> Fraction {
        Fraction::new("test", ratio).unwrap()
    }

    fn range(from: i64, to: i64) -> TimeRange {
        TimeRange::new(hour(from), hour(to)).unwrap()
    }

    fn tables() -> SourceTables {
        SourceTables {
            station: SourceTable::new()
                .with_column("PSP_Total", hourly(0, &[Some(0.0), Some(400.0), Some(800.0), None]))
                .with_column("AirT_2M", hourly(0, &[Some(20.0), Some(21.0), Some(22.0), Some(23.0)]))
                .with_column("RH_2M", hourly(0, &[Some(50.0), Some(55.0), None, Some(60.0)])),
            gridded: SourceTable::new()
                .with_column("pressure", hourly(0, &[Some(1010.0), Some(1011.0), Some(1012.0), Some(1013.0)])),
            solar: SourceTable::new()
                .with_column("zenith", hourly(0, &[Some(95.0), Some(80.0), Some(65.0), Some(50.0)])),
        }
    }

    fn registry() -> ParameterRegistry {
        ParameterRegistry::new(vec![
            Parameter::gridded("pressure"),
            Parameter::station("temperature", Some("AirT_2M")),
            Parameter::station("relative_humidity", Some("RH_2M")),
            Parameter::station("global_shortwave", Some("PSP_Total")),
            Parameter::fractional("diffuse_shortwave", "global_shortwave", fraction(0.2)),
            Parameter::fractional("direct_shortwave", "global_shortwave", fraction(0.8)),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
            Parameter::solar_position("zenith"),
        ])
        .unwrap()
    }

    #[test]
    fn test_fuse_full_registry() -> Result<(), Box<dyn std::error::Error>> {
        let registry = registry();
        let fused = fuse(&registry, &range(0, 3), &tables())?;

        assert_eq!(fused.column_names(), registry.names());
        assert_eq!(fused.height(), 4);
        assert_eq!(fused.index()?, vec![hour(0), hour(1), hour(2), hour(3)]);
        assert_eq!(
            fused.values("direct_shortwave"),
            Some(vec![Some(0.0), Some(320.0), Some(640.0), None])
        );
        assert_eq!(fused.value_at("diffuse_shortwave", hour(2)), Some(160.0));
        let lwir = fused.value_at("downwelling_lwir", hour(0)).unwrap_or_default();
        assert!((lwir - brunt_longwave(20.0, 50.0)).abs() < 1e-9);
        assert_eq!(fused.value_at("downwelling_lwir", hour(2)), None);
        assert_eq!(fused.value_at("pressure", hour(3)), Some(1013.0));
        Ok(())
    }

    #[test]
    fn test_fuse_is_idempotent() -> Result<(), FusionError> {
        let registry = registry();
        let first = fuse(&registry, &range(0, 3), &tables())?;
        let second = fuse(&registry, &range(0, 3), &tables())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_missing_bases_reported_together() {
        let registry = ParameterRegistry::new(vec![
            Parameter::gridded("pressure"),
            Parameter::fractional("diffuse_shortwave", "global_shortwave", fraction(0.2)),
            Parameter::fractional("direct_shortwave", "global_shortwave", fraction(0.8)),
        ])
        .unwrap();
        match fuse(&registry, &range(0, 3), &tables()) {
            Err(FusionError::UnsupportedParameter(error)) => {
                let missing: Vec<&str> = error.missing.iter().map(String::as_str).collect();
                assert_eq!(missing, vec!["diffuse_shortwave", "direct_shortwave"]);
            }
            other => panic!("expected UnsupportedParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_derived_without_inputs_fails() {
        let registry = ParameterRegistry::new(vec![
            Parameter::gridded("pressure"),
            Parameter::derived("downwelling_lwir", DerivedFormula::BruntLongwave),
        ])
        .unwrap();
        assert!(matches!(
            fuse(&registry, &range(0, 3), &tables()),
            Err(FusionError::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn test_missing_source_column() {
        let registry =
            ParameterRegistry::new(vec![Parameter::station("wind_speed", Some("Wind_Spd_2M"))])
                .unwrap();
        assert!(matches!(
            fuse(&registry, &range(0, 3), &tables()),
            Err(FusionError::MissingColumn { kind: SourceBucket::Station, column, .. }) if column == "Wind_Spd_2M"
        ));
    }

    #[test]
    fn test_window_keeps_neighbours_and_unions_indices() -> Result<(), FusionError> {
        let registry = ParameterRegistry::new(vec![
            Parameter::gridded("pressure"),
            Parameter::station("temperature", Some("AirT_2M")),
        ])
        .unwrap();
        let mut tables = tables();
        // Half-hourly station record offset from the hourly gridded one.
        tables.station = SourceTable::new().with_column(
            "AirT_2M",
            TimeSeries::from_points(
                (0..6).map(|i| (hour(0) + TimeDelta::minutes(30 * i + 15), Some(i as f64))),
            )
            .unwrap(),
        );
        let fused = fuse(&registry, &range(1, 2), &tables)?;

        // Pressure: 00:00 (neighbour), 01:00, 02:00, 03:00 (neighbour).
        // Temperature: 00:45 (neighbour), 01:15, 01:45, 02:15 (neighbour).
        assert_eq!(fused.height(), 8);
        assert_eq!(fused.value_at("pressure", hour(0)), Some(1010.0));
        assert_eq!(
            fused.value_at("temperature", hour(1) + TimeDelta::minutes(15)),
            Some(2.0)
        );
        assert_eq!(fused.value_at("temperature", hour(1)), None);
        Ok(())
    }

    #[test]
    fn test_empty_registry() -> Result<(), FusionError> {
        let registry = ParameterRegistry::new(Vec::new()).unwrap();
        let fused = fuse(&registry, &range(0, 3), &SourceTables::default())?;
        assert_eq!(fused.width(), 0);
        Ok(())
    }
}
