//! Conversion of raw reanalysis records to forcing units.

use crate::registry::defaults::{
    DOWNWELLING_LWIR, GLOBAL_SHORTWAVE, PRECIPITATION, PRESSURE, RELATIVE_HUMIDITY, TEMPERATURE,
    WIND_DIRECTION, WIND_SPEED,
};
use crate::sources::error::SourceError;
use crate::sources::SourceTable;
use crate::types::fused_table::DATETIME_COLUMN;
use crate::types::time_series::datetime_column;
use chrono::NaiveDateTime;
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

/// Aerodynamic roughness length (m) for the 10 m to 2 m wind reduction.
pub const SURFACE_ROUGHNESS: f64 = 0.34;

const KELVIN_OFFSET: f64 = 273.15;

/// One time step of the gridded product at the nearest grid cell, in native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GriddedSample {
    pub timestamp: NaiveDateTime,
    /// 2 m air temperature, K.
    pub temperature_k: f64,
    /// 2 m specific humidity, kg/kg.
    pub specific_humidity: f64,
    /// Surface pressure, Pa.
    pub surface_pressure_pa: f64,
    /// 10 m zonal (u) wind, m/s.
    pub zonal_wind: f64,
    /// 10 m meridional (v) wind, m/s.
    pub meridional_wind: f64,
    /// Downward shortwave flux, W/m².
    pub shortwave_down: f64,
    /// Downward longwave flux, W/m².
    pub longwave_down: f64,
    /// Hourly precipitation total, kg/m².
    pub precipitation: f64,
}

impl GriddedSample {
    pub fn temperature_celsius(&self) -> f64 {
        self.temperature_k - KELVIN_OFFSET
    }

    pub fn pressure_hpa(&self) -> f64 {
        self.surface_pressure_pa / 100.0
    }

    /// Relative humidity in %, from specific humidity and Bolton's saturation pressure.
    pub fn relative_humidity(&self) -> f64 {
        let t = self.temperature_celsius();
        let saturation_pa = 6.112 * (17.67 * t / (t + 243.5)).exp() * 100.0;
        let q = self.specific_humidity;
        let vapor_pa = q * self.surface_pressure_pa / (0.622 + 0.378 * q);
        vapor_pa / saturation_pa * 100.0
    }

    /// Wind speed reduced to 2 m with a logarithmic profile.
    pub fn wind_speed_2m(&self) -> f64 {
        let speed_10m = self.zonal_wind.hypot(self.meridional_wind);
        speed_10m * (2.0 / SURFACE_ROUGHNESS).ln() / (10.0 / SURFACE_ROUGHNESS).ln()
    }

    /// Direction in degrees `[0, 360)` from the u/v components; calm air is 0.
    pub fn wind_direction(&self) -> f64 {
        if self.zonal_wind == 0.0 && self.meridional_wind == 0.0 {
            return 0.0;
        }
        let degrees = self.zonal_wind.atan2(self.meridional_wind).to_degrees();
        if degrees < 0.0 {
            degrees + 360.0
        } else {
            degrees
        }
    }

    pub fn shortwave(&self) -> f64 {
        self.shortwave_down.max(0.0)
    }

    /// Builds a table keyed by the standard parameter names.
    pub fn to_table(samples: &[GriddedSample]) -> Result<SourceTable, SourceError> {
        let mut sorted = samples.to_vec();
        sorted.sort_by_key(|s| s.timestamp);
        let index: Vec<NaiveDateTime> = sorted.iter().map(|s| s.timestamp).collect();

        let column = |name: &str, f: fn(&GriddedSample) -> f64| -> Column {
            Series::new(name.into(), sorted.iter().map(f).collect::<Vec<f64>>()).into()
        };
        let frame = DataFrame::new(vec![
            datetime_column(DATETIME_COLUMN, &index)?,
            column(PRESSURE, GriddedSample::pressure_hpa),
            column(TEMPERATURE, GriddedSample::temperature_celsius),
            column(RELATIVE_HUMIDITY, GriddedSample::relative_humidity),
            column(WIND_SPEED, GriddedSample::wind_speed_2m),
            column(WIND_DIRECTION, GriddedSample::wind_direction),
            column(PRECIPITATION, |s| s.precipitation),
            column(GLOBAL_SHORTWAVE, GriddedSample::shortwave),
            column(DOWNWELLING_LWIR, |s| s.longwave_down),
        ])?;
        SourceTable::from_frame(&frame, DATETIME_COLUMN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> GriddedSample {
        GriddedSample {
            timestamp: NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            temperature_k: 293.15,
            specific_humidity: 0.0073,
            surface_pressure_pa: 101_325.0,
            zonal_wind: 3.0,
            meridional_wind: 4.0,
            shortwave_down: -1.5,
            longwave_down: 330.0,
            precipitation: 0.2,
        }
    }

    #[test]
    fn test_unit_conversions() {
        let s = sample();
        assert!((s.temperature_celsius() - 20.0).abs() < 1e-9);
        assert!((s.pressure_hpa() - 1013.25).abs() < 1e-9);
        assert_eq!(s.shortwave(), 0.0);
    }

    #[test]
    fn test_relative_humidity() {
        // e = 0.0073 * 101325 / (0.622 + 0.378 * 0.0073) ≈ 1183.9 Pa, e_s(20 °C) ≈ 2336.9 Pa.
        let rh = sample().relative_humidity();
        assert!((rh - 50.66).abs() < 0.01, "rh = {}", rh);
    }

    #[test]
    fn test_wind_reduction_and_direction() {
        let s = sample();
        let expected = 5.0 * (2.0_f64 / 0.34).ln() / (10.0_f64 / 0.34).ln();
        assert!((s.wind_speed_2m() - expected).abs() < 1e-12);
        assert!(s.wind_speed_2m() < 5.0);

        let direction = |u: f64, v: f64| GriddedSample {
            zonal_wind: u,
            meridional_wind: v,
            ..sample()
        }
        .wind_direction();
        assert_eq!(direction(0.0, 0.0), 0.0);
        assert!((direction(1.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((direction(0.0, -1.0) - 180.0).abs() < 1e-9);
        assert!((direction(-1.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_table() -> Result<(), SourceError> {
        let first = sample();
        let second = GriddedSample {
            timestamp: first.timestamp + chrono::TimeDelta::hours(1),
            ..first
        };
        let table = GriddedSample::to_table(&[second, first])?;
        assert_eq!(table.len(), 8);
        let temperature = table.get(TEMPERATURE).ok_or_else(|| SourceError::DataUnavailable {
            key: TEMPERATURE.to_string(),
            reason: "missing".to_string(),
        })?;
        assert_eq!(temperature.index(), vec![first.timestamp, second.timestamp]);
        assert_eq!(temperature.get(first.timestamp), Some(first.temperature_celsius()));
        Ok(())
    }
}
