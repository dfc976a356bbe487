//! Parameters computed from two other parameters with a closed-form physical formula.

use crate::resolve::error::UnsupportedParameterError;
use crate::resolve::{ensure_complete, Resolution, ResolvedFrom};
use crate::types::fused_table::FusedTable;
use polars::prelude::{col, lit, Expr};
use std::fmt;

/// Stefan–Boltzmann constant, W·m⁻²·K⁻⁴.
pub const STEFAN_BOLTZMANN: f64 = 5.670374e-8;

const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Two-input formulas. Add a variant (with its inputs and math) to support a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedFormula {
    /// Downwelling longwave radiation (W/m²) from air temperature (°C) and relative humidity (%).
    BruntLongwave,
}

impl DerivedFormula {
    pub fn name(self) -> &'static str {
        match self {
            DerivedFormula::BruntLongwave => "brunt",
        }
    }

    /// Looks a formula up by its configured name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "brunt" | "brunt_longwave" | "dlr_brunt" => Some(DerivedFormula::BruntLongwave),
            _ => None,
        }
    }

    /// Formula conventionally used for a parameter name, when the configuration names none.
    pub fn for_parameter(parameter: &str) -> Option<Self> {
        match parameter {
            "downwelling_lwir" | "downwelling_longwave" => Some(DerivedFormula::BruntLongwave),
            _ => None,
        }
    }

    /// Parameters read as the first and second argument.
    pub fn default_inputs(self) -> [&'static str; 2] {
        match self {
            DerivedFormula::BruntLongwave => ["temperature", "relative_humidity"],
        }
    }

    pub fn apply(self, first: f64, second: f64) -> f64 {
        match self {
            DerivedFormula::BruntLongwave => brunt_longwave(first, second),
        }
    }

    /// The formula over two column expressions. Null in either input gives null.
    pub fn expr(self, first: Expr, second: Expr) -> Expr {
        match self {
            DerivedFormula::BruntLongwave => brunt_longwave_expr(first, second),
        }
    }
}

impl fmt::Display for DerivedFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Saturation vapour pressure over water in hPa (Magnus/Tetens form).
pub fn saturation_vapor_pressure(temp_celsius: f64) -> f64 {
    6.11 * (17.27 * temp_celsius / (237.3 + temp_celsius)).exp()
}

/// Clear-sky downwelling longwave radiation (W/m²), Brunt emissivity.
pub fn brunt_longwave(temp_celsius: f64, relative_humidity: f64) -> f64 {
    let temp_kelvin = temp_celsius + CELSIUS_TO_KELVIN;
    let vapor_pressure = saturation_vapor_pressure(temp_celsius) * relative_humidity / 100.0;
    let emissivity = 0.61 + 0.05 * vapor_pressure.sqrt();
    emissivity * STEFAN_BOLTZMANN * temp_kelvin.powi(4)
}

fn brunt_longwave_expr(temp_celsius: Expr, relative_humidity: Expr) -> Expr {
    let saturation = lit(6.11)
        * (lit(17.27) * temp_celsius.clone() / (lit(237.3) + temp_celsius.clone())).exp();
    let vapor_pressure = saturation * relative_humidity / lit(100.0);
    let emissivity = lit(0.61) + lit(0.05) * vapor_pressure.sqrt();
    emissivity * lit(STEFAN_BOLTZMANN) * (temp_celsius + lit(CELSIUS_TO_KELVIN)).pow(lit(4.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRequest {
    pub name: String,
    pub formula: DerivedFormula,
    pub inputs: [String; 2],
}

/// Applies each request's formula element-wise over its two input columns.
///
/// A row where either input is missing stays missing.
///
/// # Errors
///
/// [`UnsupportedParameterError`] listing every request with an input column absent from `table`.
pub fn resolve(
    requests: &[DerivedRequest],
    table: &FusedTable,
) -> Result<Resolution, UnsupportedParameterError> {
    let mut resolution = Resolution::default();

    for request in requests {
        let [first, second] = &request.inputs;
        if table.column(first).is_none() || table.column(second).is_none() {
            continue;
        }
        resolution.columns.push(
            request
                .formula
                .expr(col(first.as_str()), col(second.as_str()))
                .alias(request.name.as_str()),
        );
        resolution.record.resolved.push((
            request.name.clone(),
            ResolvedFrom::Formula {
                formula: request.formula,
                inputs: request.inputs.clone(),
            },
        ));
    }

    ensure_complete(requests.iter().map(|r| r.name.as_str()), &resolution.record)?;
    Ok(resolution)
}
