use crate::registry::error::ConfigurationError;
use std::fmt;

/// Share of a base parameter taken by a fractional split, a ratio in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fraction(f64);

impl Fraction {
    /// Validates `ratio` for `parameter`; anything outside `(0, 1]` is a configuration error.
    pub fn new(parameter: &str, ratio: f64) -> Result<Self, ConfigurationError> {
        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(ConfigurationError::FractionOutOfRange {
                parameter: parameter.to_string(),
                fraction: ratio,
            });
        }
        Ok(Self(ratio))
    }

    /// Reads `"80%"` as 0.8 and a bare `"0.8"` as 0.8.
    pub fn parse(parameter: &str, text: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidFraction {
            parameter: parameter.to_string(),
            fraction: text.to_string(),
        };
        let trimmed = text.trim();
        let ratio = match trimmed.strip_suffix('%') {
            Some(percent) => percent.trim().parse::<f64>().map_err(|_| invalid())? / 100.0,
            None => trimmed.parse::<f64>().map_err(|_| invalid())?,
        };
        Self::new(parameter, ratio)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}
