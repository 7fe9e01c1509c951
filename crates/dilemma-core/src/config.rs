//! Tunable constants for the forecasting engine.

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Engine configuration shared by the parser, scorer, and ranker.
///
/// The defaults reproduce the canonical forecast: base 11.3, a 100-point
/// distribution, and ranged effects halved before scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Base of the score-to-weight exponential. Must be greater than one.
    pub exponent_base: f64,
    /// Sum every finite distribution is rounded to.
    pub percent_total: u32,
    /// Extra divisor applied to ranged effect numerators.
    pub range_divisor: f64,
    /// Prefix of effect statements that carry no information.
    pub unknown_marker: String,
    /// Appended to the label of an option that enacts an excluded policy.
    pub policy_reform_suffix: String,
    /// Rank a "Dismiss issue." option with a neutral score alongside the rest.
    pub include_dismiss: bool,
    /// Scale each delta by its observation count relative to the option's rarest effect.
    pub confidence_weighting: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            exponent_base: 11.3,
            percent_total: 100,
            range_divisor: 2.0,
            unknown_marker: "unknown effect".to_string(),
            policy_reform_suffix: " policy reform".to_string(),
            include_dismiss: true,
            confidence_weighting: false,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !self.exponent_base.is_finite() || self.exponent_base <= 1.0 {
            return Err(ForecastError::InvalidBase(self.exponent_base));
        }
        if self.range_divisor == 0.0 || !self.range_divisor.is_finite() {
            return Err(ForecastError::InvalidDivisor(self.range_divisor));
        }
        Ok(())
    }
}
