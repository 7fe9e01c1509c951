//! Score-to-percentage conversion with exact-sum integer rounding.

use std::cmp::Ordering;

use crate::config::ForecastConfig;

/// Turns net scores into integer percentages via `base ** score`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityRanker {
    base: f64,
    total: u32,
}

impl ProbabilityRanker {
    /// `base` must be greater than one; [`ForecastConfig::validate`] enforces it.
    pub fn new(base: f64, total: u32) -> Self {
        Self { base, total }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.exponent_base, config.percent_total)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Integer share of the total per score.
    ///
    /// `-inf` scores get exactly 0 and `NaN` scores get `None`. Whenever at
    /// least one score is finite the shares sum to the total. Options whose
    /// share sits closest to a whole number are rounded first; the option
    /// farthest from one absorbs whatever is left.
    pub fn rank(&self, scores: &[f64]) -> Vec<Option<u32>> {
        let mut out: Vec<Option<u32>> = scores
            .iter()
            .map(|s| if s.is_nan() { None } else { Some(0) })
            .collect();

        // Shift by the best finite score so large scores cannot overflow.
        let Some(top) = scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .max_by(|a, b| a.total_cmp(b))
        else {
            return out;
        };
        let weights: Vec<f64> = scores.iter().map(|s| self.base.powf(s - top)).collect();
        let weight_sum: f64 = weights.iter().filter(|w| !w.is_nan()).sum();
        if !(weight_sum.is_finite() && weight_sum > 0.0) {
            return out;
        }

        let total = f64::from(self.total);
        let shares: Vec<f64> = weights.iter().map(|w| w * total / weight_sum).collect();

        let mut order: Vec<usize> = (0..shares.len()).collect();
        order.sort_by(|&a, &b| match (shares[a].is_nan(), shares[b].is_nan()) {
            (false, false) => rounding_distance(shares[a])
                .partial_cmp(&rounding_distance(shares[b]))
                .unwrap_or(Ordering::Equal),
            (nan_a, nan_b) => nan_a.cmp(&nan_b),
        });
        let absorber = order.iter().rev().copied().find(|&i| weights[i] > 0.0);

        let mut remainder = self.total;
        for i in order {
            if shares[i].is_nan() {
                out[i] = None;
                continue;
            }
            let assigned = if Some(i) == absorber {
                remainder
            } else {
                let rounded = shares[i].round_ties_even() as u32;
                if rounded < remainder { rounded } else { remainder }
            };
            remainder -= assigned;
            out[i] = Some(assigned);
        }
        out
    }
}

fn rounding_distance(share: f64) -> f64 {
    (share.round_ties_even() - share).abs()
}
