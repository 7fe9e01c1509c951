//! Effect statement classification.
//!
//! Each line of an option's effects cell is one of:
//!
//! - a ranged estimate: `"-5 to -1 Crime (mean -3)"`
//! - a simple directional value: `"3 Happiness"`
//! - free text (a policy change, a notability, ...), kept for annotation
//! - noise: the unknown-effect marker, or a single observation
//!
//! Ranged estimates normalise to
//! `(min(high,0) + mean + max(low,0)) / divisor / (max(high,0) - min(low,0))`,
//! simple values to their sign.

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ForecastConfig;
use crate::error::ForecastError;

const NUMBER: &str = r"([-+]?\d+(?:\.\d+)?)";
const CATEGORY: &str = r"([^.\d]+)";

/// A statement observed exactly once is ignored as anecdotal.
const SINGLETON: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Ranged,
    Simple,
}

/// A statement reduced to a signed per-category delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub category: String,
    pub delta: f64,
    pub kind: EffectKind,
    /// Parsed observation count; `None` when the count cell is absent or non-numeric.
    pub observations: Option<u32>,
}

/// Outcome of classifying one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEffect {
    Delta(EffectDescriptor),
    /// Not a census effect; handed to the annotation splitter.
    Unparsed(String),
    Discarded,
}

/// All statements of one option, classified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionEffects {
    /// Parsed effects in statement order.
    pub effects: Vec<EffectDescriptor>,
    pub unparsed: Vec<String>,
    /// Smallest positive observation count among non-discarded statements.
    pub min_observations: Option<u32>,
}

impl OptionEffects {
    /// Delta scaled by how often the effect was observed relative to the
    /// option's least-observed statement.
    ///
    /// Without any positive count the unweighted delta is returned; an effect
    /// with no count of its own weighs zero once counts exist.
    pub fn weighted_delta(&self, effect: &EffectDescriptor) -> f64 {
        match self.min_observations {
            Some(min) => effect.delta * f64::from(effect.observations.unwrap_or(0)) / f64::from(min),
            None => effect.delta,
        }
    }

    /// Aggregate per category. A later statement for the same category
    /// replaces an earlier one.
    pub fn deltas(&self, weighted: bool) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for effect in &self.effects {
            let delta = if weighted {
                self.weighted_delta(effect)
            } else {
                effect.delta
            };
            out.insert(effect.category.clone(), delta);
        }
        out
    }
}

/// Compiled statement patterns plus the normalisation constants.
#[derive(Debug, Clone)]
pub struct EffectParser {
    ranged: Regex,
    simple: Regex,
    unknown_marker: String,
    range_divisor: f64,
}

impl EffectParser {
    pub fn new(config: &ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        let ranged = Regex::new(&format!(
            r"^{NUMBER} to {NUMBER} {CATEGORY} \(mean {NUMBER}\)$"
        ))?;
        let simple = Regex::new(&format!("^{NUMBER} {CATEGORY}$"))?;
        Ok(Self {
            ranged,
            simple,
            unknown_marker: config.unknown_marker.clone(),
            range_divisor: config.range_divisor,
        })
    }

    /// Classify one statement with its (possibly empty) observation count cell.
    pub fn parse(&self, statement: &str, count: &str) -> ParsedEffect {
        let count = count.trim();
        if statement.starts_with(&self.unknown_marker) || count == SINGLETON {
            return ParsedEffect::Discarded;
        }
        let observations = parse_count(count);

        if let Some(caps) = self.ranged.captures(statement) {
            return match self.ranged_delta(&caps) {
                Some((category, delta)) => ParsedEffect::Delta(EffectDescriptor {
                    category,
                    delta,
                    kind: EffectKind::Ranged,
                    observations,
                }),
                None => {
                    debug!(statement, "ranged effect has an empty range");
                    ParsedEffect::Unparsed(statement.to_string())
                }
            };
        }

        if let Some(caps) = self.simple.captures(statement)
            && let Some(mean) = number(&caps, 1)
        {
            return ParsedEffect::Delta(EffectDescriptor {
                category: caps[2].to_string(),
                delta: signum(mean),
                kind: EffectKind::Simple,
                observations,
            });
        }

        ParsedEffect::Unparsed(statement.to_string())
    }

    /// Classify every statement of an option. Missing count cells are empty.
    pub fn parse_option(&self, effects: &[String], observations: &[String]) -> OptionEffects {
        let mut out = OptionEffects::default();
        for (i, statement) in effects.iter().enumerate() {
            let count = observations.get(i).map(String::as_str).unwrap_or("");
            let parsed = self.parse(statement, count);
            if parsed == ParsedEffect::Discarded {
                continue;
            }
            if let Some(n) = parse_count(count.trim())
                && n > 0
                && out.min_observations.is_none_or(|min| n < min)
            {
                out.min_observations = Some(n);
            }
            match parsed {
                ParsedEffect::Delta(effect) => out.effects.push(effect),
                ParsedEffect::Unparsed(text) => out.unparsed.push(text),
                ParsedEffect::Discarded => {}
            }
        }
        out
    }

    fn ranged_delta(&self, caps: &Captures<'_>) -> Option<(String, f64)> {
        let low = number(caps, 1)?;
        let high = number(caps, 2)?;
        let mean = number(caps, 4)?;
        let numerator = high.min(0.0) + mean + low.max(0.0);
        let denominator = high.max(0.0) - low.min(0.0);
        if denominator == 0.0 {
            return None;
        }
        Some((caps[3].to_string(), numerator / self.range_divisor / denominator))
    }
}

fn number(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

fn parse_count(count: &str) -> Option<u32> {
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    count.parse().ok()
}

fn signum(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
