//! Per-session inputs: the category bias profile, policy rules, and the
//! user-controlled exclusion set.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Signed weight per census category.
///
/// Category names are case-sensitive and must match the scraped effect text
/// exactly. Iteration is alphabetical by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasProfile {
    /// Header shown above the category column.
    pub census_label: String,
    biases: BTreeMap<String, f64>,
}

impl BiasProfile {
    pub fn new(census_label: impl Into<String>) -> Self {
        Self {
            census_label: census_label.into(),
            biases: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, category: impl Into<String>, bias: f64) {
        self.biases.insert(category.into(), bias);
    }

    /// `None` means the profile does not define the category at all.
    pub fn bias(&self, category: &str) -> Option<f64> {
        self.biases.get(category).copied()
    }

    pub fn len(&self) -> usize {
        self.biases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.biases.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for BiasProfile {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut profile = BiasProfile::new("census");
        for (category, bias) in iter {
            profile.insert(category, bias);
        }
        profile
    }
}

/// A policy change the user never wants to enact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Change verb as it appears in effect text, e.g. "adopts" or "abolishes".
    pub change: String,
    pub policy: String,
}

impl PolicyRule {
    pub fn new(change: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            change: change.into(),
            policy: policy.into(),
        }
    }

    /// The exact effect statement this rule matches.
    pub fn render(&self) -> String {
        format!("{} policy: {}", self.change, self.policy)
    }
}

/// Rendered policy rules, matched verbatim against unparsed statements.
#[derive(Debug, Clone, Default)]
pub struct PolicyRules {
    rendered: HashSet<String>,
}

impl PolicyRules {
    pub fn matches(&self, statement: &str) -> bool {
        self.rendered.contains(statement)
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

impl FromIterator<PolicyRule> for PolicyRules {
    fn from_iter<I: IntoIterator<Item = PolicyRule>>(iter: I) -> Self {
        Self {
            rendered: iter.into_iter().map(|rule| rule.render()).collect(),
        }
    }
}

/// Option labels the user has removed from ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    labels: BTreeSet<String>,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the label if absent, remove it if present. Returns whether it is now excluded.
    pub fn toggle(&mut self, label: &str) -> bool {
        if self.labels.remove(label) {
            false
        } else {
            self.labels.insert(label.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Whether an option label is excluded.
    ///
    /// Exact membership, or a numeric entry that prefixes the label up to a
    /// non-digit: "1" excludes "1." and "1. policy reform" but not "10.".
    pub fn excludes(&self, label: &str) -> bool {
        if self.labels.contains(label) {
            return true;
        }
        self.labels.iter().any(|entry| {
            !entry.is_empty()
                && entry.bytes().all(|b| b.is_ascii_digit())
                && label
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
        })
    }
}

impl<S: Into<String>> FromIterator<S> for Exclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// View switches carried across refinement cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayToggles {
    /// Hide categories whose bias is exactly zero.
    pub zero_bias_filter: bool,
    /// Show running per-cutoff percentages instead of raw deltas.
    pub cumulative: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            zero_bias_filter: true,
            cumulative: false,
        }
    }
}
