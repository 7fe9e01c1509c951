//! Per-option scoring against the bias profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{AnnotationRow, split_annotations};
use crate::config::ForecastConfig;
use crate::effect::EffectParser;
use crate::error::ForecastError;
use crate::profile::{BiasProfile, Exclusions, PolicyRules};
use crate::row::DocumentRow;

/// Headline placeholder for the nation's name.
pub const NAME_MARKER: &str = "@@NAME@@";

/// One candidate choice, scored and (after ranking) given a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Label as scraped, e.g. "1.".
    pub label: String,
    /// Label with the policy reform suffix when the option enacts an excluded policy.
    pub display_label: String,
    pub headline: String,
    /// `-inf` for excluded options, which serialises as `null`.
    #[serde(with = "unrankable_score")]
    pub net_score: f64,
    pub datums: Option<u32>,
    pub annotations: Vec<AnnotationRow>,
    pub percent: Option<u32>,
    pub excluded: bool,
    pub policy_reform: bool,
}

/// `-inf` round-trips through JSON as `null`.
mod unrankable_score {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *score == f64::NEG_INFINITY {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(score)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }
}

/// One line of an option as laid out in the options table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRow<'a> {
    /// Empty on every sub-row after the first.
    pub label: &'a str,
    pub datums: Option<u32>,
    pub net_score: f64,
    pub percent: Option<u32>,
    pub headline: &'a str,
    pub annotations: Option<&'a AnnotationRow>,
}

impl OptionRecord {
    pub fn new(label: impl Into<String>, headline: impl Into<String>, net_score: f64) -> Self {
        let label = label.into();
        Self {
            display_label: label.clone(),
            label,
            headline: headline.into(),
            net_score,
            datums: None,
            annotations: Vec::new(),
            percent: None,
            excluded: false,
            policy_reform: false,
        }
    }

    /// Lay the option out over as many rows as it has headline lines or
    /// annotation rows. Sub-rows repeat the score and percent; a sub-row past
    /// the last headline line repeats the first line, and one past the last
    /// annotation row repeats the first annotation row.
    pub fn display_rows(&self) -> Vec<DisplayRow<'_>> {
        let lines: Vec<&str> = self.headline.split('\n').collect();
        let count = lines.len().max(self.annotations.len()).max(1);
        (0..count)
            .map(|i| DisplayRow {
                label: if i == 0 { self.display_label.as_str() } else { "" },
                datums: self.datums,
                net_score: self.net_score,
                percent: self.percent,
                headline: lines.get(i).or(lines.first()).copied().unwrap_or(""),
                annotations: self.annotations.get(i).or(self.annotations.first()),
            })
            .collect()
    }
}

/// Read-only inputs shared by every option of one refinement cycle.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub nation: &'a str,
    pub profile: &'a BiasProfile,
    pub policies: &'a PolicyRules,
    pub exclusions: &'a Exclusions,
}

/// A scored option plus the per-category deltas behind its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOption {
    pub record: OptionRecord,
    /// `None` for excluded options.
    pub deltas: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone)]
pub struct OptionScorer {
    parser: EffectParser,
    confidence_weighting: bool,
    policy_reform_suffix: String,
}

impl OptionScorer {
    pub fn new(config: &ForecastConfig) -> Result<Self, ForecastError> {
        Ok(Self {
            parser: EffectParser::new(config)?,
            confidence_weighting: config.confidence_weighting,
            policy_reform_suffix: config.policy_reform_suffix.clone(),
        })
    }

    /// Score one table row.
    ///
    /// Fails only when an effect names a category missing from the profile.
    pub fn score<R: DocumentRow + ?Sized>(
        &self,
        row: &R,
        ctx: &ScoringContext<'_>,
    ) -> Result<ScoredOption, ForecastError> {
        let (label, headline) = split_result_text(row.result_text());
        let headline = headline.replace(NAME_MARKER, &title_case(ctx.nation));
        let parsed = self.parser.parse_option(row.effects(), row.observations());

        let mut record = OptionRecord::new(label, headline, f64::NEG_INFINITY);
        record.datums = parsed.min_observations;

        if ctx.exclusions.excludes(label) {
            debug!(option = label, "option excluded");
            record.excluded = true;
            return Ok(ScoredOption {
                record,
                deltas: None,
            });
        }

        let deltas = parsed.deltas(self.confidence_weighting);
        let mut net_score = 0.0;
        for (category, delta) in &deltas {
            let bias = ctx
                .profile
                .bias(category)
                .ok_or_else(|| ForecastError::UnknownCategory {
                    option: label.to_string(),
                    category: category.clone(),
                })?;
            net_score += bias * delta;
        }
        record.net_score = net_score;

        if parsed.unparsed.iter().any(|s| ctx.policies.matches(s)) {
            record.policy_reform = true;
            record.display_label.push_str(&self.policy_reform_suffix);
        }
        record.annotations = split_annotations(&parsed.unparsed);

        debug!(
            option = label,
            net_score,
            effects = deltas.len(),
            annotations = parsed.unparsed.len(),
            "scored option"
        );
        Ok(ScoredOption {
            record,
            deltas: Some(deltas),
        })
    }
}

/// Split `"1. Headline text"` into label and headline at the first space.
fn split_result_text(text: &str) -> (&str, &str) {
    text.trim().split_once(' ').unwrap_or((text.trim(), ""))
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::profile::PolicyRule;
    use crate::row::TableRow;

    struct Fixture {
        profile: BiasProfile,
        policies: PolicyRules,
        exclusions: Exclusions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                profile: [("Defense", 1.0), ("Economy", -1.0), ("Wealth", 0.0)]
                    .into_iter()
                    .collect(),
                policies: [PolicyRule::new("adopts", "Nuclear Power")]
                    .into_iter()
                    .collect(),
                exclusions: Exclusions::new(),
            }
        }

        fn ctx(&self) -> ScoringContext<'_> {
            ScoringContext {
                nation: "testlandia",
                profile: &self.profile,
                policies: &self.policies,
                exclusions: &self.exclusions,
            }
        }
    }

    fn scorer() -> OptionScorer {
        OptionScorer::new(&ForecastConfig::default()).unwrap()
    }

    fn row(result: &str, effects: &[&str], counts: &[&str]) -> TableRow {
        TableRow::new(result, effects.iter().copied(), counts.iter().copied())
    }

    #[test]
    fn splits_label_and_headline() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(&row("  1. Build more tanks.  ", &[], &[]), &fx.ctx())
            .unwrap();
        assert_eq!(scored.record.label, "1.");
        assert_eq!(scored.record.headline, "Build more tanks.");
    }

    #[test]
    fn weighted_sum_of_deltas() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(
                &row(
                    "1. Tanks.",
                    &["2 to 2 Defense (mean 2)", "-3 Economy"],
                    &[],
                ),
                &fx.ctx(),
            )
            .unwrap();
        // 1.0 * 1.0 + (-1.0) * (-1.0)
        assert!((scored.record.net_score - 2.0).abs() < 1e-12);
        assert_eq!(scored.deltas.unwrap().len(), 2);
    }

    #[test]
    fn zero_bias_category_is_valid() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(&row("1. Gold.", &["5 Wealth"], &[]), &fx.ctx())
            .unwrap();
        assert_eq!(scored.record.net_score, 0.0);
    }

    #[test]
    fn unknown_category_is_an_error() {
        let fx = Fixture::new();
        let err = scorer()
            .score(&row("2. Parks.", &["3 Happiness"], &[]), &fx.ctx())
            .unwrap_err();
        match err {
            ForecastError::UnknownCategory { option, category } => {
                assert_eq!(option, "2.");
                assert_eq!(category, "Happiness");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unknown_effect_only_scores_zero() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(&row("1. Nothing.", &["unknown effect Something"], &[]), &fx.ctx())
            .unwrap();
        assert_eq!(scored.record.net_score, 0.0);
        assert!(scored.deltas.unwrap().is_empty());
        assert!(scored.record.annotations.is_empty());
    }

    #[test]
    fn excluded_option_is_unrankable() {
        let mut fx = Fixture::new();
        fx.exclusions.toggle("1");
        let scored = scorer()
            .score(&row("1. Tanks.", &["3 Happiness"], &["4"]), &fx.ctx())
            .unwrap();
        assert!(scored.record.excluded);
        assert_eq!(scored.record.net_score, f64::NEG_INFINITY);
        assert!(scored.deltas.is_none());
        assert!(scored.record.annotations.is_empty());
        assert_eq!(scored.record.datums, Some(4));
    }

    #[test]
    fn excluded_policy_flags_label() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(
                &row(
                    "3. Go nuclear.",
                    &["adopts policy: Nuclear Power", "2 Economy"],
                    &[],
                ),
                &fx.ctx(),
            )
            .unwrap();
        assert!(scored.record.policy_reform);
        assert_eq!(scored.record.label, "3.");
        assert_eq!(scored.record.display_label, "3. policy reform");
        assert_eq!(scored.record.net_score, -1.0);
        assert_eq!(
            scored.record.annotations[0].iter().next(),
            Some(&Annotation {
                behavior: "adopts".into(),
                policy: "Nuclear Power".into()
            })
        );
    }

    #[test]
    fn name_marker_title_cased() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(&row("1. @@NAME@@ should arm.", &[], &[]), &fx.ctx())
            .unwrap();
        assert_eq!(scored.record.headline, "Testlandia should arm.");
    }

    #[test]
    fn confidence_weighting_scales_score() {
        let fx = Fixture::new();
        let scorer = OptionScorer::new(&ForecastConfig {
            confidence_weighting: true,
            ..Default::default()
        })
        .unwrap();
        let scored = scorer
            .score(
                &row("1. Tanks.", &["3 Defense", "-3 Economy"], &["30", "10"]),
                &fx.ctx(),
            )
            .unwrap();
        // 1.0 * (1 * 30/10) + (-1.0) * (-1 * 10/10)
        assert!((scored.record.net_score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("testlandia"), "Testlandia");
        assert_eq!(title_case("NEW_YORK city"), "New_York City");
        assert_eq!(title_case("the 2nd republic"), "The 2Nd Republic");
    }

    #[test]
    fn display_rows_for_annotation_overflow() {
        let fx = Fixture::new();
        let scored = scorer()
            .score(
                &row(
                    "1. Ban things.",
                    &["abolishes policy: A", "abolishes policy: B"],
                    &[],
                ),
                &fx.ctx(),
            )
            .unwrap();
        let rows = scored.record.display_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "1.");
        assert_eq!(rows[1].label, "");
        assert_eq!(rows[1].headline, "Ban things.");
        assert_eq!(rows[1].annotations.unwrap().get("abolishes"), Some("B"));
        assert_eq!(rows[1].net_score, rows[0].net_score);
    }

    #[test]
    fn display_rows_for_multiline_headline() {
        let mut record = OptionRecord::new("2.", "First line.\nSecond line.", 0.5);
        record.percent = Some(40);
        let rows = record.display_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].headline, "First line.");
        assert_eq!(rows[1].headline, "Second line.");
        assert_eq!(rows[1].label, "");
        assert_eq!(rows[1].percent, Some(40));
        assert!(rows[1].annotations.is_none());
    }
}
