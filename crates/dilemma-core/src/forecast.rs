//! One refinement cycle: score every option, rank, and compose the bias table.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bias_table::{BiasTable, BiasTableComposer, TableOption};
use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::profile::{BiasProfile, DisplayToggles, Exclusions, PolicyRules};
use crate::ranker::ProbabilityRanker;
use crate::row::DocumentRow;
use crate::scorer::{OptionRecord, OptionScorer, ScoringContext};

pub const DISMISS_LABEL: &str = "0.";
pub const DISMISS_HEADLINE: &str = "Dismiss issue.";

/// Behavior columns shown first, in this order, when any option has them.
pub const KNOWN_BEHAVIORS: &[&str] = &[
    "resigns from",
    "leads to",
    "adds",
    "removes",
    "sometimes adds",
    "sometimes removes",
    "may add or remove",
];

/// Everything one cycle needs. Rebuilt by the caller for every command.
#[derive(Debug, Clone, Copy)]
pub struct ForecastRequest<'a, R> {
    pub nation: &'a str,
    pub rows: &'a [R],
    pub profile: &'a BiasProfile,
    pub policies: &'a PolicyRules,
    pub exclusions: &'a Exclusions,
    pub toggles: DisplayToggles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Options in document order, the dismiss option first when enabled.
    pub options: Vec<OptionRecord>,
    pub bias_table: BiasTable,
}

impl Forecast {
    /// The highest-ranked option that is still in play.
    pub fn leader(&self) -> Option<&OptionRecord> {
        self.options
            .iter()
            .filter(|o| !o.excluded)
            .fold(None, |best: Option<&OptionRecord>, o| match (best, o.percent) {
                (Some(b), Some(p)) if b.percent.unwrap_or(0) >= p => Some(b),
                (_, Some(_)) => Some(o),
                (b, None) => b,
            })
    }

    /// Annotation behaviors across all options: the known ones first, then
    /// the rest in the order they were first seen.
    pub fn annotation_columns(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        for option in &self.options {
            for row in &option.annotations {
                for annotation in row.iter() {
                    if !seen.contains(&annotation.behavior.as_str()) {
                        seen.push(&annotation.behavior);
                    }
                }
            }
        }
        let mut columns: Vec<String> = KNOWN_BEHAVIORS
            .iter()
            .filter(|b| seen.contains(b))
            .map(|b| b.to_string())
            .collect();
        columns.extend(
            seen.into_iter()
                .filter(|b| !KNOWN_BEHAVIORS.contains(b))
                .map(str::to_string),
        );
        columns
    }
}

/// The forecasting engine: compiled patterns plus ranking constants.
///
/// Holds no per-issue state; one instance serves a whole session.
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
    scorer: OptionScorer,
    ranker: ProbabilityRanker,
    composer: BiasTableComposer,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Result<Self, ForecastError> {
        let scorer = OptionScorer::new(&config)?;
        let ranker = ProbabilityRanker::from_config(&config);
        let baseline = config.include_dismiss.then(|| DISMISS_LABEL.to_string());
        let composer = BiasTableComposer::new(ranker, baseline);
        Ok(Self {
            config,
            scorer,
            ranker,
            composer,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Run one cycle.
    ///
    /// Fails when an option references a category the profile lacks; the
    /// caller should report it and keep accepting commands.
    pub fn forecast<R: DocumentRow>(
        &self,
        request: &ForecastRequest<'_, R>,
    ) -> Result<Forecast, ForecastError> {
        let ctx = ScoringContext {
            nation: request.nation,
            profile: request.profile,
            policies: request.policies,
            exclusions: request.exclusions,
        };

        let mut options: Vec<OptionRecord> = Vec::with_capacity(request.rows.len() + 1);
        if self.config.include_dismiss {
            options.push(OptionRecord::new(DISMISS_LABEL, DISMISS_HEADLINE, 0.0));
        }
        let first_row = options.len();

        let mut deltas = Vec::with_capacity(request.rows.len());
        for row in request.rows {
            let scored = self.scorer.score(row, &ctx)?;
            options.push(scored.record);
            deltas.push(scored.deltas);
        }

        let scores: Vec<f64> = options.iter().map(|o| o.net_score).collect();
        for (option, percent) in options.iter_mut().zip(self.ranker.rank(&scores)) {
            option.percent = percent;
        }

        let surviving: Vec<TableOption<'_>> = options[first_row..]
            .iter()
            .zip(&deltas)
            .filter_map(|(option, deltas)| {
                deltas.as_ref().map(|deltas| TableOption {
                    label: &option.label,
                    deltas,
                    percent: option.percent,
                })
            })
            .collect();
        let bias_table = self
            .composer
            .compose(request.profile, &surviving, request.toggles);

        info!(
            options = options.len(),
            excluded = options.iter().filter(|o| o.excluded).count(),
            categories = bias_table.rows.len(),
            "forecast complete"
        );
        Ok(Forecast {
            options,
            bias_table,
        })
    }
}
