//! The category × option delta matrix shown alongside the forecast.
//!
//! In cumulative mode each cell instead holds the percentage the option would
//! get if only the categories down to that row were counted, so the table
//! reads as a forecast that firms up as less decisive categories are added.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{BiasProfile, DisplayToggles};
use crate::ranker::ProbabilityRanker;

/// Rows need the bias plus at least one option value to be worth showing.
const MIN_PRESENT_VALUES: usize = 2;

/// Serialises as `{"delta": 0.5}` or `{"percent": 42}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasCell {
    Delta(f64),
    Percent(Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasRow {
    pub category: String,
    pub bias: f64,
    /// One cell per entry of [`BiasTable::columns`].
    pub cells: Vec<BiasCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasTable {
    pub census_label: String,
    /// Option labels; in cumulative mode the dismiss baseline comes first.
    pub columns: Vec<String>,
    pub rows: Vec<BiasRow>,
    pub cumulative: bool,
}

/// An option that survived exclusion, with its deltas and ranked share.
#[derive(Debug, Clone, Copy)]
pub struct TableOption<'a> {
    pub label: &'a str,
    pub deltas: &'a BTreeMap<String, f64>,
    pub percent: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct BiasTableComposer {
    ranker: ProbabilityRanker,
    /// Label of the neutral dismiss column added in cumulative mode.
    baseline: Option<String>,
}

impl BiasTableComposer {
    pub fn new(ranker: ProbabilityRanker, baseline: Option<String>) -> Self {
        Self { ranker, baseline }
    }

    pub fn compose(
        &self,
        profile: &BiasProfile,
        options: &[TableOption<'_>],
        toggles: DisplayToggles,
    ) -> BiasTable {
        let mut rows: Vec<(String, f64, Vec<Option<f64>>)> = profile
            .iter()
            .map(|(category, bias)| {
                let cells: Vec<Option<f64>> = options
                    .iter()
                    .map(|o| o.deltas.get(category).copied())
                    .collect();
                (category.to_string(), bias, cells)
            })
            .filter(|(_, bias, cells)| {
                let present = usize::from(!bias.is_nan())
                    + cells.iter().filter(|c| c.is_some_and(|v| !v.is_nan())).count();
                present >= MIN_PRESENT_VALUES
            })
            .collect();

        // Leader among the surviving options; first wins ties.
        let leader = options
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.percent.map(|p| (i, p)))
            .fold(None, |best: Option<(usize, u32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .map(|(i, _)| i);

        let sort_key = |bias: f64, cells: &[Option<f64>]| {
            let leader_delta = leader
                .and_then(|i| cells[i])
                .map(f64::abs)
                .unwrap_or(0.0);
            (bias.abs(), bias > 0.0, leader_delta)
        };
        let cumulative = toggles.cumulative;
        rows.sort_by(|(_, bias_a, cells_a), (_, bias_b, cells_b)| {
            let a = sort_key(*bias_a, cells_a);
            let b = sort_key(*bias_b, cells_b);
            let ord = a
                .0
                .partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
                .then(a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));
            if cumulative { ord } else { ord.reverse() }
        });

        let mut columns: Vec<String> = options.iter().map(|o| o.label.to_string()).collect();
        let mut table_rows: Vec<BiasRow> = Vec::with_capacity(rows.len());

        if cumulative {
            let baseline = usize::from(self.baseline.is_some());
            if let Some(label) = &self.baseline {
                columns.insert(0, label.clone());
            }
            let mut running = vec![0.0; columns.len()];
            for (category, bias, cells) in rows {
                for (j, cell) in cells.iter().enumerate() {
                    running[baseline + j] += bias * cell.unwrap_or(0.0);
                }
                let percents = self.ranker.rank(&running);
                table_rows.push(BiasRow {
                    category,
                    bias,
                    cells: percents.into_iter().map(BiasCell::Percent).collect(),
                });
            }
        } else {
            for (category, bias, cells) in rows {
                table_rows.push(BiasRow {
                    category,
                    bias,
                    cells: cells
                        .into_iter()
                        .map(|c| BiasCell::Delta(c.unwrap_or(0.0)))
                        .collect(),
                });
            }
        }

        if toggles.zero_bias_filter {
            table_rows.retain(|row| row.bias != 0.0);
        }

        BiasTable {
            census_label: profile.census_label.clone(),
            columns,
            rows: table_rows,
            cumulative,
        }
    }
}
