//! The narrow view of a results table row the engine consumes.

use serde::{Deserialize, Serialize};

/// One option row of an issue results table.
pub trait DocumentRow {
    /// Option label and headline, e.g. `"1. The Prime Minister says..."`.
    fn result_text(&self) -> &str;

    /// Effect statements, one per line of the effects cell.
    fn effects(&self) -> &[String];

    /// Observation counts aligned with [`effects`](Self::effects). May be shorter.
    fn observations(&self) -> &[String];
}

/// Owned table row, as extracted from a results page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub result: String,
    pub effects: Vec<String>,
    pub observations: Vec<String>,
}

impl TableRow {
    pub fn new(
        result: impl Into<String>,
        effects: impl IntoIterator<Item = impl Into<String>>,
        observations: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            result: result.into(),
            effects: effects.into_iter().map(Into::into).collect(),
            observations: observations.into_iter().map(Into::into).collect(),
        }
    }
}

impl DocumentRow for TableRow {
    fn result_text(&self) -> &str {
        &self.result
    }

    fn effects(&self) -> &[String] {
        &self.effects
    }

    fn observations(&self) -> &[String] {
        &self.observations
    }
}
