//! State carried between refinement cycles.

use dilemma_core::{
    BiasProfile, DisplayToggles, Exclusions, Forecast, ForecastError, ForecastRequest, Forecaster,
    PolicyRules,
};
use dilemma_sync::{IssueDocument, IssueRef};
use tracing::debug;

use crate::command::Command;

/// What the loop should do after a command has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Refresh,
    Fetch(IssueRef),
    Exit,
}

pub struct Session {
    forecaster: Forecaster,
    nation: String,
    profile: BiasProfile,
    policies: PolicyRules,
    document: IssueDocument,
    exclusions: Exclusions,
    toggles: DisplayToggles,
}

impl Session {
    pub fn new(
        forecaster: Forecaster,
        nation: String,
        profile: BiasProfile,
        policies: PolicyRules,
        document: IssueDocument,
    ) -> Self {
        Self {
            forecaster,
            nation,
            profile,
            policies,
            document,
            exclusions: Exclusions::new(),
            toggles: DisplayToggles::default(),
        }
    }

    pub fn document(&self) -> &IssueDocument {
        &self.document
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn toggles(&self) -> DisplayToggles {
        self.toggles
    }

    /// Exclusions and toggles carry over to the new issue.
    pub fn set_document(&mut self, document: IssueDocument) {
        self.document = document;
    }

    pub fn apply(&mut self, command: &Command) -> Step {
        match command {
            Command::NewIssue(issue) => return Step::Fetch(*issue),
            Command::ResetExclusions => self.exclusions.clear(),
            Command::ToggleZeroBias => {
                self.toggles.zero_bias_filter = !self.toggles.zero_bias_filter;
            }
            Command::ToggleCumulative => self.toggles.cumulative = !self.toggles.cumulative,
            Command::Exit => return Step::Exit,
            Command::ToggleOption(label) => {
                let excluded = self.exclusions.toggle(label);
                debug!(label = %label, excluded, "toggled option");
            }
        }
        Step::Refresh
    }

    pub fn forecast(&self) -> Result<Forecast, ForecastError> {
        self.forecaster.forecast(&ForecastRequest {
            nation: &self.nation,
            rows: &self.document.rows,
            profile: &self.profile,
            policies: &self.policies,
            exclusions: &self.exclusions,
            toggles: self.toggles,
        })
    }
}
