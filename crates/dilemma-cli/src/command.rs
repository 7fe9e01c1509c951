//! Typed commands read from the refinement prompt.

use dilemma_sync::IssueRef;

pub const MENU: &str = "\"f\" > toggle zero bias
\"c\" > toggle cumulative summation
\"n <number>|n ?\" > reset with new issue number
\"1-9\" > drop/restore option
\"0\" > reset options
\"e\" > exit
>> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewIssue(IssueRef),
    ResetExclusions,
    ToggleZeroBias,
    ToggleCumulative,
    Exit,
    /// Drop or restore the option with this label.
    ToggleOption(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some(rest) = line.strip_prefix("n ")
            && let Ok(issue) = rest.parse()
        {
            return Some(Self::NewIssue(issue));
        }
        Some(match line {
            "0" => Self::ResetExclusions,
            "f" => Self::ToggleZeroBias,
            "c" => Self::ToggleCumulative,
            "e" => Self::Exit,
            label => Self::ToggleOption(label.to_string()),
        })
    }
}
