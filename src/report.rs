use std::fmt;

use crate::model::Outcome;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub key: String,
    pub detail: String,
}

/// Tally of one executor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub archived: usize,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Summary::default(), |mut summary, outcome| {
            summary.total += 1;
            match &outcome.error {
                None => summary.archived += 1,
                Some(detail) => summary.failures.push(Failure {
                    key: outcome.key.clone(),
                    detail: detail.clone(),
                }),
            }
            summary
        })
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Archive Summary")?;
        writeln!(f, "{}", rule)?;
        for failure in &self.failures {
            writeln!(f, "Failed: {} - {}", failure.key, failure.detail)?;
        }
        writeln!(f)?;
        writeln!(f, "Total issues: {}", self.total)?;
        writeln!(f, "Successfully archived: {}", self.archived)?;
        writeln!(f, "Failed: {}", self.failed())?;
        write!(f, "{}", rule)
    }
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The search matched nothing; no archive call was made.
    NothingToArchive,
    Completed(Summary),
}

impl Report {
    pub fn has_failures(&self) -> bool {
        match self {
            Report::NothingToArchive => false,
            Report::Completed(summary) => summary.has_failures(),
        }
    }

    /// Process exit status: 1 when any issue failed to archive, else 0.
    pub fn exit_status(&self) -> u8 {
        u8::from(self.has_failures())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::NothingToArchive => write!(f, "No matching issues found; nothing to archive."),
            Report::Completed(summary) => fmt::Display::fmt(summary, f),
        }
    }
}
