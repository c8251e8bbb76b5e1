use crate::action::ActionError;
use crate::engine::session::Handshake;
use crate::matcher::PatternError;
use crate::region::Region;
use std::fmt;

/// Outcome of one pattern in a single-pass run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTally {
    pub name: String,
    pub outcome: Result<usize, PatternError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tally {
    /// One entry per requested name, in request order.
    PerPattern(Vec<PatternTally>),
    MultiPass {
        sweeps: usize,
        /// Regions acted on, summed over every sweep.
        total: usize,
        /// The last sweep acted on nothing.
        converged: bool,
        errors: Vec<(String, PatternError)>,
    },
}

impl Tally {
    /// Regions acted on across the run.
    pub fn total(&self) -> usize {
        match self {
            Tally::PerPattern(entries) => entries
                .iter()
                .filter_map(|entry| entry.outcome.as_ref().ok())
                .sum(),
            Tally::MultiPass { total, .. } => *total,
        }
    }

    /// Count for `name`, `None` if it failed or was not run individually.
    pub fn count(&self, name: &str) -> Option<usize> {
        match self {
            Tally::PerPattern(entries) => entries
                .iter()
                .find(|entry| entry.name == name)
                .and_then(|entry| entry.outcome.as_ref().ok().copied()),
            Tally::MultiPass { .. } => None,
        }
    }

    pub fn errors(&self) -> Vec<(&str, &PatternError)> {
        match self {
            Tally::PerPattern(entries) => entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .outcome
                        .as_ref()
                        .err()
                        .map(|e| (entry.name.as_str(), e))
                })
                .collect(),
            Tally::MultiPass { errors, .. } => {
                errors.iter().map(|(name, e)| (name.as_str(), e)).collect()
            }
        }
    }
}

/// Everything a run produced, for the host to display.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub tally: Tally,
    /// Recorded target regions, in the order they were recorded.
    pub targets: Vec<Region>,
    /// Set after a find-only run; pass it to `Engine::confirm`.
    pub pending: Option<Handshake>,
    /// The action could not run; nothing was dispatched.
    pub action_error: Option<ActionError>,
    /// Format one pattern per line.
    pub in_panel: bool,
}

impl RunReport {
    pub fn is_bad_action(&self) -> bool {
        self.action_error.is_some()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.action_error.is_some() {
            return f.write_str("Error: Bad Action!");
        }
        let sep = if self.in_panel { "\n" } else { " " };
        let mut parts: Vec<String> = Vec::new();
        match &self.tally {
            Tally::PerPattern(entries) => {
                for entry in entries {
                    parts.push(match &entry.outcome {
                        Ok(count) => format!("{}: {} regions;", entry.name, count),
                        Err(e) => format!("{}: {};", entry.name, e),
                    });
                }
            }
            Tally::MultiPass { total, errors, .. } => {
                parts.push(format!("Regions Found: {total} regions;"));
                for (name, e) in errors {
                    parts.push(format!("{name}: {e};"));
                }
            }
        }
        f.write_str(&parts.join(sep))
    }
}
