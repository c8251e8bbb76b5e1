//! Choosing which qualified candidates to act on.
//!
//! The policy does not care where candidates came from: whole-document
//! regex matches, scope regions, and rewritten scope regions all go through
//! the same two rules.

use crate::matcher::Candidate;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every candidate.
    Greedy,
    /// The single candidate nearest the cursor, wrapping to the first.
    NonGreedy,
}

impl Policy {
    pub fn from_greedy(greedy: bool) -> Self {
        if greedy {
            Policy::Greedy
        } else {
            Policy::NonGreedy
        }
    }
}

/// Result of applying a [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Chosen candidates, highest offset first.
    pub candidates: Vec<Candidate>,
    /// Point the host should scroll to, set for a non-greedy pick.
    pub reveal: Option<usize>,
}

/// Select from `candidates`, which must be qualified and in ascending,
/// non-overlapping order.
pub fn select(mut candidates: Vec<Candidate>, policy: Policy, cursor: Option<usize>) -> Selection {
    match policy {
        Policy::Greedy => {
            candidates.reverse();
            Selection {
                candidates,
                reveal: None,
            }
        }
        Policy::NonGreedy => {
            match nearest(candidates.iter().map(|c| c.region), cursor) {
                Some(index) => {
                    let chosen = candidates.swap_remove(index);
                    Selection {
                        reveal: Some(chosen.region.start()),
                        candidates: vec![chosen],
                    }
                }
                None => Selection {
                    candidates: Vec::new(),
                    reveal: None,
                },
            }
        }
    }
}

/// Index of the first region reaching past `cursor`. Falls back to the
/// first region when there is no cursor or every region ends at or before
/// it. `None` only for an empty input.
pub fn nearest<I>(regions: I, cursor: Option<usize>) -> Option<usize>
where
    I: IntoIterator<Item = Region>,
{
    let mut regions = regions.into_iter().peekable();
    regions.peek()?;
    let Some(cursor) = cursor else {
        return Some(0);
    };
    Some(
        regions
            .position(|region| region.end() > cursor)
            .unwrap_or(0),
    )
}
