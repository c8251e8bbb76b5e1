//! Applying a selection: rewrite the text, or record target regions.

use crate::document::Document;
use crate::matcher::Candidate;
use crate::region::Region;

/// What the executor does with each selected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Replace the region's text with its resolved replacement.
    Rewrite,
    /// Only record the region; used for find-only runs and when an action
    /// takes the place of replacement.
    Record,
}

/// Act on `selected` and return how many regions were acted upon.
///
/// `selected` must be ordered by descending offset with no overlaps, so a
/// replacement never shifts a region that is still pending. Candidates
/// without replacement text are always recorded.
pub fn execute<D: Document + ?Sized>(
    doc: &mut D,
    selected: &[Candidate],
    disposition: Disposition,
    targets: &mut Vec<Region>,
) -> usize {
    debug_assert!(
        selected
            .windows(2)
            .all(|pair| pair[0].region.start() >= pair[1].region.end()),
        "selected regions must be descending and disjoint"
    );

    for candidate in selected {
        match (disposition, &candidate.replacement) {
            (Disposition::Rewrite, Some(text)) => doc.replace(candidate.region, text),
            _ => targets.push(candidate.region),
        }
    }
    selected.len()
}
