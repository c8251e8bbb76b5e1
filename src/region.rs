use serde::Serialize;
use std::fmt;

/// A half-open range `[start, end)` of character offsets into a document.
///
/// Offsets are only meaningful against the document snapshot they were
/// computed from. Any edit before `end` invalidates them, which is why every
/// mutating pass works from the highest offset down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Region {
    start: usize,
    end: usize,
}

impl Region {
    /// Create a region; the bounds are normalized so that `start <= end`.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// An empty region anchored at `point`.
    pub fn point(point: usize) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `point` lies inside the half-open range.
    pub fn contains(&self, point: usize) -> bool {
        self.start <= point && point < self.end
    }

    /// Whether the two regions share at least one point, or an empty region
    /// sits strictly inside the other.
    pub fn intersects(&self, other: &Region) -> bool {
        self.start < other.end && other.start < self.end
            || (self.is_empty() && other.contains(self.start))
            || (other.is_empty() && self.contains(other.start))
    }

    /// Every offset covered by the region, in ascending order.
    pub fn points(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Same region with `end` pulled back by `amount`, never before `start`.
    pub fn trim_end(&self, amount: usize) -> Self {
        Self {
            start: self.start,
            end: self.end.saturating_sub(amount).max(self.start),
        }
    }

    /// Position of this region after `edited` (old bounds) was replaced by
    /// `inserted` characters. Returns `None` when the two overlap.
    pub fn shift_for_edit(&self, edited: Region, inserted: usize) -> Option<Self> {
        if self.end <= edited.start {
            return Some(*self);
        }
        if self.start >= edited.end {
            let start = self.start - edited.len() + inserted;
            return Some(Self {
                start,
                end: start + self.len(),
            });
        }
        None
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl From<std::ops::Range<usize>> for Region {
    fn from(range: std::ops::Range<usize>) -> Self {
        Region::new(range.start, range.end)
    }
}
