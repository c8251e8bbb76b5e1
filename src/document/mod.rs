//! The host document contract.
//!
//! The engine never owns text. Everything it needs from the buffer it is
//! rewriting goes through [`Document`]: searching, scope scoring, replacing,
//! folding and highlighting. [`TextDocument`] is the in-memory host used by
//! the CLI and the tests.

pub mod scopes;
pub mod text;

pub use scopes::{CompiledSyntax, ScopeMap, ScopeRule, SyntaxDefinition};
pub use text::TextDocument;

use crate::matcher::{Match, SearchQuery};
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one document instance. Two documents with equal text still
/// have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Allocate a fresh, process-unique id.
    pub fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// How a highlight set is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    #[default]
    Outline,
    /// Drawn under each character; needs one empty anchor per offset.
    Underline,
    Solid,
}

impl HighlightStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightStyle::Outline => "outline",
            HighlightStyle::Underline => "underline",
            HighlightStyle::Solid => "solid",
        }
    }
}

impl fmt::Display for HighlightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "outline" => Ok(HighlightStyle::Outline),
            "underline" => Ok(HighlightStyle::Underline),
            "solid" => Ok(HighlightStyle::Solid),
            other => Err(other.to_string()),
        }
    }
}

/// A named set of highlighted regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub regions: Vec<Region>,
    pub color: String,
    pub style: HighlightStyle,
}

/// Operations the engine needs from the buffer it works on.
///
/// Offsets are character offsets into the current text. Implementations must
/// return search results and selector regions in ascending, non-overlapping
/// order.
pub trait Document {
    /// Identity of this document instance.
    fn id(&self) -> DocumentId;

    /// Hash of the current text, used to detect edits between a find and
    /// its confirmation.
    fn fingerprint(&self) -> u64;

    fn len_chars(&self) -> usize;

    fn text_of(&self, region: Region) -> String;

    /// Every non-overlapping match of `query` over the whole document, with
    /// the replacement template already expanded for each.
    fn search_all(&self, query: &SearchQuery) -> Vec<Match>;

    /// Maximal runs of points whose scope matches `selector`.
    fn regions_matching_selector(&self, selector: &str) -> Vec<Region>;

    /// How strongly the scope at `point` matches `selector`; 0 is no match.
    fn score_selector(&self, point: usize, selector: &str) -> u32;

    fn replace(&mut self, region: Region, text: &str);

    fn fold(&mut self, regions: &[Region]);

    fn unfold(&mut self, region: Region);

    /// Replace the highlight set stored under `key`.
    fn add_highlight(&mut self, key: &str, regions: Vec<Region>, color: &str, style: HighlightStyle);

    fn clear_highlight(&mut self, key: &str);

    /// Start of the first selection, if there is one.
    fn cursor_point(&self) -> Option<usize>;

    /// Scroll the view so `point` is visible.
    fn reveal(&mut self, point: usize);
}
