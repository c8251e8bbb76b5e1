use crate::document::scopes::{CompiledSyntax, ScopeMap};
use crate::document::{Document, DocumentId, Highlight, HighlightStyle};
use crate::matcher::{Match, SearchQuery};
use crate::region::Region;
use ropey::Rope;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use xxhash_rust::xxh3::Xxh3;

/// In-memory document backed by a rope.
///
/// Scopes come from a [`CompiledSyntax`]. The scope map is built on the
/// first scope query and discarded by every edit, so a batch of edits
/// costs one rescan. Folds, highlights and the cursor follow edits; folds and
/// highlight regions that overlap an edited range are dropped.
#[derive(Debug)]
pub struct TextDocument {
    id: DocumentId,
    text: Rope,
    syntax: CompiledSyntax,
    scopes: OnceCell<ScopeMap>,
    cursor: Option<usize>,
    folds: Vec<Region>,
    highlights: BTreeMap<String, Highlight>,
    revealed: Option<usize>,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        Self::with_syntax(text, CompiledSyntax::plain())
    }

    pub fn with_syntax(text: &str, syntax: CompiledSyntax) -> Self {
        Self {
            id: DocumentId::next(),
            text: Rope::from_str(text),
            syntax,
            scopes: OnceCell::new(),
            cursor: None,
            folds: Vec::new(),
            highlights: BTreeMap::new(),
            revealed: None,
        }
    }

    /// Builder form of [`set_cursor`](Self::set_cursor).
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.set_cursor(Some(cursor));
        self
    }

    /// Place the cursor, clamped to the end of the text, or clear it.
    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor.map(|point| point.min(self.text.len_chars()));
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn folds(&self) -> &[Region] {
        &self.folds
    }

    pub fn highlight(&self, key: &str) -> Option<&Highlight> {
        self.highlights.get(key)
    }

    pub fn highlights(&self) -> impl Iterator<Item = (&str, &Highlight)> {
        self.highlights.iter().map(|(key, h)| (key.as_str(), h))
    }

    /// Last point passed to [`Document::reveal`].
    pub fn revealed(&self) -> Option<usize> {
        self.revealed
    }

    /// Zero-based line and column of a character offset.
    pub fn line_col(&self, point: usize) -> (usize, usize) {
        let point = point.min(self.text.len_chars());
        let line = self.text.char_to_line(point);
        (line, point - self.text.line_to_char(line))
    }

    /// Scope stack at `point`, outermost first.
    pub fn scope_stack(&self, point: usize) -> Vec<&str> {
        self.scope_map().stack_at(point)
    }

    fn scope_map(&self) -> &ScopeMap {
        self.scopes.get_or_init(|| self.syntax.scan(&self.text))
    }

    fn clamp(&self, region: Region) -> Region {
        let len = self.text.len_chars();
        Region::new(region.start().min(len), region.end().min(len))
    }
}

impl Document for TextDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for chunk in self.text.chunks() {
            hasher.update(chunk.as_bytes());
        }
        hasher.digest()
    }

    fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    fn text_of(&self, region: Region) -> String {
        let region = self.clamp(region);
        self.text.slice(region.start()..region.end()).to_string()
    }

    fn search_all(&self, query: &SearchQuery) -> Vec<Match> {
        let haystack = self.text.to_string();
        query
            .regex()
            .captures_iter(&haystack)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Match {
                    region: Region::new(
                        self.text.byte_to_char(whole.start()),
                        self.text.byte_to_char(whole.end()),
                    ),
                    replacement: query.expand(&caps),
                })
            })
            .collect()
    }

    fn regions_matching_selector(&self, selector: &str) -> Vec<Region> {
        self.scope_map().regions_matching(selector)
    }

    fn score_selector(&self, point: usize, selector: &str) -> u32 {
        self.scope_map().score(point, selector)
    }

    fn replace(&mut self, region: Region, text: &str) {
        let region = self.clamp(region);
        self.text.remove(region.start()..region.end());
        self.text.insert(region.start(), text);
        let inserted = text.chars().count();

        self.folds = self
            .folds
            .iter()
            .filter_map(|fold| fold.shift_for_edit(region, inserted))
            .collect();
        self.highlights.retain(|_, highlight| {
            let shifted: Vec<Region> = highlight
                .regions
                .iter()
                .filter_map(|r| r.shift_for_edit(region, inserted))
                .collect();
            highlight.regions = shifted;
            !highlight.regions.is_empty()
        });
        self.cursor = self.cursor.map(|point| {
            if point <= region.start() {
                point
            } else if point >= region.end() {
                point - region.len() + inserted
            } else {
                region.start() + inserted
            }
        });
        self.scopes.take();
    }

    fn fold(&mut self, regions: &[Region]) {
        let added: Vec<Region> = regions
            .iter()
            .map(|region| self.clamp(*region))
            .filter(|region| !region.is_empty())
            .collect();
        self.folds.extend(added);
        self.folds.sort();
        let mut merged: Vec<Region> = Vec::with_capacity(self.folds.len());
        for fold in self.folds.drain(..) {
            match merged.last_mut() {
                Some(last) if fold.start() <= last.end() => {
                    *last = Region::new(last.start(), last.end().max(fold.end()));
                }
                _ => merged.push(fold),
            }
        }
        self.folds = merged;
    }

    fn unfold(&mut self, region: Region) {
        self.folds.retain(|fold| !fold.intersects(&region));
    }

    fn add_highlight(&mut self, key: &str, regions: Vec<Region>, color: &str, style: HighlightStyle) {
        self.highlights.insert(
            key.to_string(),
            Highlight {
                regions,
                color: color.to_string(),
                style,
            },
        );
    }

    fn clear_highlight(&mut self, key: &str) {
        self.highlights.remove(key);
    }

    fn cursor_point(&self) -> Option<usize> {
        self.cursor
    }

    fn reveal(&mut self, point: usize) {
        self.revealed = Some(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_reports_char_offsets() {
        let doc = TextDocument::new("héllo wörld");
        let query = SearchQuery::compile("w.rld", "[$0]", false, true).unwrap();
        let found = doc.search_all(&query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].region, Region::new(6, 11));
        assert_eq!(found[0].replacement, "[wörld]");
        assert_eq!(doc.text_of(found[0].region), "wörld");
    }

    #[test]
    fn replace_shifts_cursor_folds_and_highlights() {
        let mut doc = TextDocument::new("one two three").with_cursor(9);
        doc.fold(&[Region::new(8, 13)]);
        doc.add_highlight("k", vec![Region::new(0, 3), Region::new(8, 13)], "red", HighlightStyle::Outline);

        doc.replace(Region::new(4, 7), "2");

        assert_eq!(doc.text(), "one 2 three");
        assert_eq!(doc.cursor_point(), Some(7));
        assert_eq!(doc.folds(), &[Region::new(6, 11)]);
        assert_eq!(
            doc.highlight("k").unwrap().regions,
            vec![Region::new(0, 3), Region::new(6, 11)]
        );
    }

    #[test]
    fn replace_drops_overlapping_highlights() {
        let mut doc = TextDocument::new("abcdef");
        doc.add_highlight("k", vec![Region::new(1, 3)], "red", HighlightStyle::Outline);
        doc.replace(Region::new(2, 4), "");
        assert!(doc.highlight("k").is_none());
    }

    #[test]
    fn folds_merge_and_unfold() {
        let mut doc = TextDocument::new("0123456789");
        doc.fold(&[Region::new(5, 8), Region::new(1, 3), Region::new(2, 4), Region::point(9)]);
        assert_eq!(doc.folds(), &[Region::new(1, 4), Region::new(5, 8)]);
        doc.unfold(Region::new(6, 7));
        assert_eq!(doc.folds(), &[Region::new(1, 4)]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut doc = TextDocument::new("same");
        let other = TextDocument::new("same");
        assert_eq!(doc.fingerprint(), other.fingerprint());
        assert_ne!(doc.id(), other.id());
        doc.replace(Region::new(0, 1), "S");
        assert_ne!(doc.fingerprint(), other.fingerprint());
    }

    #[test]
    fn cursor_is_clamped_and_line_col_reported() {
        let doc = TextDocument::new("ab\ncd").with_cursor(40);
        assert_eq!(doc.cursor_point(), Some(5));
        assert_eq!(doc.line_col(4), (1, 1));
    }

    #[test]
    fn scopes_are_rescanned_once_after_a_batch_of_edits() {
        use crate::document::scopes::{ScopeRule, SyntaxDefinition};

        let syntax = SyntaxDefinition {
            base: "source.test".to_string(),
            rules: vec![ScopeRule {
                scope: "comment.line".to_string(),
                pattern: "//.*$".to_string(),
            }],
        };
        let mut doc = TextDocument::with_syntax(&"a // c\n".repeat(50), syntax.compile().unwrap());
        assert!(doc.scopes.get().is_none());
        assert!(doc.score_selector(2, "comment") > 0);
        assert!(doc.scopes.get().is_some());

        for line in (0..50).rev() {
            doc.replace(Region::new(line * 7, line * 7 + 1), "bb");
            assert!(doc.scopes.get().is_none());
        }

        assert_eq!(doc.score_selector(0, "comment"), 0);
        assert!(doc.score_selector(3, "comment") > 0);
        assert_eq!(doc.regions_matching_selector("comment").len(), 50);
        assert_eq!(doc.regions_matching_selector("comment")[0], Region::new(3, 7));
    }
}
