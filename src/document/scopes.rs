//! Scope classification and selector scoring for [`TextDocument`].
//!
//! A syntax is a base scope plus named regex rules. Scanning a text yields a
//! [`ScopeMap`]: every rule match becomes a scope span, and the scope stack
//! at a point is the base scope followed by every span covering it, outermost
//! first.
//!
//! Selectors follow the usual editor shape:
//!
//! ```text
//! comment, string.quoted        // alternatives
//! source.rust comment           // descendant path
//! string - string.regexp        // exclusion
//! ```
//!
//! [`TextDocument`]: super::TextDocument

use crate::region::Region;
use regex::{Regex, RegexBuilder};
use ropey::Rope;
use serde::Deserialize;
use std::collections::BTreeSet;

fn default_base() -> String {
    "text.plain".to_string()
}

/// Declarative syntax description, as found in the `[syntax]` config table.
#[derive(Debug, Deserialize, Clone)]
pub struct SyntaxDefinition {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default)]
    pub rules: Vec<ScopeRule>,
}

impl Default for SyntaxDefinition {
    fn default() -> Self {
        Self {
            base: default_base(),
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScopeRule {
    pub scope: String,
    pub pattern: String,
}

impl SyntaxDefinition {
    pub fn compile(&self) -> Result<CompiledSyntax, regex::Error> {
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .multi_line(true)
                    .build()
                    .map(|regex| (rule.scope.clone(), regex))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledSyntax {
            base: self.base.clone(),
            rules,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledSyntax {
    base: String,
    rules: Vec<(String, Regex)>,
}

impl CompiledSyntax {
    /// A syntax with no rules; every point is just the base scope.
    pub fn plain() -> Self {
        Self {
            base: default_base(),
            rules: Vec::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Classify `rope` into scope spans.
    pub fn scan(&self, rope: &Rope) -> ScopeMap {
        let mut spans = Vec::new();
        if !self.rules.is_empty() {
            let text = rope.to_string();
            for (scope, regex) in &self.rules {
                for m in regex.find_iter(&text) {
                    if m.start() == m.end() {
                        continue;
                    }
                    spans.push(ScopeSpan {
                        region: Region::new(rope.byte_to_char(m.start()), rope.byte_to_char(m.end())),
                        scope: scope.clone(),
                    });
                }
            }
        }
        // Outer spans first so the stack reads from general to specific.
        spans.sort_by(|a, b| {
            a.region
                .start()
                .cmp(&b.region.start())
                .then(b.region.end().cmp(&a.region.end()))
        });
        ScopeMap {
            base: self.base.clone(),
            spans,
            len: rope.len_chars(),
        }
    }
}

#[derive(Debug, Clone)]
struct ScopeSpan {
    region: Region,
    scope: String,
}

/// Scope spans of one document snapshot.
#[derive(Debug, Clone)]
pub struct ScopeMap {
    base: String,
    spans: Vec<ScopeSpan>,
    len: usize,
}

impl ScopeMap {
    /// Scope stack at `point`, base scope first.
    pub fn stack_at(&self, point: usize) -> Vec<&str> {
        let mut stack = vec![self.base.as_str()];
        stack.extend(
            self.spans
                .iter()
                .filter(|span| span.region.contains(point))
                .map(|span| span.scope.as_str()),
        );
        stack
    }

    pub fn score(&self, point: usize, selector: &str) -> u32 {
        score_selector(&self.stack_at(point), selector)
    }

    /// Maximal runs of points scoring above zero for `selector`.
    pub fn regions_matching(&self, selector: &str) -> Vec<Region> {
        // The stack can only change at a span boundary, so one sample per
        // segment between boundaries is enough.
        let mut boundaries = BTreeSet::new();
        boundaries.insert(0);
        boundaries.insert(self.len);
        for span in &self.spans {
            boundaries.insert(span.region.start());
            boundaries.insert(span.region.end());
        }

        let mut runs: Vec<Region> = Vec::new();
        let points: Vec<usize> = boundaries.into_iter().collect();
        for pair in points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if from >= to || self.score(from, selector) == 0 {
                continue;
            }
            match runs.last_mut() {
                Some(last) if last.end() == from => *last = Region::new(last.start(), to),
                _ => runs.push(Region::new(from, to)),
            }
        }
        runs
    }
}

/// Score a scope stack against a selector. Zero means no match.
pub fn score_selector(stack: &[&str], selector: &str) -> u32 {
    selector
        .split([',', '|'])
        .map(|alternative| score_alternative(stack, alternative))
        .max()
        .unwrap_or(0)
}

fn score_alternative(stack: &[&str], alternative: &str) -> u32 {
    if alternative.trim().is_empty() {
        return 0;
    }
    let mut parts = alternative.split(" - ");
    let include = parts.next().unwrap_or("").trim();
    let score = score_path(stack, include);
    if score == 0 {
        return 0;
    }
    if parts.any(|exclude| score_path(stack, exclude.trim()) > 0) {
        return 0;
    }
    score
}

/// Match a descendant path against the stack. Each token must match a scope
/// deeper than the previous token's match.
fn score_path(stack: &[&str], path: &str) -> u32 {
    let mut score = 1;
    let mut depth = 0;
    for token in path.split_whitespace() {
        let Some(offset) = stack[depth..]
            .iter()
            .position(|scope| scope_matches(scope, token))
        else {
            return 0;
        };
        depth += offset;
        score += (depth as u32 + 1) * token.split('.').count() as u32;
        depth += 1;
    }
    score
}

fn scope_matches(scope: &str, token: &str) -> bool {
    scope == token
        || (scope.starts_with(token) && scope[token.len()..].starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax() -> CompiledSyntax {
        SyntaxDefinition {
            base: "source.rust".to_string(),
            rules: vec![
                ScopeRule {
                    scope: "comment.line".to_string(),
                    pattern: "//.*$".to_string(),
                },
                ScopeRule {
                    scope: "string.quoted.double".to_string(),
                    pattern: r#""[^"]*""#.to_string(),
                },
            ],
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn prefix_matching_respects_dot_boundaries() {
        assert!(scope_matches("comment.line", "comment"));
        assert!(scope_matches("comment.line", "comment.line"));
        assert!(!scope_matches("commentary", "comment"));
        assert!(!scope_matches("comment", "comment.line"));
    }

    #[test]
    fn scores_alternatives_paths_and_exclusions() {
        let stack = ["source.rust", "comment.line"];
        assert!(score_selector(&stack, "comment") > 0);
        assert!(score_selector(&stack, "string, comment") > 0);
        assert!(score_selector(&stack, "source comment") > 0);
        assert_eq!(score_selector(&stack, "comment source"), 0);
        assert_eq!(score_selector(&stack, "source - comment"), 0);
        assert_eq!(score_selector(&stack, "string"), 0);
        assert_eq!(score_selector(&stack, ""), 0);
    }

    #[test]
    fn deeper_matches_score_higher() {
        let stack = ["source.rust", "comment.line"];
        assert!(score_selector(&stack, "comment.line") > score_selector(&stack, "source"));
    }

    #[test]
    fn scan_builds_stack_per_point() {
        let rope = Rope::from_str("let s = \"x\"; // note \"q\"\n");
        let map = syntax().scan(&rope);
        assert_eq!(map.stack_at(0), vec!["source.rust"]);
        assert_eq!(map.stack_at(9), vec!["source.rust", "string.quoted.double"]);
        // quoted text inside the comment stacks on top of it
        assert_eq!(
            map.stack_at(22),
            vec!["source.rust", "comment.line", "string.quoted.double"]
        );
    }

    #[test]
    fn regions_matching_merges_adjacent_segments() {
        let rope = Rope::from_str("a // one \"two\"\nb // three\n");
        let map = syntax().scan(&rope);
        let regions = map.regions_matching("comment");
        assert_eq!(regions, vec![Region::new(2, 14), Region::new(17, 25)]);
    }

    #[test]
    fn char_offsets_survive_multibyte_text() {
        let rope = Rope::from_str("é // ü\n");
        let map = syntax().scan(&rope);
        assert_eq!(map.regions_matching("comment"), vec![Region::new(2, 6)]);
    }
}
