//! Match finding: turning a configured pattern into candidate regions.
//!
//! A pattern works in one of two modes:
//!
//! - **regex**: search the whole document for `find`, each match carrying its
//!   expanded replacement text;
//! - **scope**: enumerate the regions matching a scope selector; if `find` is
//!   also set, only regions containing a match survive, and each carries the
//!   whole region's rewritten text.

pub mod errors;
pub mod finder;
pub mod template;

pub use errors::PatternError;
pub use finder::find_candidates;
pub use template::Template;

use crate::config::Pattern;
use crate::qualify::QualifierList;
use crate::region::Region;
use regex::{Captures, Regex, RegexBuilder};

/// A compiled `find` regex together with its replacement template.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    regex: Regex,
    template: Template,
}

impl SearchQuery {
    /// Compile `find` and `replace`.
    ///
    /// `^` and `$` match at line boundaries. With `literal` set, `find` is
    /// matched as plain text.
    pub fn compile(
        find: &str,
        replace: &str,
        literal: bool,
        case_sensitive: bool,
    ) -> Result<Self, PatternError> {
        let source = if literal {
            regex::escape(find)
        } else {
            find.to_string()
        };
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .multi_line(true)
            .build()?;
        let template = Template::compile(replace, &regex)?;
        Ok(Self { regex, template })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Replacement text for one match.
    pub fn expand(&self, caps: &Captures<'_>) -> String {
        self.template.expand(caps)
    }

    /// Rewrite `text` in place: every match when `all` is set, otherwise the
    /// first. `None` when nothing matched.
    pub fn rewrite(&self, text: &str, all: bool) -> Option<String> {
        if !self.regex.is_match(text) {
            return None;
        }
        let limit = if all { 0 } else { 1 };
        let rewritten = self
            .regex
            .replacen(text, limit, |caps: &Captures<'_>| self.expand(caps));
        Some(rewritten.into_owned())
    }
}

/// One search hit as reported by a [`Document`](crate::document::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub region: Region,
    pub replacement: String,
}

/// A region the pattern may act on.
///
/// `replacement` is `None` for pure scope enumeration: such candidates are
/// only ever recorded as targets, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub region: Region,
    pub replacement: Option<String>,
}

impl Candidate {
    pub fn replace(region: Region, replacement: impl Into<String>) -> Self {
        Self {
            region,
            replacement: Some(replacement.into()),
        }
    }

    pub fn target(region: Region) -> Self {
        Self {
            region,
            replacement: None,
        }
    }
}

impl From<Match> for Candidate {
    fn from(m: Match) -> Self {
        Candidate::replace(m.region, m.replacement)
    }
}

#[derive(Debug, Clone)]
pub enum MatchMode {
    Regex(SearchQuery),
    Scope {
        selector: String,
        query: Option<SearchQuery>,
        /// Rewrite every in-region match, or only the first.
        rewrite_all: bool,
    },
}

/// A pattern ready to run: regexes compiled, scope filter parsed.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub mode: MatchMode,
    /// Act on every qualifying candidate, or on the one nearest the cursor.
    pub greedy: bool,
    pub filter: QualifierList,
}

impl CompiledPattern {
    pub fn compile(pattern: &Pattern) -> Result<Self, PatternError> {
        let query = pattern
            .find
            .as_deref()
            .map(|find| {
                SearchQuery::compile(
                    find,
                    &pattern.replace,
                    pattern.literal,
                    pattern.case_sensitive,
                )
            })
            .transpose()?;
        let filter = QualifierList::parse(&pattern.scope_filter)?;

        let (mode, greedy) = match (&pattern.scope, query) {
            (Some(selector), query) => (
                MatchMode::Scope {
                    selector: selector.trim().to_string(),
                    query,
                    rewrite_all: pattern.greedy_replace,
                },
                pattern.greedy_scope,
            ),
            (None, Some(query)) => (MatchMode::Regex(query), pattern.greedy),
            (None, None) => {
                return Err(PatternError::InvalidPattern {
                    message: "pattern needs a find regex or a scope selector".to_string(),
                })
            }
        };

        Ok(Self {
            mode,
            greedy,
            filter,
        })
    }
}
