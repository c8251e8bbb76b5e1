//! Scope filters deciding whether a candidate region is eligible.
//!
//! Each `scope_filter` entry has one of four prefix forms:
//!
//! | entry     | region passes when                        |
//! |-----------|-------------------------------------------|
//! | `-!scope` | at least one point is outside `scope`     |
//! | `-scope`  | no point is inside `scope`                |
//! | `!scope`  | every point is inside `scope`             |
//! | `scope`   | at least one point is inside `scope`      |
//!
//! A list passes only when every entry passes; the empty list passes
//! everything. Empty regions have no points, so `-!` and the plain form
//! reject them while `-` and `!` accept them.

use crate::document::Document;
use crate::matcher::PatternError;
use crate::region::Region;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualifierError {
    #[error("'{0}' names no scope")]
    EmptyScope(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// `-!scope`
    NotEntirely(String),
    /// `-scope`
    ContainsNone(String),
    /// `!scope`
    Entirely(String),
    /// `scope`
    ContainsAny(String),
}

impl FromStr for Qualifier {
    type Err = QualifierError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let trimmed = entry.trim();
        let (make, rest): (fn(String) -> Qualifier, &str) =
            if let Some(rest) = trimmed.strip_prefix("-!") {
                (Qualifier::NotEntirely, rest)
            } else if let Some(rest) = trimmed.strip_prefix('-') {
                (Qualifier::ContainsNone, rest)
            } else if let Some(rest) = trimmed.strip_prefix('!') {
                (Qualifier::Entirely, rest)
            } else {
                (Qualifier::ContainsAny, trimmed)
            };
        let scope = rest.trim();
        if scope.is_empty() {
            return Err(QualifierError::EmptyScope(entry.to_string()));
        }
        Ok(make(scope.to_string()))
    }
}

impl Qualifier {
    pub fn scope(&self) -> &str {
        match self {
            Qualifier::NotEntirely(scope)
            | Qualifier::ContainsNone(scope)
            | Qualifier::Entirely(scope)
            | Qualifier::ContainsAny(scope) => scope,
        }
    }

    /// Evaluate against `region`, stopping at the first deciding point.
    pub fn admits<D: Document + ?Sized>(&self, doc: &D, region: Region) -> bool {
        let inside = |point: usize| doc.score_selector(point, self.scope()) > 0;
        let mut points = region.points();
        match self {
            Qualifier::NotEntirely(_) => points.any(|point| !inside(point)),
            Qualifier::ContainsNone(_) => !points.any(inside),
            Qualifier::Entirely(_) => points.all(inside),
            Qualifier::ContainsAny(_) => points.any(inside),
        }
    }
}

/// An ordered `scope_filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifierList(Vec<Qualifier>);

impl QualifierList {
    /// Parse config entries. Blank entries are ignored.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, PatternError> {
        entries
            .iter()
            .map(AsRef::as_ref)
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                entry
                    .parse::<Qualifier>()
                    .map_err(|e| PatternError::InvalidQualifier {
                        entry: entry.to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(QualifierList)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Qualifier> {
        self.0.iter()
    }

    /// True when every qualifier admits `region`, checked in list order.
    pub fn qualify<D: Document + ?Sized>(&self, doc: &D, region: Region) -> bool {
        self.0.iter().all(|qualifier| qualifier.admits(doc, region))
    }
}

impl From<Vec<Qualifier>> for QualifierList {
    fn from(qualifiers: Vec<Qualifier>) -> Self {
        QualifierList(qualifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ScopeRule, SyntaxDefinition, TextDocument};

    // "code // note\n": comment covers [5, 12)
    fn doc() -> TextDocument {
        let syntax = SyntaxDefinition {
            base: "source.test".to_string(),
            rules: vec![ScopeRule {
                scope: "comment.line".to_string(),
                pattern: "//.*$".to_string(),
            }],
        };
        TextDocument::with_syntax("code // note\n", syntax.compile().unwrap())
    }

    fn list(entries: &[&str]) -> QualifierList {
        QualifierList::parse(entries).unwrap()
    }

    #[test]
    fn parses_prefix_forms() {
        assert_eq!("-!comment".parse(), Ok(Qualifier::NotEntirely("comment".into())));
        assert_eq!("-comment".parse(), Ok(Qualifier::ContainsNone("comment".into())));
        assert_eq!("!comment".parse(), Ok(Qualifier::Entirely("comment".into())));
        assert_eq!(" comment ".parse(), Ok(Qualifier::ContainsAny("comment".into())));
        assert!("-!".parse::<Qualifier>().is_err());
        assert!("!  ".parse::<Qualifier>().is_err());
    }

    #[test]
    fn blank_entries_are_skipped() {
        assert!(list(&["", "  "]).is_empty());
    }

    #[test]
    fn empty_list_admits_everything() {
        let doc = doc();
        assert!(list(&[]).qualify(&doc, Region::new(0, 4)));
        assert!(list(&[]).qualify(&doc, Region::point(2)));
    }

    #[test]
    fn not_entirely() {
        let doc = doc();
        let filter = list(&["-!comment"]);
        assert!(filter.qualify(&doc, Region::new(0, 4)));
        assert!(filter.qualify(&doc, Region::new(3, 8)));
        assert!(!filter.qualify(&doc, Region::new(5, 12)));
        assert!(!filter.qualify(&doc, Region::point(1)));
    }

    #[test]
    fn contains_none() {
        let doc = doc();
        let filter = list(&["-comment"]);
        assert!(filter.qualify(&doc, Region::new(0, 4)));
        assert!(!filter.qualify(&doc, Region::new(3, 8)));
        assert!(filter.qualify(&doc, Region::point(6)));
    }

    #[test]
    fn entirely() {
        let doc = doc();
        let filter = list(&["!comment"]);
        assert!(filter.qualify(&doc, Region::new(6, 10)));
        assert!(!filter.qualify(&doc, Region::new(3, 8)));
    }

    #[test]
    fn contains_any() {
        let doc = doc();
        let filter = list(&["comment"]);
        assert!(filter.qualify(&doc, Region::new(3, 8)));
        assert!(!filter.qualify(&doc, Region::new(0, 4)));
        assert!(!filter.qualify(&doc, Region::point(6)));
    }

    #[test]
    fn all_entries_must_pass() {
        let doc = doc();
        let filter = list(&["source", "-comment"]);
        assert!(filter.qualify(&doc, Region::new(0, 4)));
        assert!(!filter.qualify(&doc, Region::new(0, 8)));
    }
}
