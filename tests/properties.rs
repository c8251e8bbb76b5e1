//! Property tests for selection, qualification and replacement.

use proptest::prelude::*;
use reg_replace::action::underline;
use reg_replace::config::{Pattern, ReplaceConfig, Settings};
use reg_replace::document::{ScopeRule, SyntaxDefinition, TextDocument};
use reg_replace::select::nearest;
use reg_replace::{Directive, Document, Engine, QualifierList, Region};
use regex::Regex;
use std::collections::BTreeMap;

fn engine(pattern: Pattern) -> Engine {
    Engine::new(ReplaceConfig::new(Settings::default(), BTreeMap::new()).with_pattern("p", pattern))
}

fn commented(text: &str) -> TextDocument {
    let syntax = SyntaxDefinition {
        base: "source.test".to_string(),
        rules: vec![ScopeRule {
            scope: "comment.line".to_string(),
            pattern: "#.*$".to_string(),
        }],
    };
    TextDocument::with_syntax(text, syntax.compile().unwrap())
}

/// Ascending, disjoint, non-empty regions.
fn arb_regions() -> impl Strategy<Value = Vec<Region>> {
    prop::collection::vec((0usize..5, 1usize..5), 1..8).prop_map(|steps| {
        let mut at = 0;
        steps
            .into_iter()
            .map(|(gap, len)| {
                let start = at + gap;
                at = start + len;
                Region::new(start, at)
            })
            .collect()
    })
}

proptest! {
    /// Greedy replacement touches every match exactly once.
    #[test]
    fn prop_greedy_replaces_every_match(text in "[ab \n]{0,40}", replacement in "[xyz]{0,3}") {
        let mut engine = engine(Pattern::regex("a+", replacement.clone()));
        let mut doc = TextDocument::new(&text);
        let report = engine.run(&mut doc, &Directive::new(["p"]));

        let regex = Regex::new("a+").unwrap();
        let matched: Vec<_> = regex.find_iter(&text).collect();
        let removed: usize = matched.iter().map(|m| m.len()).sum();

        prop_assert_eq!(report.tally.count("p"), Some(matched.len()));
        prop_assert_eq!(
            doc.len_chars(),
            text.len() - removed + matched.len() * replacement.len()
        );
        prop_assert_eq!(doc.text(), regex.replace_all(&text, replacement.as_str()).into_owned());
    }

    /// Find-only runs never touch the text.
    #[test]
    fn prop_find_only_never_mutates(text in "[ab #\n]{0,40}", greedy in any::<bool>(), cursor in 0usize..45) {
        let mut pattern = Pattern::regex("a|b", "c");
        pattern.greedy = greedy;
        let mut engine = engine(pattern);
        let mut doc = commented(&text).with_cursor(cursor);
        let report = engine.run(&mut doc, &Directive::new(["p"]).with_find_only(true));

        prop_assert_eq!(doc.text(), text);
        prop_assert!(report.pending.is_some());
    }

    /// The empty filter admits every region.
    #[test]
    fn prop_empty_filter_admits_everything(text in "[ab #\n]{1,30}", a in 0usize..30, b in 0usize..30) {
        let doc = commented(&text);
        let len = doc.len_chars();
        let region = Region::new(a.min(len), b.min(len));
        prop_assert!(QualifierList::default().qualify(&doc, region));
    }

    /// `-!comment` passes regions with no comment point and fails regions
    /// made only of comment points.
    #[test]
    fn prop_not_entirely(code in "[ab ]{1,10}", note in "[ab ]{1,10}") {
        let text = format!("{code}#{note}");
        let doc = commented(&text);
        let filter = QualifierList::parse(&["-!comment"]).unwrap();
        let split = code.len();

        prop_assert!(filter.qualify(&doc, Region::new(0, split)));
        prop_assert!(!filter.qualify(&doc, Region::new(split, text.len())));
    }

    /// Non-greedy selection always picks something, and wraps to the first
    /// region from either side.
    #[test]
    fn prop_wraparound_is_total(regions in arb_regions(), cursor in 0usize..60) {
        let chosen = nearest(regions.clone(), Some(cursor));
        prop_assert!(chosen.is_some());

        let last_end = regions.iter().map(Region::end).max().unwrap_or(0);
        prop_assert_eq!(nearest(regions.clone(), Some(last_end + cursor)), Some(0));
        prop_assert_eq!(nearest(regions.clone(), Some(0)), Some(0));
        prop_assert_eq!(nearest(regions, None), Some(0));
    }

    /// The chosen region is the first one reaching past the cursor.
    #[test]
    fn prop_nearest_is_first_after_cursor(regions in arb_regions(), cursor in 0usize..60) {
        let index = nearest(regions.clone(), Some(cursor)).unwrap();
        if regions.iter().any(|r| r.end() > cursor) {
            prop_assert!(regions[index].end() > cursor);
            prop_assert!(regions[..index].iter().all(|r| r.end() <= cursor));
        } else {
            prop_assert_eq!(index, 0);
        }
    }

    /// Underline makes one empty anchor per covered point.
    #[test]
    fn prop_underline_anchor_count(start in 0usize..100, width in 0usize..50) {
        let anchors = underline(&[Region::new(start, start + width)]);
        prop_assert_eq!(anchors.len(), width);
        prop_assert!(anchors.iter().all(Region::is_empty));
    }
}
