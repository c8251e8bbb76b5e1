use crate::document::Document;
use crate::matcher::{Candidate, CompiledPattern, MatchMode};

/// Candidate regions for `pattern`, in ascending document order.
///
/// In scope mode with a `find` regex, the candidate region is the whole
/// enclosing scope region and its replacement is that region's rewritten
/// text; regions without a match are dropped.
pub fn find_candidates<D: Document + ?Sized>(doc: &D, pattern: &CompiledPattern) -> Vec<Candidate> {
    match &pattern.mode {
        MatchMode::Regex(query) => doc
            .search_all(query)
            .into_iter()
            .map(Candidate::from)
            .collect(),
        MatchMode::Scope {
            selector,
            query: None,
            ..
        } => doc
            .regions_matching_selector(selector)
            .into_iter()
            .map(Candidate::target)
            .collect(),
        MatchMode::Scope {
            selector,
            query: Some(query),
            rewrite_all,
        } => doc
            .regions_matching_selector(selector)
            .into_iter()
            .filter_map(|region| {
                query
                    .rewrite(&doc.text_of(region), *rewrite_all)
                    .map(|text| Candidate::replace(region, text))
            })
            .collect(),
    }
}
