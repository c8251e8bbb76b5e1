//! Running directives against a document.
//!
//! Each named pattern goes through the same pipeline: find candidates,
//! drop the ones its scope filter rejects, select (all, or the one nearest
//! the cursor), then rewrite or record the selection. Patterns run in
//! request order; a failing pattern contributes nothing and the rest still
//! run.

pub mod report;
pub mod session;

pub use report::{PatternTally, RunReport, Tally};
pub use session::{Handshake, SessionError};

use crate::action::{self, Action};
use crate::config::ReplaceConfig;
use crate::directive::Directive;
use crate::document::{Document, DocumentId};
use crate::executor::{execute, Disposition};
use crate::matcher::{find_candidates, CompiledPattern, PatternError};
use crate::region::Region;
use crate::select::{select, Policy};
use session::Sessions;
use tracing::{debug, trace, warn};

/// Highlight key used for find-only results.
pub const MODULE_KEY: &str = "RegReplace";

/// Result of answering a pending find-only run.
#[derive(Debug, Clone)]
pub enum Confirmation {
    /// The stored directive was run for real.
    Replaced(RunReport),
    Declined,
}

type Compiled = Vec<(String, Result<CompiledPattern, PatternError>)>;

#[derive(Debug)]
pub struct Engine {
    config: ReplaceConfig,
    sessions: Sessions,
}

impl Engine {
    pub fn new(config: ReplaceConfig) -> Self {
        Self {
            config,
            sessions: Sessions::default(),
        }
    }

    pub fn config(&self) -> &ReplaceConfig {
        &self.config
    }

    /// The live handshake for `document`, if a find-only run is pending.
    pub fn pending(&self, document: DocumentId) -> Option<&Handshake> {
        self.sessions.pending(document)
    }

    /// Run `directive` once against `doc`.
    pub fn run<D: Document + ?Sized>(&mut self, doc: &mut D, directive: &Directive) -> RunReport {
        let action_name = directive.action_name();
        if action_name == Some("unmark") {
            if let Some(key) = directive.options.key() {
                doc.clear_highlight(key);
            }
        }

        // Any new run supersedes a pending confirmation for this document.
        self.sessions.forget(doc.id());

        let compiled = self.compile(&directive.patterns);
        let disposition = if directive.find_only || action_name.is_some() {
            Disposition::Record
        } else {
            Disposition::Rewrite
        };

        let mut targets = Vec::new();
        let tally = if directive.engages_multi_pass() {
            self.sweep(doc, &compiled, &mut targets)
        } else {
            Tally::PerPattern(
                compiled
                    .iter()
                    .map(|(name, pattern)| PatternTally {
                        name: name.clone(),
                        outcome: pattern
                            .as_ref()
                            .map(|pattern| apply(doc, name, pattern, disposition, &mut targets))
                            .map_err(|e| e.clone()),
                    })
                    .collect(),
            )
        };

        let mut report = RunReport {
            tally,
            targets,
            pending: None,
            action_error: None,
            in_panel: self.config.settings.results_in_panel,
        };

        if directive.find_only {
            let settings = &self.config.settings;
            let regions = action::highlight_regions(&report.targets, settings.highlight_style);
            doc.clear_highlight(MODULE_KEY);
            doc.add_highlight(
                MODULE_KEY,
                regions,
                &settings.highlight_color,
                settings.highlight_style,
            );
            let handshake = self
                .sessions
                .begin(doc.id(), doc.fingerprint(), directive.clone());
            debug!(
                document = %handshake.document,
                generation = handshake.generation,
                targets = report.targets.len(),
                "find-only run awaiting confirmation"
            );
            report.pending = Some(handshake);
        } else if let Some(name) = action_name {
            match Action::resolve(name, &directive.options) {
                Ok(action) => {
                    doc.clear_highlight(MODULE_KEY);
                    action::dispatch(doc, &action, &report.targets);
                    debug!(action = %action, targets = report.targets.len(), "action dispatched");
                }
                Err(e) => {
                    warn!(error = %e, "bad action");
                    report.action_error = Some(e);
                }
            }
        }

        report
    }

    /// Answer the prompt that follows a find-only run.
    ///
    /// Anything but `yes` declines. A yes against a handshake that no longer
    /// matches the document (another run started or the text changed) is
    /// refused and the session dropped. A handshake issued for a different
    /// document is discarded without touching `doc` or its pending run.
    pub fn confirm<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        handshake: &Handshake,
        answer: &str,
    ) -> Result<Confirmation, SessionError> {
        let id = doc.id();
        if handshake.document != id {
            warn!(expected = %handshake.document, actual = %id, "handshake for another document");
            self.sessions.discard(handshake);
            return Err(SessionError::StaleHandshake(handshake.document));
        }

        if answer.trim().to_lowercase() != "yes" {
            self.cancel(doc);
            return Ok(Confirmation::Declined);
        }

        let Some(session) = self.sessions.take(id) else {
            doc.clear_highlight(MODULE_KEY);
            return Err(SessionError::NoPendingRun(id));
        };
        doc.clear_highlight(MODULE_KEY);

        if session.handshake != *handshake || handshake.fingerprint != doc.fingerprint() {
            warn!(
                document = %id,
                generation = handshake.generation,
                live = session.handshake.generation,
                "stale handshake discarded"
            );
            return Err(SessionError::StaleHandshake(id));
        }

        let directive = session.directive.with_find_only(false);
        Ok(Confirmation::Replaced(self.run(doc, &directive)))
    }

    /// Drop any pending confirmation and its highlight.
    pub fn cancel<D: Document + ?Sized>(&mut self, doc: &mut D) {
        self.sessions.forget(doc.id());
        doc.clear_highlight(MODULE_KEY);
    }

    /// Remove find-only highlights, keeping any pending confirmation.
    pub fn clear<D: Document + ?Sized>(&self, doc: &mut D) {
        doc.clear_highlight(MODULE_KEY);
    }

    fn compile(&self, names: &[String]) -> Compiled {
        names
            .iter()
            .map(|name| {
                let compiled = match self.config.patterns.get(name) {
                    Some(pattern) => CompiledPattern::compile(pattern),
                    None => Err(PatternError::UnknownPattern { name: name.clone() }),
                };
                if let Err(e) = &compiled {
                    warn!(pattern = %name, error = %e, "pattern skipped");
                }
                (name.clone(), compiled)
            })
            .collect()
    }

    fn sweep<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        compiled: &Compiled,
        targets: &mut Vec<Region>,
    ) -> Tally {
        let max_sweeps = self.config.settings.max_sweeps;
        let mut sweeps = 0;
        let mut total = 0;
        let mut converged = false;

        while sweeps < max_sweeps {
            sweeps += 1;
            let count: usize = compiled
                .iter()
                .filter_map(|(name, pattern)| {
                    let pattern = pattern.as_ref().ok()?;
                    Some(apply(doc, name, pattern, Disposition::Rewrite, targets))
                })
                .sum();
            total += count;
            trace!(sweep = sweeps, count, total, "sweep finished");
            if count == 0 {
                converged = true;
                break;
            }
        }
        if !converged {
            debug!(max_sweeps, total, "sweep limit reached");
        }

        Tally::MultiPass {
            sweeps,
            total,
            converged,
            errors: compiled
                .iter()
                .filter_map(|(name, pattern)| {
                    pattern.as_ref().err().map(|e| (name.clone(), e.clone()))
                })
                .collect(),
        }
    }
}

fn apply<D: Document + ?Sized>(
    doc: &mut D,
    name: &str,
    pattern: &CompiledPattern,
    disposition: Disposition,
    targets: &mut Vec<Region>,
) -> usize {
    let mut candidates = find_candidates(&*doc, pattern);
    if !pattern.filter.is_empty() {
        candidates.retain(|candidate| pattern.filter.qualify(&*doc, candidate.region));
    }
    let selection = select(candidates, Policy::from_greedy(pattern.greedy), doc.cursor_point());
    if let Some(point) = selection.reveal {
        doc.reveal(point);
    }
    let count = execute(doc, &selection.candidates, disposition, targets);
    debug!(pattern = %name, count, "pattern applied");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Pattern, Settings};
    use crate::document::TextDocument;
    use std::collections::BTreeMap;

    fn engine(patterns: &[(&str, Pattern)]) -> Engine {
        let mut config = ReplaceConfig::new(Settings::default(), BTreeMap::new());
        for (name, pattern) in patterns {
            config = config.with_pattern(*name, pattern.clone());
        }
        Engine::new(config)
    }

    #[test]
    fn runs_patterns_in_order() {
        let mut engine = engine(&[
            ("ab", Pattern::regex("a", "b")),
            ("bc", Pattern::regex("b", "c")),
        ]);
        let mut doc = TextDocument::new("aab");
        let report = engine.run(&mut doc, &Directive::new(["ab", "bc"]));
        assert_eq!(doc.text(), "ccc");
        assert_eq!(report.tally.count("ab"), Some(2));
        assert_eq!(report.tally.count("bc"), Some(3));
    }

    #[test]
    fn unknown_and_broken_patterns_do_not_stop_the_sequence() {
        let mut engine = engine(&[
            ("broken", Pattern::regex("(", "x")),
            ("ok", Pattern::regex("o", "0")),
        ]);
        let mut doc = TextDocument::new("foo");
        let report = engine.run(&mut doc, &Directive::new(["missing", "broken", "ok"]));
        assert_eq!(doc.text(), "f00");
        let errors = report.tally.errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0].1, PatternError::UnknownPattern { .. }));
        assert!(matches!(errors[1].1, PatternError::InvalidPattern { .. }));
    }

    #[test]
    fn non_greedy_reveals_the_choice() {
        let mut pattern = Pattern::regex("x", "y");
        pattern.greedy = false;
        let mut engine = engine(&[("one", pattern)]);
        let mut doc = TextDocument::new("x x x").with_cursor(1);
        engine.run(&mut doc, &Directive::new(["one"]));
        assert_eq!(doc.text(), "x y x");
        assert_eq!(doc.revealed(), Some(2));
    }

    #[test]
    fn multi_pass_sums_every_pattern() {
        let mut engine = engine(&[
            ("ab", Pattern::regex("a", "b")),
            ("bc", Pattern::regex("b", "c")),
        ]);
        let mut doc = TextDocument::new("ab");
        let report = engine.run(&mut doc, &Directive::new(["ab", "bc"]).with_multi_pass(true));
        assert_eq!(doc.text(), "cc");
        assert_eq!(
            report.tally,
            Tally::MultiPass {
                sweeps: 2,
                total: 3,
                converged: true,
                errors: Vec::new(),
            }
        );
    }

    #[test]
    fn action_records_instead_of_replacing() {
        let mut engine = engine(&[("a", Pattern::regex("a+", "X"))]);
        let mut doc = TextDocument::new("aa b aaa");
        let report = engine.run(
            &mut doc,
            &Directive::new(["a"]).with_action("fold", Default::default()),
        );
        assert_eq!(doc.text(), "aa b aaa");
        assert_eq!(doc.folds(), &[Region::new(0, 2), Region::new(5, 8)]);
        assert_eq!(report.targets, vec![Region::new(5, 8), Region::new(0, 2)]);
    }

    #[test]
    fn bad_action_mutates_nothing() {
        let mut engine = engine(&[("a", Pattern::regex("a", "X"))]);
        let mut doc = TextDocument::new("aaa");
        let report = engine.run(
            &mut doc,
            &Directive::new(["a"]).with_action("explode", Default::default()),
        );
        assert_eq!(doc.text(), "aaa");
        assert!(report.is_bad_action());
        assert_eq!(report.to_string(), "Error: Bad Action!");
        assert!(doc.folds().is_empty());
        assert_eq!(doc.highlights().count(), 0);
    }

    #[test]
    fn declining_forgets_the_session() {
        let mut engine = engine(&[("a", Pattern::regex("a", "X"))]);
        let mut doc = TextDocument::new("aaa");
        let report = engine.run(&mut doc, &Directive::new(["a"]).with_find_only(true));
        let handshake = report.pending.unwrap();
        assert!(doc.highlight(MODULE_KEY).is_some());

        let answer = engine.confirm(&mut doc, &handshake, " No ").unwrap();
        assert!(matches!(answer, Confirmation::Declined));
        assert!(engine.pending(doc.id()).is_none());
        assert!(doc.highlight(MODULE_KEY).is_none());
        assert_eq!(
            engine.confirm(&mut doc, &handshake, "yes").unwrap_err(),
            SessionError::NoPendingRun(doc.id())
        );
    }
}
