//! RegReplace: named regex and scope-selector replacement rules applied to a
//! document.
//!
//! A rule ("pattern") finds regions either by regex over the whole document
//! or by enumerating the regions of a scope selector. Candidates can be
//! filtered by further scope qualifiers, then either all of them or the one
//! nearest the cursor is rewritten, recorded for highlighting, or handed to
//! an action (fold, unfold, mark, unmark).
//!
//! # Architecture
//!
//! The engine never owns text: everything goes through the [`Document`]
//! trait. [`TextDocument`] is a rope-backed implementation with a small
//! regex-driven scope map, used by the CLI and the tests.
//!
//! Within one pattern, selected regions are applied in descending offset
//! order so that no replacement moves a region still waiting to be
//! replaced. Multi-pass runs repeat the whole sequence until a sweep
//! changes nothing or `max_sweeps` is reached.
//!
//! # Example
//!
//! ```
//! use reg_replace::{Directive, Engine, Pattern, ReplaceConfig, Settings, TextDocument};
//! use std::collections::BTreeMap;
//!
//! let config = ReplaceConfig::new(Settings::default(), BTreeMap::new())
//!     .with_pattern("trailing_spaces", Pattern::regex("[ \t]+$", ""));
//! let mut engine = Engine::new(config);
//!
//! let mut doc = TextDocument::new("one  \ntwo\t\n");
//! let directive: Directive = "trailing_spaces".parse().unwrap();
//! let report = engine.run(&mut doc, &directive);
//!
//! assert_eq!(doc.text(), "one\ntwo\n");
//! assert_eq!(report.to_string(), "trailing_spaces: 2 regions;");
//! ```

pub mod action;
pub mod config;
pub mod directive;
pub mod document;
pub mod engine;
pub mod executor;
pub mod matcher;
pub mod persist;
pub mod qualify;
pub mod region;
pub mod select;

// Re-exports
pub use action::{Action, ActionError, ActionOptions};
pub use config::{
    load_from_path, load_from_paths, load_from_str, ConfigError, Pattern, ReplaceConfig, RuleSource,
    Settings,
};
pub use directive::{Directive, DirectiveError};
pub use document::{Document, DocumentId, HighlightStyle, SyntaxDefinition, TextDocument};
pub use engine::{Confirmation, Engine, Handshake, RunReport, SessionError, Tally, MODULE_KEY};
pub use matcher::PatternError;
pub use persist::{LoadedFile, PersistError};
pub use qualify::{Qualifier, QualifierList};
pub use region::Region;
