//! The structured request the engine runs.

pub mod parse;

pub use parse::DirectiveError;

use crate::action::ActionOptions;
use serde::{Deserialize, Serialize};

/// An ordered list of pattern names plus how to apply them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub patterns: Vec<String>,
    /// Record and highlight targets instead of replacing.
    #[serde(default)]
    pub find_only: bool,
    /// Repeat the sequence until a sweep changes nothing.
    #[serde(default)]
    pub multi_pass: bool,
    /// Run this action on the targets instead of replacing.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub options: ActionOptions,
}

impl Directive {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_find_only(mut self, find_only: bool) -> Self {
        self.find_only = find_only;
        self
    }

    pub fn with_multi_pass(mut self, multi_pass: bool) -> Self {
        self.multi_pass = multi_pass;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>, options: ActionOptions) -> Self {
        self.action = Some(action.into());
        self.options = options;
        self
    }

    /// Trimmed action name, `None` when absent or blank.
    pub fn action_name(&self) -> Option<&str> {
        self.action.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    /// Multi-pass only applies to plain replacement runs.
    pub fn engages_multi_pass(&self) -> bool {
        self.multi_pass && !self.find_only && self.action_name().is_none()
    }
}
