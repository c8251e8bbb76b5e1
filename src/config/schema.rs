use crate::document::{HighlightStyle, SyntaxDefinition};
use crate::qualify::QualifierList;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_MAX_SWEEPS: usize = 100;
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "invalid";

fn default_true() -> bool {
    true
}

fn default_replace() -> String {
    "\\0".to_string()
}

/// The full rule configuration: settings, host syntax, named patterns.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(from = "RawConfig")]
pub struct ReplaceConfig {
    pub settings: Settings,
    pub syntax: SyntaxDefinition,
    pub patterns: BTreeMap<String, Pattern>,
    declared_settings: bool,
    declared_syntax: bool,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    settings: Option<Settings>,
    #[serde(default)]
    syntax: Option<SyntaxDefinition>,
    #[serde(default)]
    patterns: BTreeMap<String, Pattern>,
}

impl From<RawConfig> for ReplaceConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            declared_settings: raw.settings.is_some(),
            declared_syntax: raw.syntax.is_some(),
            settings: raw.settings.unwrap_or_default(),
            syntax: raw.syntax.unwrap_or_default(),
            patterns: raw.patterns,
        }
    }
}

impl ReplaceConfig {
    /// Build a config from code rather than TOML.
    pub fn new(settings: Settings, patterns: BTreeMap<String, Pattern>) -> Self {
        Self {
            settings,
            syntax: SyntaxDefinition::default(),
            patterns,
            declared_settings: true,
            declared_syntax: false,
        }
    }

    pub fn with_pattern(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        self.patterns.insert(name.into(), pattern);
        self
    }

    pub fn with_syntax(mut self, syntax: SyntaxDefinition) -> Self {
        self.syntax = syntax;
        self.declared_syntax = true;
        self
    }

    /// Layer `other` on top of `self`. Same-named patterns are replaced;
    /// `[settings]` and `[syntax]` are taken from `other` only when it
    /// declares them.
    pub fn merge(mut self, other: ReplaceConfig) -> Self {
        if other.declared_settings {
            self.settings = other.settings;
            self.declared_settings = true;
        }
        if other.declared_syntax {
            self.syntax = other.syntax;
            self.declared_syntax = true;
        }
        self.patterns.extend(other.patterns);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patterns.is_empty() {
            issues.push(ValidationIssue::EmptyPatternList);
        }

        if self.settings.max_sweeps == 0 {
            issues.push(ValidationIssue::InvalidCombo {
                pattern: None,
                message: "max_sweeps must be at least 1".to_string(),
            });
        }

        for rule in &self.syntax.rules {
            if rule.scope.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    pattern: None,
                    field: "syntax.rules.scope",
                });
            }
            if rule.pattern.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    pattern: None,
                    field: "syntax.rules.pattern",
                });
            }
        }
        if let Err(e) = self.syntax.compile() {
            issues.push(ValidationIssue::InvalidCombo {
                pattern: None,
                message: format!("syntax rule does not compile: {e}"),
            });
        }

        for (name, pattern) in &self.patterns {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    pattern: None,
                    field: "name",
                });
            }

            match (&pattern.find, &pattern.scope) {
                (None, None) => issues.push(ValidationIssue::MissingField {
                    pattern: Some(name.clone()),
                    field: "find",
                }),
                (Some(find), _) if find.is_empty() => issues.push(ValidationIssue::MissingField {
                    pattern: Some(name.clone()),
                    field: "find",
                }),
                _ => {}
            }

            if let Some(scope) = &pattern.scope {
                if scope.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        pattern: Some(name.clone()),
                        field: "scope",
                    });
                }
            }

            if let Err(e) = QualifierList::parse(&pattern.scope_filter) {
                issues.push(ValidationIssue::InvalidCombo {
                    pattern: Some(name.clone()),
                    message: e.to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// Engine-wide settings, the `[settings]` table.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Ceiling on multi-pass sweeps.
    #[serde(alias = "multi_pass_max_sweeps")]
    pub max_sweeps: usize,
    /// Highlight color (a scope name) for find results and marks.
    #[serde(alias = "find_highlight_color")]
    pub highlight_color: String,
    #[serde(alias = "find_highlight_style")]
    pub highlight_style: HighlightStyle,
    /// Report one pattern per line instead of a single status line.
    pub results_in_panel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_sweeps: DEFAULT_MAX_SWEEPS,
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            highlight_style: HighlightStyle::Outline,
            results_in_panel: false,
        }
    }
}

/// One named replacement rule.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Regex to search for. Optional in scope mode.
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default = "default_replace")]
    pub replace: String,
    /// Match `find` as plain text.
    #[serde(default)]
    pub literal: bool,
    #[serde(default = "default_true", alias = "case")]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub greedy: bool,
    /// Scope selector; switches the pattern to scope mode.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_true")]
    pub greedy_scope: bool,
    #[serde(default = "default_true")]
    pub greedy_replace: bool,
    #[serde(default)]
    pub scope_filter: Vec<String>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            find: None,
            replace: default_replace(),
            literal: false,
            case_sensitive: true,
            greedy: true,
            scope: None,
            greedy_scope: true,
            greedy_replace: true,
            scope_filter: Vec::new(),
        }
    }
}

impl Pattern {
    /// A regex-mode pattern with every other field at its default.
    pub fn regex(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: Some(find.into()),
            replace: replace.into(),
            ..Self::default()
        }
    }

    /// A scope-mode pattern with no `find`.
    pub fn scope(selector: impl Into<String>) -> Self {
        Self {
            scope: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn is_scope_mode(&self) -> bool {
        self.scope.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatternList,
    MissingField {
        pattern: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        pattern: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatternList => write!(f, "config defines no patterns"),
            ValidationIssue::MissingField { pattern, field } => match pattern {
                Some(name) => write!(f, "pattern '{name}' missing required field '{field}'"),
                None => write!(f, "config missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { pattern, message } => match pattern {
                Some(name) => write!(f, "pattern '{name}' has invalid configuration: {message}"),
                None => write!(f, "invalid configuration: {message}"),
            },
        }
    }
}
