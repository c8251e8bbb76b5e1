//! Side actions run on target regions in place of replacement.

use crate::config::DEFAULT_HIGHLIGHT_COLOR;
use crate::document::{Document, HighlightStyle};
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{0}' requires a key")]
    MissingKey(&'static str),

    #[error("unknown highlight style '{0}'")]
    UnknownStyle(String),
}

/// Options attached to an action, as given by the directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Highlight set name for `mark` and `unmark`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Highlight color, a scope name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl ActionOptions {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Trimmed key, `None` when absent or blank.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Fold,
    Unfold,
    Mark {
        key: String,
        color: String,
        style: HighlightStyle,
    },
    Unmark {
        key: String,
    },
}

impl Action {
    /// Resolve an action name and its options.
    ///
    /// `mark` defaults to the `invalid` color drawn as an outline.
    pub fn resolve(name: &str, options: &ActionOptions) -> Result<Self, ActionError> {
        match name.trim() {
            "fold" => Ok(Action::Fold),
            "unfold" => Ok(Action::Unfold),
            "mark" => {
                let key = options.key().ok_or(ActionError::MissingKey("mark"))?;
                let color = options
                    .scope
                    .as_deref()
                    .map(str::trim)
                    .filter(|color| !color.is_empty())
                    .unwrap_or(DEFAULT_HIGHLIGHT_COLOR);
                let style = match options.style.as_deref().map(str::trim) {
                    None | Some("") => HighlightStyle::default(),
                    Some(style) => style.parse().map_err(ActionError::UnknownStyle)?,
                };
                Ok(Action::Mark {
                    key: key.to_string(),
                    color: color.to_string(),
                    style,
                })
            }
            "unmark" => {
                let key = options.key().ok_or(ActionError::MissingKey("unmark"))?;
                Ok(Action::Unmark {
                    key: key.to_string(),
                })
            }
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Fold => "fold",
            Action::Unfold => "unfold",
            Action::Mark { .. } => "mark",
            Action::Unmark { .. } => "unmark",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Mark { key, color, style } => write!(f, "mark={key},{color},{style}"),
            Action::Unmark { key } => write!(f, "unmark={key}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Run `action` over `targets`.
pub fn dispatch<D: Document + ?Sized>(doc: &mut D, action: &Action, targets: &[Region]) {
    match action {
        Action::Fold => {
            let trimmed: Vec<Region> = targets
                .iter()
                .map(|region| without_line_ending(doc, *region))
                .collect();
            doc.fold(&trimmed);
        }
        Action::Unfold => {
            for region in targets {
                doc.unfold(*region);
            }
        }
        Action::Mark { key, color, style } => {
            doc.clear_highlight(key);
            doc.add_highlight(key, highlight_regions(targets, *style), color, *style);
        }
        Action::Unmark { key } => doc.clear_highlight(key),
    }
}

/// Regions as they must be stored for `style`.
pub fn highlight_regions(targets: &[Region], style: HighlightStyle) -> Vec<Region> {
    match style {
        HighlightStyle::Underline => underline(targets),
        _ => targets.to_vec(),
    }
}

/// One empty region per point covered by `regions`.
pub fn underline(regions: &[Region]) -> Vec<Region> {
    regions
        .iter()
        .flat_map(|region| region.points().map(Region::point))
        .collect()
}

// Drop a trailing "\n", then a trailing "\r", so a fold never swallows the
// line break.
fn without_line_ending<D: Document + ?Sized>(doc: &D, region: Region) -> Region {
    let mut trim = 0;
    if region.len() > trim && doc.text_of(Region::new(region.end() - 1, region.end())) == "\n" {
        trim += 1;
    }
    let end = region.end() - trim;
    if region.len() > trim && doc.text_of(Region::new(end - 1, end)) == "\r" {
        trim += 1;
    }
    region.trim_end(trim)
}
