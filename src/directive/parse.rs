//! Parser for the one-line directive syntax.
//!
//! ```text
//! [?] [+ | action] : name, name, ...
//! ```
//!
//! A leading `?` asks for a find-only run and `+` for multi-pass. Any other
//! text before the colon names an action; `mark=key[,scope[,style]]` and
//! `unmark=key` carry their options inline. Without a colon the whole input
//! is the name list.

use crate::action::ActionOptions;
use crate::directive::Directive;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("multi-pass cannot be combined with an action: '{0}'")]
    MultiPassWithAction(String),
}

impl FromStr for Directive {
    type Err = DirectiveError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some((head, names)) = input.split_once(':') else {
            return Ok(Directive::new(split_names(input)));
        };

        let mut directive = Directive::new(split_names(names));
        let head = head.trim_start();
        let head = match head.strip_prefix('?') {
            Some(rest) => {
                directive.find_only = true;
                rest.trim()
            }
            None => head.trim(),
        };

        match head {
            "" => {}
            "+" => directive.multi_pass = true,
            _ if head.starts_with('+') => {
                return Err(DirectiveError::MultiPassWithAction(head.to_string()))
            }
            _ => {
                let (action, options) = parse_action(head);
                directive.action = Some(action);
                directive.options = options;
            }
        }
        Ok(directive)
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_action(head: &str) -> (String, ActionOptions) {
    let Some((name, args)) = head.split_once('=') else {
        return (head.to_string(), ActionOptions::default());
    };
    let name = name.trim();
    if name != "mark" && name != "unmark" {
        return (head.to_string(), ActionOptions::default());
    }

    let mut fields = args
        .split(',')
        .map(str::trim)
        .map(|field| (!field.is_empty()).then(|| field.to_string()));
    let key = fields.next().flatten();
    let options = if name == "mark" {
        ActionOptions {
            key,
            scope: fields.next().flatten(),
            style: fields.next().flatten(),
        }
    } else {
        ActionOptions {
            key,
            ..ActionOptions::default()
        }
    };
    (name.to_string(), options)
}
