use crate::matcher::errors::PatternError;
use regex::{Captures, Regex};

/// A replacement template, translated once into `regex` expansion syntax.
///
/// Accepted references: `\0`-`\9`, `$N`, `${N}`, `$name`, `${name}`.
/// Escapes: `\\`, `\n`, `\t`, `\r`, `\$` and `$$`. Any other backslash
/// sequence is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    expansion: String,
}

impl Template {
    /// Translate `template`, checking every group reference against `regex`.
    pub fn compile(template: &str, regex: &Regex) -> Result<Self, PatternError> {
        let mut expansion = String::with_capacity(template.len() + 8);
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(digit @ '0'..='9') => {
                        push_index(&mut expansion, (digit as u8 - b'0') as usize, regex)?
                    }
                    Some('n') => expansion.push('\n'),
                    Some('t') => expansion.push('\t'),
                    Some('r') => expansion.push('\r'),
                    Some('\\') => expansion.push('\\'),
                    Some('$') => expansion.push_str("$$"),
                    Some(other) => {
                        expansion.push('\\');
                        expansion.push(other);
                    }
                    None => expansion.push('\\'),
                },
                '$' => match chars.peek().copied() {
                    Some('$') => {
                        chars.next();
                        expansion.push_str("$$");
                    }
                    Some('{') => {
                        chars.next();
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some('}') => break,
                                Some(ch) => name.push(ch),
                                None => {
                                    return Err(invalid(format!(
                                        "unterminated group reference '${{{name}'"
                                    )))
                                }
                            }
                        }
                        push_group(&mut expansion, &name, regex)?;
                    }
                    Some(ch) if is_name_char(ch) => {
                        let mut name = String::new();
                        while let Some(&ch) = chars.peek() {
                            if !is_name_char(ch) {
                                break;
                            }
                            name.push(ch);
                            chars.next();
                        }
                        push_group(&mut expansion, &name, regex)?;
                    }
                    _ => expansion.push_str("$$"),
                },
                other => expansion.push(other),
            }
        }

        Ok(Self { expansion })
    }

    /// Expand the template for one match.
    pub fn expand(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        caps.expand(&self.expansion, &mut out);
        out
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn push_group(expansion: &mut String, name: &str, regex: &Regex) -> Result<(), PatternError> {
    if let Ok(index) = name.parse::<usize>() {
        return push_index(expansion, index, regex);
    }
    if !regex.capture_names().flatten().any(|group| group == name) {
        return Err(invalid(format!("no group named '{name}'")));
    }
    expansion.push_str("${");
    expansion.push_str(name);
    expansion.push('}');
    Ok(())
}

fn push_index(expansion: &mut String, index: usize, regex: &Regex) -> Result<(), PatternError> {
    if index >= regex.captures_len() {
        return Err(invalid(format!(
            "group {index} does not exist (pattern has {} groups)",
            regex.captures_len() - 1
        )));
    }
    expansion.push_str(&format!("${{{index}}}"));
    Ok(())
}

fn invalid(message: String) -> PatternError {
    PatternError::InvalidTemplate { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(find: &str, template: &str, text: &str) -> String {
        let regex = Regex::new(find).unwrap();
        let template = Template::compile(template, &regex).unwrap();
        let caps = regex.captures(text).unwrap();
        template.expand(&caps)
    }

    #[test]
    fn backslash_and_dollar_references() {
        assert_eq!(render("(a)(b)", r"\1-\0", "ab"), "a-ab");
        assert_eq!(render("(a)(b)", "$2$1", "ab"), "ba");
        assert_eq!(render("(a)(b)", "${2}x${1}", "ab"), "bxa");
    }

    #[test]
    fn named_groups() {
        assert_eq!(render(r"(?P<word>\w+)", "<${word}>", "hey"), "<hey>");
        assert_eq!(render(r"(?P<word>\w+)", "$word!", "hey"), "hey!");
    }

    #[test]
    fn escapes_and_literal_dollars() {
        assert_eq!(render("x", r"a\nb\tc", "x"), "a\nb\tc");
        assert_eq!(render("x", r"cost: $$5 \$ \\", "x"), r"cost: $5 $ \");
        assert_eq!(render("x", "$ and $-", "x"), "$ and $-");
        assert_eq!(render("x", r"\q", "x"), r"\q");
    }

    #[test]
    fn identity_template() {
        assert_eq!(render("b+", r"\0", "abbbc"), "bbb");
    }

    #[test]
    fn rejects_missing_groups() {
        let regex = Regex::new("(a)").unwrap();
        assert!(matches!(
            Template::compile(r"\5", &regex),
            Err(PatternError::InvalidTemplate { .. })
        ));
        assert!(Template::compile("${nope}", &regex).is_err());
        assert!(Template::compile("${1", &regex).is_err());
    }
}
