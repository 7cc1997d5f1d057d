//! `{name}` placeholder templates for provider URLs and inline scripts
//!
//! `{{` and `}}` are literal braces. Templates are parsed once at provider load
//! against the set of names the caller will supply, so rendering cannot fail.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed '{{' at byte {0}")]
    UnclosedPlaceholder(usize),

    #[error("unmatched '}}' at byte {0}")]
    StrayClosingBrace(usize),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `raw`, accepting only placeholders listed in `allowed`
    pub fn parse(raw: &str, allowed: &[&str]) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().is_some_and(|&(_, c)| c == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::UnclosedPlaceholder(pos)),
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedPlaceholder(pos));
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(pos));
                    }
                    if !allowed.contains(&name.as_str()) {
                        return Err(TemplateError::UnknownPlaceholder(name));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' if chars.peek().is_some_and(|&(_, c)| c == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::StrayClosingBrace(pos)),
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Names referenced by the template, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute placeholders. Names missing from `values` render empty.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(value) = values.get(name.as_str()) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL_NAMES: &[&str] = &["kw", "number", "timestamp", "rand", "first"];

    #[test]
    fn test_render_substitutes_placeholders() {
        let template =
            Template::parse("/search?q={kw}&count={number}&first={first}&_={timestamp}", URL_NAMES)
                .expect("valid template");
        let values = HashMap::from([
            ("kw", "rust%20lang".to_string()),
            ("number", "10".to_string()),
            ("first", "20".to_string()),
            ("timestamp", "1700000000000".to_string()),
        ]);
        assert_eq!(
            template.render(&values),
            "/search?q=rust%20lang&count=10&first=20&_=1700000000000"
        );
        assert_eq!(
            template.placeholders().collect::<Vec<_>>(),
            vec!["kw", "number", "first", "timestamp"]
        );
    }

    #[test]
    fn test_double_braces_are_literal() {
        let template = Template::parse(
            "(() => {{ window.scrollBy(0, {number} * 100); }})()",
            &["number"],
        )
        .expect("valid template");
        let values = HashMap::from([("number", "5".to_string())]);
        assert_eq!(
            template.render(&values),
            "(() => { window.scrollBy(0, 5 * 100); })()"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Template::parse("/s?q={kw", URL_NAMES),
            Err(TemplateError::UnclosedPlaceholder(5))
        );
        assert_eq!(
            Template::parse("/s?q=}", URL_NAMES),
            Err(TemplateError::StrayClosingBrace(5))
        );
        assert_eq!(
            Template::parse("/s?q={}", URL_NAMES),
            Err(TemplateError::EmptyPlaceholder(5))
        );
        assert_eq!(
            Template::parse("/s?q={kw}&p={page}", URL_NAMES),
            Err(TemplateError::UnknownPlaceholder("page".to_string()))
        );
    }
}
