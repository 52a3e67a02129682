//! Placeholder templates for the HTML output
//!
//! A template is plain text with `${NAME}` placeholders, optionally
//! wrapped in an HTML comment (`<!-- ${NAME} -->`) so the template file
//! itself stays valid markup. Templates are parsed once into segments
//! and rendered by substitution.

use regex::Regex;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A pre-parsed template
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        // The comment form must come first so it wins over the bare form
        let pattern = Regex::new(r"<!--\s*\$\{([A-Z_]+)\}\s*-->|\$\{([A-Z_]+)\}")
            .expect("placeholder pattern is valid");

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in pattern.captures_iter(source) {
            let whole = caps.get(0).expect("capture 0 always present");
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .expect("one alternative always matches");
            segments.push(Segment::Placeholder(name.as_str().to_string()));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self { segments }
    }

    /// Substitute placeholders from `values`. Unknown placeholders render
    /// as the empty string.
    pub fn render(&self, values: &FxHashMap<&str, String>) -> String {
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

    fn values(pairs: &[(&'static str, &str)]) -> FxHashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_bare_placeholder() {
        let t = Template::parse("hello ${NAME}!");
        assert_eq!(t.render(&values(&[("NAME", "world")])), "hello world!");
    }

    #[test]
    fn test_comment_placeholder() {
        let t = Template::parse("<ul><!-- ${ITEMS} --></ul>");
        assert_eq!(
            t.render(&values(&[("ITEMS", "<li>x</li>")])),
            "<ul><li>x</li></ul>"
        );
    }

    #[test]
    fn test_unknown_placeholder_renders_empty() {
        let t = Template::parse("a${MISSING}b");
        assert_eq!(t.render(&values(&[])), "ab");
    }

    #[test]
    fn test_repeated_placeholder() {
        let t = Template::parse("${X}-${X}");
        assert_eq!(t.render(&values(&[("X", "y")])), "y-y");
    }

    #[test]
    fn test_literal_without_placeholders() {
        let t = Template::parse("static text");
        assert_eq!(t.render(&values(&[])), "static text");
    }
}
