//! Placeholder grammar shared by the extractor, the adapter and the validator.
//!
//! ```text
//! ${name}   placeholder, name = [A-Za-z_][A-Za-z0-9_]*
//! $${       escaped literal "${"
//! ```
//!
//! Anything else (a lone `$`, an unclosed `${`, `${not a name}`) is literal
//! text. Tokenizing never fails.

use std::collections::BTreeSet;

/// One lexical piece of parameterized content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// `$${`, stands for a literal `${`.
    Escaped,
    Placeholder(&'a str),
}

pub const ESCAPE: &str = "$${";

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Format `name` as placeholder syntax.
pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// Split content into literal, escape and placeholder segments.
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let bytes = content.as_bytes();
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'$') && bytes.get(i + 2) == Some(&b'{') {
            push_literal(&mut out, &content[literal_start..i]);
            out.push(Segment::Escaped);
            i += 3;
            literal_start = i;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'{') {
            if let Some(close) = content[i + 2..].find('}') {
                let name = &content[i + 2..i + 2 + close];
                if is_valid_name(name) {
                    push_literal(&mut out, &content[literal_start..i]);
                    out.push(Segment::Placeholder(name));
                    i += close + 3;
                    literal_start = i;
                    continue;
                }
            }
        }

        i += 1;
    }

    push_literal(&mut out, &content[literal_start..]);
    out
}

fn push_literal<'a>(out: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        out.push(Segment::Literal(text));
    }
}

/// Placeholder names in order of first appearance, without duplicates.
pub fn placeholders(content: &str) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    segments(content)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(name) if seen.insert(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Every `${name}` token in plain text as `(byte offset, name)`, left to
/// right. Unlike [`segments`], `$${` has no special meaning here.
pub fn tokens(content: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(found) = content[from..].find("${") {
        let start = from + found;
        let name = content[start + 2..]
            .find('}')
            .map(|close| &content[start + 2..start + 2 + close])
            .filter(|name| is_valid_name(name));
        match name {
            Some(name) => {
                out.push((start, name));
                from = start + name.len() + 3;
            }
            None => from = start + 1,
        }
    }
    out
}

/// Escape raw text so that it tokenizes back to itself as pure literal.
pub fn escape_literal(raw: &str) -> String {
    raw.replace("${", ESCAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescape(content: &str) -> String {
        segments(content)
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.to_string(),
                Segment::Escaped => "${".to_string(),
                Segment::Placeholder(name) => placeholder(name),
            })
            .collect()
    }

    #[test]
    fn tokenizes_placeholders_and_literals() {
        let segs = segments(r#"DB="${db_path}" # ok"#);
        assert_eq!(
            segs,
            vec![
                Segment::Literal("DB=\""),
                Segment::Placeholder("db_path"),
                Segment::Literal("\" # ok"),
            ]
        );
    }

    #[test]
    fn escaped_sequence_is_not_a_placeholder() {
        let segs = segments("echo $${HOME}");
        assert_eq!(
            segs,
            vec![
                Segment::Literal("echo "),
                Segment::Escaped,
                Segment::Literal("HOME}"),
            ]
        );
        assert!(placeholders("echo $${HOME}").is_empty());
    }

    #[test]
    fn malformed_syntax_is_literal() {
        assert!(placeholders("cost: $5, ${ spaced }, ${unclosed").is_empty());
        assert!(placeholders("${1abc}").is_empty());
    }

    #[test]
    fn placeholders_are_deduplicated_in_order() {
        assert_eq!(placeholders("${b} ${a} ${b}"), vec!["b", "a"]);
    }

    #[test]
    fn escape_then_unescape_is_identity() {
        for raw in ["plain", "${HOME}/x", "$${odd}", "$", "a$b${", "$$$"] {
            let escaped = escape_literal(raw);
            assert!(placeholders(&escaped).is_empty(), "{raw}");
            assert_eq!(unescape(&escaped), raw);
        }
    }

    #[test]
    fn tokens_scan_plain_text() {
        assert_eq!(
            tokens("a ${x} $${y} ${bad name} ${${z}"),
            vec![(2, "x"), (8, "y"), (27, "z")]
        );
        assert!(tokens("cost $5 and ${unclosed").is_empty());
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("db_path"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("9lives"));
        assert!(!is_valid_name("has-dash"));
    }
}
