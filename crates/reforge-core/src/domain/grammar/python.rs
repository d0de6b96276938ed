//! Python grammar (tree-sitter).

use tree_sitter::{Node, Parser, Tree};

use super::SyntaxIssue;

/// Parse Python source. The tree may still contain ERROR nodes; see
/// [`syntax_issues`].
pub fn parse(source: &str) -> Result<Tree, SyntaxIssue> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyntaxIssue::new(1, 1, format!("python grammar unavailable: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| SyntaxIssue::new(1, 1, "parser produced no tree"))
}

/// Every ERROR and MISSING node, in document order.
pub fn syntax_issues(root: Node<'_>) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    if root.has_error() {
        collect_issues(root, &mut issues);
    }
    issues
}

fn collect_issues(node: Node<'_>, issues: &mut Vec<SyntaxIssue>) {
    let pos = node.start_position();
    if node.is_missing() {
        issues.push(SyntaxIssue::new(
            pos.row + 1,
            pos.column + 1,
            format!("missing '{}'", node.kind()),
        ));
        return;
    }
    if node.is_error() {
        issues.push(SyntaxIssue::new(pos.row + 1, pos.column + 1, "invalid syntax"));
        return;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    for child in children {
        if child.has_error() || child.is_missing() {
            collect_issues(child, issues);
        }
    }
}

/// Source text of a node, empty when the span is not valid UTF-8.
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

// ============================================================================
// String Literals
// ============================================================================

/// A plain single-line string literal that can be swapped for a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    /// Byte range of the text between the quotes.
    pub start: usize,
    pub end: usize,
    pub value: String,
    /// Assignment target, keyword, parameter or dict key the literal is bound to.
    pub binding: Option<String>,
}

/// Collect simple string literals in document order.
///
/// Skipped: prefixed strings (f/b/r/u), triple-quoted strings, strings with
/// escapes or interpolation, dictionary keys and docstrings.
pub fn string_literals(root: Node<'_>, source: &str) -> Vec<StringLiteral> {
    let mut out = Vec::new();
    visit_strings(root, source, &mut out);
    out
}

fn visit_strings(node: Node<'_>, source: &str, out: &mut Vec<StringLiteral>) {
    if node.kind() == "string" {
        if let Some(literal) = simple_literal(node, source) {
            out.push(literal);
        }
        return;
    }
    for child in named_children(node) {
        visit_strings(child, source, out);
    }
}

fn simple_literal(node: Node<'_>, source: &str) -> Option<StringLiteral> {
    let parent = node.parent()?;
    if parent.kind() == "expression_statement" {
        return None;
    }
    if parent.kind() == "pair" && parent.child_by_field_name("key") == Some(node) {
        return None;
    }

    let children = named_children(node);
    let opener = children.first().filter(|c| c.kind() == "string_start")?;
    if !matches!(text(*opener, source), "\"" | "'") {
        return None;
    }

    let contents: Vec<_> = children
        .iter()
        .filter(|c| c.kind() != "string_start" && c.kind() != "string_end")
        .collect();
    let [content] = contents.as_slice() else {
        return None;
    };
    if content.kind() != "string_content" || content.named_child_count() > 0 {
        return None;
    }

    let value = text(**content, source);
    if value.is_empty() || value.contains('\n') {
        return None;
    }

    Some(StringLiteral {
        start: content.start_byte(),
        end: content.end_byte(),
        value: value.to_string(),
        binding: binding_name(node, parent, source),
    })
}

fn binding_name(node: Node<'_>, parent: Node<'_>, source: &str) -> Option<String> {
    let field = |name: &str| parent.child_by_field_name(name);
    let target = match parent.kind() {
        "assignment" if field("right") == Some(node) => field("left"),
        "keyword_argument" | "default_parameter" | "typed_default_parameter"
            if field("value") == Some(node) =>
        {
            field("name")
        }
        "pair" => field("key"),
        _ => None,
    }?;

    let raw = text(target, source);
    let name = raw
        .trim_matches(|c| c == '"' || c == '\'')
        .rsplit('.')
        .next()
        .unwrap_or(raw);
    (!name.is_empty()).then(|| name.to_string())
}
