use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Node;

use super::Profile;
use crate::domain::{
    entities::{Artifact, Signal},
    error::DomainError,
    grammar::python::{self, named_children, text},
};

static LOG_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(logger|logging|log)\.(debug|info|warning|warn|error|exception|critical)\(")
        .expect("valid regex")
});

static CODING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#.*coding[:=]").expect("valid regex"));

const LOGGING_MODULES: &[&str] = &["logging", "loguru", "structlog"];
const CONFIG_MODULES: &[&str] = &[
    "configparser", "dotenv", "yaml", "toml", "tomllib", "json", "argparse", "click",
];
const PERSISTENCE_MODULES: &[&str] = &[
    "sqlite3", "sqlalchemy", "psycopg2", "psycopg", "pymongo", "redis", "shelve", "pickle",
    "peewee", "duckdb",
];
const PROGRESS_MODULES: &[&str] = &["tqdm", "rich", "alive_progress", "progressbar"];

const CONTROL_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "match_statement",
];

const COMPREHENSION_KINDS: &[&str] = &[
    "list_comprehension",
    "dictionary_comprehension",
    "set_comprehension",
    "generator_expression",
];

pub(super) fn profile(artifact: &Artifact) -> Result<Profile, DomainError> {
    let source = artifact.raw_content.as_str();
    let path = artifact.display_path();

    let tree = python::parse(source).map_err(|issue| issue.into_parse_error(&path, artifact.kind))?;
    let root = tree.root_node();
    if let Some(issue) = python::syntax_issues(root).into_iter().next() {
        return Err(issue.into_parse_error(&path, artifact.kind));
    }

    let mut walker = Walker {
        source,
        profile: Profile::default(),
        untyped_params: 0,
    };
    walker.visit(root, 0);

    let mut profile = walker.profile;
    profile.facts.has_documentation = has_docstring(root);
    profile.facts.has_entry_guard = named_children(root)
        .into_iter()
        .any(|n| n.kind() == "if_statement" && is_main_guard(n, source));
    profile.facts.has_logging =
        uses_any(&profile.dependencies, LOGGING_MODULES) || LOG_CALL.is_match(source);

    let deps = &profile.dependencies;
    let signals = [
        (Signal::Logging, profile.facts.has_logging),
        (Signal::ErrorHandling, profile.facts.has_error_handling),
        (Signal::Docstring, profile.facts.has_documentation),
        (
            Signal::TypeAnnotations,
            !profile.functions.is_empty() && walker.untyped_params == 0,
        ),
        (Signal::EntryGuard, profile.facts.has_entry_guard),
        (Signal::Header, has_header(source)),
        (
            Signal::ExternalConfig,
            uses_any(deps, CONFIG_MODULES) || source.contains("os.environ") || source.contains("getenv("),
        ),
        (Signal::Persistence, uses_any(deps, PERSISTENCE_MODULES)),
        (
            Signal::Progress,
            uses_any(deps, PROGRESS_MODULES) || source.to_lowercase().contains("progress"),
        ),
        (
            Signal::PathAbstraction,
            uses_any(deps, &["pathlib"]) || source.contains("os.path") || source.contains("Path("),
        ),
    ];
    profile.signals = signals
        .into_iter()
        .filter_map(|(signal, on)| on.then_some(signal))
        .collect();

    Ok(profile)
}

struct Walker<'s> {
    source: &'s str,
    profile: Profile,
    untyped_params: usize,
}

impl Walker<'_> {
    fn visit(&mut self, node: Node<'_>, depth: usize) {
        let kind = node.kind();
        let mut child_depth = depth;

        if CONTROL_KINDS.contains(&kind) {
            child_depth = depth + 1;
            let facts = &mut self.profile.facts;
            facts.max_nesting_depth = facts.max_nesting_depth.max(child_depth);
        }
        if COMPREHENSION_KINDS.contains(&kind) {
            self.tag("comprehension");
        }

        match kind {
            "function_definition" => self.function(node),
            "class_definition" => self.class(node),
            "try_statement" => {
                self.profile.facts.has_error_handling = true;
                self.tag("error_handling:try_except");
            }
            "except_clause" | "except_group_clause" => {
                self.profile.facts.exception_handler_count += 1;
            }
            "with_statement" => self.tag("context_manager:with_statement"),
            "import_statement" => {
                self.profile.facts.import_count += 1;
                for child in named_children(node) {
                    let module = match child.kind() {
                        "aliased_import" => child.child_by_field_name("name"),
                        "dotted_name" => Some(child),
                        _ => None,
                    };
                    if let Some(module) = module {
                        self.dependency(text(module, self.source));
                    }
                }
            }
            "import_from_statement" => {
                self.profile.facts.import_count += 1;
                if let Some(module) = node
                    .child_by_field_name("module_name")
                    .filter(|m| m.kind() == "dotted_name")
                {
                    self.dependency(text(module, self.source));
                }
            }
            "future_import_statement" => self.profile.facts.import_count += 1,
            _ => {}
        }

        for child in named_children(node) {
            self.visit(child, child_depth);
        }
    }

    fn function(&mut self, node: Node<'_>) {
        if let Some(name) = node.child_by_field_name("name") {
            self.profile.functions.push(text(name, self.source).to_string());
        }
        if node.child(0).is_some_and(|c| c.kind() == "async") {
            self.tag("function:async");
        }
        if node
            .parent()
            .is_some_and(|p| p.kind() == "decorated_definition")
        {
            self.tag("function:decorated");
        }

        if let Some(params) = node.child_by_field_name("parameters") {
            for param in named_children(params) {
                let untyped = match param.kind() {
                    "identifier" => !matches!(text(param, self.source), "self" | "cls"),
                    "default_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => true,
                    _ => false,
                };
                if untyped {
                    self.untyped_params += 1;
                }
            }
        }
    }

    fn class(&mut self, node: Node<'_>) {
        if let Some(name) = node.child_by_field_name("name") {
            self.profile.classes.push(text(name, self.source).to_string());
        }
        if node
            .child_by_field_name("superclasses")
            .is_some_and(|s| s.named_child_count() > 0)
        {
            self.tag("class:inheritance");
        }
    }

    fn tag(&mut self, tag: &str) {
        self.profile.tags.insert(tag.to_string());
    }

    /// Record the base module of a dotted import, first occurrence only.
    fn dependency(&mut self, dotted: &str) {
        let base = dotted.split('.').next().unwrap_or(dotted).trim();
        if !base.is_empty() && !self.profile.dependencies.iter().any(|d| d == base) {
            self.profile.dependencies.push(base.to_string());
        }
    }
}

fn uses_any(dependencies: &[String], modules: &[&str]) -> bool {
    dependencies.iter().any(|d| modules.contains(&d.as_str()))
}

fn has_header(source: &str) -> bool {
    source.starts_with("#!") || source.lines().next().is_some_and(|l| CODING_LINE.is_match(l))
}

/// A string expression as the first statement of the module or of any
/// function/class body.
fn has_docstring(root: Node<'_>) -> bool {
    if block_starts_with_string(root) {
        return true;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), "function_definition" | "class_definition") {
            if let Some(body) = node.child_by_field_name("body") {
                if block_starts_with_string(body) {
                    return true;
                }
            }
        }
        stack.extend(named_children(node));
    }
    false
}

fn block_starts_with_string(block: Node<'_>) -> bool {
    named_children(block)
        .into_iter()
        .find(|n| n.kind() != "comment")
        .filter(|n| n.kind() == "expression_statement")
        .and_then(|n| n.named_child(0))
        .is_some_and(|n| n.kind() == "string")
}

fn is_main_guard(node: Node<'_>, source: &str) -> bool {
    node.child_by_field_name("condition").is_some_and(|cond| {
        let cond = text(cond, source);
        cond.contains("__name__") && cond.contains("__main__")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Profile {
        profile(&Artifact::from_path("t.py", src).unwrap()).unwrap()
    }

    #[test]
    fn untyped_parameters_fail_type_annotations() {
        let p = run("def f(a, b: int):\n    pass\n");
        assert!(!p.signals.contains(&Signal::TypeAnnotations));
    }

    #[test]
    fn self_and_cls_are_exempt() {
        let p = run("class A(Base):\n    def m(self, x: int) -> None:\n        pass\n");
        assert!(p.signals.contains(&Signal::TypeAnnotations));
        assert!(p.tags.contains("class:inheritance"));
        assert_eq!(p.classes, vec!["A"]);
    }

    #[test]
    fn no_functions_means_no_type_signal() {
        let p = run("x = 1\n");
        assert!(!p.signals.contains(&Signal::TypeAnnotations));
    }

    #[test]
    fn function_docstring_counts_as_documentation() {
        let p = run("def f():\n    \"\"\"Doc.\"\"\"\n    return 1\n");
        assert!(p.facts.has_documentation);
    }

    #[test]
    fn dotted_imports_keep_base_module() {
        let p = run("import os.path\nimport os\nfrom xml.etree import ElementTree\nfrom . import sibling\n");
        assert_eq!(p.dependencies, vec!["os", "xml"]);
        assert_eq!(p.facts.import_count, 4);
    }

    #[test]
    fn async_and_decorated_functions_are_tagged() {
        let p = run("@cache\nasync def f():\n    return [x for x in range(3)]\n");
        assert!(p.tags.contains("function:async"));
        assert!(p.tags.contains("function:decorated"));
        assert!(p.tags.contains("comprehension"));
    }

    #[test]
    fn coding_line_is_a_header() {
        assert!(has_header("# -*- coding: utf-8 -*-\nx = 1\n"));
        assert!(!has_header("x = 1\n"));
    }
}
