use std::sync::LazyLock;

use regex::Regex;

use super::Profile;
use crate::domain::{
    entities::{Artifact, Signal},
    error::DomainError,
    grammar::{
        SyntaxIssue,
        config::{self, ConfigDocument},
    },
    value_objects::ConfigFormat,
};

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}").expect("valid regex"));

static ABSOLUTE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:/[^/\s]|~/|[A-Za-z]:[\\/])"#).expect("valid regex"));

const ERROR_HANDLING_KEYS: &[&str] = &["retry", "retries", "timeout", "fallback"];
const PERSISTENCE_KEYS: &[&str] = &[
    "database", "db", "sqlite", "dsn", "storage", "redis", "mongo", "postgres",
];
const PROGRESS_KEYS: &[&str] = &["progress", "verbose", "verbosity", "interval"];

pub(super) fn profile(artifact: &Artifact, format: ConfigFormat) -> Result<Profile, DomainError> {
    let path = artifact.display_path();
    let doc = config::parse(format, &artifact.raw_content).map_err(|issues| {
        issues
            .into_iter()
            .next()
            .unwrap_or_else(|| SyntaxIssue::new(1, 1, "invalid document"))
            .into_parse_error(&path, artifact.kind)
    })?;

    let mut profile = Profile::default();
    profile.facts.max_nesting_depth = doc.max_depth;
    profile.facts.has_documentation = doc.comment_lines > 0;
    profile.facts.has_logging = any_key(&doc, &["log"]);
    profile.facts.has_error_handling = any_key(&doc, ERROR_HANDLING_KEYS);
    profile.facts.has_entry_guard = doc.section_count > 0;

    let signals = [
        (Signal::Logging, profile.facts.has_logging),
        (Signal::ErrorHandling, profile.facts.has_error_handling),
        (Signal::Docstring, profile.facts.has_documentation),
        (Signal::TypeAnnotations, format.is_structured()),
        (Signal::EntryGuard, profile.facts.has_entry_guard),
        (Signal::Header, doc.leading_comment),
        (
            Signal::ExternalConfig,
            ENV_REFERENCE.is_match(&artifact.raw_content),
        ),
        (Signal::Persistence, any_key(&doc, PERSISTENCE_KEYS)),
        (Signal::Progress, any_key(&doc, PROGRESS_KEYS)),
        (
            Signal::PathAbstraction,
            !doc.entries.iter().any(|e| ABSOLUTE_PATH.is_match(e.value.trim())),
        ),
    ];
    profile.signals = signals
        .into_iter()
        .filter_map(|(signal, on)| on.then_some(signal))
        .collect();

    Ok(profile)
}

/// Whether any key segment contains one of `needles`.
fn any_key(doc: &ConfigDocument, needles: &[&str]) -> bool {
    doc.entries.iter().any(|entry| {
        let key = entry.key.to_ascii_lowercase();
        key.split(['.', '_', '-'])
            .any(|segment| needles.iter().any(|n| segment.contains(n)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(path: &str, src: &str) -> Profile {
        let artifact = Artifact::from_path(path, src).unwrap();
        let format = artifact.kind.config_format().unwrap();
        profile(&artifact, format).unwrap()
    }

    #[test]
    fn structured_formats_count_as_typed() {
        let p = run("app.json", r#"{"server": {"port": 8080}}"#);
        assert!(p.signals.contains(&Signal::TypeAnnotations));
        assert!(p.signals.contains(&Signal::EntryGuard));
        assert_eq!(p.facts.max_nesting_depth, 2);
    }

    #[test]
    fn windows_and_home_paths_are_absolute() {
        let p = run("a.env", "A=C:\\data\\x.db\n");
        assert!(!p.signals.contains(&Signal::PathAbstraction));
        let p = run("b.env", "B=~/data\n");
        assert!(!p.signals.contains(&Signal::PathAbstraction));
        let p = run("c.env", "C=data/x.db\n");
        assert!(p.signals.contains(&Signal::PathAbstraction));
    }

    #[test]
    fn key_segments_drive_signals() {
        let p = run("svc.yaml", "worker:\n  progress_interval: 5\n  db_url: sqlite:///x\n");
        assert!(p.signals.contains(&Signal::Progress));
        assert!(p.signals.contains(&Signal::Persistence));
        assert!(!p.signals.contains(&Signal::Logging));
    }
}
