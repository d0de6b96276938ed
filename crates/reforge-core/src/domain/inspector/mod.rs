//! Static analysis of a single artifact.
//!
//! ```text
//! Artifact ──► grammar parse ──► Profile (facts + signals + tags)
//!                                   │
//!                 ComplianceWeights ┼──► compliance_score
//!                                   └──► complexity_score
//!                                          │
//!                       PatternCategorizer ▼
//!                                   AnalysisResult
//! ```
//!
//! Parsing never executes anything. Analysis is a pure function of the
//! artifact's content and kind, so results can be memoised by content hash.

mod config;
mod python;

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::domain::{
    categorizer::PatternCategorizer,
    entities::{
        AnalysisResult, Artifact, ComplianceWeights, Signal, StructuralFacts, common::round2,
    },
    error::DomainError,
    value_objects::ArtifactKind,
};

/// Domain pattern tags and the content keywords that raise them.
pub const DOMAIN_TAGS: &[(&str, &[&str])] = &[
    ("ANTI_RECURSION_PROTECTION", &["anti_recursion", "recursion", "forbidden_patterns"]),
    ("VISUAL_PROCESSING_INDICATORS", &["tqdm", "progress", "visual", "indicator"]),
    ("DATABASE_INTEGRATION", &["sqlite3", "database", "production.db"]),
    ("ENTERPRISE_COMPLIANCE", &["enterprise", "compliance", "validation"]),
    ("FRAMEWORK_INTEGRATION", &["framework", "orchestrator", "step1", "step2"]),
    ("SESSION_MANAGEMENT", &["session", "session_id"]),
    ("PERFORMANCE_MONITORING", &["performance", "metrics", "monitoring"]),
];

/// What a grammar-specific pass learned about an artifact.
#[derive(Debug, Default)]
struct Profile {
    tags: BTreeSet<String>,
    dependencies: Vec<String>,
    functions: Vec<String>,
    classes: Vec<String>,
    facts: StructuralFacts,
    signals: BTreeSet<Signal>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceInspector {
    weights: ComplianceWeights,
    categorizer: PatternCategorizer,
}

impl SourceInspector {
    /// Inspector scoring with `weights`; rejects tables not summing to 100.
    pub fn new(weights: ComplianceWeights) -> Result<Self, DomainError> {
        weights.validate()?;
        Ok(Self {
            weights,
            categorizer: PatternCategorizer,
        })
    }

    pub fn weights(&self) -> &ComplianceWeights {
        &self.weights
    }

    /// Parse and score one artifact.
    ///
    /// # Errors
    /// `ParseError` when the content does not parse under its kind's grammar.
    #[instrument(skip_all, fields(path = %artifact.display_path(), kind = %artifact.kind))]
    pub fn analyze(&self, artifact: &Artifact) -> Result<AnalysisResult, DomainError> {
        let mut profile = match artifact.kind {
            ArtifactKind::Script => python::profile(artifact)?,
            ArtifactKind::Config(format) => config::profile(artifact, format)?,
        };

        let lowered = artifact.raw_content.to_lowercase();
        for (tag, keywords) in DOMAIN_TAGS {
            if keywords.iter().any(|k| lowered.contains(k)) {
                profile.tags.insert((*tag).to_string());
            }
        }

        let compliance = self.weights.score(|s| profile.signals.contains(&s));
        let complexity_score = complexity(artifact.line_count, &profile);

        let mut result = AnalysisResult {
            source_path: artifact.source_path.clone(),
            content_hash: artifact.content_hash.clone(),
            kind: artifact.kind,
            pattern_tags: profile.tags.into_iter().collect(),
            dependencies: profile.dependencies,
            functions: profile.functions,
            classes: profile.classes,
            facts: profile.facts,
            complexity_score,
            compliance_score: round2(compliance.score),
            compliance,
            category: Default::default(),
        };
        result.category = self.categorizer.categorize(artifact, &result);

        debug!(
            compliance = result.compliance_score,
            complexity = result.complexity_score,
            category = %result.category,
            "Artifact analyzed"
        );
        Ok(result)
    }
}

fn complexity(line_count: usize, profile: &Profile) -> f64 {
    let raw = line_count as f64 * 0.1
        + profile.functions.len() as f64 * 2.0
        + profile.classes.len() as f64 * 3.0
        + profile.facts.max_nesting_depth as f64 * 5.0
        + profile.facts.exception_handler_count as f64 * 2.0
        + profile.facts.import_count as f64;
    round2(raw.min(100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Category, ConfigFormat};

    fn inspect(path: &str, content: &str) -> AnalysisResult {
        let artifact = Artifact::from_path(path, content).unwrap();
        SourceInspector::default().analyze(&artifact).unwrap()
    }

    // ========================================================================
    // Scoring
    // ========================================================================

    #[test]
    fn minimal_function_scores_only_type_annotations() {
        let result = inspect("foo.py", "def foo():\n    pass\n");
        assert_eq!(result.compliance_score, 10.0);
        assert!(result.compliance.passed(Signal::TypeAnnotations));
        assert_eq!(result.functions, vec!["foo"]);
        // 2 lines * 0.1 + 1 function * 2
        assert_eq!(result.complexity_score, 2.2);
    }

    #[test]
    fn rich_script_scores_high() {
        let src = r#"#!/usr/bin/env python3
"""Synchronise the reporting database."""
import logging
import os
import sqlite3
from pathlib import Path

from tqdm import tqdm

logger = logging.getLogger(__name__)
DB_PATH = Path(os.environ.get("DB_PATH", "data/app.db"))


def sync(rows: list, dry_run: bool = False) -> int:
    try:
        with sqlite3.connect(DB_PATH) as conn:
            for row in tqdm(rows):
                conn.execute("INSERT INTO t VALUES (?)", (row,))
    except sqlite3.Error as exc:
        logger.error("sync failed: %s", exc)
        return 1
    return 0


if __name__ == "__main__":
    raise SystemExit(sync([]))
"#;
        let result = inspect("db_sync.py", src);
        assert_eq!(result.compliance_score, 100.0);
        assert_eq!(result.dependencies, vec!["logging", "os", "sqlite3", "pathlib", "tqdm"]);
        assert_eq!(result.facts.exception_handler_count, 1);
        assert_eq!(result.facts.max_nesting_depth, 3);
        assert!(result.facts.has_entry_guard);
        assert!(result.has_tag("DATABASE_INTEGRATION"));
        assert!(result.has_tag("error_handling:try_except"));
        assert!(result.has_tag("context_manager:with_statement"));
        assert_eq!(result.category, Category::Database);
    }

    #[test]
    fn complexity_is_capped_at_100() {
        let body: String = (0..200).map(|i| format!("def f{i}():\n    pass\n")).collect();
        assert_eq!(inspect("big.py", &body).complexity_score, 100.0);
    }

    #[test]
    fn analysis_is_idempotent() {
        let artifact = Artifact::from_path("x.py", "import os\nprint(os.getcwd())\n").unwrap();
        let inspector = SourceInspector::default();
        assert_eq!(
            inspector.analyze(&artifact).unwrap(),
            inspector.analyze(&artifact).unwrap()
        );
    }

    #[test]
    fn tags_are_sorted_and_unique() {
        let result = inspect(
            "x.py",
            "try:\n    pass\nexcept Exception:\n    pass\ntry:\n    pass\nexcept Exception:\n    pass\n",
        );
        let mut sorted = result.pattern_tags.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(result.pattern_tags, sorted);
    }

    // ========================================================================
    // Failures
    // ========================================================================

    #[test]
    fn unparseable_script_is_a_parse_error() {
        let artifact = Artifact::from_path("bad.py", "def broken(:\n    pass\n").unwrap();
        let err = SourceInspector::default().analyze(&artifact).unwrap_err();
        assert!(matches!(err, DomainError::ParseError { ref grammar, .. } if grammar == "python"));
    }

    #[test]
    fn unparseable_config_is_a_parse_error() {
        let artifact = Artifact::new("x.json", "{ nope", ArtifactKind::Config(ConfigFormat::Json));
        let err = SourceInspector::default().analyze(&artifact).unwrap_err();
        assert!(matches!(err, DomainError::ParseError { .. }));
    }

    #[test]
    fn bad_weights_are_rejected() {
        let weights = ComplianceWeights {
            header: 50,
            ..ComplianceWeights::default()
        };
        assert!(SourceInspector::new(weights).is_err());
    }

    // ========================================================================
    // Configs
    // ========================================================================

    #[test]
    fn config_signals_are_format_specific() {
        let src = "# Database settings\n[database]\npath = ${DATA_DIR}/app.db\nretry_count = 3\nlog_level = INFO\n";
        let result = inspect("app.ini", src);
        assert!(result.compliance.passed(Signal::Header));
        assert!(result.compliance.passed(Signal::Docstring));
        assert!(result.compliance.passed(Signal::EntryGuard));
        assert!(result.compliance.passed(Signal::ExternalConfig));
        assert!(result.compliance.passed(Signal::ErrorHandling));
        assert!(result.compliance.passed(Signal::Logging));
        assert!(result.compliance.passed(Signal::Persistence));
        assert!(result.compliance.passed(Signal::PathAbstraction));
        assert!(!result.compliance.passed(Signal::TypeAnnotations));
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn absolute_paths_fail_path_abstraction() {
        let result = inspect("svc.env", "DATA=/var/lib/app\n");
        assert!(!result.compliance.passed(Signal::PathAbstraction));
    }
}
