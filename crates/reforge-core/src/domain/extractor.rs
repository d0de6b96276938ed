//! Template extraction: quality gate plus literal parameterization.
//!
//! ```text
//! AnalysisResult ──► gate (score ≥ threshold AND sub-checks ≥ minimum)
//!                        │ rejected ─► None
//!                        ▼ accepted
//! raw content ──► candidate literals ──► classify (environment/version/path)
//!                        │
//!                        ▼
//!   escaped gaps + ${name} placeholders, schema name -> {type, default}
//! ```
//!
//! Every extracted variable defaults to the literal it replaced, so rendering
//! under the identity environment gives back the source byte for byte.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    entities::{AnalysisResult, Artifact, Signal, Template, VariableSchema, VariableSpec},
    error::DomainError,
    grammar::{config::is_comment, python},
    placeholder,
    value_objects::{ArtifactKind, ConfigFormat, VariableType},
};

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+\.\d+(\.\d+)?([-+][0-9A-Za-z.\-]+)?$").expect("valid regex")
});

static ABSOLUTE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'](?:/[^/\s"']+/[^\s"']*|[A-Za-z]:[\\/])"#).expect("valid regex")
});

static ASSIGN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z0-9_.\-]+)\s*=[ \t]*(.*?)[ \t]*$").expect("valid regex")
});

static YAML_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:-\s+)?([A-Za-z0-9_.\-]+)\s*:[ \t]+(.*?)[ \t]*$").expect("valid regex")
});

static JSON_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\\]+)"\s*:\s*"([^"\\]*)""#).expect("valid regex")
});

const ENVIRONMENT_NAMES: &[&str] = &[
    "production", "prod", "development", "dev", "staging", "stage", "testing", "test", "qa",
    "uat", "local",
];

const DATA_EXTENSIONS: &[&str] = &[
    "db", "sqlite", "sqlite3", "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "csv", "txt",
    "log", "xml", "parquet", "env", "py", "sql",
];

// ============================================================================
// Policy & Gate
// ============================================================================

/// Configurable extraction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPolicy {
    /// Minimum compliance score, inclusive.
    pub threshold: f64,
    /// Minimum number of passing structural sub-checks (out of six).
    pub min_structural_checks: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            threshold: 70.0,
            min_structural_checks: 4,
        }
    }
}

impl ExtractionPolicy {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(DomainError::InvalidPolicy(format!(
                "extraction threshold {} is outside 0..=100",
                self.threshold
            )));
        }
        if self.min_structural_checks > SubCheck::ALL.len() {
            return Err(DomainError::InvalidPolicy(format!(
                "at most {} structural checks exist, {} required",
                SubCheck::ALL.len(),
                self.min_structural_checks
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubCheck {
    ErrorHandling,
    Logging,
    Docstring,
    NoAbsolutePaths,
    HeaderOrdering,
    DomainTag,
}

impl SubCheck {
    pub const ALL: [SubCheck; 6] = [
        SubCheck::ErrorHandling,
        SubCheck::Logging,
        SubCheck::Docstring,
        SubCheck::NoAbsolutePaths,
        SubCheck::HeaderOrdering,
        SubCheck::DomainTag,
    ];

    fn passes(self, analysis: &AnalysisResult, artifact: &Artifact) -> bool {
        match self {
            Self::ErrorHandling => analysis.facts.has_error_handling,
            Self::Logging => analysis.facts.has_logging,
            Self::Docstring => analysis.facts.has_documentation,
            Self::NoAbsolutePaths => match artifact.kind {
                ArtifactKind::Script => !ABSOLUTE_LITERAL.is_match(&artifact.raw_content),
                ArtifactKind::Config(_) => analysis.compliance.passed(Signal::PathAbstraction),
            },
            Self::HeaderOrdering => match artifact.kind {
                ArtifactKind::Script => script_starts_well(&artifact.raw_content),
                ArtifactKind::Config(_) => analysis.compliance.passed(Signal::Header),
            },
            Self::DomainTag => analysis.domain_tags().next().is_some(),
        }
    }
}

impl fmt::Display for SubCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ErrorHandling => "error handling",
            Self::Logging => "logging",
            Self::Docstring => "docstring",
            Self::NoAbsolutePaths => "no absolute paths",
            Self::HeaderOrdering => "header/import ordering",
            Self::DomainTag => "domain pattern tag",
        };
        f.write_str(s)
    }
}

/// First meaningful line is a shebang, comment, import or docstring.
fn script_starts_well(content: &str) -> bool {
    content
        .lines()
        .map(str::trim_start)
        .find(|l| !l.is_empty())
        .is_none_or(|l| {
            ["#", "import ", "from ", "\"\"\"", "'''", "\"", "'"]
                .iter()
                .any(|p| l.starts_with(p))
        })
}

/// Why an artifact was or was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub compliance_score: f64,
    pub threshold: f64,
    pub checks: Vec<(SubCheck, bool)>,
    pub min_structural_checks: usize,
    pub accepted: bool,
}

impl GateVerdict {
    pub fn passed_checks(&self) -> usize {
        self.checks.iter().filter(|(_, ok)| *ok).count()
    }
}

// ============================================================================
// Extractor
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TemplateExtractor {
    policy: ExtractionPolicy,
}

impl TemplateExtractor {
    pub fn new(policy: ExtractionPolicy) -> Result<Self, DomainError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    pub fn gate(&self, analysis: &AnalysisResult, artifact: &Artifact) -> GateVerdict {
        let checks: Vec<_> = SubCheck::ALL
            .iter()
            .map(|c| (*c, c.passes(analysis, artifact)))
            .collect();
        let passed = checks.iter().filter(|(_, ok)| *ok).count();
        GateVerdict {
            compliance_score: analysis.compliance_score,
            threshold: self.policy.threshold,
            accepted: analysis.compliance_score >= self.policy.threshold
                && passed >= self.policy.min_structural_checks,
            checks,
            min_structural_checks: self.policy.min_structural_checks,
        }
    }

    /// Convert a qualifying artifact into a template.
    ///
    /// Returns `Ok(None)` when the artifact is below the gate; that is an
    /// expected outcome, not an error.
    #[instrument(skip_all, fields(path = %artifact.display_path()))]
    pub fn extract(
        &self,
        analysis: &AnalysisResult,
        artifact: &Artifact,
    ) -> Result<Option<Template>, DomainError> {
        let verdict = self.gate(analysis, artifact);
        if !verdict.accepted {
            debug!(
                score = verdict.compliance_score,
                checks = verdict.passed_checks(),
                "Below extraction gate"
            );
            return Ok(None);
        }

        let candidates = match artifact.kind {
            ArtifactKind::Script => script_candidates(&artifact.raw_content),
            ArtifactKind::Config(format) => config_candidates(format, &artifact.raw_content),
        };
        let (content, schema) = parameterize(&artifact.raw_content, candidates);
        debug!(variables = schema.len(), "Template extracted");

        Template::builder()
            .name(artifact.stem())
            .category(analysis.category)
            .kind(artifact.kind)
            .content(content)
            .schema(schema)
            .pattern_tags(analysis.pattern_tags.clone())
            .dependencies(analysis.dependencies.clone())
            .complexity_score(analysis.complexity_score)
            .effectiveness_score(analysis.compliance_score)
            .source_path(artifact.source_path.clone())
            .build()
            .map(Some)
    }
}

// ============================================================================
// Candidates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    start: usize,
    end: usize,
    value: String,
    binding: Option<String>,
    var_type: VariableType,
}

/// Classify a literal as configuration-like, checking environment names,
/// then versions, then paths.
pub fn classify(value: &str) -> Option<VariableType> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if ENVIRONMENT_NAMES.contains(&value.to_ascii_lowercase().as_str()) {
        return Some(VariableType::Environment);
    }
    if VERSION.is_match(value) {
        return Some(VariableType::Version);
    }
    if looks_like_path(value) {
        return Some(VariableType::Path);
    }
    None
}

fn looks_like_path(value: &str) -> bool {
    if value.len() < 2
        || value.contains("://")
        || value
            .chars()
            .any(|c| c.is_whitespace() || "\"'[](),;=%<>|*?".contains(c))
    {
        return false;
    }
    let has_separator = (value.contains('/') || value.contains('\\'))
        && value.chars().any(|c| c.is_ascii_alphanumeric());
    let has_data_extension = value
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && DATA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    has_separator || has_data_extension
}

fn candidate(start: usize, value: &str, binding: Option<&str>) -> Option<Candidate> {
    let var_type = classify(value)?;
    Some(Candidate {
        start,
        end: start + value.len(),
        value: value.to_string(),
        binding: binding.map(str::to_string),
        var_type,
    })
}

fn script_candidates(source: &str) -> Vec<Candidate> {
    let Ok(tree) = python::parse(source) else {
        return Vec::new();
    };
    python::string_literals(tree.root_node(), source)
        .into_iter()
        .filter_map(|lit| candidate(lit.start, &lit.value, lit.binding.as_deref()))
        .collect()
}

fn config_candidates(format: ConfigFormat, source: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let body = line.trim_end_matches(['\n', '\r']);
        if body.trim().is_empty() || (format != ConfigFormat::Json && is_comment(body)) {
            continue;
        }

        match format {
            ConfigFormat::Json => {
                for caps in JSON_PAIR.captures_iter(body) {
                    if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
                        out.extend(candidate(line_start + value.start(), value.as_str(), Some(key.as_str())));
                    }
                }
            }
            ConfigFormat::Yaml => {
                if let Some(caps) = YAML_LINE.captures(body) {
                    out.extend(line_value(&caps, line_start, format));
                }
            }
            ConfigFormat::Ini | ConfigFormat::Env | ConfigFormat::Toml => {
                if let Some(caps) = ASSIGN_LINE.captures(body) {
                    out.extend(line_value(&caps, line_start, format));
                }
            }
        }
    }
    out
}

/// Candidate for the value capture of a `key = value` / `key: value` line.
fn line_value(caps: &regex::Captures<'_>, line_start: usize, format: ConfigFormat) -> Option<Candidate> {
    let key = caps.get(1)?.as_str();
    let value = caps.get(2)?;
    let raw = value.as_str();
    let bytes = raw.as_bytes();

    let quoted = bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0];
    let (start, inner) = if quoted {
        (value.start() + 1, &raw[1..raw.len() - 1])
    } else {
        // TOML strings are always quoted; YAML flow values and anchors stay put.
        if format == ConfigFormat::Toml || raw.starts_with(['|', '>', '&', '*', '{', '[', '#', '!']) {
            return None;
        }
        (value.start(), raw)
    };
    candidate(line_start + start, inner, Some(key))
}

// ============================================================================
// Parameterization
// ============================================================================

fn parameterize(source: &str, mut candidates: Vec<Candidate>) -> (String, VariableSchema) {
    candidates.sort_by_key(|c| c.start);

    let mut names_by_value: HashMap<String, String> = HashMap::new();
    let mut schema: VariableSchema = BTreeMap::new();
    let mut content = String::with_capacity(source.len());
    let mut cursor = 0;

    for cand in candidates {
        if cand.start < cursor || cand.end > source.len() {
            continue;
        }
        let name = match names_by_value.get(&cand.value) {
            Some(existing) => existing.clone(),
            None => {
                let name = unique_name(&cand, &schema);
                schema.insert(
                    name.clone(),
                    VariableSpec::optional(cand.var_type, cand.value.clone()),
                );
                names_by_value.insert(cand.value.clone(), name.clone());
                name
            }
        };

        content.push_str(&placeholder::escape_literal(&source[cursor..cand.start]));
        content.push_str(&placeholder::placeholder(&name));
        cursor = cand.end;
    }
    content.push_str(&placeholder::escape_literal(&source[cursor..]));

    (content, schema)
}

fn unique_name(cand: &Candidate, schema: &VariableSchema) -> String {
    let base = cand
        .binding
        .as_deref()
        .and_then(snake_case)
        .unwrap_or_else(|| cand.var_type.base_name().to_string());

    if !schema.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|name| !schema.contains_key(name))
        .unwrap_or(base)
}

/// `DB_PATH`, `dbPath`, `db-path` and `db.path` all become `db_path`.
pub fn snake_case(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for c in raw.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    let out = out.trim_matches('_').to_string();
    placeholder::is_valid_name(&out).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{ComplianceWeights, StructuralFacts},
        inspector::SourceInspector,
    };

    fn analysis_with(score: f64, artifact: &Artifact) -> AnalysisResult {
        AnalysisResult {
            source_path: artifact.source_path.clone(),
            content_hash: artifact.content_hash.clone(),
            kind: artifact.kind,
            pattern_tags: vec!["DATABASE_INTEGRATION".into()],
            dependencies: vec![],
            functions: vec![],
            classes: vec![],
            facts: StructuralFacts {
                has_error_handling: true,
                has_logging: true,
                has_documentation: true,
                ..StructuralFacts::default()
            },
            complexity_score: 5.0,
            compliance: ComplianceWeights::default().score(|_| true),
            compliance_score: score,
            category: Default::default(),
        }
    }

    // ========================================================================
    // Gate
    // ========================================================================

    #[test]
    fn threshold_is_inclusive() {
        let artifact = Artifact::from_path("x.py", "import os\nDB = 'data/app.db'\n").unwrap();
        let extractor = TemplateExtractor::default();

        assert!(extractor.extract(&analysis_with(70.0, &artifact), &artifact).unwrap().is_some());
        assert!(extractor.extract(&analysis_with(69.0, &artifact), &artifact).unwrap().is_none());
        assert!(extractor.extract(&analysis_with(69.99, &artifact), &artifact).unwrap().is_none());
    }

    #[test]
    fn structural_checks_are_required_too() {
        let artifact = Artifact::from_path("x.py", "import os\n").unwrap();
        let mut analysis = analysis_with(95.0, &artifact);
        analysis.facts = StructuralFacts::default();
        analysis.pattern_tags.clear();

        let verdict = TemplateExtractor::default().gate(&analysis, &artifact);
        // only "no absolute paths" and "header ordering" pass
        assert_eq!(verdict.passed_checks(), 2);
        assert!(!verdict.accepted);
    }

    #[test]
    fn minimal_function_is_rejected() {
        let artifact = Artifact::from_path("foo.py", "def foo():\n    pass\n").unwrap();
        let analysis = SourceInspector::default().analyze(&artifact).unwrap();
        assert_eq!(analysis.compliance_score, 10.0);
        assert!(TemplateExtractor::default().extract(&analysis, &artifact).unwrap().is_none());
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = ExtractionPolicy {
            threshold: 120.0,
            ..ExtractionPolicy::default()
        };
        assert!(TemplateExtractor::new(policy).is_err());
        let policy = ExtractionPolicy {
            min_structural_checks: 7,
            ..ExtractionPolicy::default()
        };
        assert!(TemplateExtractor::new(policy).is_err());
    }

    // ========================================================================
    // Classification & naming
    // ========================================================================

    #[test]
    fn classification_order() {
        assert_eq!(classify("production"), Some(VariableType::Environment));
        assert_eq!(classify("v1.4.2-rc.1"), Some(VariableType::Version));
        assert_eq!(classify("2.0"), Some(VariableType::Version));
        assert_eq!(classify("data/app.db"), Some(VariableType::Path));
        assert_eq!(classify("app.db"), Some(VariableType::Path));
        assert_eq!(classify("C:\\data"), Some(VariableType::Path));
        assert_eq!(classify("hello world"), None);
        assert_eq!(classify("https://x.io/a"), None);
        assert_eq!(classify("%Y/%m/%d"), None);
        assert_eq!(classify("__main__"), None);
    }

    #[test]
    fn snake_case_names() {
        assert_eq!(snake_case("DB_PATH").as_deref(), Some("db_path"));
        assert_eq!(snake_case("dbPath").as_deref(), Some("db_path"));
        assert_eq!(snake_case("db-path").as_deref(), Some("db_path"));
        assert_eq!(snake_case("database.path").as_deref(), Some("database_path"));
        assert_eq!(snake_case("9lives"), None);
    }

    // ========================================================================
    // Parameterization
    // ========================================================================

    #[test]
    fn script_literals_become_placeholders() {
        let src = "import os\nDB_PATH = \"data/app.db\"\nBACKUP = \"data/app.db\"\nENV = 'production'\nMSG = \"hello\"\n";
        let artifact = Artifact::from_path("x.py", src).unwrap();
        let template = TemplateExtractor::default()
            .extract(&analysis_with(80.0, &artifact), &artifact)
            .unwrap()
            .unwrap();

        assert_eq!(
            template.parameterized_content,
            "import os\nDB_PATH = \"${db_path}\"\nBACKUP = \"${db_path}\"\nENV = '${env}'\nMSG = \"hello\"\n"
        );
        assert_eq!(template.variable_schema.len(), 2);
        let spec = &template.variable_schema["db_path"];
        assert_eq!(spec.var_type, VariableType::Path);
        assert!(!spec.required);
        assert_eq!(spec.default.as_deref(), Some("data/app.db"));
        assert_eq!(template.effectiveness_score, 80.0);
        assert!(template.environments.is_empty());
    }

    #[test]
    fn unbound_literals_use_numbered_base_names() {
        let src = "import os\nopen(\"a/b.txt\")\nopen(\"c/d.txt\")\n";
        let artifact = Artifact::from_path("x.py", src).unwrap();
        let template = TemplateExtractor::default()
            .extract(&analysis_with(80.0, &artifact), &artifact)
            .unwrap()
            .unwrap();
        assert_eq!(template.variable_names(), vec!["path", "path_2"]);
    }

    #[test]
    fn existing_dollar_braces_are_escaped() {
        let src = "import os\ncmd = f\"echo ${HOME}\"\n";
        let artifact = Artifact::from_path("x.py", src).unwrap();
        let template = TemplateExtractor::default()
            .extract(&analysis_with(80.0, &artifact), &artifact)
            .unwrap()
            .unwrap();
        assert_eq!(template.parameterized_content, "import os\ncmd = f\"echo $${HOME}\"\n");
        assert!(template.variable_schema.is_empty());
    }

    #[test]
    fn config_values_become_placeholders() {
        let src = "# svc\nexport APP_ENV=staging\nDATA_DIR=\"/srv/data\"\nWORKERS=4\n";
        let artifact = Artifact::from_path("svc.env", src).unwrap();
        let template = TemplateExtractor::default()
            .extract(&analysis_with(80.0, &artifact), &artifact)
            .unwrap()
            .unwrap();
        assert_eq!(
            template.parameterized_content,
            "# svc\nexport APP_ENV=${app_env}\nDATA_DIR=\"${data_dir}\"\nWORKERS=4\n"
        );
    }

    #[test]
    fn json_and_yaml_values() {
        let json = "{\n  \"db\": \"data/x.db\",\n  \"stage\": \"prod\", \"n\": 3\n}\n";
        let found = config_candidates(ConfigFormat::Json, json);
        assert_eq!(found.len(), 2);
        assert_eq!(&json[found[0].start..found[0].end], "data/x.db");
        assert_eq!(found[1].binding.as_deref(), Some("stage"));

        let yaml = "release:\n  version: 1.2.0\n  notes: |\n    text\n  path: 'logs/app.log'\n";
        let found = config_candidates(ConfigFormat::Yaml, yaml);
        let values: Vec<_> = found.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["1.2.0", "logs/app.log"]);
    }

    #[test]
    fn toml_values_must_be_quoted() {
        let toml = "[app]\nversion = \"1.0.0\"\nratio = 1.5\npaths = [\"a/b\"]\n";
        let found = config_candidates(ConfigFormat::Toml, toml);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "1.0.0");
    }
}
