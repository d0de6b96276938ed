//! Configuration grammars: JSON, YAML, TOML and the line-oriented INI/env.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::SyntaxIssue;
use crate::domain::value_objects::ConfigFormat;

static ENV_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_.\-]*)\s*=(.*)$").expect("valid regex")
});

static INI_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([^\[\]]+)\]\s*$").expect("valid regex"));

static INI_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_.\-][A-Za-z0-9_.\- ]*?)\s*=(.*)$").expect("valid regex")
});

/// One leaf value with its dotted key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// What the parsers learn about a config document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDocument {
    pub entries: Vec<ConfigEntry>,
    /// `[section]` headers, or top-level tables/objects.
    pub section_count: usize,
    pub max_depth: usize,
    pub comment_lines: usize,
    pub leading_comment: bool,
}

pub fn is_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with('#') || t.starts_with(';')
}

/// Parse `content` as `format`.
///
/// Line-oriented formats report every offending line; structured formats
/// report the first error their parser hits.
pub fn parse(format: ConfigFormat, content: &str) -> Result<ConfigDocument, Vec<SyntaxIssue>> {
    let mut doc = match format {
        ConfigFormat::Ini | ConfigFormat::Env => parse_lines(format, content)?,
        ConfigFormat::Json => parse_json(content).map_err(|e| vec![e])?,
        ConfigFormat::Yaml => parse_yaml(content).map_err(|e| vec![e])?,
        ConfigFormat::Toml => parse_toml(content).map_err(|e| vec![e])?,
    };

    if format != ConfigFormat::Json {
        doc.comment_lines = content.lines().filter(|l| is_comment(l)).count();
        doc.leading_comment = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .is_some_and(is_comment);
    }
    Ok(doc)
}

// ============================================================================
// Line-oriented
// ============================================================================

fn parse_lines(format: ConfigFormat, content: &str) -> Result<ConfigDocument, Vec<SyntaxIssue>> {
    let mut doc = ConfigDocument::default();
    let mut issues = Vec::new();
    let mut section: Option<String> = None;
    let mut in_entry = false;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || is_comment(line) {
            continue;
        }

        if format == ConfigFormat::Ini {
            if let Some(caps) = INI_SECTION.captures(line) {
                section = Some(caps[1].trim().to_string());
                doc.section_count += 1;
                doc.max_depth = 1;
                in_entry = false;
                continue;
            }
            // Indented continuation of the previous value.
            if in_entry && line.starts_with(char::is_whitespace) {
                continue;
            }
        }

        let pattern = if format == ConfigFormat::Ini { &*INI_LINE } else { &*ENV_LINE };
        match pattern.captures(line) {
            Some(caps) => {
                let key = caps[1].trim();
                let key = match &section {
                    Some(s) => format!("{s}.{key}"),
                    None => key.to_string(),
                };
                doc.entries.push(ConfigEntry {
                    key,
                    value: unquote(caps[2].trim()).to_string(),
                });
                in_entry = true;
            }
            None => {
                let expected = if format == ConfigFormat::Ini {
                    "expected '[section]' or 'key=value'"
                } else {
                    "expected 'key=value'"
                };
                let column = line.len() - line.trim_start().len() + 1;
                issues.push(SyntaxIssue::new(line_no, column, expected));
                in_entry = false;
            }
        }
    }

    if issues.is_empty() { Ok(doc) } else { Err(issues) }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

// ============================================================================
// Structured
// ============================================================================

fn parse_json(content: &str) -> Result<ConfigDocument, SyntaxIssue> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| SyntaxIssue::new(e.line().max(1), e.column().max(1), e.to_string()))?;

    let mut doc = ConfigDocument::default();
    if let serde_json::Value::Object(map) = &value {
        doc.section_count = map.values().filter(|v| v.is_object()).count();
    }
    doc.max_depth = flatten_json(&value, "", 0, &mut doc.entries);
    Ok(doc)
}

fn flatten_json(value: &serde_json::Value, prefix: &str, depth: usize, out: &mut Vec<ConfigEntry>) -> usize {
    use serde_json::Value;
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| flatten_json(v, &join(prefix, k), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| flatten_json(v, &join(prefix, &i.to_string()), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::String(s) => leaf(prefix, s.clone(), depth, out),
        Value::Null => leaf(prefix, String::new(), depth, out),
        other => leaf(prefix, other.to_string(), depth, out),
    }
}

fn parse_yaml(content: &str) -> Result<ConfigDocument, SyntaxIssue> {
    let mut doc = ConfigDocument::default();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| {
            let (line, column) = e
                .location()
                .map_or((1, 1), |loc| (loc.line().max(1), loc.column().max(1)));
            SyntaxIssue::new(line, column, e.to_string())
        })?;

        if let serde_yaml::Value::Mapping(map) = &value {
            doc.section_count += map.values().filter(|v| v.is_mapping()).count();
        }
        let depth = flatten_yaml(&value, "", 0, &mut doc.entries);
        doc.max_depth = doc.max_depth.max(depth);
    }
    Ok(doc)
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, depth: usize, out: &mut Vec<ConfigEntry>) -> usize {
    use serde_yaml::Value;
    match value {
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| flatten_yaml(v, &join(prefix, &yaml_scalar(k)), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| flatten_yaml(v, &join(prefix, &i.to_string()), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::Tagged(tagged) => flatten_yaml(&tagged.value, prefix, depth, out),
        scalar => leaf(prefix, yaml_scalar(scalar), depth, out),
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    use serde_yaml::Value;
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

fn parse_toml(content: &str) -> Result<ConfigDocument, SyntaxIssue> {
    let table: toml::Table = toml::from_str(content).map_err(|e| {
        let offset = e.span().map_or(0, |span| span.start);
        SyntaxIssue::at_offset(content, offset, e.message().to_string())
    })?;

    let mut doc = ConfigDocument {
        section_count: table.values().filter(|v| v.is_table()).count(),
        ..ConfigDocument::default()
    };
    doc.max_depth = table
        .iter()
        .map(|(k, v)| flatten_toml(v, k, 1, &mut doc.entries))
        .max()
        .unwrap_or(0);
    Ok(doc)
}

fn flatten_toml(value: &toml::Value, prefix: &str, depth: usize, out: &mut Vec<ConfigEntry>) -> usize {
    use toml::Value;
    match value {
        Value::Table(map) => map
            .iter()
            .map(|(k, v)| flatten_toml(v, &join(prefix, k), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| flatten_toml(v, &join(prefix, &i.to_string()), depth + 1, out))
            .max()
            .unwrap_or(depth),
        Value::String(s) => leaf(prefix, s.clone(), depth, out),
        other => leaf(prefix, other.to_string(), depth, out),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn leaf(key: &str, value: String, depth: usize, out: &mut Vec<ConfigEntry>) -> usize {
    out.push(ConfigEntry {
        key: key.to_string(),
        value,
    });
    depth
}
