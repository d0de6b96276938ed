//! SQLite-backed template catalog.
//!
//! Templates are stored as a JSON body plus the columns that are mutated
//! after insertion (usage, effectiveness, timestamps). Mutable columns win
//! over the body when a row is read back.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use tracing::debug;

use reforge_core::{
    application::{
        ApplicationError,
        ports::{RecordFilter, TemplateCatalog, TemplateQuery},
    },
    domain::{DomainValidator as validator, EnvironmentContext, GenerationRecord, Template, TemplateId},
    error::{ReforgeError, ReforgeResult},
};

use super::{not_found, unavailable};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS templates (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        effectiveness_score REAL NOT NULL,
        usage_count INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        last_used TEXT,
        body TEXT NOT NULL,
        UNIQUE (name, category, content_hash)
    );

    CREATE INDEX IF NOT EXISTS idx_templates_category ON templates(category);

    CREATE TABLE IF NOT EXISTS environment_contexts (
        name TEXT PRIMARY KEY,
        body TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS generation_records (
        generation_id TEXT PRIMARY KEY,
        template_id TEXT NOT NULL,
        environment_name TEXT NOT NULL,
        generated_at TEXT NOT NULL,
        body TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_template
        ON generation_records(template_id, generated_at);
"#;

const TEMPLATE_COLUMNS: &str = "body, effectiveness_score, usage_count, updated_at, last_used";

/// Persistent catalog in a single SQLite file.
///
/// Thread-safe via internal mutex on the connection.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (creating if needed) the catalog at `path`.
    pub fn open(path: impl AsRef<Path>) -> ReforgeResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                unavailable(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| unavailable(format!("failed to open {}: {e}", path.display())))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| unavailable(format!("failed to set pragmas: {e}")))?;
        debug!(path = %path.display(), "Opened catalog");
        Self::init(conn)
    }

    /// A private, non-persistent catalog.
    pub fn in_memory() -> ReforgeResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| unavailable(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> ReforgeResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| unavailable(format!("failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> ReforgeResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| unavailable(format!("failed to lock database: {e}")))
    }
}

impl TemplateCatalog for SqliteCatalog {
    fn put(&self, template: Template) -> ReforgeResult<TemplateId> {
        validator::validate_template(&template)?;
        let body = encode(&template)?;
        let conn = self.conn()?;

        let stored: String = conn
            .query_row(
                "INSERT INTO templates
                    (id, name, category, content_hash, effectiveness_score,
                     usage_count, updated_at, last_used, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (name, category, content_hash)
                 DO UPDATE SET updated_at = excluded.updated_at
                 RETURNING id",
                params![
                    template.id.to_string(),
                    template.name,
                    template.category.as_str(),
                    template.content_hash.as_str(),
                    template.effectiveness_score,
                    template.usage_count as i64,
                    timestamp(Utc::now()),
                    template.last_used.map(timestamp),
                    body,
                ],
                |row| row.get(0),
            )
            .map_err(|e| unavailable(format!("failed to store template: {e}")))?;

        stored.parse::<TemplateId>().map_err(unavailable)
    }

    fn get(&self, id: &TemplateId) -> ReforgeResult<Template> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = ?1"),
                params![id.to_string()],
                TemplateRow::read,
            )
            .optional()
            .map_err(|e| unavailable(format!("failed to read template: {e}")))?;
        row.ok_or_else(|| not_found(id))?.decode()
    }

    fn find(&self, query: &TemplateQuery) -> ReforgeResult<Vec<Template>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE (?1 IS NULL OR category = ?1)"
            ))
            .map_err(|e| unavailable(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params![query.category.map(|c| c.as_str())], TemplateRow::read)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| unavailable(format!("failed to query templates: {e}")))?;

        let mut found = Vec::with_capacity(rows.len());
        for row in rows {
            let template = row.decode()?;
            if query.matches(&template) {
                found.push(template);
            }
        }
        found.sort_by(Template::catalog_order);
        Ok(found)
    }

    fn record_usage(&self, id: &TemplateId) -> ReforgeResult<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE templates SET usage_count = usage_count + 1, last_used = ?2 WHERE id = ?1",
                params![id.to_string(), timestamp(Utc::now())],
            )
            .map_err(|e| unavailable(format!("failed to record usage: {e}")))?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn update_effectiveness(&self, id: &TemplateId, score: f64) -> ReforgeResult<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE templates SET effectiveness_score = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), score.clamp(0.0, 100.0), timestamp(Utc::now())],
            )
            .map_err(|e| unavailable(format!("failed to update effectiveness: {e}")))?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn put_context(&self, context: EnvironmentContext) -> ReforgeResult<()> {
        validator::validate_environment(&context)?;
        let body = encode(&context)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO environment_contexts (name, body) VALUES (?1, ?2)",
                params![context.environment_name, body],
            )
            .map_err(|e| unavailable(format!("failed to store context: {e}")))?;
        Ok(())
    }

    fn get_context(&self, name: &str) -> ReforgeResult<Option<EnvironmentContext>> {
        let body: Option<String> = self
            .conn()?
            .query_row(
                "SELECT body FROM environment_contexts WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| unavailable(format!("failed to read context: {e}")))?;
        body.as_deref().map(decode).transpose()
    }

    fn append_record(&self, record: GenerationRecord) -> ReforgeResult<()> {
        let body = encode(&record)?;
        let result = self.conn()?.execute(
            "INSERT INTO generation_records
                (generation_id, template_id, environment_name, generated_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.generation_id.to_string(),
                record.template_id.to_string(),
                record.environment_name,
                timestamp(record.generated_at),
                body,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(ApplicationError::DuplicateRecord {
                    id: record.generation_id.to_string(),
                }
                .into())
            }
            Err(e) => Err(unavailable(format!("failed to append record: {e}"))),
        }
    }

    fn records(&self, filter: &RecordFilter) -> ReforgeResult<Vec<GenerationRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT body FROM generation_records
                 WHERE (?1 IS NULL OR template_id = ?1)
                   AND (?2 IS NULL OR environment_name = ?2)
                 ORDER BY generated_at, generation_id",
            )
            .map_err(|e| unavailable(format!("failed to prepare query: {e}")))?;
        let bodies = stmt
            .query_map(
                params![
                    filter.template_id.map(|id| id.to_string()),
                    filter.environment,
                ],
                |row| row.get::<_, String>(0),
            )
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| unavailable(format!("failed to query records: {e}")))?;

        let mut records = bodies
            .iter()
            .map(|b| decode::<GenerationRecord>(b))
            .collect::<ReforgeResult<Vec<_>>>()?;
        records.sort_by(GenerationRecord::chronological);
        Ok(records)
    }
}

// -----------------------------------------------------------------------------
// Row mapping
// -----------------------------------------------------------------------------

struct TemplateRow {
    body: String,
    effectiveness_score: f64,
    usage_count: i64,
    updated_at: String,
    last_used: Option<String>,
}

impl TemplateRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            body: row.get(0)?,
            effectiveness_score: row.get(1)?,
            usage_count: row.get(2)?,
            updated_at: row.get(3)?,
            last_used: row.get(4)?,
        })
    }

    fn decode(self) -> ReforgeResult<Template> {
        let mut template: Template = decode(&self.body)?;
        template.effectiveness_score = self.effectiveness_score;
        template.usage_count = u64::try_from(self.usage_count).unwrap_or(0);
        template.updated_at = parse_timestamp(&self.updated_at)?;
        template.last_used = self.last_used.as_deref().map(parse_timestamp).transpose()?;
        Ok(template)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> ReforgeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| unavailable(format!("corrupt timestamp '{raw}': {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> ReforgeResult<String> {
    serde_json::to_string(value).map_err(|e| ReforgeError::internal(format!("encode failed: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> ReforgeResult<T> {
    serde_json::from_str(body).map_err(|e| unavailable(format!("corrupt catalog row: {e}")))
}
