use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use crate::errors::KycError;
use crate::models::{Issue, IssueCategory, IssueId};
use super::{IssueStore, StoreMeta};

const SELECT_COLUMNS: &str = "SELECT id, title, description, severity, status, company_id, materiality, requirements, considerations, category, badge, hit, state FROM issues";

/// Issue storage in a SQLite database. Insertion order is kept by the
/// autoincrement `seq` column, which updates never touch.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, KycError> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| KycError::Database(format!("Failed to open database: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| KycError::Database(format!("Failed to set pragmas: {}", e)))?;

        debug!(path, "Opened issue database");
        Self::initialize(conn)
    }

    pub fn in_memory() -> Result<Self, KycError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| KycError::Database(format!("Failed to open in-memory db: {}", e)))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, KycError> {
        conn.execute_batch(super::schema::CREATE_TABLES)
            .map_err(|e| KycError::Database(format!("Failed to create tables: {}", e)))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, KycError> {
        self.conn.lock().map_err(|_| KycError::Internal("database lock poisoned".into()))
    }

    fn query_issues(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Issue>, KycError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)
            .map_err(|e| KycError::Database(format!("Query failed: {}", e)))?;
        let rows = stmt.query_map(args, row_to_issue)
            .map_err(|e| KycError::Database(format!("Query error: {}", e)))?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.map_err(|e| KycError::Database(format!("Row error: {}", e)))?);
        }
        Ok(issues)
    }
}

/// Serialize a unit enum to its wire name, e.g. `Severity::High` -> "High".
fn enum_to_sql<T: Serialize>(value: &T) -> Result<String, KycError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(KycError::Internal(format!("expected enum name, got {}", other))),
    }
}

fn enum_from_sql<T: DeserializeOwned>(idx: usize, raw: String) -> rusqlite::Result<T> {
    serde_json::from_value(serde_json::Value::String(raw)).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn list_from_sql(idx: usize, raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_issue(row: &Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        severity: enum_from_sql(3, row.get(3)?)?,
        status: enum_from_sql(4, row.get(4)?)?,
        company_id: row.get(5)?,
        materiality: row.get(6)?,
        requirements: list_from_sql(7, row.get(7)?)?,
        considerations: list_from_sql(8, row.get(8)?)?,
        category: enum_from_sql(9, row.get(9)?)?,
        badge: row.get(10)?,
        hit: row.get(11)?,
        state: enum_from_sql(12, row.get(12)?)?,
    })
}

impl IssueStore for SqliteStore {
    fn all(&self) -> Result<Vec<Issue>, KycError> {
        self.query_issues(&format!("{} ORDER BY seq", SELECT_COLUMNS), params![])
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, KycError> {
        let conn = self.conn()?;
        conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), params![id], row_to_issue)
            .optional()
            .map_err(|e| KycError::Database(format!("Query error: {}", e)))
    }

    fn insert(&mut self, issue: Issue) -> Result<(), KycError> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO issues (id, title, description, severity, status, company_id, materiality, requirements, considerations, category, badge, hit, state) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                issue.id,
                issue.title,
                issue.description,
                enum_to_sql(&issue.severity)?,
                enum_to_sql(&issue.status)?,
                issue.company_id,
                issue.materiality,
                serde_json::to_string(&issue.requirements)?,
                serde_json::to_string(&issue.considerations)?,
                enum_to_sql(&issue.category)?,
                issue.badge,
                issue.hit,
                enum_to_sql(&issue.state)?,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(KycError::Conflict(format!("issue {} already exists", issue.id)))
            }
            Err(e) => Err(KycError::Database(format!("Failed to insert issue: {}", e))),
        }
    }

    fn replace(&mut self, issue: Issue) -> Result<bool, KycError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE issues SET title = ?2, description = ?3, severity = ?4, status = ?5, company_id = ?6, materiality = ?7, requirements = ?8, considerations = ?9, category = ?10, badge = ?11, hit = ?12, state = ?13 WHERE id = ?1",
            params![
                issue.id,
                issue.title,
                issue.description,
                enum_to_sql(&issue.severity)?,
                enum_to_sql(&issue.status)?,
                issue.company_id,
                issue.materiality,
                serde_json::to_string(&issue.requirements)?,
                serde_json::to_string(&issue.considerations)?,
                enum_to_sql(&issue.category)?,
                issue.badge,
                issue.hit,
                enum_to_sql(&issue.state)?,
            ],
        ).map_err(|e| KycError::Database(format!("Failed to update issue: {}", e)))?;
        Ok(changed > 0)
    }

    fn remove(&mut self, id: IssueId) -> Result<bool, KycError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])
            .map_err(|e| KycError::Database(format!("Failed to delete issue: {}", e)))?;
        Ok(changed > 0)
    }

    fn meta(&self) -> Result<StoreMeta, KycError> {
        let conn = self.conn()?;
        let read = |key: &str| -> Result<Option<i64>, KycError> {
            conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
                .optional()
                .map_err(|e| KycError::Database(format!("Query error: {}", e)))
        };

        let seeded = read("seeded")?.unwrap_or(0) != 0;
        let high_water = read("id_high_water")?.unwrap_or(0);
        let id_high_water = IssueId::try_from(high_water)
            .map_err(|_| KycError::Database(format!("corrupt id high-water mark {}", high_water)))?;
        Ok(StoreMeta { seeded, id_high_water })
    }

    fn save_meta(&mut self, meta: StoreMeta) -> Result<(), KycError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('seeded', ?1), ('id_high_water', ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![meta.seeded as i64, meta.id_high_water as i64],
        ).map_err(|e| KycError::Database(format!("Failed to save store metadata: {}", e)))?;
        Ok(())
    }

    fn len(&self) -> Result<usize, KycError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .map_err(|e| KycError::Database(format!("Query error: {}", e)))?;
        Ok(count as usize)
    }

    fn max_id(&self) -> Result<Option<IssueId>, KycError> {
        let conn = self.conn()?;
        conn.query_row("SELECT MAX(id) FROM issues", [], |row| row.get::<_, Option<IssueId>>(0))
            .map_err(|e| KycError::Database(format!("Query error: {}", e)))
    }

    fn by_category(&self, category: IssueCategory) -> Result<Vec<Issue>, KycError> {
        self.query_issues(
            &format!("{} WHERE category = ?1 ORDER BY seq", SELECT_COLUMNS),
            params![enum_to_sql(&category)?],
        )
    }
}
