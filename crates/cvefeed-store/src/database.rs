//! SQLite-backed CVE store

use chrono::DateTime;
use cvefeed_core::{Clause, CveRecord, CveStore, Error, Predicate, Result, SortField, SortOrder};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// CVE collection backed by SQLite
pub struct CveDb {
    conn: Arc<Mutex<Connection>>,
}

impl CveDb {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::Store(format!("Failed to open CVE database: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("Failed to create in-memory database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cves (
                cve_id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                base_score REAL,
                published INTEGER NOT NULL,
                last_modified INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cves_score ON cves(base_score);
            CREATE INDEX IF NOT EXISTS idx_cves_published ON cves(published);
            CREATE INDEX IF NOT EXISTS idx_cves_modified ON cves(last_modified);
            "#,
        )
        .map_err(store_err)?;

        Ok(())
    }
}

/// Translate rusqlite failures into the service taxonomy. Busy/locked are the
/// transient class callers may retry.
fn store_err(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if matches!(inner.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) {
            return Error::StoreTimeout;
        }
    }
    Error::Store(e.to_string())
}

/// Compile a predicate into a WHERE fragment plus bound parameters.
///
/// Clauses are ANDed. An empty predicate compiles to no WHERE at all.
fn compile(predicate: &Predicate) -> (String, Vec<Value>) {
    let mut conds: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    for clause in predicate.clauses() {
        match clause {
            Clause::ScoreRange { min, max } => {
                // Unscored records are excluded whenever a bound is set
                let mut parts = vec![String::from("base_score IS NOT NULL")];
                if let Some(min) = min {
                    parts.push(String::from("base_score >= ?"));
                    params.push(Value::Real(*min));
                }
                if let Some(max) = max {
                    parts.push(String::from("base_score <= ?"));
                    params.push(Value::Real(*max));
                }
                conds.push(format!("({})", parts.join(" AND ")));
            }
            Clause::PublishedIn { start, end } => {
                conds.push(String::from("(published >= ? AND published < ?)"));
                params.push(Value::Integer(start.timestamp_millis()));
                params.push(Value::Integer(end.timestamp_millis()));
            }
            Clause::ModifiedSince { cutoff } => {
                conds.push(String::from("last_modified >= ?"));
                params.push(Value::Integer(cutoff.timestamp_millis()));
            }
            Clause::Keyword { needle } => {
                conds.push(String::from("description LIKE ? ESCAPE '\\'"));
                params.push(Value::Text(format!("%{}%", escape_like(needle))));
            }
        }
    }

    let where_sql = if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    };

    (where_sql, params)
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::BaseScore => "base_score",
        SortField::PublishedDate => "published",
        SortField::LastModifiedDate => "last_modified",
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CveRecord> {
    let published: i64 = row.get(3)?;
    let last_modified: i64 = row.get(4)?;
    Ok(CveRecord {
        id: row.get(0)?,
        description: row.get(1)?,
        base_score: row.get(2)?,
        published_date: DateTime::from_timestamp_millis(published).unwrap_or_default(),
        last_modified_date: DateTime::from_timestamp_millis(last_modified).unwrap_or_default(),
    })
}

const SELECT_COLUMNS: &str = "cve_id, description, base_score, published, last_modified";

impl CveStore for CveDb {
    fn get(&self, id: &str) -> Result<Option<CveRecord>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM cves WHERE cve_id = ?1"),
            [id],
            row_to_record,
        );
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(store_err(e)),
        }
    }

    fn contains(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row("SELECT 1 FROM cves WHERE cve_id = ?1", [id], |_| Ok(()));
        match result {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(store_err(e)),
        }
    }

    fn find(&self, predicate: &Predicate) -> Result<Vec<CveRecord>> {
        let (where_sql, params) = compile(predicate);
        let sql = format!("SELECT {SELECT_COLUMNS} FROM cves{where_sql}");
        debug!(sql = %sql, "find");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), row_to_record)
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn count(&self, predicate: &Predicate) -> Result<u64> {
        let (where_sql, params) = compile(predicate);
        let sql = format!("SELECT COUNT(*) FROM cves{where_sql}");

        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as u64)
    }

    fn find_page(
        &self,
        predicate: &Predicate,
        sort: SortField,
        order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CveRecord>> {
        let (where_sql, mut params) = compile(predicate);
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        // cve_id tiebreaker keeps pages stable when the sort key repeats
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM cves{where_sql} \
             ORDER BY {col} {direction}, cve_id ASC LIMIT ? OFFSET ?",
            col = sort_column(sort),
        );
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));
        debug!(sql = %sql, "find_page");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), row_to_record)
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn insert_if_absent(&self, record: &CveRecord) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO cves (cve_id, description, base_score, published, last_modified) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    record.id,
                    record.description,
                    record.base_score,
                    record.published_date.timestamp_millis(),
                    record.last_modified_date.timestamp_millis(),
                ],
            )
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn len(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cves", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as u64)
    }
}
