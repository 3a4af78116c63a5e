//! Query execution over one stage database.
//!
//! # Responsibility
//! - Open stage files (fresh, copied from a prior stage, or built from the
//!   fixture scripts).
//! - Run query strings and return rows as [`RowMapping`]s.
//! - Interrupt statements that outlive the configured query timeout.
//!
//! # Invariants
//! - The progress handler is installed only for the duration of one call.
//! - Logged events carry SQL length, never SQL text.

use crate::db::{open_db, DbError, DbResult, FixtureStore};
use crate::query::value::{RowMapping, SqlValue};
use log::{debug, warn};
use rusqlite::{Connection, ErrorCode, Row};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// VM instructions between two deadline checks.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

/// Handle to one stage database.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
    query_timeout: Option<Duration>,
}

impl Database {
    /// Opens an existing (or new, empty) database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Ok(Self {
            conn,
            path,
            query_timeout: None,
        })
    }

    /// Creates an empty database for `stage`, discarding any previous file.
    pub fn new_database(store: &FixtureStore, stage: &str) -> DbResult<Self> {
        store.remove_stage(stage)?;
        let path = store.stage_path(stage)?;
        std::fs::create_dir_all(store.root()).map_err(|source| DbError::Io {
            path: store.root().to_path_buf(),
            source,
        })?;
        Self::open(path)
    }

    /// Copies stage `existing` to `stage` and opens the copy.
    ///
    /// Writes through the returned handle never reach the `existing` file.
    pub fn from_existing(store: &FixtureStore, existing: &str, stage: &str) -> DbResult<Self> {
        let path = store.copy_stage(existing, stage)?;
        Self::open(path)
    }

    /// Opens a stage that has already been prepared, without creating a file.
    pub fn open_stage(store: &FixtureStore, stage: &str) -> DbResult<Self> {
        let path = store.existing_stage_path(stage)?;
        Self::open(path)
    }

    /// Builds `stage` up to the latest fixture version and opens it.
    pub fn from_fixture(store: &FixtureStore, stage: &str) -> DbResult<Self> {
        let path = store.prepare(stage)?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Sets the per-call time limit. `None` lets statements run to completion.
    pub fn set_query_timeout(&mut self, limit: Option<Duration>) {
        self.query_timeout = limit;
    }

    /// Runs one or more statements that return no rows.
    pub fn execute(&self, sql: &str) -> DbResult<()> {
        self.run("execute", sql, |conn| conn.execute_batch(sql))
    }

    /// Runs one `INSERT` and returns the rowid of the last inserted row.
    pub fn insert(&self, sql: &str) -> DbResult<i64> {
        self.run("insert", sql, |conn| {
            conn.execute(sql, [])?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Runs one `UPDATE` and returns the number of changed rows.
    pub fn update(&self, sql: &str) -> DbResult<usize> {
        self.run("update", sql, |conn| conn.execute(sql, []))
    }

    /// Runs one `DELETE` and returns the number of removed rows.
    pub fn delete(&self, sql: &str) -> DbResult<usize> {
        self.run("delete", sql, |conn| conn.execute(sql, []))
    }

    /// Returns the first result row, or `None` for an empty result.
    pub fn select_single_row(&self, sql: &str) -> DbResult<Option<RowMapping>> {
        self.run("select_single_row", sql, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let aliases = column_aliases(&stmt);
            let mut rows = stmt.query([])?;
            let first = match rows.next()? {
                Some(row) => Some(map_row(row, &aliases)?),
                None => None,
            };
            Ok(first)
        })
    }

    /// Returns every result row in the order the engine produced them.
    pub fn select_multiple_rows(&self, sql: &str) -> DbResult<Vec<RowMapping>> {
        self.run("select_multiple_rows", sql, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let aliases = column_aliases(&stmt);
            let mut rows = stmt.query([])?;
            let mut mapped = Vec::new();
            while let Some(row) = rows.next()? {
                mapped.push(map_row(row, &aliases)?);
            }
            Ok(mapped)
        })
    }

    fn run<T>(
        &self,
        op: &str,
        sql: &str,
        call: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> DbResult<T> {
        let started_at = Instant::now();
        if let Some(limit) = self.query_timeout {
            let deadline = started_at + limit;
            self.conn
                .progress_handler(PROGRESS_HANDLER_OPS, Some(move || Instant::now() >= deadline));
        }

        let result = call(&self.conn);

        if self.query_timeout.is_some() {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }

        match result {
            Ok(value) => {
                debug!(
                    "event=query module=query status=ok op={} sql_len={} duration_ms={}",
                    op,
                    sql.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                let err = self.classify_error(err);
                warn!(
                    "event=query module=query status=error op={} sql_len={} duration_ms={} error_code={}",
                    op,
                    sql.len(),
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn classify_error(&self, err: rusqlite::Error) -> DbError {
        if let (Some(limit), rusqlite::Error::SqliteFailure(inner, _)) = (self.query_timeout, &err)
        {
            if inner.code == ErrorCode::OperationInterrupted {
                return DbError::QueryTimedOut { limit };
            }
        }
        DbError::Sqlite(err)
    }
}

fn column_aliases(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn map_row(row: &Row<'_>, aliases: &[String]) -> rusqlite::Result<RowMapping> {
    let mut mapping = RowMapping::new();
    for (index, alias) in aliases.iter().enumerate() {
        mapping.insert(alias.clone(), SqlValue::from(row.get_ref(index)?));
    }
    Ok(mapping)
}
