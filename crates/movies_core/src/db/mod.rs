//! SQLite bootstrap, fixture versioning and stage storage.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the query harness.
//! - Build the movies fixture from versioned SQL scripts.
//! - Keep per-stage fixture copies on disk.
//!
//! # Invariants
//! - Fixture version is tracked via `PRAGMA user_version`.
//! - A stage file is never read before its fixture scripts succeed.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub mod fixture;
mod open;
pub mod store;

pub use open::{open_db, open_db_in_memory};
pub use store::FixtureStore;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Filesystem failure while preparing or copying a stage file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedFixtureVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Requested fixture version has no script.
    UnknownFixtureVersion(u32),
    InvalidStageName(String),
    /// Source and target of a stage copy are the same file.
    StageCopyOntoItself(String),
    FixtureMissing {
        stage: String,
        path: PathBuf,
    },
    /// Statement was interrupted after running past the query timeout.
    QueryTimedOut {
        limit: Duration,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "io error at `{}`: {source}", path.display()),
            Self::UnsupportedFixtureVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "fixture version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnknownFixtureVersion(version) => {
                write!(f, "no fixture script for version {version}")
            }
            Self::InvalidStageName(name) => write!(
                f,
                "invalid stage name `{name}`; expected 1-64 chars of [A-Za-z0-9_-]"
            ),
            Self::StageCopyOntoItself(stage) => {
                write!(f, "cannot copy stage `{stage}` onto itself")
            }
            Self::FixtureMissing { stage, path } => write!(
                f,
                "fixture for stage `{stage}` not found at `{}`",
                path.display()
            ),
            Self::QueryTimedOut { limit } => {
                write!(f, "query interrupted after {} ms", limit.as_millis())
            }
        }
    }
}

impl DbError {
    /// Stable, text-free code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(inner, _)) => sqlite_code(inner.code),
            Self::Sqlite(_) => "sqlite_api",
            Self::Io { .. } => "io",
            Self::UnsupportedFixtureVersion { .. } => "fixture_version_unsupported",
            Self::UnknownFixtureVersion(_) => "fixture_version_unknown",
            Self::InvalidStageName(_) => "stage_name_invalid",
            Self::StageCopyOntoItself(_) => "stage_copy_onto_itself",
            Self::FixtureMissing { .. } => "fixture_missing",
            Self::QueryTimedOut { .. } => "query_timed_out",
        }
    }
}

fn sqlite_code(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::ConstraintViolation => "sqlite_constraint",
        ErrorCode::DatabaseBusy => "sqlite_busy",
        ErrorCode::DatabaseLocked => "sqlite_locked",
        ErrorCode::OperationInterrupted => "sqlite_interrupt",
        ErrorCode::ReadOnly => "sqlite_readonly",
        ErrorCode::CannotOpen => "sqlite_cantopen",
        ErrorCode::NotADatabase => "sqlite_notadb",
        ErrorCode::TypeMismatch => "sqlite_mismatch",
        _ => "sqlite_error",
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
