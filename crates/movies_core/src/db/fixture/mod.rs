//! Movies fixture script registry and executor.
//!
//! # Responsibility
//! - Register fixture scripts in strictly increasing order.
//! - Apply pending scripts atomically up to a target version.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied script version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct FixtureScript {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Version that creates the schema without any rows.
pub const SCHEMA_VERSION: u32 = 1;
/// Version that holds every fixture row.
pub const DATA_VERSION: u32 = 3;

const SCRIPTS: &[FixtureScript] = &[
    FixtureScript {
        version: 1,
        name: "create_tables",
        sql: include_str!("0001_create_tables.sql"),
    },
    FixtureScript {
        version: 2,
        name: "lookup_data",
        sql: include_str!("0002_lookup_data.sql"),
    },
    FixtureScript {
        version: 3,
        name: "movies_data",
        sql: include_str!("0003_movies_data.sql"),
    },
    FixtureScript {
        version: 4,
        name: "indexes",
        sql: include_str!("0004_indexes.sql"),
    },
];

/// Returns the latest fixture version known by this binary.
pub fn latest_version() -> u32 {
    SCRIPTS.last().map_or(0, |script| script.version)
}

/// Reads the fixture version stored in the database header.
pub fn fixture_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies every script newer than the current version, up to `target`.
///
/// # Errors
/// - `UnknownFixtureVersion` when `target` has no script.
/// - `UnsupportedFixtureVersion` when the database is already past `target`.
pub fn apply_fixture_scripts(conn: &mut Connection, target: u32) -> DbResult<()> {
    let latest = latest_version();
    if target > latest {
        return Err(DbError::UnknownFixtureVersion(target));
    }

    let current_version = fixture_version(conn)?;
    if current_version > target {
        return Err(DbError::UnsupportedFixtureVersion {
            db_version: current_version,
            latest_supported: target,
        });
    }

    if current_version == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for script in SCRIPTS {
        if script.version <= current_version || script.version > target {
            continue;
        }

        debug!(
            "event=fixture_script module=db status=apply version={} name={}",
            script.version, script.name
        );
        tx.execute_batch(script.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", script.version))?;
    }
    tx.commit()?;

    Ok(())
}
