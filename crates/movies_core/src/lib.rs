//! Fixture bootstrap and query helpers for the movies SQL exercises.
//! Every query runs on SQLite; this crate only prepares stage databases,
//! runs query strings and hands rows back as alias-keyed mappings.

pub mod config;
pub mod db;
pub mod logging;
pub mod query;
pub mod timeout;

pub use config::{ConfigError, HarnessConfig};
pub use db::fixture::{latest_version, DATA_VERSION, SCHEMA_VERSION};
pub use db::{DbError, DbResult, FixtureStore};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LoggingError,
};
pub use query::database::Database;
pub use query::value::{RowMapping, SqlValue};
pub use timeout::{minutes, run_with_timeout, seconds, TimeoutError, DEFAULT_TEST_TIMEOUT};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
