//! Query helper returning rows as alias-keyed mappings.
//!
//! # Responsibility
//! - Wrap a stage connection behind execute/insert/update/delete/select calls.
//! - Convert SQLite cells into owned, comparable values.

pub mod database;
pub mod value;
