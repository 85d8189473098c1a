//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Build the process-wide SQLite connection pool for Quill.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write article data before migrations succeed.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_pool, open_pool_in_memory};

/// Shared connection pool handed to repositories at startup.
pub type DbPool = Pool<SqliteConnectionManager>;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
