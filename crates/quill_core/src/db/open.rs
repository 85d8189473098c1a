//! Connection pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Build file-backed or in-memory SQLite connection pools.
//! - Configure per-connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON` and a busy timeout.
//! - Returned pools have migrations fully applied.
//! - The in-memory pool holds exactly one connection, so every checkout sees
//!   the same database.

use super::migrations::apply_migrations;
use super::{DbPool, DbResult};
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const FILE_POOL_MAX_SIZE: u32 = 8;

/// Opens a pool over a SQLite database file and applies pending migrations.
///
/// # Side effects
/// - Creates the database file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>) -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(configure_connection);
    build_pool(manager, FILE_POOL_MAX_SIZE, "file")
}

/// Opens a single-connection pool over an in-memory SQLite database.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    build_pool(manager, 1, "memory")
}

fn build_pool(manager: SqliteConnectionManager, max_size: u32, mode: &str) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode} max_size={max_size}");

    let pool = match Pool::builder().max_size(max_size).build(manager) {
        Ok(pool) => pool,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match migrate(&pool) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn migrate(pool: &DbPool) -> DbResult<()> {
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
