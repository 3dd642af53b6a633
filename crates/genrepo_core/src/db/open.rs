//! Connection open helpers.
//!
//! # Invariants
//! - `foreign_keys` and `busy_timeout` follow `DbOptions` on every connection.
//! - Every open attempt emits one `db_open` start event and one outcome event.

use super::{DbError, DbResult};
use crate::config::DbOptions;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens (or creates) a SQLite database file.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, options: &DbOptions) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", options, || Connection::open(path))
}

/// Opens a private in-memory SQLite database.
///
/// The database lives exactly as long as the returned connection.
pub fn open_db_in_memory(options: &DbOptions) -> DbResult<Connection> {
    open_with("memory", options, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    options: &DbOptions,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect()
        .map_err(DbError::from)
        .and_then(|conn| configure_connection(&conn, options).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={} foreign_keys={}",
            started_at.elapsed().as_millis(),
            options.foreign_keys
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }

    result
}

fn configure_connection(conn: &Connection, options: &DbOptions) -> DbResult<()> {
    let foreign_keys = i64::from(options.foreign_keys);
    conn.pragma_update(None, "foreign_keys", foreign_keys)?;
    conn.busy_timeout(options.busy_timeout())?;

    let actual: i64 = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
    if actual != foreign_keys {
        return Err(DbError::PragmaMismatch {
            pragma: "foreign_keys",
            expected: foreign_keys,
            actual,
        });
    }

    Ok(())
}
