//! Database schema and migrations.
//!
//! The `measurements` table layout is an on-disk contract shared with stores
//! written by earlier archiver tools, so it is never altered. The schema
//! version lives in `PRAGMA user_version` rather than in a table of its own.

use rusqlite::Connection;
use tracing::debug;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Idempotently create the schema.
///
/// Performs no writes when the store is already up to date, so read-only
/// stores can still be queried.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    let version = get_schema_version(conn)?;

    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    if version == 0 && measurements_table_exists(conn)? {
        // Legacy store: same v1 layout, just never stamped with a version.
        debug!("Adopting existing measurements table as schema v{SCHEMA_VERSION}");
        return Ok(());
    }

    if version == 0 {
        create_schema_v1(conn)?;
    } else {
        migrate(conn, version)?;
    }
    set_schema_version(conn, SCHEMA_VERSION)
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}

fn measurements_table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'measurements'",
        [],
        |row| row.get(0),
    )
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS measurements(
            device TEXT,
            timestamp INTEGER,
            temperature REAL,
            humidity INTEGER,
            pressure REAL,
            co2 INTEGER,
            PRIMARY KEY(device, timestamp)
        );
        "#,
    )
}

/// Run migrations from old_version to current.
fn migrate(conn: &Connection, old_version: i32) -> rusqlite::Result<()> {
    // Add future migrations here
    // if old_version < 2 { migrate_to_v2(conn)?; }
    debug!("Migrating schema from v{old_version} to v{SCHEMA_VERSION}");
    create_schema_v1(conn)
}
