//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: catalog, history, preferences
    r#"
    CREATE TABLE IF NOT EXISTS stretches (
        id               INTEGER PRIMARY KEY,
        name             TEXT NOT NULL UNIQUE,
        priority         TEXT NOT NULL,
        category         TEXT NOT NULL,
        description      TEXT NOT NULL,
        enabled          INTEGER              -- NULL on rows imported before the flag existed
    );

    -- No foreign key: history outlives renames, and deletes cascade in code
    CREATE TABLE IF NOT EXISTS history (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        stretch_id       INTEGER NOT NULL,
        stretch_name     TEXT NOT NULL,
        action           TEXT NOT NULL CHECK (action IN ('completed', 'skipped')),
        timestamp        DATETIME NOT NULL,
        date             TEXT NOT NULL        -- YYYY-MM-DD
    );

    CREATE TABLE IF NOT EXISTS preferences (
        key              TEXT PRIMARY KEY,
        value            REAL NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_history_stretch ON history(stretch_id);
    "#,
    // Version 2: daily grouping index
    r#"
    CREATE INDEX IF NOT EXISTS idx_history_date ON history(date, action);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = i as i32 + 1;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
