//! SQLite schema definition and in-place schema evolution.

use rusqlite::Connection;

/// Value stored in `PRAGMA user_version` once setup has completed.
pub const SCHEMA_VERSION: i64 = 2;

/// Base tables, as created by the first release.
///
/// Foreign keys are declared but not enforced: medications may outlive (or
/// predate) their user and readers must cope with that.
pub const BASE_SCHEMA: &str = r#"
-- ============================================================================
-- Users
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);

-- ============================================================================
-- Medications (columns added later live in EVOLVED_COLUMNS)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    medication_name TEXT NOT NULL,
    dose TEXT NOT NULL,
    timing TEXT NOT NULL,
    FOREIGN KEY(user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_medications_user ON medications(user_id);
CREATE INDEX IF NOT EXISTS idx_medications_timing ON medications(timing);

-- ============================================================================
-- Dose History (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medication_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medication_id INTEGER NOT NULL REFERENCES medications(id),
    action TEXT NOT NULL CHECK (action IN ('taken', 'postponed', 'skipped')),
    action_time TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_medication ON medication_history(medication_id);

-- History rows are never rewritten
CREATE TRIGGER IF NOT EXISTS medication_history_no_update BEFORE UPDATE ON medication_history
BEGIN
    SELECT RAISE(ABORT, 'Dose history is append-only');
END;

CREATE TRIGGER IF NOT EXISTS medication_history_no_delete BEFORE DELETE ON medication_history
BEGIN
    SELECT RAISE(ABORT, 'Dose history is append-only');
END;
"#;

/// Columns added to `medications` after the first release: (name, definition).
pub const EVOLVED_COLUMNS: &[(&str, &str)] = &[
    ("inventory_count", "INTEGER DEFAULT 0"),
    ("last_taken", "TEXT"),
    ("refill_threshold", "INTEGER DEFAULT 5"),
];

/// Create missing tables and add missing columns. Safe to run on every start.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(BASE_SCHEMA)?;

    let existing = table_columns(conn, "medications")?;
    for (column, definition) in EVOLVED_COLUMNS {
        if existing.iter().any(|c| c == column) {
            continue;
        }
        tracing::info!(column = %column, "adding column to medications");
        conn.execute_batch(&format!(
            "ALTER TABLE medications ADD COLUMN {} {}",
            column, definition
        ))?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Column names of a table, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    rows.collect()
}

/// Schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}
