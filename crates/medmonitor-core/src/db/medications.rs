//! Medication database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Medication, NewMedication, DEFAULT_INVENTORY_COUNT, DEFAULT_REFILL_THRESHOLD};

/// Integer column read that falls back to `default` for NULL or stray text.
///
/// Older releases stored form entries verbatim, so INTEGER columns may hold
/// values such as `''` or `'sixty'`.
pub(crate) fn integer_or(column: &str, default: i64) -> String {
    format!(
        "CASE typeof({column}) WHEN 'integer' THEN {column} ELSE {default} END",
        column = column,
        default = default
    )
}

/// SELECT list for a full medication row.
///
/// Evolved columns read back with their defaults when NULL or non-numeric; a
/// missing or unreadable owner reads as user 0 (an orphan).
fn medication_columns() -> String {
    format!(
        "id, {}, medication_name, dose, timing, {}, last_taken, {}",
        integer_or("user_id", 0),
        integer_or("inventory_count", DEFAULT_INVENTORY_COUNT),
        integer_or("refill_threshold", DEFAULT_REFILL_THRESHOLD),
    )
}

impl Database {
    /// Insert a validated medication, returning the store-assigned ID.
    pub fn insert_medication(&self, medication: &NewMedication) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO medications (
                user_id, medication_name, dose, timing,
                inventory_count, refill_threshold
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                medication.user_id,
                medication.medication_name,
                medication.dose,
                medication.timing,
                medication.inventory_count,
                medication.refill_threshold,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, user_id = medication.user_id, "inserted medication");
        Ok(id)
    }

    /// Replace the editable fields of an existing medication.
    ///
    /// `last_taken` is left untouched. Returns false if no such medication.
    pub fn update_medication(&self, id: i64, medication: &NewMedication) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medications SET
                user_id = ?2,
                medication_name = ?3,
                dose = ?4,
                timing = ?5,
                inventory_count = ?6,
                refill_threshold = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                medication.user_id,
                medication.medication_name,
                medication.dose,
                medication.timing,
                medication.inventory_count,
                medication.refill_threshold,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: i64) -> DbResult<Option<Medication>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM medications WHERE id = ?", medication_columns()),
                [id],
                medication_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a medication by ID, treating absence as an error.
    pub fn require_medication(&self, id: i64) -> DbResult<Medication> {
        self.get_medication(id)?
            .ok_or_else(|| DbError::NotFound(format!("medication {}", id)))
    }

    /// List a user's medications in insertion order.
    ///
    /// User 0 lists the orphans.
    pub fn list_medications_for_user(&self, user_id: i64) -> DbResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM medications WHERE {} = ? ORDER BY id",
            medication_columns(),
            integer_or("user_id", 0)
        ))?;

        let rows = stmt.query_map([user_id], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List every medication in insertion order, orphans included.
    pub fn list_medications(&self) -> DbResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM medications ORDER BY id",
            medication_columns()
        ))?;

        let rows = stmt.query_map([], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Add `delta` to a medication's inventory. No clamping at zero.
    pub fn adjust_inventory(&self, medication_id: i64, delta: i64) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            &format!(
                "UPDATE medications SET inventory_count = {} + ?2 WHERE id = ?1",
                integer_or("inventory_count", DEFAULT_INVENTORY_COUNT)
            ),
            params![medication_id, delta],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("medication {}", medication_id)));
        }
        Ok(())
    }

    /// Record when a dose was last taken.
    pub fn set_last_taken(&self, medication_id: i64, taken_at: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE medications SET last_taken = ?2 WHERE id = ?1",
            params![medication_id, taken_at],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("medication {}", medication_id)));
        }
        Ok(())
    }
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        user_id: row.get(1)?,
        medication_name: row.get(2)?,
        dose: row.get(3)?,
        timing: row.get(4)?,
        inventory_count: row.get(5)?,
        last_taken: row.get(6)?,
        refill_threshold: row.get(7)?,
    })
}
