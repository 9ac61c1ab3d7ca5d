//! Dose history (append-only) database operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{DoseAction, DoseEvent};

impl Database {
    /// Append one dose event, returning its ID.
    pub fn append_dose_event(
        &self,
        medication_id: i64,
        action: DoseAction,
        action_time: &str,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO medication_history (medication_id, action, action_time)
            VALUES (?1, ?2, ?3)
            "#,
            params![medication_id, action.as_str(), action_time],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All events for one medication, oldest first.
    pub fn list_dose_events(&self, medication_id: i64) -> DbResult<Vec<DoseEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, medication_id, action, action_time
            FROM medication_history
            WHERE medication_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([medication_id], |row| {
            Ok(DoseEventRow {
                id: row.get(0)?,
                medication_id: row.get(1)?,
                action: row.get(2)?,
                action_time: row.get(3)?,
            })
        })?;

        let mut events: Vec<DoseEvent> = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }

    /// Every event in the log, oldest first.
    pub fn list_all_dose_events(&self) -> DbResult<Vec<DoseEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, medication_id, action, action_time
            FROM medication_history
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DoseEventRow {
                id: row.get(0)?,
                medication_id: row.get(1)?,
                action: row.get(2)?,
                action_time: row.get(3)?,
            })
        })?;

        let mut events: Vec<DoseEvent> = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }

    /// Number of events recorded for a medication.
    pub fn count_dose_events(&self, medication_id: i64) -> DbResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM medication_history WHERE medication_id = ?",
            [medication_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Intermediate row struct for database mapping.
struct DoseEventRow {
    id: i64,
    medication_id: i64,
    action: String,
    action_time: String,
}

impl TryFrom<DoseEventRow> for DoseEvent {
    type Error = DbError;

    fn try_from(row: DoseEventRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse::<DoseAction>()
            .map_err(|e| DbError::Constraint(e.to_string()))?;

        Ok(DoseEvent {
            id: row.id,
            medication_id: row.medication_id,
            action,
            action_time: row.action_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_list() {
        let db = Database::open_in_memory().unwrap();

        let first = db
            .append_dose_event(1, DoseAction::Taken, "2024-01-01 08:00:00")
            .unwrap();
        let second = db
            .append_dose_event(1, DoseAction::Skipped, "2024-01-01 20:00:00")
            .unwrap();
        db.append_dose_event(2, DoseAction::Postponed, "2024-01-01 09:00:00")
            .unwrap();

        let events = db.list_dose_events(1).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, first);
        assert_eq!(events[0].action, DoseAction::Taken);
        assert_eq!(events[1].id, second);
        assert_eq!(events[1].action, DoseAction::Skipped);
        assert_eq!(events[1].action_time, "2024-01-01 20:00:00");

        assert_eq!(db.count_dose_events(1).unwrap(), 2);
        assert_eq!(db.count_dose_events(2).unwrap(), 1);
        assert_eq!(db.count_dose_events(3).unwrap(), 0);
        assert_eq!(db.list_all_dose_events().unwrap().len(), 3);
    }
}
