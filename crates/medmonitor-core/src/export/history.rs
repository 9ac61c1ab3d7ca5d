//! Dose history export.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::models::{format_timestamp, DoseAction, DoseEvent, Medication};

/// Version of the exported document layout.
pub const HISTORY_FORMAT_VERSION: &str = "1";

/// History of a single medication with per-action tallies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationHistory {
    /// Medication as currently stored
    pub medication: Medication,
    /// Events, oldest first
    pub events: Vec<DoseEvent>,
    pub taken: usize,
    pub postponed: usize,
    pub skipped: usize,
}

impl MedicationHistory {
    fn new(medication: Medication, events: Vec<DoseEvent>) -> Self {
        let count = |action: DoseAction| events.iter().filter(|e| e.action == action).count();
        Self {
            taken: count(DoseAction::Taken),
            postponed: count(DoseAction::Postponed),
            skipped: count(DoseAction::Skipped),
            medication,
            events,
        }
    }

    /// Fraction of recorded actions that were Taken, if any were recorded.
    pub fn adherence(&self) -> Option<f64> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.taken as f64 / self.events.len() as f64)
        }
    }
}

/// History export metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryMetadata {
    /// Export format version
    pub format_version: String,
    /// Export timestamp (local time)
    pub exported_at: String,
    /// Total events across all medications
    pub event_count: usize,
}

/// Exported dose history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryExport {
    /// Export metadata
    pub metadata: HistoryMetadata,
    /// One entry per medication
    pub medications: Vec<MedicationHistory>,
}

impl HistoryExport {
    fn new(medications: Vec<MedicationHistory>) -> Self {
        let event_count = medications.iter().map(|m| m.events.len()).sum();
        Self {
            metadata: HistoryMetadata {
                format_version: HISTORY_FORMAT_VERSION.to_string(),
                exported_at: format_timestamp(Local::now().naive_local()),
                event_count,
            },
            medications,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format, one row per event.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("medication_id,user_id,medication_name,action,action_time\n");

        for history in &self.medications {
            for event in &history.events {
                csv.push_str(&format!(
                    "{},{},{},{},{}\n",
                    history.medication.id,
                    history.medication.user_id,
                    escape_csv(&history.medication.medication_name),
                    event.action,
                    escape_csv(&event.action_time),
                ));
            }
        }

        csv
    }
}

/// History exporter.
pub struct HistoryExporter<'a> {
    db: &'a Database,
}

impl<'a> HistoryExporter<'a> {
    /// Create a new history exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export the history of one medication.
    pub fn export_medication(&self, medication_id: i64) -> DbResult<HistoryExport> {
        let medication = self.db.require_medication(medication_id)?;
        let events = self.db.list_dose_events(medication_id)?;
        Ok(HistoryExport::new(vec![MedicationHistory::new(medication, events)]))
    }

    /// Export the history of every medication, orphans included.
    pub fn export_all(&self) -> DbResult<HistoryExport> {
        let medications = self
            .db
            .list_medications()?
            .into_iter()
            .map(|medication| {
                let events = self.db.list_dose_events(medication.id)?;
                Ok(MedicationHistory::new(medication, events))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(HistoryExport::new(medications))
    }

    /// Export the history of every medication belonging to a user.
    pub fn export_user(&self, user_id: i64) -> DbResult<HistoryExport> {
        let medications = self
            .db
            .list_medications_for_user(user_id)?
            .into_iter()
            .map(|medication| {
                let events = self.db.list_dose_events(medication.id)?;
                Ok(MedicationHistory::new(medication, events))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(HistoryExport::new(medications))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
