//! MedMonitor Core Library
//!
//! Local medication inventory, dose history and reminder tracking backed by
//! SQLite.
//!
//! # Architecture
//!
//! ```text
//!   Presentation (forms, lists, notifications)
//!         │ text input              ▲ outcomes, RefillNeeded, reminders
//!         ▼                         │
//!   ┌───────────────────────────────┴───────────────┐
//!   │ models::forms   parse + validate text fields  │
//!   ├───────────────────────────────────────────────┤
//!   │ dosing          Taken → inventory -= qty      │
//!   │                 always → append DoseEvent     │
//!   │                 re-read → inventory <= limit? │
//!   │ reminder        timing == now("HH:MM")?       │
//!   │ export          history as JSON / CSV         │
//!   ├───────────────────────────────────────────────┤
//!   │ db              users, medications,           │
//!   │                 medication_history            │
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store with idempotent schema evolution
//! - [`models`]: Domain types (User, Medication, DoseEvent) and form parsing
//! - [`dosing`]: Inventory and dosing service
//! - [`reminder`]: Due-medication polling
//! - [`export`]: Dose history export
//! - [`config`]: TOML configuration
//! - [`logging`]: tracing setup

pub mod config;
pub mod db;
pub mod dosing;
pub mod export;
pub mod logging;
pub mod models;
pub mod reminder;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use dosing::{DoseOutcome, DosingError, DosingService, RefillNeeded};
pub use export::{HistoryExport, HistoryExporter};
pub use models::{
    DoseAction, DoseEvent, Medication, MedicationForm, NewMedication, NewUser, User, UserForm,
    ValidationError,
};
pub use reminder::{poll_due, Notifier, Reminder, ReminderPoller};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedMonitorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<db::DbError> for MedMonitorError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => MedMonitorError::NotFound(what),
            other => MedMonitorError::Store(other.to_string()),
        }
    }
}

impl From<ValidationError> for MedMonitorError {
    fn from(e: ValidationError) -> Self {
        MedMonitorError::Validation(e.to_string())
    }
}

impl From<DosingError> for MedMonitorError {
    fn from(e: DosingError) -> Self {
        match e {
            DosingError::Database(e) => e.into(),
            DosingError::MedicationNotFound(id) => {
                MedMonitorError::NotFound(format!("medication {}", id))
            }
            DosingError::Validation(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for MedMonitorError {
    fn from(e: serde_json::Error) -> Self {
        MedMonitorError::Serialization(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedMonitorError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedMonitorError::Store(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedMonitorCore>, MedMonitorError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MedMonitorCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedMonitorCore>, MedMonitorError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedMonitorCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedMonitorCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl MedMonitorCore {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Add a user from raw form text. Returns the new user ID.
    pub fn add_user(&self, name: String, age: String) -> Result<i64, MedMonitorError> {
        let user = UserForm::new(name, age).validate()?;
        let db = self.db.lock()?;
        Ok(db.insert_user(&user)?)
    }

    /// Search users by case-insensitive name substring.
    pub fn search_users(&self, query: String) -> Result<Vec<FfiUser>, MedMonitorError> {
        let db = self.db.lock()?;
        let users = db.search_users(&query)?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<FfiUser>, MedMonitorError> {
        let db = self.db.lock()?;
        let users = db.list_users()?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    // =========================================================================
    // Medication Operations
    // =========================================================================

    /// Add a medication from raw form text. Returns the new medication ID.
    pub fn add_medication(&self, form: FfiMedicationForm) -> Result<i64, MedMonitorError> {
        let medication = MedicationForm::from(form).validate()?;
        let db = self.db.lock()?;
        Ok(db.insert_medication(&medication)?)
    }

    /// Replace an existing medication's fields from raw form text.
    pub fn update_medication(
        &self,
        medication_id: i64,
        form: FfiMedicationForm,
    ) -> Result<(), MedMonitorError> {
        let medication = MedicationForm::from(form).validate()?;
        let db = self.db.lock()?;
        if !db.update_medication(medication_id, &medication)? {
            return Err(MedMonitorError::NotFound(format!(
                "medication {}",
                medication_id
            )));
        }
        Ok(())
    }

    /// Get a medication by ID.
    pub fn get_medication(
        &self,
        medication_id: i64,
    ) -> Result<Option<FfiMedication>, MedMonitorError> {
        let db = self.db.lock()?;
        let medication = db.get_medication(medication_id)?;
        Ok(medication.map(|m| m.into()))
    }

    /// List a user's medications in insertion order.
    pub fn list_medications(&self, user_id: i64) -> Result<Vec<FfiMedication>, MedMonitorError> {
        let db = self.db.lock()?;
        let medications = db.list_medications_for_user(user_id)?;
        Ok(medications.into_iter().map(|m| m.into()).collect())
    }

    // =========================================================================
    // Dosing Operations
    // =========================================================================

    /// Record a dose action. Check `refill` on the result for a refill alert.
    pub fn record_dose(
        &self,
        medication_id: i64,
        action: FfiDoseAction,
        quantity: i64,
    ) -> Result<FfiDoseOutcome, MedMonitorError> {
        let db = self.db.lock()?;
        let outcome = DosingService::new(&db).record(medication_id, action.into(), quantity)?;
        Ok(outcome.into())
    }

    /// Dose history for a medication, oldest first.
    pub fn dose_history(&self, medication_id: i64) -> Result<Vec<FfiDoseEvent>, MedMonitorError> {
        let db = self.db.lock()?;
        let events = db.list_dose_events(medication_id)?;
        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Reminder Operations
    // =========================================================================

    /// Medications due at the current local minute.
    pub fn due_reminders(&self) -> Result<Vec<FfiReminder>, MedMonitorError> {
        let db = self.db.lock()?;
        let due = poll_due(&db, chrono::Local::now().naive_local())?;
        Ok(due.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the full dose history as JSON.
    pub fn export_history_json(&self) -> Result<String, MedMonitorError> {
        let db = self.db.lock()?;
        let export = HistoryExporter::new(&db).export_all()?;
        Ok(export.to_json()?)
    }

    /// Export the full dose history as CSV.
    pub fn export_history_csv(&self) -> Result<String, MedMonitorError> {
        let db = self.db.lock()?;
        let export = HistoryExporter::new(&db).export_all()?;
        Ok(export.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe user.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            age: user.age,
        }
    }
}

/// FFI-safe medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: i64,
    pub user_id: i64,
    pub medication_name: String,
    pub dose: String,
    pub timing: String,
    pub inventory_count: i64,
    pub last_taken: Option<String>,
    pub refill_threshold: i64,
}

impl From<Medication> for FfiMedication {
    fn from(medication: Medication) -> Self {
        Self {
            id: medication.id,
            user_id: medication.user_id,
            medication_name: medication.medication_name,
            dose: medication.dose,
            timing: medication.timing,
            inventory_count: medication.inventory_count,
            last_taken: medication.last_taken,
            refill_threshold: medication.refill_threshold,
        }
    }
}

/// FFI-safe medication form; every field is raw entry text.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationForm {
    pub user_id: String,
    pub medication_name: String,
    pub dose: String,
    pub timing: String,
    pub inventory_count: String,
    pub refill_threshold: String,
}

impl From<FfiMedicationForm> for MedicationForm {
    fn from(form: FfiMedicationForm) -> Self {
        MedicationForm {
            user_id: form.user_id,
            medication_name: form.medication_name,
            dose: form.dose,
            timing: form.timing,
            inventory_count: form.inventory_count,
            refill_threshold: form.refill_threshold,
        }
    }
}

/// FFI-safe dose action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDoseAction {
    Taken,
    Postponed,
    Skipped,
}

impl From<FfiDoseAction> for DoseAction {
    fn from(action: FfiDoseAction) -> Self {
        match action {
            FfiDoseAction::Taken => DoseAction::Taken,
            FfiDoseAction::Postponed => DoseAction::Postponed,
            FfiDoseAction::Skipped => DoseAction::Skipped,
        }
    }
}

impl From<DoseAction> for FfiDoseAction {
    fn from(action: DoseAction) -> Self {
        match action {
            DoseAction::Taken => FfiDoseAction::Taken,
            DoseAction::Postponed => FfiDoseAction::Postponed,
            DoseAction::Skipped => FfiDoseAction::Skipped,
        }
    }
}

/// FFI-safe dose event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseEvent {
    pub id: i64,
    pub medication_id: i64,
    pub action: FfiDoseAction,
    pub action_time: String,
}

impl From<DoseEvent> for FfiDoseEvent {
    fn from(event: DoseEvent) -> Self {
        Self {
            id: event.id,
            medication_id: event.medication_id,
            action: event.action.into(),
            action_time: event.action_time,
        }
    }
}

/// FFI-safe refill alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRefillNeeded {
    pub medication_id: i64,
    pub medication_name: String,
    pub inventory_count: i64,
    pub refill_threshold: i64,
}

impl From<RefillNeeded> for FfiRefillNeeded {
    fn from(refill: RefillNeeded) -> Self {
        Self {
            medication_id: refill.medication_id,
            medication_name: refill.medication_name,
            inventory_count: refill.inventory_count,
            refill_threshold: refill.refill_threshold,
        }
    }
}

/// FFI-safe dose outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseOutcome {
    pub event: FfiDoseEvent,
    pub medication: FfiMedication,
    pub refill: Option<FfiRefillNeeded>,
}

impl From<DoseOutcome> for FfiDoseOutcome {
    fn from(outcome: DoseOutcome) -> Self {
        Self {
            event: outcome.event.into(),
            medication: outcome.medication.into(),
            refill: outcome.refill.map(|r| r.into()),
        }
    }
}

/// FFI-safe reminder.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReminder {
    pub user_id: i64,
    pub medication_name: String,
    pub message: String,
}

impl From<Reminder> for FfiReminder {
    fn from(reminder: Reminder) -> Self {
        Self {
            message: reminder.to_string(),
            user_id: reminder.user_id,
            medication_name: reminder.medication_name,
        }
    }
}
