//! Inventory and dosing service.
//!
//! Recording a dose action is the only operation in the system that makes a
//! decision:
//!
//! ```text
//! record_dose(medication, action, quantity)
//!     │
//!     ├── action == Taken ──► inventory_count -= quantity, last_taken = now
//!     │
//!     ├── always ───────────► append DoseEvent { medication, action, now }
//!     │
//!     └── re-read ──────────► inventory_count <= refill_threshold ?
//!                                 └── yes ──► RefillNeeded
//! ```
//!
//! All three steps run in one transaction. Inventory is never clamped at zero,
//! and the refill check runs after every action, so postponing or skipping a
//! dose of a low-stock medication signals RefillNeeded again.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{format_timestamp, DoseAction, DoseEvent, Medication, ValidationError};

/// Quantity consumed by a Taken action when the caller does not say.
pub const DEFAULT_DOSE_QUANTITY: i64 = 1;

/// Dosing errors.
#[derive(Error, Debug)]
pub enum DosingError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Medication not found: {0}")]
    MedicationNotFound(i64),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

pub type DosingResult<T> = Result<T, DosingError>;

/// Signal that a medication's stock is at or below its refill threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefillNeeded {
    pub medication_id: i64,
    pub medication_name: String,
    pub inventory_count: i64,
    pub refill_threshold: i64,
}

impl RefillNeeded {
    /// Evaluate the refill condition against post-action state.
    pub fn check(medication: &Medication) -> Option<Self> {
        medication.needs_refill().then(|| Self {
            medication_id: medication.id,
            medication_name: medication.medication_name.clone(),
            inventory_count: medication.inventory_count,
            refill_threshold: medication.refill_threshold,
        })
    }
}

/// Result of recording one dose action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoseOutcome {
    /// The history record that was appended
    pub event: DoseEvent,
    /// Medication state after the action
    pub medication: Medication,
    /// Present when post-action inventory is at or below the threshold
    pub refill: Option<RefillNeeded>,
}

impl DoseOutcome {
    pub fn refill_needed(&self) -> bool {
        self.refill.is_some()
    }
}

/// Applies dose actions against the store.
pub struct DosingService<'a> {
    db: &'a Database,
    default_quantity: i64,
}

impl<'a> DosingService<'a> {
    /// Create a service consuming one unit per Taken action by default.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            default_quantity: DEFAULT_DOSE_QUANTITY,
        }
    }

    /// Override the quantity used by [`DosingService::record_default`].
    pub fn with_default_quantity(mut self, quantity: i64) -> Self {
        self.default_quantity = quantity;
        self
    }

    /// Record an action now, consuming the default quantity if Taken.
    pub fn record_default(
        &self,
        medication_id: i64,
        action: DoseAction,
    ) -> DosingResult<DoseOutcome> {
        self.record(medication_id, action, self.default_quantity)
    }

    /// Record an action at the current local wall-clock time.
    pub fn record(
        &self,
        medication_id: i64,
        action: DoseAction,
        quantity: i64,
    ) -> DosingResult<DoseOutcome> {
        self.record_at(medication_id, action, quantity, Local::now().naive_local())
    }

    /// Record an action at an explicit time.
    pub fn record_at(
        &self,
        medication_id: i64,
        action: DoseAction,
        quantity: i64,
        now: NaiveDateTime,
    ) -> DosingResult<DoseOutcome> {
        if quantity <= 0 {
            return Err(ValidationError::NotPositive {
                field: "quantity",
                value: quantity,
            }
            .into());
        }

        let action_time = format_timestamp(now);
        let tx = self.db.transaction()?;

        if self.db.get_medication(medication_id)?.is_none() {
            tracing::warn!(medication_id, action = %action, "dose action for unknown medication");
            return Err(DosingError::MedicationNotFound(medication_id));
        }

        if action.consumes_inventory() {
            self.db.adjust_inventory(medication_id, -quantity)?;
            self.db.set_last_taken(medication_id, &action_time)?;
        }

        let event_id = self.db.append_dose_event(medication_id, action, &action_time)?;
        let medication = self.db.require_medication(medication_id)?;

        tx.commit().map_err(DbError::from)?;

        tracing::info!(
            medication_id,
            action = %action,
            inventory_count = medication.inventory_count,
            "recorded dose action"
        );

        let refill = RefillNeeded::check(&medication);
        if let Some(refill) = &refill {
            tracing::warn!(
                medication_id,
                medication = %refill.medication_name,
                inventory_count = refill.inventory_count,
                refill_threshold = refill.refill_threshold,
                "refill needed"
            );
        }

        Ok(DoseOutcome {
            event: DoseEvent {
                id: event_id,
                medication_id,
                action,
                action_time,
            },
            medication,
            refill,
        })
    }
}
