//! Dose actions and the append-only dose history.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Second-resolution local wall-clock format used for every stored timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a local timestamp for storage.
pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// User-reported outcome for a scheduled dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseAction {
    /// Dose taken; consumes inventory
    Taken,
    /// Dose deferred to later
    Postponed,
    /// Dose deliberately not taken
    Skipped,
}

impl DoseAction {
    pub const ALL: [DoseAction; 3] = [
        DoseAction::Taken,
        DoseAction::Postponed,
        DoseAction::Skipped,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DoseAction::Taken => "taken",
            DoseAction::Postponed => "postponed",
            DoseAction::Skipped => "skipped",
        }
    }

    /// Whether this action draws down inventory.
    pub fn consumes_inventory(&self) -> bool {
        matches!(self, DoseAction::Taken)
    }
}

impl fmt::Display for DoseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taken" => Ok(DoseAction::Taken),
            "postponed" => Ok(DoseAction::Postponed),
            "skipped" => Ok(DoseAction::Skipped),
            other => Err(ValidationError::UnknownAction(other.to_string())),
        }
    }
}

/// One immutable entry in `medication_history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoseEvent {
    pub id: i64,
    pub medication_id: i64,
    pub action: DoseAction,
    pub action_time: String,
}
