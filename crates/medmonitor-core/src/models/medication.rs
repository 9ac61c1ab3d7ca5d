//! Medication models.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Inventory assigned to a medication when none is given.
pub const DEFAULT_INVENTORY_COUNT: i64 = 0;

/// Refill threshold assigned to a medication when none is given.
pub const DEFAULT_REFILL_THRESHOLD: i64 = 5;

/// Format of the `timing` column and of the reminder clock.
pub const TIMING_FORMAT: &str = "%H:%M";

/// A stored medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    /// Store-assigned ID
    pub id: i64,
    /// Owning user (may reference a user that no longer exists)
    pub user_id: i64,
    /// Medication name
    pub medication_name: String,
    /// Free-text dose description, e.g. "1 tablet"
    pub dose: String,
    /// Time of day as "HH:MM"
    pub timing: String,
    /// Pills on hand; negative when more doses were taken than stocked
    pub inventory_count: i64,
    /// Timestamp of the most recent Taken action
    pub last_taken: Option<String>,
    /// Refill is signaled when inventory_count <= refill_threshold
    pub refill_threshold: i64,
}

impl Medication {
    /// Whether the current stock is at or below the refill threshold.
    pub fn needs_refill(&self) -> bool {
        self.inventory_count <= self.refill_threshold
    }
}

/// A validated medication that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedication {
    pub(crate) user_id: i64,
    pub(crate) medication_name: String,
    pub(crate) dose: String,
    pub(crate) timing: String,
    pub(crate) inventory_count: i64,
    pub(crate) refill_threshold: i64,
}

impl NewMedication {
    /// Validate and build a medication with default inventory and threshold.
    pub fn new(
        user_id: i64,
        medication_name: impl Into<String>,
        dose: impl Into<String>,
        timing: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if user_id <= 0 {
            return Err(ValidationError::NotPositive {
                field: "user_id",
                value: user_id,
            });
        }
        let medication_name = required("medication_name", medication_name.into())?;
        let dose = required("dose", dose.into())?;
        let timing = parse_timing(&timing.into())?;

        Ok(Self {
            user_id,
            medication_name,
            dose,
            timing,
            inventory_count: DEFAULT_INVENTORY_COUNT,
            refill_threshold: DEFAULT_REFILL_THRESHOLD,
        })
    }

    pub fn with_inventory_count(mut self, inventory_count: i64) -> Self {
        self.inventory_count = inventory_count;
        self
    }

    pub fn with_refill_threshold(mut self, refill_threshold: i64) -> Self {
        self.refill_threshold = refill_threshold;
        self
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn medication_name(&self) -> &str {
        &self.medication_name
    }

    pub fn timing(&self) -> &str {
        &self.timing
    }

    pub fn inventory_count(&self) -> i64 {
        self.inventory_count
    }

    pub fn refill_threshold(&self) -> i64 {
        self.refill_threshold
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(value)
}

/// Parse a time of day, accepting only the canonical zero-padded "HH:MM".
///
/// Reminders compare the stored string against the formatted clock, so
/// "8:00" must be rejected rather than stored as-is.
pub fn parse_timing(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    let invalid = || ValidationError::InvalidTiming(input.to_string());

    let time = NaiveTime::parse_from_str(input, TIMING_FORMAT).map_err(|_| invalid())?;
    let canonical = time.format(TIMING_FORMAT).to_string();
    if canonical != input {
        return Err(invalid());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_medication_defaults() {
        let med = NewMedication::new(1, "Aspirin", "1 tablet", "08:00").unwrap();
        assert_eq!(med.inventory_count(), DEFAULT_INVENTORY_COUNT);
        assert_eq!(med.refill_threshold(), DEFAULT_REFILL_THRESHOLD);
        assert_eq!(med.timing(), "08:00");
    }

    #[test]
    fn test_parse_timing() {
        assert_eq!(parse_timing("23:59").unwrap(), "23:59");
        assert_eq!(parse_timing(" 07:30 ").unwrap(), "07:30");
        assert!(parse_timing("7:30").is_err());
        assert!(parse_timing("24:00").is_err());
        assert!(parse_timing("noon").is_err());
        assert!(parse_timing("").is_err());
    }

    #[test]
    fn test_new_medication_requires_fields() {
        assert_eq!(
            NewMedication::new(1, " ", "1 tablet", "08:00").unwrap_err(),
            ValidationError::Empty("medication_name")
        );
        assert_eq!(
            NewMedication::new(1, "Aspirin", "", "08:00").unwrap_err(),
            ValidationError::Empty("dose")
        );
        assert!(NewMedication::new(0, "Aspirin", "1 tablet", "08:00").is_err());
    }

    #[test]
    fn test_needs_refill_is_inclusive() {
        let mut med = Medication {
            id: 1,
            user_id: 1,
            medication_name: "Aspirin".into(),
            dose: "1 tablet".into(),
            timing: "08:00".into(),
            inventory_count: 5,
            last_taken: None,
            refill_threshold: 5,
        };
        assert!(med.needs_refill());

        med.inventory_count = 6;
        assert!(!med.needs_refill());

        med.inventory_count = -2;
        assert!(med.needs_refill());
    }
}
