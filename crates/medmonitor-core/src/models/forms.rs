//! Text form input parsing.
//!
//! Every entry field of the add-user and add-medication forms arrives as raw
//! text. These types parse and validate that text before anything reaches the
//! store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::medication::{DEFAULT_INVENTORY_COUNT, DEFAULT_REFILL_THRESHOLD};
use super::{NewMedication, NewUser};

/// Missing or malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be a whole number, got {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("timing must be a 24-hour HH:MM time, got {0:?}")]
    InvalidTiming(String),

    #[error("unknown dose action: {0:?}")]
    UnknownAction(String),
}

/// Raw contents of the add-user form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub age: String,
}

impl UserForm {
    pub fn new(name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
        }
    }

    /// Parse into a storable user.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let age = parse_integer("age", &self.age)?;
        NewUser::new(self.name.as_str(), age)
    }
}

/// Raw contents of the add/update-medication form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationForm {
    pub user_id: String,
    pub medication_name: String,
    pub dose: String,
    pub timing: String,
    /// Blank means the default of 0
    pub inventory_count: String,
    /// Blank means the default of 5
    pub refill_threshold: String,
}

impl MedicationForm {
    /// Parse into a storable medication.
    pub fn validate(&self) -> Result<NewMedication, ValidationError> {
        let user_id = parse_integer("user_id", &self.user_id)?;
        let inventory_count =
            parse_optional_integer("inventory_count", &self.inventory_count)?
                .unwrap_or(DEFAULT_INVENTORY_COUNT);
        let refill_threshold =
            parse_optional_integer("refill_threshold", &self.refill_threshold)?
                .unwrap_or(DEFAULT_REFILL_THRESHOLD);

        Ok(NewMedication::new(
            user_id,
            self.medication_name.as_str(),
            self.dose.as_str(),
            self.timing.as_str(),
        )?
        .with_inventory_count(inventory_count)
        .with_refill_threshold(refill_threshold))
    }
}

/// Parse a required integer field.
pub fn parse_integer(field: &'static str, input: &str) -> Result<i64, ValidationError> {
    parse_optional_integer(field, input)?.ok_or(ValidationError::Empty(field))
}

fn parse_optional_integer(
    field: &'static str,
    input: &str,
) -> Result<Option<i64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ValidationError::NotNumeric {
            field,
            value: trimmed.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medication_form() -> MedicationForm {
        MedicationForm {
            user_id: "1".into(),
            medication_name: "Metformin".into(),
            dose: "500 mg".into(),
            timing: "08:00".into(),
            inventory_count: "30".into(),
            refill_threshold: "7".into(),
        }
    }

    #[test]
    fn test_user_form_valid() {
        let user = UserForm::new("Anna", " 34 ").validate().unwrap();
        assert_eq!(user.name(), "Anna");
        assert_eq!(user.age(), 34);
    }

    #[test]
    fn test_user_form_non_numeric_age() {
        let err = UserForm::new("Anna", "thirty").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotNumeric {
                field: "age",
                value: "thirty".into()
            }
        );
    }

    #[test]
    fn test_user_form_missing_age() {
        let err = UserForm::new("Anna", "").validate().unwrap_err();
        assert_eq!(err, ValidationError::Empty("age"));
    }

    #[test]
    fn test_medication_form_valid() {
        let med = medication_form().validate().unwrap();
        assert_eq!(med.user_id(), 1);
        assert_eq!(med.inventory_count(), 30);
        assert_eq!(med.refill_threshold(), 7);
    }

    #[test]
    fn test_medication_form_blank_numbers_use_defaults() {
        let mut form = medication_form();
        form.inventory_count = String::new();
        form.refill_threshold = "  ".into();

        let med = form.validate().unwrap();
        assert_eq!(med.inventory_count(), DEFAULT_INVENTORY_COUNT);
        assert_eq!(med.refill_threshold(), DEFAULT_REFILL_THRESHOLD);
    }

    #[test]
    fn test_medication_form_rejects_garbage() {
        let mut form = medication_form();
        form.refill_threshold = "five".into();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::NotNumeric { field: "refill_threshold", .. })
        ));

        let mut form = medication_form();
        form.user_id = "abc".into();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::NotNumeric { field: "user_id", .. })
        ));

        let mut form = medication_form();
        form.timing = "8am".into();
        assert!(matches!(form.validate(), Err(ValidationError::InvalidTiming(_))));
    }
}
