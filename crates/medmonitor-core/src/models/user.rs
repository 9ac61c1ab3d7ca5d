//! User (patient profile) models.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A stored user profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Store-assigned ID
    pub id: i64,
    /// Display name (never empty)
    pub name: String,
    /// Age in years (positive)
    pub age: i64,
}

/// A validated user profile that has not been stored yet.
///
/// Only constructible through [`NewUser::new`], so anything handed to the
/// store has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    age: i64,
}

impl NewUser {
    /// Validate and build a new user profile.
    pub fn new(name: impl Into<String>, age: i64) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if age <= 0 {
            return Err(ValidationError::NotPositive {
                field: "age",
                value: age,
            });
        }
        Ok(Self { name, age })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i64 {
        self.age
    }
}
