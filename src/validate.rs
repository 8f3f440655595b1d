//! Field-level input validation. Handlers validate their payloads before any
//! store call; failures surface as a 400 with per-field details.

use std::collections::HashMap;

use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn check_len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.push(
                field,
                format!("must be between {} and {} characters", min, max),
            );
        }
    }

    pub fn check_url(&mut self, field: &str, value: &str) {
        if url::Url::parse(value).is_err() {
            self.push(field, "must be a valid URL");
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid payload", Some(self.errors)))
        }
    }
}
