//! Field validation for catalog add/edit input.
//!
//! Every rule is checked on every call so callers can show one complete
//! error summary instead of fixing fields one at a time.

use crate::error::{Error, Result};
use crate::types::{Category, Priority};

/// Maximum stretch name length, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Outcome of validating one stretch form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    /// Distinct human-readable messages, in field order
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn push(&mut self, message: String) {
        if !self.errors.contains(&message) {
            self.errors.push(message);
        }
        self.valid = false;
    }

    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::ValidationFailed(self.errors))
        }
    }
}

/// Validate raw stretch fields.
pub fn validate(name: &str, priority: &str, category: &str, description: &str) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        errors: Vec::new(),
    };

    let name = name.trim();
    if name.is_empty() {
        report.push("Name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        report.push(format!("Name must be {} characters or less", MAX_NAME_LEN));
    }

    if priority.parse::<Priority>().is_err() {
        report.push("Priority must be 'high' or 'low'".to_string());
    }

    if category.parse::<Category>().is_err() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        report.push(format!("Category must be one of: {}", names.join(", ")));
    }

    let description = description.trim();
    if description.is_empty() {
        report.push("Description is required".to_string());
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        report.push(format!(
            "Description must be {} characters or less",
            MAX_DESCRIPTION_LEN
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_input() {
        let report = validate("Pigeon Pose", "high", "hips", "Open the hip flexors");
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let report = validate("   ", "medium", "legs", "");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4);
        assert_eq!(report.errors[0], "Name is required");
        assert_eq!(report.errors[1], "Priority must be 'high' or 'low'");
        assert!(report.errors[2].starts_with("Category must be one of: hips, core"));
        assert_eq!(report.errors[3], "Description is required");
    }

    #[test]
    fn test_length_limits_count_characters() {
        let name = "é".repeat(MAX_NAME_LEN);
        assert!(validate(&name, "low", "core", "ok").valid);

        let long_name = "a".repeat(MAX_NAME_LEN + 1);
        let long_desc = "b".repeat(MAX_DESCRIPTION_LEN + 1);
        let report = validate(&long_name, "low", "core", &long_desc);
        assert_eq!(
            report.errors,
            vec![
                "Name must be 100 characters or less".to_string(),
                "Description must be 500 characters or less".to_string(),
            ]
        );
    }

    #[test]
    fn test_into_result_carries_messages() {
        let err = validate("", "high", "core", "x").into_result().unwrap_err();
        match err {
            Error::ValidationFailed(errors) => assert_eq!(errors, vec!["Name is required"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
