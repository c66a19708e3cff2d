//! Input validation for API requests.
//!
//! Validators return `Err(message)`; handlers collect them with
//! `ValidationErrorBuilder` or convert a single failure with
//! `ApiError::validation_field`.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::ApiError;

lazy_static! {
    /// Loose email shape: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    /// Course codes such as CS101 or MATH-2A
    static ref COURSE_CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap();
}

/// Validate an identifier that crosses the API boundary.
///
/// Returns the canonical lowercase hyphenated form, which is how ids are stored.
pub fn validate_uuid(id: &str, field_name: &str) -> Result<String, String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    uuid::Uuid::parse_str(id)
        .map(|parsed| parsed.to_string())
        .map_err(|_| "Invalid id format".to_string())
}

/// Parse-or-reject shorthand used by handlers for path and body ids
pub fn require_uuid(id: &str, field_name: &str) -> Result<String, ApiError> {
    validate_uuid(id, field_name).map_err(|e| ApiError::validation_field(field_name, e))
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.len() > 1024 {
        return Err("Password is too long (max 1024 characters)".to_string());
    }
    Ok(())
}

pub fn validate_course_code(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Course code is required".to_string());
    }
    if code.len() > 20 {
        return Err("Course code is too long (max 20 characters)".to_string());
    }
    if !COURSE_CODE_REGEX.is_match(code) {
        return Err(
            "Course code must be alphanumeric with dashes or underscores".to_string(),
        );
    }
    Ok(())
}

/// Validate a required free-text field such as a title
pub fn validate_required_text(value: &str, label: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    if value.len() > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }
    Ok(())
}

pub fn validate_capacity(capacity: Option<i64>) -> Result<(), String> {
    match capacity {
        Some(c) if c < 1 => Err("Capacity must be at least 1".to_string()),
        _ => Ok(()),
    }
}

pub fn validate_grade(grade: f64) -> Result<(), String> {
    if !grade.is_finite() || !(0.0..=100.0).contains(&grade) {
        return Err("Grade must be between 0 and 100".to_string());
    }
    Ok(())
}
