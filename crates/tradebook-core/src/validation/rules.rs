//! Reusable field rules.
//!
//! Each rule inspects one value and pushes onto the caller's
//! [`ValidationErrors`] instead of returning early.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ValidationError, ValidationErrors};

/// Local part of word characters, `+`, `-`, `.`; a domain of letters, digits,
/// hyphens and dots; a final alphabetic label.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9_+\-.]+@[a-z0-9\-.]+\.[a-z]+$").expect("email pattern is valid")
});

/// Whether `value` is an acceptable email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Fails with `Presence` when `value` is empty or only whitespace.
pub fn presence(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Presence {
            field: field.to_string(),
        });
    }
}

/// Fails with `Presence` when an optional value is missing.
pub fn presence_of<T>(errors: &mut ValidationErrors, field: &str, value: Option<&T>) {
    if value.is_none() {
        errors.push(ValidationError::Presence {
            field: field.to_string(),
        });
    }
}

/// Fails with `Length` when `value` has more than `max` characters.
pub fn max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let actual = value.chars().count();
    if actual > max {
        errors.push(ValidationError::Length {
            field: field.to_string(),
            max,
            actual,
        });
    }
}

/// Fails with `Format` when `value` is not an email address.
pub fn email_format(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_valid_email(value) {
        errors.push(ValidationError::Format {
            field: field.to_string(),
        });
    }
}

/// Fails with `Inclusion` unless the flag is explicitly `true` or `false`.
pub fn boolean_inclusion(errors: &mut ValidationErrors, field: &str, value: Option<bool>) {
    if !matches!(value, Some(true) | Some(false)) {
        errors.push(ValidationError::Inclusion {
            field: field.to_string(),
        });
    }
}
