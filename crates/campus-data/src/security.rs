//! Identifier validation for boundary callers
//!
//! The query builder trusts table and field names verbatim; that is what
//! keeps it schema-agnostic. The collaborator that accepts names from the
//! outside world (route handlers, form processors) is expected to validate
//! them before they reach this layer. This module is that validator.

use crate::error::{Error, Result};

/// Validate a SQL identifier (table, view, or column name).
///
/// Enforces strict character rules:
/// - not empty, at most 255 characters
/// - starts with an ASCII letter or underscore
/// - contains only ASCII alphanumerics and underscores
///
/// Char-iteration instead of regex keeps this allocation-free on the hot
/// path.
///
/// # Examples
///
/// ```
/// use campus_data::security::validate_identifier;
///
/// assert!(validate_identifier("students").is_ok());
/// assert!(validate_identifier("grade_entries_2026").is_ok());
/// assert!(validate_identifier("_audit").is_ok());
///
/// assert!(validate_identifier("x; DROP TABLE students--").is_err());
/// assert!(validate_identifier("").is_err());
/// assert!(validate_identifier("2026_grades").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config("identifier cannot be empty"));
    }
    if name.len() > 255 {
        return Err(Error::config(format!(
            "identifier too long ({} characters, maximum 255)",
            name.len()
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().expect("non-empty checked above");
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::config(format!(
            "identifier {:?} must start with a letter or underscore",
            name
        )));
    }
    if let Some(bad) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(Error::config(format!(
            "identifier {:?} contains invalid character {:?}",
            name, bad
        )));
    }

    Ok(())
}
