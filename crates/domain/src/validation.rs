// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{Duty, Group, User};

const MAX_NAME_LENGTH: usize = 200;
const MAX_GROUP_NAME_LENGTH: usize = 100;

/// Validates that a user's basic field constraints are met.
///
/// Uniqueness of the email is checked separately, since it needs the other
/// users.
///
/// # Errors
///
/// Returns an error if:
/// - The full name is empty or longer than 200 characters
/// - The email is malformed
pub fn validate_user_fields(user: &User) -> Result<(), DomainError> {
    validate_full_name(&user.full_name)?;
    validate_email(&user.email)
}

/// Validates a full name.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is blank or too long.
pub fn validate_full_name(full_name: &str) -> Result<(), DomainError> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates the shape of an email address.
///
/// Only the structure is checked: one `@`, a non-empty local part, a dotted
/// domain, and no whitespace.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` on malformed input.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::InvalidEmail(email.to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    if !domain.contains('.') || !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Validates that no other user already uses `email`.
///
/// Comparison is case-insensitive. `except_user_id` is skipped so a user can
/// keep their own address.
///
/// # Errors
///
/// Returns `DomainError::DuplicateEmail` if the address is taken.
pub fn validate_email_unique(
    users: &[User],
    email: &str,
    except_user_id: Option<i64>,
) -> Result<(), DomainError> {
    let taken = users
        .iter()
        .filter(|u| except_user_id.is_none() || u.user_id != except_user_id)
        .any(|u| u.email.eq_ignore_ascii_case(email));
    if taken {
        return Err(DomainError::DuplicateEmail(email.to_string()));
    }
    Ok(())
}

/// Validates a group's fields.
///
/// # Errors
///
/// Returns `DomainError::InvalidGroupName` if the name is blank or too long.
pub fn validate_group_fields(group: &Group) -> Result<(), DomainError> {
    let trimmed = group.name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidGroupName(String::from(
            "Group name cannot be empty",
        )));
    }
    if trimmed.chars().count() > MAX_GROUP_NAME_LENGTH {
        return Err(DomainError::InvalidGroupName(format!(
            "Group name cannot exceed {MAX_GROUP_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates a duty's free-text fields.
///
/// The window is valid by construction.
///
/// # Errors
///
/// Returns `DomainError::EmptyField` if the type or position is blank.
pub fn validate_duty_fields(duty: &Duty) -> Result<(), DomainError> {
    validate_required("duty_type", &duty.duty_type)?;
    validate_required("position", &duty.position)
}

/// Validates that a required text field is not blank.
///
/// # Errors
///
/// Returns `DomainError::EmptyField` naming `field`.
pub fn validate_required(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::EmptyField(field));
    }
    Ok(())
}

/// Trims optional free text, mapping blank text to `None`.
#[must_use]
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
