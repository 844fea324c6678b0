//! Input validation for household planning.
//!
//! Checks the structural integrity of a household's roster and
//! medication list before anything is computed. Detects:
//! - Empty or duplicate member IDs
//! - Negative dose counts
//! - Requirements naming members not in the roster
//! - The same medication listed twice for one member
//!
//! All problems are collected; validation never stops at the first one.
//! Softer problems (a zero dose count, a bad minimum gap) are not
//! structural and are reported inside the schedule instead.

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{DoseRequirement, FamilyMember};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two members share the same ID.
    DuplicateId,
    /// A member or medication ID is empty.
    EmptyId,
    /// A requirement asks for a negative number of doses.
    NegativeDoseCount,
    /// A requirement names a member that doesn't exist.
    UnknownMember,
    /// The same (member, medication) pair appears twice.
    DuplicateRequirement,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a household's roster and requirements.
///
/// Checks:
/// 1. No empty or duplicate member IDs
/// 2. No empty medication IDs
/// 3. No negative dose counts
/// 4. Every requirement names a known member
/// 5. No duplicate (member, medication) pairs
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_household(
    members: &[FamilyMember],
    requirements: &[DoseRequirement],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut member_ids = HashSet::new();
    for m in members {
        if m.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                "Member with empty ID",
            ));
        } else if !member_ids.insert(m.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate member ID: {}", m.id),
            ));
        }
    }

    let mut pairs = HashSet::new();
    for req in requirements {
        if req.medication_id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                format!("Requirement for member '{}' has an empty medication ID", req.member_id),
            ));
        }

        if req.required_daily_count < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDoseCount,
                format!(
                    "Requirement '{}' has negative dose count {}",
                    req.key(),
                    req.required_daily_count
                ),
            ));
        }

        if !member_ids.contains(req.member_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownMember,
                format!(
                    "Requirement '{}' references unknown member '{}'",
                    req.medication_id, req.member_id
                ),
            ));
        }

        if !pairs.insert((req.member_id.as_str(), req.medication_id.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRequirement,
                format!("Duplicate requirement: {}", req.key()),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
