//! Error types.
//!
//! Two layers:
//!
//! - [`SchedulingIssue`]: degradations reported *inside* results. A missing
//!   prayer timetable or a rejected dose requirement never aborts planning.
//! - [`PlanError`]: hard failures for malformed input shapes and invalid
//!   configuration. Nothing is computed when one of these is returned.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

/// Which constraint family an issue concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrayerAvoidance,
    MealAlignment,
    Fasting,
    FamilyRoutine,
    Festival,
    Supervision,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintKind::PrayerAvoidance => "prayer_avoidance",
            ConstraintKind::MealAlignment => "meal_alignment",
            ConstraintKind::Fasting => "fasting",
            ConstraintKind::FamilyRoutine => "family_routine",
            ConstraintKind::Festival => "festival",
            ConstraintKind::Supervision => "supervision",
        };
        f.write_str(s)
    }
}

/// A degradation recorded in a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulingIssue {
    /// Input for a constraint was absent or unusable; the constraint was
    /// disabled and planning continued.
    #[error("input data missing for {constraint}: {detail}")]
    InputDataMissing {
        constraint: ConstraintKind,
        detail: String,
    },

    /// A single requirement or setting was rejected; the rest was planned.
    #[error("invalid configuration for {subject}: {detail}")]
    InvalidConfiguration { subject: String, detail: String },

    /// Some doses could not be placed; best-effort times were returned.
    #[error("infeasible schedule for {subject}: {unresolved} dose(s) unresolved")]
    InfeasibleSchedule { subject: String, unresolved: usize },
}

impl SchedulingIssue {
    /// Shorthand for [`SchedulingIssue::InputDataMissing`].
    pub fn missing(constraint: ConstraintKind, detail: impl Into<String>) -> Self {
        SchedulingIssue::InputDataMissing {
            constraint,
            detail: detail.into(),
        }
    }

    /// Shorthand for [`SchedulingIssue::InvalidConfiguration`].
    pub fn invalid(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        SchedulingIssue::InvalidConfiguration {
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

/// A value together with the issues raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reported<T> {
    pub value: T,
    pub issues: Vec<SchedulingIssue>,
}

impl<T> Reported<T> {
    /// A value with no issues.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    /// A value with one issue.
    pub fn with_issue(value: T, issue: SchedulingIssue) -> Self {
        Self {
            value,
            issues: vec![issue],
        }
    }

    /// Moves the issues into `sink` and returns the value.
    pub fn drain_into(self, sink: &mut Vec<SchedulingIssue>) -> T {
        sink.extend(self.issues);
        self.value
    }
}

/// Invalid optimizer configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn out_of_range(
        field: &'static str,
        requirement: &'static str,
        value: impl fmt::Display,
    ) -> Self {
        ConfigError::OutOfRange {
            field,
            requirement,
            value: value.to_string(),
        }
    }
}

/// Hard planning failure.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<ValidationError>> for PlanError {
    fn from(errors: Vec<ValidationError>) -> Self {
        PlanError::Validation(errors)
    }
}
