//! Optimized schedule (solution) model.
//!
//! A schedule holds, per medication, the placed doses and an adherence
//! score, plus every scheduling issue raised while building it. Issues
//! are data, not errors: a schedule with issues is still usable.

use serde::{Deserialize, Serialize};

use super::{Minute, OptimizedDose};
use crate::error::SchedulingIssue;

/// Placed doses for one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSchedule {
    /// Medication identifier.
    pub medication_id: String,
    /// Member taking the medication.
    pub member_id: String,
    /// Whether each dose needs supervision.
    pub supervision_required: bool,
    /// Doses in chronological order.
    pub doses: Vec<OptimizedDose>,
    /// Constraint satisfaction with minimal displacement, in `[0, 1]`.
    pub adherence_score: f64,
}

impl MedicationSchedule {
    /// Adjusted times, in dose order.
    pub fn adjusted_times(&self) -> Vec<Minute> {
        self.doses.iter().map(|d| d.adjusted_time).collect()
    }

    /// Number of doses left unresolved.
    pub fn unresolved_count(&self) -> usize {
        self.doses.iter().filter(|d| d.unresolved).count()
    }

    /// `member/medication` key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.member_id, self.medication_id)
    }
}

/// The optimized schedule for one household.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizedSchedule {
    /// Household identifier.
    pub household_id: String,
    /// One entry per accepted dose requirement, in input order.
    pub medications: Vec<MedicationSchedule>,
    /// Degradations and rejected requirements.
    pub issues: Vec<SchedulingIssue>,
}

impl OptimizedSchedule {
    /// Creates an empty schedule.
    pub fn new(household_id: impl Into<String>) -> Self {
        Self {
            household_id: household_id.into(),
            ..Self::default()
        }
    }

    /// Adds a medication schedule.
    pub fn add_medication(&mut self, medication: MedicationSchedule) {
        self.medications.push(medication);
    }

    /// Records an issue.
    pub fn add_issue(&mut self, issue: SchedulingIssue) {
        self.issues.push(issue);
    }

    /// Finds a medication schedule by member and medication id.
    pub fn medication(&self, member_id: &str, medication_id: &str) -> Option<&MedicationSchedule> {
        self.medications
            .iter()
            .find(|m| m.member_id == member_id && m.medication_id == medication_id)
    }

    /// Total number of placed doses.
    pub fn dose_count(&self) -> usize {
        self.medications.iter().map(|m| m.doses.len()).sum()
    }

    /// Total number of unresolved doses.
    pub fn unresolved_count(&self) -> usize {
        self.medications.iter().map(|m| m.unresolved_count()).sum()
    }

    /// Mean adherence score across medications (1.0 when empty).
    pub fn overall_score(&self) -> f64 {
        if self.medications.is_empty() {
            return 1.0;
        }
        let sum: f64 = self.medications.iter().map(|m| m.adherence_score).sum();
        sum / self.medications.len() as f64
    }
}
