//! Conflict records.
//!
//! Conflicts are what a caregiver needs to act on: doses bunched together,
//! supervised doses nobody can watch, and doses the optimizer could not
//! place. They carry suggestion codes, never display text.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Minute;

/// Classification of conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Too many doses in one time bucket.
    TimeClustering,
    /// Supervised doses outnumber available caregivers.
    SupervisionShortage,
    /// A dose has no valid placement.
    UnresolvedSlot,
}

impl ConflictType {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::TimeClustering => "time_clustering",
            ConflictType::SupervisionShortage => "supervision_shortage",
            ConflictType::UnresolvedSlot => "unresolved_slot",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// What the caller could do about a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCode {
    /// Spread clustered doses apart.
    StaggerDoses,
    /// Find another caregiver for the bucket.
    AddCaregiver,
    /// Ask a caregiver to extend their availability.
    ExtendCaregiverAvailability,
    /// Relax a constraint (shorter buffers, smaller minimum gap).
    RelaxConstraints,
    /// Review the dosing regimen with the prescriber.
    ConsultPrescriber,
}

impl SuggestionCode {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCode::StaggerDoses => "stagger_doses",
            SuggestionCode::AddCaregiver => "add_caregiver",
            SuggestionCode::ExtendCaregiverAvailability => "extend_caregiver_availability",
            SuggestionCode::RelaxConstraints => "relax_constraints",
            SuggestionCode::ConsultPrescriber => "consult_prescriber",
        }
    }
}

/// A detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Household the conflict belongs to.
    pub household_id: String,
    /// Type of conflict.
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: Severity,
    /// Start minute of the bucket (or dose time) the conflict concerns.
    pub bucket_start: Minute,
    /// Entity ids involved: member ids for supervision shortage,
    /// `member/medication` keys otherwise.
    pub affected_ids: Vec<String>,
    /// Suggested remedy.
    pub suggestion: SuggestionCode,
}

impl ConflictRecord {
    /// Creates a record; affected ids are sorted and deduplicated.
    pub fn new(
        household_id: impl Into<String>,
        conflict_type: ConflictType,
        severity: Severity,
        bucket_start: Minute,
        mut affected_ids: Vec<String>,
        suggestion: SuggestionCode,
    ) -> Self {
        affected_ids.sort();
        affected_ids.dedup();
        Self {
            household_id: household_id.into(),
            conflict_type,
            severity,
            bucket_start,
            affected_ids,
            suggestion,
        }
    }
}

/// All conflicts found across the scanned households.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Conflicts ordered by household, bucket, then type.
    pub records: Vec<ConflictRecord>,
}

impl ConflictReport {
    /// Number of records of one type.
    pub fn count_of(&self, conflict_type: ConflictType) -> usize {
        self.records
            .iter()
            .filter(|r| r.conflict_type == conflict_type)
            .count()
    }

    /// Records of one type.
    pub fn of_type(&self, conflict_type: ConflictType) -> Vec<&ConflictRecord> {
        self.records
            .iter()
            .filter(|r| r.conflict_type == conflict_type)
            .collect()
    }

    /// Highest severity present.
    pub fn max_severity(&self) -> Option<Severity> {
        self.records.iter().map(|r| r.severity).max()
    }

    /// Whether no conflicts were found.
    pub fn is_clear(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sorts_ids() {
        let r = ConflictRecord::new(
            "h1",
            ConflictType::SupervisionShortage,
            Severity::High,
            480,
            vec!["p3".into(), "p2".into(), "p3".into()],
            SuggestionCode::AddCaregiver,
        );
        assert_eq!(r.affected_ids, vec!["p2".to_string(), "p3".to_string()]);
    }

    #[test]
    fn test_report_queries() {
        let report = ConflictReport {
            records: vec![
                ConflictRecord::new(
                    "h1",
                    ConflictType::TimeClustering,
                    Severity::Medium,
                    480,
                    vec![],
                    SuggestionCode::StaggerDoses,
                ),
                ConflictRecord::new(
                    "h1",
                    ConflictType::UnresolvedSlot,
                    Severity::Critical,
                    600,
                    vec![],
                    SuggestionCode::RelaxConstraints,
                ),
            ],
        };
        assert_eq!(report.count_of(ConflictType::TimeClustering), 1);
        assert_eq!(report.max_severity(), Some(Severity::Critical));
        assert!(!report.is_clear());
        assert!(Severity::Critical > Severity::High);
    }
}
