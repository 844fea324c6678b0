//! Structured recommendations.
//!
//! Every adaptation, unresolved dose, conflict and scheduling issue turns
//! into one [`Recommendation`] carrying a stable reason code and the ids
//! and numbers a presentation layer needs. No text is produced here;
//! localization happens downstream, keyed by [`ReasonCode`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchedulingIssue;
use crate::models::{
    AdaptationType, ConflictRecord, ConflictType, Minute, OptimizedSchedule,
};

/// Why a recommendation was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    // Adaptations
    PrayerAvoidance,
    FastingAccommodation,
    MealAlignment,
    FamilyRoutine,
    FestivalAdjustment,
    // Doses
    UnresolvedDose,
    // Conflicts
    TimeClustering,
    SupervisionShortage,
    UnresolvedSlot,
    // Issues
    InputDataMissing,
    InvalidConfiguration,
    InfeasibleSchedule,
}

impl ReasonCode {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::PrayerAvoidance => "prayer_avoidance",
            ReasonCode::FastingAccommodation => "fasting_accommodation",
            ReasonCode::MealAlignment => "meal_alignment",
            ReasonCode::FamilyRoutine => "family_routine",
            ReasonCode::FestivalAdjustment => "festival_adjustment",
            ReasonCode::UnresolvedDose => "unresolved_dose",
            ReasonCode::TimeClustering => "time_clustering",
            ReasonCode::SupervisionShortage => "supervision_shortage",
            ReasonCode::UnresolvedSlot => "unresolved_slot",
            ReasonCode::InputDataMissing => "input_data_missing",
            ReasonCode::InvalidConfiguration => "invalid_configuration",
            ReasonCode::InfeasibleSchedule => "infeasible_schedule",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AdaptationType> for ReasonCode {
    fn from(t: AdaptationType) -> Self {
        match t {
            AdaptationType::PrayerAvoidance => ReasonCode::PrayerAvoidance,
            AdaptationType::FastingAccommodation => ReasonCode::FastingAccommodation,
            AdaptationType::MealAlignment => ReasonCode::MealAlignment,
            AdaptationType::FamilyRoutine => ReasonCode::FamilyRoutine,
            AdaptationType::FestivalAdjustment => ReasonCode::FestivalAdjustment,
        }
    }
}

impl From<ConflictType> for ReasonCode {
    fn from(t: ConflictType) -> Self {
        match t {
            ConflictType::TimeClustering => ReasonCode::TimeClustering,
            ConflictType::SupervisionShortage => ReasonCode::SupervisionShortage,
            ConflictType::UnresolvedSlot => ReasonCode::UnresolvedSlot,
        }
    }
}

/// One machine-readable recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub code: ReasonCode,
    pub household_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<String>,
    /// Dose time, or bucket start for conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_time: Option<Minute>,
    /// Signed shift for adaptations, unresolved count for infeasible schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<Minute>,
    /// Prayer name, meal type, fasting slot, suggestion code or constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Ids affected by a conflict.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_ids: Vec<String>,
}

impl Recommendation {
    fn new(code: ReasonCode, household_id: &str) -> Self {
        Self {
            code,
            household_id: household_id.to_string(),
            member_id: None,
            medication_id: None,
            dose_time: None,
            minutes: None,
            detail: None,
            affected_ids: Vec::new(),
        }
    }
}

/// Builds the recommendations for one household.
///
/// Order: per medication and dose, its adaptations then an unresolved
/// marker; then conflicts in report order; then scheduling issues.
pub fn recommend(schedule: &OptimizedSchedule, conflicts: &[ConflictRecord]) -> Vec<Recommendation> {
    let household = schedule.household_id.as_str();
    let mut out = Vec::new();

    for medication in &schedule.medications {
        for dose in &medication.doses {
            let base = |code: ReasonCode| Recommendation {
                member_id: Some(medication.member_id.clone()),
                medication_id: Some(medication.medication_id.clone()),
                dose_time: Some(dose.adjusted_time),
                ..Recommendation::new(code, household)
            };

            for adaptation in &dose.adaptations {
                out.push(Recommendation {
                    minutes: Some(adaptation.minutes_shifted),
                    detail: adaptation.detail.clone(),
                    ..base(adaptation.adaptation_type.into())
                });
            }
            if dose.unresolved {
                out.push(Recommendation {
                    detail: Some(dose.source_window_id.clone()),
                    ..base(ReasonCode::UnresolvedDose)
                });
            }
        }
    }

    for record in conflicts.iter().filter(|r| r.household_id == household) {
        out.push(Recommendation {
            dose_time: Some(record.bucket_start),
            detail: Some(record.suggestion.as_str().to_string()),
            affected_ids: record.affected_ids.clone(),
            ..Recommendation::new(record.conflict_type.into(), household)
        });
    }

    for issue in &schedule.issues {
        out.push(from_issue(issue, household));
    }

    out
}

fn from_issue(issue: &SchedulingIssue, household: &str) -> Recommendation {
    match issue {
        SchedulingIssue::InputDataMissing { constraint, .. } => Recommendation {
            detail: Some(constraint.to_string()),
            ..Recommendation::new(ReasonCode::InputDataMissing, household)
        },
        SchedulingIssue::InvalidConfiguration { subject, .. } => {
            let (member, medication) = split_key(subject);
            Recommendation {
                member_id: member,
                medication_id: medication,
                detail: Some(subject.clone()),
                ..Recommendation::new(ReasonCode::InvalidConfiguration, household)
            }
        }
        SchedulingIssue::InfeasibleSchedule { subject, unresolved } => {
            let (member, medication) = split_key(subject);
            Recommendation {
                member_id: member,
                medication_id: medication,
                minutes: Some(*unresolved as Minute),
                ..Recommendation::new(ReasonCode::InfeasibleSchedule, household)
            }
        }
    }
}

/// Splits a `member/medication` key; other subjects (e.g. `prayer:asr`) carry no ids.
fn split_key(subject: &str) -> (Option<String>, Option<String>) {
    match subject.split_once('/') {
        Some((member, medication)) => (Some(member.to_string()), Some(medication.to_string())),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintKind;
    use crate::models::{
        hm, CulturalAdaptation, MedicationSchedule, OptimizedDose, Severity, SuggestionCode,
    };

    fn schedule() -> OptimizedSchedule {
        let mut s = OptimizedSchedule::new("h1");
        s.add_medication(MedicationSchedule {
            medication_id: "metformin".into(),
            member_id: "nani".into(),
            supervision_required: false,
            doses: vec![
                OptimizedDose {
                    dose_index: 0,
                    original_time: hm(16, 30),
                    adjusted_time: hm(17, 0),
                    adaptations: vec![
                        CulturalAdaptation::new(AdaptationType::PrayerAvoidance, 30).with_detail("asr"),
                    ],
                    source_window_id: "anchor:0".into(),
                    unresolved: false,
                },
                OptimizedDose {
                    dose_index: 1,
                    original_time: hm(20, 0),
                    adjusted_time: hm(20, 45),
                    adaptations: Vec::new(),
                    source_window_id: "anchor:1".into(),
                    unresolved: true,
                },
            ],
            adherence_score: 0.5,
        });
        s.add_issue(SchedulingIssue::missing(ConstraintKind::Fasting, "dawn absent"));
        s.add_issue(SchedulingIssue::InfeasibleSchedule {
            subject: "nani/metformin".into(),
            unresolved: 1,
        });
        s
    }

    #[test]
    fn test_one_per_source_in_order() {
        let conflicts = vec![
            ConflictRecord::new(
                "h1",
                ConflictType::UnresolvedSlot,
                Severity::Critical,
                hm(20, 45),
                vec!["nani/metformin".into()],
                SuggestionCode::RelaxConstraints,
            ),
            ConflictRecord::new(
                "other",
                ConflictType::TimeClustering,
                Severity::Medium,
                0,
                vec![],
                SuggestionCode::StaggerDoses,
            ),
        ];
        let recs = recommend(&schedule(), &conflicts);
        let codes: Vec<ReasonCode> = recs.iter().map(|r| r.code).collect();
        assert_eq!(
            codes,
            vec![
                ReasonCode::PrayerAvoidance,
                ReasonCode::UnresolvedDose,
                ReasonCode::UnresolvedSlot,
                ReasonCode::InputDataMissing,
                ReasonCode::InfeasibleSchedule,
            ]
        );

        let prayer = &recs[0];
        assert_eq!(prayer.minutes, Some(30));
        assert_eq!(prayer.detail.as_deref(), Some("asr"));
        assert_eq!(prayer.dose_time, Some(hm(17, 0)));
        assert_eq!(prayer.member_id.as_deref(), Some("nani"));

        assert_eq!(recs[2].detail.as_deref(), Some("relax_constraints"));
        assert_eq!(recs[3].detail.as_deref(), Some("fasting"));
        assert_eq!(recs[4].medication_id.as_deref(), Some("metformin"));
        assert_eq!(recs[4].minutes, Some(1));
    }

    #[test]
    fn test_codes_serialize_snake_case() {
        let recs = recommend(&schedule(), &[]);
        let json = serde_json::to_string(&recs[0]).unwrap();
        assert!(json.contains(r#""code":"prayer_avoidance""#));
        assert!(!json.contains("affected_ids"));
        assert_eq!(ReasonCode::UnresolvedDose.to_string(), "unresolved_dose");
    }

    #[test]
    fn test_empty_schedule_has_none() {
        assert!(recommend(&OptimizedSchedule::new("h1"), &[]).is_empty());
    }
}
