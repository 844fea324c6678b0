//! Household members and supervision assignments.
//!
//! Members are both patients (they have dose requirements) and potential
//! caregivers. Eligibility to supervise depends on age, cognitive status
//! and availability; ordering among eligible caregivers depends on role.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AdaptationPriority, Minute, TimeWindow};

/// Cognitive status of a household member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveStatus {
    #[default]
    Intact,
    MildImpairment,
    Impaired,
}

impl CognitiveStatus {
    /// Whether the member may supervise someone else's doses.
    pub fn can_supervise(&self) -> bool {
        !matches!(self, CognitiveStatus::Impaired)
    }
}

/// Role a member plays in the household's care arrangements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalRole {
    /// Explicitly designated primary caregiver.
    PrimaryCaregiver,
    Elder,
    Spouse,
    AdultChild,
    Sibling,
    Grandchild,
    ExtendedFamily,
    /// Hired or community carer.
    ProfessionalCarer,
    #[default]
    Other,
}

impl CulturalRole {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CulturalRole::PrimaryCaregiver => "primary_caregiver",
            CulturalRole::Elder => "elder",
            CulturalRole::Spouse => "spouse",
            CulturalRole::AdultChild => "adult_child",
            CulturalRole::Sibling => "sibling",
            CulturalRole::Grandchild => "grandchild",
            CulturalRole::ExtendedFamily => "extended_family",
            CulturalRole::ProfessionalCarer => "professional_carer",
            CulturalRole::Other => "other",
        }
    }
}

impl fmt::Display for CulturalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A household member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Unique member identifier.
    pub id: String,
    /// Age in years.
    pub age: u32,
    /// Cognitive status.
    #[serde(default)]
    pub cognitive_status: CognitiveStatus,
    /// When the member is at home and able to help, in preference order.
    #[serde(default)]
    pub availability: Vec<TimeWindow>,
    /// Role used for caregiver ranking.
    #[serde(default)]
    pub cultural_role: CulturalRole,
}

impl FamilyMember {
    /// Creates a member with intact cognition, no availability and no role.
    pub fn new(id: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            age,
            cognitive_status: CognitiveStatus::Intact,
            availability: Vec::new(),
            cultural_role: CulturalRole::Other,
        }
    }

    /// Sets the cognitive status.
    pub fn with_cognitive_status(mut self, status: CognitiveStatus) -> Self {
        self.cognitive_status = status;
        self
    }

    /// Adds an availability window.
    pub fn with_availability(mut self, window: TimeWindow) -> Self {
        self.availability.push(window);
        self
    }

    /// Sets the cultural role.
    pub fn with_role(mut self, role: CulturalRole) -> Self {
        self.cultural_role = role;
        self
    }

    /// Whether any availability window contains `minute`.
    pub fn is_available_at(&self, minute: Minute) -> bool {
        self.availability.iter().any(|w| w.contains(minute))
    }

    /// Whether the member is marked as primary caregiver.
    pub fn is_primary_caregiver(&self) -> bool {
        self.cultural_role == CulturalRole::PrimaryCaregiver
    }
}

/// A caregiver paired with a dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionAssignment {
    /// Dose time (minute-of-day).
    pub dose_time: Minute,
    /// Medication being supervised.
    pub medication_id: String,
    /// Member taking the dose.
    pub member_id: String,
    /// Member supervising.
    pub supervisor_id: String,
    /// How urgent the supervision is.
    pub priority: AdaptationPriority,
}

/// A supervised dose no caregiver could take on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedDose {
    /// Dose time (minute-of-day).
    pub dose_time: Minute,
    /// Medication needing supervision.
    pub medication_id: String,
    /// Member taking the dose.
    pub member_id: String,
    /// Caregivers whose availability covered the dose time.
    pub available_caregivers: usize,
}

/// Result of caregiver assignment for one household.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionPlan {
    /// Household the plan belongs to.
    pub household_id: String,
    /// Matched doses, chronological.
    pub assignments: Vec<SupervisionAssignment>,
    /// Doses left without a supervisor, chronological.
    pub unmatched: Vec<UnmatchedDose>,
}

impl SupervisionPlan {
    /// Creates an empty plan.
    pub fn new(household_id: impl Into<String>) -> Self {
        Self {
            household_id: household_id.into(),
            ..Self::default()
        }
    }

    /// Assignments held by one caregiver.
    pub fn assignments_for(&self, supervisor_id: &str) -> Vec<&SupervisionAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.supervisor_id == supervisor_id)
            .collect()
    }

    /// Whether every supervised dose found a caregiver.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hm;

    #[test]
    fn test_member_builder() {
        let m = FamilyMember::new("aisha", 42)
            .with_role(CulturalRole::PrimaryCaregiver)
            .with_availability(TimeWindow::new(hm(7, 0), hm(9, 0)))
            .with_availability(TimeWindow::new(hm(18, 0), hm(23, 0)));

        assert!(m.is_primary_caregiver());
        assert!(m.is_available_at(hm(8, 0)));
        assert!(m.is_available_at(hm(9, 0)));
        assert!(!m.is_available_at(hm(12, 0)));
        assert!(m.cognitive_status.can_supervise());
    }

    #[test]
    fn test_impaired_cannot_supervise() {
        assert!(!CognitiveStatus::Impaired.can_supervise());
        assert!(CognitiveStatus::MildImpairment.can_supervise());
    }

    #[test]
    fn test_plan_queries() {
        let mut plan = SupervisionPlan::new("h1");
        plan.assignments.push(SupervisionAssignment {
            dose_time: hm(8, 0),
            medication_id: "m1".into(),
            member_id: "p1".into(),
            supervisor_id: "c1".into(),
            priority: AdaptationPriority::Low,
        });
        assert_eq!(plan.assignments_for("c1").len(), 1);
        assert!(plan.assignments_for("c2").is_empty());
        assert!(plan.is_complete());
    }
}
