//! Greedy caregiver assignment.
//!
//! # Algorithm
//!
//! 1. Collect every dose of every supervision-requiring medication.
//! 2. Visit them chronologically (ties by member id, then medication id).
//! 3. Filter eligible caregivers: not the patient, adult, cognitively able,
//!    available at the dose time, and below the concurrency limit within
//!    the handling duration.
//! 4. Take the best caregiver per [`CaregiverRanking`]; record the dose as
//!    unmatched when nobody is eligible.
//!
//! Greedy and single-pass: an earlier dose is never re-assigned to free a
//! caregiver for a later one.

use std::collections::HashMap;
use tracing::{debug, info};

use super::{AssignmentContext, CaregiverRanking};
use crate::config::OptimizerConfig;
use crate::models::{
    signed_offset, AdaptationPriority, CognitiveStatus, FamilyMember, Minute, OptimizedSchedule,
    SupervisionAssignment, SupervisionPlan, UnmatchedDose,
};

/// A dose waiting for a supervisor.
#[derive(Debug, Clone)]
struct Demand<'s> {
    dose_time: Minute,
    member_id: &'s str,
    medication_id: &'s str,
    priority: AdaptationPriority,
}

/// Matches supervised doses to household caregivers.
#[derive(Debug, Clone)]
pub struct FamilyCoordinator<'a> {
    config: &'a OptimizerConfig,
    ranking: CaregiverRanking,
}

impl<'a> FamilyCoordinator<'a> {
    /// Creates a coordinator with the default ranking.
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self {
            config,
            ranking: CaregiverRanking::default(),
        }
    }

    /// Replaces the caregiver ranking.
    pub fn with_ranking(mut self, ranking: CaregiverRanking) -> Self {
        self.ranking = ranking;
        self
    }

    /// Builds the supervision plan for one household schedule.
    pub fn assign(
        &self,
        schedule: &OptimizedSchedule,
        members: &[FamilyMember],
        culture: &str,
    ) -> SupervisionPlan {
        let mut plan = SupervisionPlan::new(schedule.household_id.clone());
        let demands = self.collect_demands(schedule, members);
        let mut load: HashMap<String, usize> = HashMap::new();

        for demand in demands {
            let able: Vec<&FamilyMember> = members
                .iter()
                .filter(|c| self.can_cover(c, demand.member_id, demand.dose_time))
                .collect();
            let free: Vec<&FamilyMember> = able
                .iter()
                .copied()
                .filter(|c| self.has_capacity(&plan, &c.id, demand.dose_time))
                .collect();

            let context = AssignmentContext::new(culture, &self.config.hierarchy, &load, demand.dose_time);
            match self.ranking.select_best(&free, &context) {
                Some(caregiver) => {
                    debug!(
                        member = demand.member_id,
                        medication = demand.medication_id,
                        time = demand.dose_time,
                        supervisor = %caregiver.id,
                        "supervision assigned"
                    );
                    *load.entry(caregiver.id.clone()).or_insert(0) += 1;
                    plan.assignments.push(SupervisionAssignment {
                        dose_time: demand.dose_time,
                        medication_id: demand.medication_id.to_string(),
                        member_id: demand.member_id.to_string(),
                        supervisor_id: caregiver.id.clone(),
                        priority: demand.priority,
                    });
                }
                None => {
                    debug!(
                        member = demand.member_id,
                        medication = demand.medication_id,
                        time = demand.dose_time,
                        available = able.len(),
                        "no caregiver free"
                    );
                    plan.unmatched.push(UnmatchedDose {
                        dose_time: demand.dose_time,
                        medication_id: demand.medication_id.to_string(),
                        member_id: demand.member_id.to_string(),
                        available_caregivers: able.len(),
                    });
                }
            }
        }

        info!(
            household = %plan.household_id,
            assigned = plan.assignments.len(),
            unmatched = plan.unmatched.len(),
            "supervision plan built"
        );
        plan
    }

    fn collect_demands<'s>(
        &self,
        schedule: &'s OptimizedSchedule,
        members: &[FamilyMember],
    ) -> Vec<Demand<'s>> {
        let impaired = |member_id: &str| {
            members
                .iter()
                .any(|m| m.id == member_id && m.cognitive_status == CognitiveStatus::Impaired)
        };

        let mut demands: Vec<Demand<'s>> = schedule
            .medications
            .iter()
            .filter(|m| m.supervision_required)
            .flat_map(|med| {
                let raised = impaired(&med.member_id);
                med.doses.iter().map(move |dose| Demand {
                    dose_time: dose.adjusted_time,
                    member_id: med.member_id.as_str(),
                    medication_id: med.medication_id.as_str(),
                    priority: if raised {
                        AdaptationPriority::High
                    } else {
                        dose.max_priority().unwrap_or(AdaptationPriority::Low)
                    },
                })
            })
            .collect();

        demands.sort_by(|a, b| {
            (a.dose_time, a.member_id, a.medication_id).cmp(&(b.dose_time, b.member_id, b.medication_id))
        });
        demands
    }

    /// Static eligibility: everything except the concurrency limit.
    fn can_cover(&self, caregiver: &FamilyMember, patient_id: &str, at: Minute) -> bool {
        caregiver.id != patient_id
            && caregiver.age >= self.config.adult_age
            && caregiver.cognitive_status.can_supervise()
            && caregiver.is_available_at(at)
    }

    fn has_capacity(&self, plan: &SupervisionPlan, caregiver_id: &str, at: Minute) -> bool {
        let concurrent = plan
            .assignments
            .iter()
            .filter(|a| a.supervisor_id == caregiver_id)
            .filter(|a| signed_offset(a.dose_time, at).abs() < self.config.handling_duration)
            .count();
        concurrent < self.config.caregiver_concurrency
    }
}
