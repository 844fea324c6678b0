//! Conflict detection across household schedules.
//!
//! # Checks
//!
//! | Type | Trigger | Severity |
//! |------|---------|----------|
//! | `time_clustering` | more than `clustering_threshold` placed doses in one bucket of one household | Medium |
//! | `supervision_shortage` | supervised doses in a bucket the assigner could not match | High |
//! | `unresolved_slot` | a dose the optimizer could not place | Critical |
//!
//! Buckets are `bucket_minutes` wide and aligned to midnight. Records are
//! ordered by household, bucket, then type.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::OptimizerConfig;
use crate::models::{
    normalize, ConflictRecord, ConflictReport, ConflictType, Minute, OptimizedSchedule, Severity,
    SuggestionCode, SupervisionPlan,
};

/// Scans optimized schedules and supervision plans for conflicts.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> ConflictDetector<'a> {
    /// Creates a detector.
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// Start of the bucket containing `minute`.
    pub fn bucket_of(&self, minute: Minute) -> Minute {
        let width = self.config.bucket_minutes;
        normalize(minute) / width * width
    }

    /// Detects conflicts across all households.
    pub fn detect(&self, households: &[(&OptimizedSchedule, &SupervisionPlan)]) -> ConflictReport {
        let mut records: Vec<ConflictRecord> = households
            .iter()
            .flat_map(|(schedule, supervision)| self.detect_household(schedule, supervision))
            .collect();
        sort_records(&mut records);

        info!(
            households = households.len(),
            conflicts = records.len(),
            "conflict detection complete"
        );
        ConflictReport { records }
    }

    /// Detects conflicts for one household, in report order.
    pub fn detect_household(
        &self,
        schedule: &OptimizedSchedule,
        supervision: &SupervisionPlan,
    ) -> Vec<ConflictRecord> {
        let household = schedule.household_id.as_str();
        let mut records = Vec::new();
        records.extend(self.clustering(schedule));
        records.extend(self.shortages(household, supervision));
        records.extend(self.unresolved(schedule));
        sort_records(&mut records);

        debug!(household, conflicts = records.len(), "household scanned");
        records
    }

    fn clustering(&self, schedule: &OptimizedSchedule) -> Vec<ConflictRecord> {
        let mut buckets: BTreeMap<Minute, Vec<String>> = BTreeMap::new();
        for medication in &schedule.medications {
            let key = medication.key();
            for dose in medication.doses.iter().filter(|d| !d.unresolved) {
                buckets
                    .entry(self.bucket_of(dose.adjusted_time))
                    .or_default()
                    .push(key.clone());
            }
        }

        buckets
            .into_iter()
            .filter(|(_, keys)| keys.len() > self.config.clustering_threshold)
            .map(|(bucket, keys)| {
                ConflictRecord::new(
                    schedule.household_id.clone(),
                    ConflictType::TimeClustering,
                    Severity::Medium,
                    bucket,
                    keys,
                    SuggestionCode::StaggerDoses,
                )
            })
            .collect()
    }

    fn shortages(&self, household: &str, supervision: &SupervisionPlan) -> Vec<ConflictRecord> {
        let mut buckets: BTreeMap<Minute, (Vec<String>, bool)> = BTreeMap::new();
        for unmatched in &supervision.unmatched {
            let entry = buckets
                .entry(self.bucket_of(unmatched.dose_time))
                .or_insert_with(|| (Vec::new(), false));
            entry.0.push(unmatched.member_id.clone());
            entry.1 |= unmatched.available_caregivers > 0;
        }

        buckets
            .into_iter()
            .map(|(bucket, (members, anyone_available))| {
                // Nobody around at all: someone's hours have to change.
                let suggestion = if anyone_available {
                    SuggestionCode::AddCaregiver
                } else {
                    SuggestionCode::ExtendCaregiverAvailability
                };
                ConflictRecord::new(
                    household,
                    ConflictType::SupervisionShortage,
                    Severity::High,
                    bucket,
                    members,
                    suggestion,
                )
            })
            .collect()
    }

    fn unresolved(&self, schedule: &OptimizedSchedule) -> Vec<ConflictRecord> {
        schedule
            .medications
            .iter()
            .flat_map(|medication| {
                let key = medication.key();
                let hopeless = medication.unresolved_count() == medication.doses.len();
                medication
                    .doses
                    .iter()
                    .filter(|d| d.unresolved)
                    .map(move |dose| {
                        let suggestion = if hopeless {
                            SuggestionCode::ConsultPrescriber
                        } else {
                            SuggestionCode::RelaxConstraints
                        };
                        ConflictRecord::new(
                            schedule.household_id.clone(),
                            ConflictType::UnresolvedSlot,
                            Severity::Critical,
                            self.bucket_of(dose.adjusted_time),
                            vec![key.clone()],
                            suggestion,
                        )
                    })
            })
            .collect()
    }
}

fn sort_records(records: &mut [ConflictRecord]) {
    records.sort_by(|a, b| {
        (&a.household_id, a.bucket_start, a.conflict_type, &a.affected_ids).cmp(&(
            &b.household_id,
            b.bucket_start,
            b.conflict_type,
            &b.affected_ids,
        ))
    });
}
