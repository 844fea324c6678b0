//! Rule chain for ordering caregivers.
//!
//! Rules are applied in sequence; the next rule is consulted only on a
//! tie. Caregivers still tied after every rule are ordered by id, so the
//! ranking is total and deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use super::{rules, CaregiverRule, HierarchyTable, RuleScore};
use crate::models::{FamilyMember, Minute};

/// State a rule may consult while scoring caregivers for one dose.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentContext<'a> {
    /// Household culture key for the hierarchy table.
    pub culture: &'a str,
    /// Role ordering per culture.
    pub hierarchy: &'a HierarchyTable,
    /// Assignments held so far per caregiver id.
    pub load: &'a HashMap<String, usize>,
    /// The dose being assigned.
    pub dose_time: Minute,
}

impl<'a> AssignmentContext<'a> {
    /// Creates a context.
    pub fn new(
        culture: &'a str,
        hierarchy: &'a HierarchyTable,
        load: &'a HashMap<String, usize>,
        dose_time: Minute,
    ) -> Self {
        Self {
            culture,
            hierarchy,
            load,
            dose_time,
        }
    }

    /// Assignments held by a caregiver.
    pub fn load_of(&self, caregiver_id: &str) -> usize {
        self.load.get(caregiver_id).copied().unwrap_or(0)
    }
}

/// Sequential caregiver ranking with a final tie-break by id.
#[derive(Clone)]
pub struct CaregiverRanking {
    rules: Vec<Arc<dyn CaregiverRule>>,
    epsilon: f64,
}

impl CaregiverRanking {
    /// Creates an empty ranking (id order only).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Appends a rule.
    pub fn with_rule<R: CaregiverRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the rules in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Scores from each rule for one caregiver.
    pub fn evaluate(&self, caregiver: &FamilyMember, context: &AssignmentContext<'_>) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|r| r.evaluate(caregiver, context))
            .collect()
    }

    /// Orders caregivers, most preferred first.
    pub fn sort(&self, caregivers: &mut [&FamilyMember], context: &AssignmentContext<'_>) {
        caregivers.sort_by(|a, b| self.compare(a, b, context));
    }

    /// The most preferred caregiver.
    pub fn select_best<'m>(
        &self,
        caregivers: &[&'m FamilyMember],
        context: &AssignmentContext<'_>,
    ) -> Option<&'m FamilyMember> {
        caregivers
            .iter()
            .copied()
            .min_by(|a, b| self.compare(a, b, context))
    }

    fn compare(&self, a: &FamilyMember, b: &FamilyMember, context: &AssignmentContext<'_>) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }
        a.id.cmp(&b.id)
    }
}

impl Default for CaregiverRanking {
    /// Primary role, then cultural hierarchy, then least loaded.
    fn default() -> Self {
        Self::new()
            .with_rule(rules::PrimaryRole)
            .with_rule(rules::HierarchyRank)
            .with_rule(rules::LeastLoaded)
    }
}

impl std::fmt::Debug for CaregiverRanking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaregiverRanking")
            .field("rules", &self.rule_names())
            .finish()
    }
}
