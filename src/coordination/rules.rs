//! Built-in caregiver rules.
//!
//! All rules return lower scores for caregivers that should be asked first.

use super::{AssignmentContext, CaregiverRule, RuleScore};
use crate::models::FamilyMember;

/// Explicitly designated primary caregivers first.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryRole;

impl CaregiverRule for PrimaryRole {
    fn name(&self) -> &'static str {
        "PRIMARY"
    }

    fn evaluate(&self, caregiver: &FamilyMember, _context: &AssignmentContext<'_>) -> RuleScore {
        if caregiver.is_primary_caregiver() {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Primary caregiver role"
    }
}

/// Position of the caregiver's role in the household culture's hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyRank;

impl CaregiverRule for HierarchyRank {
    fn name(&self) -> &'static str {
        "HIERARCHY"
    }

    fn evaluate(&self, caregiver: &FamilyMember, context: &AssignmentContext<'_>) -> RuleScore {
        context
            .hierarchy
            .rank(context.culture, &caregiver.cultural_role) as f64
    }

    fn description(&self) -> &'static str {
        "Cultural hierarchy rank"
    }
}

/// Fewest assignments so far.
#[derive(Debug, Clone, Copy)]
pub struct LeastLoaded;

impl CaregiverRule for LeastLoaded {
    fn name(&self) -> &'static str {
        "LEAST_LOADED"
    }

    fn evaluate(&self, caregiver: &FamilyMember, context: &AssignmentContext<'_>) -> RuleScore {
        context.load_of(&caregiver.id) as f64
    }

    fn description(&self) -> &'static str {
        "Least loaded caregiver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::HierarchyTable;
    use crate::models::CulturalRole;
    use std::collections::HashMap;

    #[test]
    fn test_primary_role() {
        let table = HierarchyTable::default();
        let load = HashMap::new();
        let ctx = AssignmentContext::new("default", &table, &load, 480);
        let primary = FamilyMember::new("a", 40).with_role(CulturalRole::PrimaryCaregiver);
        let other = FamilyMember::new("b", 40);
        assert!(PrimaryRole.evaluate(&primary, &ctx) < PrimaryRole.evaluate(&other, &ctx));
    }

    #[test]
    fn test_hierarchy_rank_follows_culture() {
        let table = HierarchyTable::default();
        let load = HashMap::new();
        let elder = FamilyMember::new("a", 70).with_role(CulturalRole::Elder);
        let spouse = FamilyMember::new("b", 45).with_role(CulturalRole::Spouse);

        let ctx = AssignmentContext::new("south_asian", &table, &load, 480);
        assert!(HierarchyRank.evaluate(&elder, &ctx) < HierarchyRank.evaluate(&spouse, &ctx));

        let ctx = AssignmentContext::new("western", &table, &load, 480);
        assert!(HierarchyRank.evaluate(&spouse, &ctx) < HierarchyRank.evaluate(&elder, &ctx));
    }

    #[test]
    fn test_least_loaded() {
        let table = HierarchyTable::default();
        let load: HashMap<String, usize> = [("a".to_string(), 3)].into_iter().collect();
        let ctx = AssignmentContext::new("default", &table, &load, 480);
        let a = FamilyMember::new("a", 40);
        let b = FamilyMember::new("b", 40);
        assert_eq!(LeastLoaded.evaluate(&a, &ctx), 3.0);
        assert_eq!(LeastLoaded.evaluate(&b, &ctx), 0.0);
    }
}
