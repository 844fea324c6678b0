//! Family coordination: who supervises which dose.
//!
//! Supervision-requiring doses are matched to household members greedily
//! in chronological order. Among eligible caregivers, a composable chain of
//! [`CaregiverRule`]s decides who is asked first.
//!
//! # Usage
//!
//! ```
//! use u_dose::coordination::{rules, CaregiverRanking};
//!
//! let ranking = CaregiverRanking::new()
//!     .with_rule(rules::PrimaryRole)
//!     .with_rule(rules::HierarchyRank)
//!     .with_rule(rules::LeastLoaded);
//! assert_eq!(ranking.rule_names(), vec!["PRIMARY", "HIERARCHY", "LEAST_LOADED"]);
//! ```
//!
//! # References
//!
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod assigner;
mod hierarchy;
mod ranking;
pub mod rules;

pub use assigner::FamilyCoordinator;
pub use hierarchy::{HierarchyTable, DEFAULT_CULTURE};
pub use ranking::{AssignmentContext, CaregiverRanking};

use crate::models::FamilyMember;
use std::fmt::Debug;

/// Score returned by a caregiver rule.
///
/// Lower scores = asked first.
pub type RuleScore = f64;

/// A rule that orders eligible caregivers for one dose.
///
/// # Score Convention
/// **Lower score = higher preference.**
pub trait CaregiverRule: Send + Sync + Debug {
    /// Rule name (e.g., "PRIMARY").
    fn name(&self) -> &'static str;

    /// Scores a caregiver for the dose described by `context`.
    fn evaluate(&self, caregiver: &FamilyMember, context: &AssignmentContext<'_>) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
