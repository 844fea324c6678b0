//! Dose scheduling domain models.
//!
//! Provides the data types exchanged between the window builders, the
//! optimizer, the caregiver assigner and the conflict detector. All
//! times are minutes-of-day (see [`time_window`]).
//!
//! # Domain Mappings
//!
//! | u-dose | Generic scheduling |
//! |--------|-------------------|
//! | DoseRequirement | Task |
//! | OptimizedDose | Assignment (time only) |
//! | FamilyMember | Resource (human, with calendar) |
//! | AvoidanceWindow | Blocked period |
//! | ConflictRecord | Violation |

mod avoidance;
mod conflict;
mod dose;
mod family;
mod fasting;
mod meal;
mod schedule;
pub mod time_window;

pub use avoidance::{AvoidanceSource, AvoidanceWindow, Prayer};
pub use conflict::{ConflictRecord, ConflictReport, ConflictType, Severity, SuggestionCode};
pub use dose::{
    AdaptationPriority, AdaptationType, CulturalAdaptation, DoseRequirement, OptimizedDose,
    TimingPreference,
};
pub use family::{
    CognitiveStatus, CulturalRole, FamilyMember, SupervisionAssignment, SupervisionPlan,
    UnmatchedDose,
};
pub use fasting::{FastingPeriod, FastingSlot};
pub use meal::{MealType, MealWindow};
pub use schedule::{MedicationSchedule, OptimizedSchedule};
pub use time_window::{
    format_hhmm, hm, normalize, signed_offset, Minute, TimeWindow, MINUTES_PER_DAY,
};
