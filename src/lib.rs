//! Culture-aware medication dose scheduling.
//!
//! Turns a household's medication list into concrete dose times that
//! respect prayer times, meal patterns, seasonal fasting and caregiver
//! availability, then reports supervision assignments, conflicts and
//! structured recommendations.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TimeWindow`, `DoseRequirement`,
//!   `OptimizedDose`, `FamilyMember`, `ConflictRecord`, `OptimizedSchedule`
//! - **`windows`**: Prayer, meal and fasting window builders
//! - **`scheduler`**: `ScheduleOptimizer` and adherence scoring
//! - **`coordination`**: Greedy caregiver assignment with pluggable ranking rules
//! - **`conflicts`**: Clustering, supervision shortage and unresolved-dose detection
//! - **`recommendation`**: Untranslated reason codes for every deviation
//! - **`planner`**: The full pipeline for one or many households
//! - **`orchestrator`**: Debounced, generation-checked recomputation
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown members)
//! - **`config`**: `OptimizerConfig` with documented defaults
//!
//! # Architecture
//!
//! Every stage is a pure function of its inputs. Window builders never
//! fail: unusable input disables the affected constraint and is reported
//! as a `SchedulingIssue` inside the result. Only malformed input shapes
//! and invalid configuration abort planning (`PlanError`).
//!
//! Prayer-time calculation, localization and persistence live elsewhere;
//! this crate consumes their outputs.

pub mod config;
pub mod conflicts;
pub mod coordination;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod recommendation;
pub mod scheduler;
pub mod validation;
pub mod windows;
