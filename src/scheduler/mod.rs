//! Dose placement and adherence scoring.
//!
//! # Algorithm
//!
//! `ScheduleOptimizer` is a deterministic, single-pass placement: windows
//! are chosen for the timing preference, doses are distributed over them
//! chronologically, and each dose takes its window target or the nearest
//! valid point found by an outward scan. It is not globally optimal; it
//! is predictable, and every deviation is recorded as an adaptation.
//!
//! # KPI
//!
//! `AdherenceKpi` summarises displacement and unresolved doses into the
//! adherence score stored on each medication schedule.

mod optimizer;
mod score;

pub use optimizer::{DayContext, ScheduleOptimizer};
pub use score::AdherenceKpi;
