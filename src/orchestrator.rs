//! Recompute gating for callers that plan in response to events.
//!
//! Planning itself is pure; deciding *when* to re-plan is not. A
//! [`RecomputeGate`] collects triggers (profile edits, date rollover,
//! fasting start/end, roster changes), waits for a quiet period so a
//! burst of edits produces one recomputation, numbers each recomputation
//! with a generation, and drops results that a newer generation has
//! superseded.
//!
//! Timestamps are supplied by the caller, so the gate never reads a clock.
//!
//! # Example
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use u_dose::orchestrator::{Completion, RecomputeGate, RecomputeTrigger};
//!
//! let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
//! let mut gate: RecomputeGate<&str> = RecomputeGate::new();
//!
//! gate.record(RecomputeTrigger::ProfileChanged, t0);
//! assert!(gate.begin(t0 + TimeDelta::seconds(1)).is_none()); // still settling
//!
//! let ticket = gate.begin(t0 + TimeDelta::seconds(2)).unwrap();
//! assert_eq!(gate.complete(ticket.generation, "plan"), Completion::Accepted);
//! assert_eq!(gate.cached(), Some(&"plan"));
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::planner::HouseholdPlan;

/// Default quiet period before a recomputation starts.
pub const DEFAULT_QUIET_PERIOD_MS: i64 = 2_000;

/// An external event that invalidates the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeTrigger {
    /// Cultural or dietary profile edited (buffers, meal category, toggles).
    ProfileChanged,
    /// Local date changed; prayer and fasting times move.
    DateRollover,
    FastingStarted,
    FastingEnded,
    /// Members, caregivers or medications added, removed or edited.
    RosterChanged,
}

/// Permission to run one recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeTicket {
    /// Generation the result must be reported with.
    pub generation: u64,
    /// Triggers folded into this recomputation.
    pub triggers: BTreeSet<RecomputeTrigger>,
}

/// What happened to a reported result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Cached as the current plan.
    Accepted,
    /// A newer generation was issued (or this one never was); discarded.
    Stale,
}

/// Debounces triggers and discards superseded results.
#[derive(Debug, Clone)]
pub struct RecomputeGate<T = HouseholdPlan> {
    quiet_period: TimeDelta,
    pending: BTreeSet<RecomputeTrigger>,
    last_trigger_at: Option<DateTime<Utc>>,
    issued: u64,
    accepted: Option<u64>,
    cached: Option<T>,
}

impl<T> Default for RecomputeGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecomputeGate<T> {
    /// A gate with the default quiet period and nothing pending.
    pub fn new() -> Self {
        Self {
            quiet_period: TimeDelta::milliseconds(DEFAULT_QUIET_PERIOD_MS),
            pending: BTreeSet::new(),
            last_trigger_at: None,
            issued: 0,
            accepted: None,
            cached: None,
        }
    }

    /// Sets the quiet period. Negative values act as zero.
    pub fn with_quiet_period(mut self, quiet_period: TimeDelta) -> Self {
        self.quiet_period = quiet_period.max(TimeDelta::zero());
        self
    }

    /// Records a trigger; restarts the quiet period.
    pub fn record(&mut self, trigger: RecomputeTrigger, at: DateTime<Utc>) {
        self.pending.insert(trigger);
        // Out-of-order timestamps never shorten the wait.
        self.last_trigger_at = Some(match self.last_trigger_at {
            Some(last) if last > at => last,
            _ => at,
        });
        debug!(?trigger, pending = self.pending.len(), "recompute trigger recorded");
    }

    /// Triggers waiting for the next recomputation.
    pub fn pending(&self) -> &BTreeSet<RecomputeTrigger> {
        &self.pending
    }

    /// Whether triggers are pending and the quiet period has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_trigger_at {
            Some(last) if !self.pending.is_empty() => now - last >= self.quiet_period,
            _ => false,
        }
    }

    /// Starts a recomputation if one is due, consuming the pending triggers.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Option<RecomputeTicket> {
        if !self.is_due(now) {
            return None;
        }
        self.issued += 1;
        let triggers = std::mem::take(&mut self.pending);
        debug!(generation = self.issued, triggers = triggers.len(), "recompute started");
        Some(RecomputeTicket {
            generation: self.issued,
            triggers,
        })
    }

    /// Reports a finished recomputation. Only the newest issued
    /// generation is accepted.
    pub fn complete(&mut self, generation: u64, result: T) -> Completion {
        let newest = generation == self.issued && generation > 0;
        let fresh = self.accepted.map_or(true, |a| generation > a);
        if newest && fresh {
            self.accepted = Some(generation);
            self.cached = Some(result);
            debug!(generation, "recompute result accepted");
            Completion::Accepted
        } else {
            debug!(generation, newest = self.issued, "stale recompute result discarded");
            Completion::Stale
        }
    }

    /// Latest accepted result.
    pub fn cached(&self) -> Option<&T> {
        self.cached.as_ref()
    }

    /// Generation of the latest accepted result.
    pub fn accepted_generation(&self) -> Option<u64> {
        self.accepted
    }

    /// Generation of the latest issued ticket (0 before the first).
    pub fn issued_generation(&self) -> u64 {
        self.issued
    }
}
