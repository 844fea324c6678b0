//! Avoidance windows.
//!
//! Intervals during which dose placement is discouraged: prayer buffers,
//! family routines (school run, work commute) and festival observances.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Minute, TimeWindow};

/// The five daily prayers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// All prayers in chronological order.
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an avoidance window exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum AvoidanceSource {
    /// Buffer around a prayer time.
    Prayer(Prayer),
    /// Household routine (school run, commute, shop hours).
    FamilyRoutine(String),
    /// Festival or special observance for the date.
    Festival(String),
}

impl AvoidanceSource {
    /// Short tag used in window ids and recommendation details.
    pub fn tag(&self) -> String {
        match self {
            AvoidanceSource::Prayer(p) => p.as_str().to_string(),
            AvoidanceSource::FamilyRoutine(label) => format!("routine:{label}"),
            AvoidanceSource::Festival(label) => format!("festival:{label}"),
        }
    }
}

/// A buffered interval to keep doses out of.
///
/// After merging, one window may carry several sources (e.g. Maghrib and
/// Isha buffers that overlap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceWindow {
    /// The blocked interval (buffer already applied).
    pub window: TimeWindow,
    /// What produced this window.
    pub sources: Vec<AvoidanceSource>,
    /// Buffer applied on each side of the source time (minutes).
    pub buffer_minutes: Minute,
    /// Disabled windows are reported but never block placement.
    pub enabled: bool,
}

impl AvoidanceWindow {
    /// Creates an enabled window from a single source.
    pub fn new(window: TimeWindow, source: AvoidanceSource, buffer_minutes: Minute) -> Self {
        Self {
            window,
            sources: vec![source],
            buffer_minutes,
            enabled: true,
        }
    }

    /// Window around a prayer time.
    pub fn prayer(prayer: Prayer, at: Minute, buffer_minutes: Minute) -> Self {
        Self::new(
            TimeWindow::around(at, buffer_minutes),
            AvoidanceSource::Prayer(prayer),
            buffer_minutes,
        )
    }

    /// Family routine window.
    pub fn routine(label: impl Into<String>, window: TimeWindow) -> Self {
        Self::new(window, AvoidanceSource::FamilyRoutine(label.into()), 0)
    }

    /// Festival window.
    pub fn festival(label: impl Into<String>, window: TimeWindow) -> Self {
        Self::new(window, AvoidanceSource::Festival(label.into()), 0)
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether this window forbids placing a dose at `minute`.
    #[inline]
    pub fn blocks(&self, minute: Minute) -> bool {
        self.enabled && self.window.contains_strictly(minute)
    }

    /// Prayers among the sources.
    pub fn prayers(&self) -> impl Iterator<Item = Prayer> + '_ {
        self.sources.iter().filter_map(|s| match s {
            AvoidanceSource::Prayer(p) => Some(*p),
            _ => None,
        })
    }
}
