//! Constraint window builders.
//!
//! Turn externally resolved inputs (prayer timetable, dietary category,
//! fasting observance) into the window sets the optimizer places doses
//! against. Builders never fail: unusable input disables the constraint
//! and is reported as a [`SchedulingIssue`](crate::error::SchedulingIssue).
//!
//! | Builder | Input | Output |
//! |---------|-------|--------|
//! | [`PrayerWindowBuilder`] | five prayer timestamps + buffers | avoidance windows |
//! | [`MealPatternResolver`] | dietary category | meal windows + aligned sub-windows |
//! | [`FastingAnalyzer`] | dawn / sunset or explicit windows | suhoor / iftar / night windows |

mod fasting;
mod meal;
mod prayer;

pub use fasting::{FastingAnalyzer, FastingInput};
pub use meal::{MealPatternCatalog, MealPatternResolver, FALLBACK_CATEGORY};
pub use prayer::{PrayerTimes, PrayerWindowBuilder};

use serde::{Deserialize, Serialize};

use crate::models::{
    AvoidanceSource, AvoidanceWindow, FastingSlot, MealType, Minute, TimeWindow, MINUTES_PER_DAY,
};

/// Where a candidate window came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WindowOrigin {
    /// Derived from a meal (before/with/after).
    Meal(MealType),
    /// One of the fasting windows.
    Fasting(FastingSlot),
    /// Free interval away from meals (empty stomach).
    FreeInterval,
    /// Point at an original or default-spread time.
    Anchor,
}

/// A window the optimizer may place doses in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateWindow {
    /// Stable id, e.g. `with_food:breakfast`, `fasting:night`, `anchor:1`.
    pub id: String,
    /// The interval.
    pub window: TimeWindow,
    /// Provenance.
    pub origin: WindowOrigin,
}

impl CandidateWindow {
    /// Creates a candidate window.
    pub fn new(id: impl Into<String>, window: TimeWindow, origin: WindowOrigin) -> Self {
        Self {
            id: id.into(),
            window,
            origin,
        }
    }
}

/// The merged avoidance windows for a household-day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceSet {
    /// Windows ordered by start; enabled windows never overlap each other.
    pub windows: Vec<AvoidanceWindow>,
}

impl AvoidanceSet {
    /// Merges and orders the given windows.
    pub fn new(windows: Vec<AvoidanceWindow>) -> Self {
        Self {
            windows: merge_avoidance(windows),
        }
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any enabled window strictly contains `minute`.
    pub fn is_blocked(&self, minute: Minute) -> bool {
        self.windows.iter().any(|w| w.blocks(minute))
    }

    /// Enabled windows that strictly contain `minute`.
    pub fn blocking(&self, minute: Minute) -> Vec<&AvoidanceWindow> {
        self.windows.iter().filter(|w| w.blocks(minute)).collect()
    }

    /// Intervals of the enabled windows.
    pub fn enabled_intervals(&self) -> Vec<TimeWindow> {
        self.windows
            .iter()
            .filter(|w| w.enabled)
            .map(|w| w.window)
            .collect()
    }

    /// Keeps only windows whose sources satisfy `keep`.
    pub fn filtered(&self, keep: impl Fn(&AvoidanceSource) -> bool) -> Self {
        let windows = self
            .windows
            .iter()
            .filter(|w| w.sources.iter().any(&keep))
            .cloned()
            .collect();
        Self { windows }
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether there are no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Splits windows at midnight and merges overlapping or touching enabled
/// windows, unioning their sources. Disabled windows are kept apart.
pub fn merge_avoidance(windows: Vec<AvoidanceWindow>) -> Vec<AvoidanceWindow> {
    let mut pieces: Vec<AvoidanceWindow> = Vec::new();
    let mut disabled: Vec<AvoidanceWindow> = Vec::new();

    for w in windows {
        for (s, e) in w.window.segments() {
            let piece = AvoidanceWindow {
                window: TimeWindow::new(s, e),
                ..w.clone()
            };
            if w.enabled {
                pieces.push(piece);
            } else {
                disabled.push(piece);
            }
        }
    }

    pieces.sort_by_key(|w| (w.window.start, w.window.end));

    let mut merged: Vec<AvoidanceWindow> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match merged.last_mut() {
            Some(last) if piece.window.start <= last.window.end => {
                if piece.window.end > last.window.end {
                    last.window = TimeWindow::new(last.window.start, piece.window.end);
                }
                for source in piece.sources {
                    if !last.sources.contains(&source) {
                        last.sources.push(source);
                    }
                }
                last.buffer_minutes = last.buffer_minutes.max(piece.buffer_minutes);
            }
            _ => merged.push(piece),
        }
    }

    // Pieces touching midnight from both sides form one wrapping window,
    // so 00:00 stays interior.
    if merged.len() > 1 {
        let first_starts = merged.first().is_some_and(|w| w.window.start == 0);
        let last_ends = merged
            .last()
            .is_some_and(|w| w.window.start + w.window.duration() == MINUTES_PER_DAY);
        if first_starts && last_ends {
            let head = merged.remove(0);
            if let Some(tail) = merged.last_mut() {
                tail.window = TimeWindow::new(tail.window.start, head.window.end);
                for source in head.sources {
                    if !tail.sources.contains(&source) {
                        tail.sources.push(source);
                    }
                }
                tail.buffer_minutes = tail.buffer_minutes.max(head.buffer_minutes);
            }
        }
    }

    merged.extend(disabled);
    merged.sort_by_key(|w| (w.window.start, w.window.end, !w.enabled));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hm, Prayer};

    #[test]
    fn test_merge_adjacent_prayers() {
        let merged = merge_avoidance(vec![
            AvoidanceWindow::prayer(Prayer::Isha, hm(20, 10), 30),
            AvoidanceWindow::prayer(Prayer::Maghrib, hm(19, 30), 30),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].window, TimeWindow::new(hm(19, 0), hm(20, 40)));
        assert_eq!(
            merged[0].prayers().collect::<Vec<_>>(),
            vec![Prayer::Maghrib, Prayer::Isha]
        );
    }

    #[test]
    fn test_merge_keeps_midnight_interior() {
        let merged = merge_avoidance(vec![
            AvoidanceWindow::prayer(Prayer::Isha, hm(23, 50), 30),
            AvoidanceWindow::routine("late_tea", TimeWindow::new(hm(0, 10), hm(0, 40))),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].window, TimeWindow::new(hm(23, 20), hm(0, 40)));
        assert_eq!(merged[0].sources.len(), 2);
        assert!(merged[0].blocks(0));
    }

    #[test]
    fn test_disabled_not_merged() {
        let merged = merge_avoidance(vec![
            AvoidanceWindow::prayer(Prayer::Maghrib, hm(19, 30), 30),
            AvoidanceWindow::prayer(Prayer::Isha, hm(20, 10), 30).with_enabled(false),
        ]);
        assert_eq!(merged.len(), 2);
        let set = AvoidanceSet { windows: merged };
        assert!(set.is_blocked(hm(19, 30)));
        assert!(!set.is_blocked(hm(20, 30)));
    }

    #[test]
    fn test_set_filtered_by_source() {
        let set = AvoidanceSet::new(vec![
            AvoidanceWindow::prayer(Prayer::Dhuhr, hm(13, 0), 30),
            AvoidanceWindow::routine("school_run", TimeWindow::new(hm(8, 0), hm(8, 45))),
        ]);
        let prayers_only = set.filtered(|s| matches!(s, AvoidanceSource::Prayer(_)));
        assert_eq!(prayers_only.len(), 1);
        assert!(!prayers_only.is_blocked(hm(8, 20)));
        assert!(set.is_blocked(hm(8, 20)));
    }
}
