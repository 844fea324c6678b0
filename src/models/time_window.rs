//! Minute-of-day time windows.
//!
//! The single interval type used by every stage of the optimizer. All
//! times are minutes after local midnight in `[0, 1440)`. A window whose
//! end lies before its start wraps past midnight (e.g. a night window
//! `21:15 → 03:00`).
//!
//! # Boundaries
//! Windows are closed: both `start` and `end` belong to the window.
//! Avoidance checks use [`TimeWindow::contains_strictly`], which excludes
//! the two boundary minutes, so a dose may sit exactly on the edge of a
//! prayer buffer.
//!
//! # Set Operations
//! [`union`], [`intersect`], [`complement`] and [`subtract`] operate on
//! slices of windows and return sorted, non-wrapping, merged windows
//! (split at midnight). Use [`rejoin_midnight`] to fold a piece ending at
//! 24:00 and a piece starting at 00:00 back into one wrapping window.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes after local midnight.
pub type Minute = i32;

/// Minutes in one day.
pub const MINUTES_PER_DAY: Minute = 1440;

/// Maps any minute value into `[0, 1440)`.
#[inline]
pub fn normalize(minute: Minute) -> Minute {
    minute.rem_euclid(MINUTES_PER_DAY)
}

/// Shortest signed circular distance from `from` to `to`.
///
/// Result lies in `(-720, 720]`; positive means `to` is later in the day.
#[inline]
pub fn signed_offset(from: Minute, to: Minute) -> Minute {
    let d = normalize(to - from);
    if d > MINUTES_PER_DAY / 2 {
        d - MINUTES_PER_DAY
    } else {
        d
    }
}

/// Builds a minute-of-day value from hours and minutes.
///
/// # Examples
/// ```
/// use u_dose::models::hm;
/// assert_eq!(hm(7, 30), 450);
/// assert_eq!(hm(24, 0), 0);
/// ```
#[inline]
pub fn hm(hours: i32, minutes: i32) -> Minute {
    normalize(hours * 60 + minutes)
}

/// Formats a minute-of-day as `HH:MM`.
pub fn format_hhmm(minute: Minute) -> String {
    let m = normalize(minute);
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// A closed minute-of-day interval, possibly wrapping past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (minute-of-day, inclusive).
    pub start: Minute,
    /// Window end (minute-of-day, inclusive). `1440` marks end-of-day for
    /// a non-wrapping window.
    pub end: Minute,
    /// Whether the window spans 24:00. Recomputed by [`TimeWindow::normalized`].
    #[serde(default)]
    pub wraps_midnight: bool,
}

impl TimeWindow {
    /// Creates a normalized window from raw (possibly out-of-range) bounds.
    ///
    /// Spans of a full day or more collapse to [`TimeWindow::full_day`].
    pub fn new(start: Minute, end: Minute) -> Self {
        if end - start >= MINUTES_PER_DAY {
            return Self::full_day();
        }
        let s = normalize(start);
        let mut e = normalize(end);
        if e == 0 && end != start && s != 0 {
            e = MINUTES_PER_DAY;
        }
        Self {
            start: s,
            end: e,
            wraps_midnight: e < s,
        }
    }

    /// The whole day, `00:00 → 24:00`.
    pub fn full_day() -> Self {
        Self {
            start: 0,
            end: MINUTES_PER_DAY,
            wraps_midnight: false,
        }
    }

    /// A zero-length window at a single minute.
    pub fn point(minute: Minute) -> Self {
        let m = normalize(minute);
        Self {
            start: m,
            end: m,
            wraps_midnight: false,
        }
    }

    /// Window centred on `center` extending `radius` minutes each way.
    pub fn around(center: Minute, radius: Minute) -> Self {
        Self::new(center - radius, center + radius)
    }

    /// Re-applies normalization (for windows built from raw field values).
    pub fn normalized(&self) -> Self {
        if self.wraps_midnight && self.end >= self.start {
            Self::new(self.start, self.end + MINUTES_PER_DAY)
        } else {
            Self::new(self.start, self.end)
        }
    }

    /// Length in minutes.
    #[inline]
    pub fn duration(&self) -> Minute {
        if self.wraps_midnight {
            MINUTES_PER_DAY - self.start + self.end
        } else {
            self.end - self.start
        }
    }

    /// Whether this is a single-minute window.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.duration() == 0
    }

    /// Minutes from the window start to `minute`, walking forward.
    #[inline]
    pub fn offset_of(&self, minute: Minute) -> Minute {
        normalize(minute - self.start)
    }

    /// Whether `minute` lies in the closed window.
    #[inline]
    pub fn contains(&self, minute: Minute) -> bool {
        if self.duration() >= MINUTES_PER_DAY {
            return true;
        }
        self.offset_of(minute) <= self.duration()
    }

    /// Whether `minute` lies in the open interior (boundaries excluded).
    ///
    /// A full-day window has no boundary and contains every minute.
    #[inline]
    pub fn contains_strictly(&self, minute: Minute) -> bool {
        if self.duration() >= MINUTES_PER_DAY {
            return true;
        }
        let off = self.offset_of(minute);
        off > 0 && off < self.duration()
    }

    /// Wrap-aware midpoint (rounded down).
    pub fn midpoint(&self) -> Minute {
        normalize(self.start + self.duration() / 2)
    }

    /// Grows the window by `minutes` on both sides.
    pub fn expand(&self, minutes: Minute) -> Self {
        Self::new(self.start - minutes, self.start + self.duration() + minutes)
    }

    /// Splits the window at midnight into linear `(start, end)` pieces.
    pub fn segments(&self) -> Vec<(Minute, Minute)> {
        if self.wraps_midnight {
            let mut out = vec![(self.start, MINUTES_PER_DAY)];
            if self.end > 0 {
                out.push((0, self.end));
            }
            out
        } else {
            vec![(self.start, self.end)]
        }
    }

    /// Whether the two windows share more than a boundary minute.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.segments().iter().any(|&(a0, a1)| {
            other
                .segments()
                .iter()
                .any(|&(b0, b1)| a0.max(b0) < a1.min(b1))
        })
    }

    /// Start of the window measured as elapsed minutes from `origin`.
    ///
    /// Used to sort windows chronologically relative to a day anchor.
    pub fn start_after(&self, origin: Minute) -> Minute {
        normalize(self.start - origin)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_hhmm(self.start), format_hhmm(self.end))
    }
}

fn from_segment(start: Minute, end: Minute) -> TimeWindow {
    TimeWindow {
        start,
        end,
        wraps_midnight: false,
    }
}

fn merged_segments(windows: &[TimeWindow]) -> Vec<(Minute, Minute)> {
    let mut segs: Vec<(Minute, Minute)> = windows.iter().flat_map(|w| w.segments()).collect();
    segs.sort_unstable();

    let mut out: Vec<(Minute, Minute)> = Vec::with_capacity(segs.len());
    for (s, e) in segs {
        match out.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => out.push((s, e)),
        }
    }
    out
}

/// Merges overlapping or touching windows.
///
/// Returns sorted, non-wrapping windows; wrapping input is split at midnight.
pub fn union(windows: &[TimeWindow]) -> Vec<TimeWindow> {
    merged_segments(windows)
        .into_iter()
        .map(|(s, e)| from_segment(s, e))
        .collect()
}

/// Intersection of two window sets (positive-length pieces only).
pub fn intersect(a: &[TimeWindow], b: &[TimeWindow]) -> Vec<TimeWindow> {
    let left = merged_segments(a);
    let right = merged_segments(b);
    let mut out = Vec::new();
    for &(a0, a1) in &left {
        for &(b0, b1) in &right {
            let s = a0.max(b0);
            let e = a1.min(b1);
            if s < e {
                out.push(from_segment(s, e));
            }
        }
    }
    union(&out)
}

/// The parts of the day not covered by `windows` (positive-length pieces).
pub fn complement(windows: &[TimeWindow]) -> Vec<TimeWindow> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for (s, e) in merged_segments(windows) {
        if s > cursor {
            out.push(from_segment(cursor, s));
        }
        cursor = cursor.max(e);
    }
    if cursor < MINUTES_PER_DAY {
        out.push(from_segment(cursor, MINUTES_PER_DAY));
    }
    out
}

/// `base` minus `remove`.
pub fn subtract(base: &[TimeWindow], remove: &[TimeWindow]) -> Vec<TimeWindow> {
    intersect(base, &complement(remove))
}

/// Folds a piece ending at 24:00 and a piece starting at 00:00 into one
/// wrapping window. Input must be sorted and non-overlapping.
pub fn rejoin_midnight(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
    if windows.len() < 2 {
        return windows;
    }
    let first = windows[0];
    let last = windows[windows.len() - 1];
    if first.start == 0 && !first.wraps_midnight && last.end == MINUTES_PER_DAY {
        windows.pop();
        windows.remove(0);
        windows.push(TimeWindow {
            start: last.start,
            end: first.end,
            wraps_midnight: true,
        });
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_and_offsets() {
        assert_eq!(normalize(-30), 1410);
        assert_eq!(normalize(1445), 5);
        assert_eq!(signed_offset(hm(16, 30), hm(17, 0)), 30);
        assert_eq!(signed_offset(hm(23, 50), hm(0, 10)), 20);
        assert_eq!(signed_offset(hm(0, 10), hm(23, 50)), -20);
        assert_eq!(signed_offset(0, 720), 720);
        assert_eq!(format_hhmm(hm(7, 5)), "07:05");
    }

    #[test]
    fn test_window_new_wrapping() {
        let w = TimeWindow::new(hm(21, 15), hm(3, 0));
        assert!(w.wraps_midnight);
        assert_eq!(w.duration(), 345);
        assert!(w.contains(hm(23, 0)));
        assert!(w.contains(hm(1, 0)));
        assert!(!w.contains(hm(12, 0)));
        assert_eq!(w.midpoint(), hm(0, 7));
    }

    #[test]
    fn test_window_negative_start_wraps() {
        let w = TimeWindow::around(hm(0, 10), 30);
        assert!(w.wraps_midnight);
        assert_eq!(w.start, hm(23, 40));
        assert_eq!(w.end, hm(0, 40));
        assert_eq!(w.segments(), vec![(hm(23, 40), 1440), (0, hm(0, 40))]);
    }

    #[test]
    fn test_window_end_of_day() {
        let w = TimeWindow::new(hm(23, 0), 1440);
        assert!(!w.wraps_midnight);
        assert_eq!(w.end, 1440);
        assert_eq!(w.duration(), 60);
    }

    #[test]
    fn test_full_day_and_point() {
        let full = TimeWindow::new(-10, 1500);
        assert_eq!(full, TimeWindow::full_day());
        assert!(full.contains(hm(12, 0)));

        let p = TimeWindow::point(hm(16, 30));
        assert!(p.is_point());
        assert!(p.contains(hm(16, 30)));
        assert!(!p.contains_strictly(hm(16, 30)));
    }

    #[test]
    fn test_contains_strictly_excludes_boundaries() {
        let w = TimeWindow::around(hm(16, 30), 30);
        assert!(!w.contains_strictly(hm(16, 0)));
        assert!(w.contains_strictly(hm(16, 1)));
        assert!(w.contains_strictly(hm(16, 59)));
        assert!(!w.contains_strictly(hm(17, 0)));
    }

    #[test]
    fn test_full_day_strictly_contains_midnight() {
        let full = TimeWindow::full_day();
        assert!(full.contains_strictly(0));
        assert!(full.contains_strictly(hm(23, 59)));
        assert!(TimeWindow::new(hm(6, 0), hm(6, 0) + MINUTES_PER_DAY).contains_strictly(hm(6, 0)));
    }

    #[test]
    fn test_overlaps() {
        let a = TimeWindow::new(0, 100);
        let b = TimeWindow::new(50, 150);
        assert!(a.overlaps(&b));
        let c = TimeWindow::new(100, 200);
        assert!(!a.overlaps(&c)); // touching only
        let night = TimeWindow::new(hm(22, 0), hm(2, 0));
        assert!(night.overlaps(&TimeWindow::new(hm(1, 0), hm(3, 0))));
    }

    #[test]
    fn test_union_merges_touching() {
        let merged = union(&[
            TimeWindow::new(hm(18, 0), hm(19, 0)),
            TimeWindow::new(hm(19, 0), hm(20, 0)),
            TimeWindow::new(hm(8, 0), hm(9, 0)),
        ]);
        assert_eq!(
            merged,
            vec![
                TimeWindow::new(hm(8, 0), hm(9, 0)),
                TimeWindow::new(hm(18, 0), hm(20, 0)),
            ]
        );
    }

    #[test]
    fn test_complement_and_subtract() {
        let gaps = complement(&[TimeWindow::new(hm(6, 0), hm(22, 0))]);
        assert_eq!(
            gaps,
            vec![
                TimeWindow::new(0, hm(6, 0)),
                TimeWindow::new(hm(22, 0), 1440),
            ]
        );

        let rest = subtract(
            &[TimeWindow::new(hm(8, 0), hm(12, 0))],
            &[TimeWindow::new(hm(9, 0), hm(10, 0))],
        );
        assert_eq!(
            rest,
            vec![
                TimeWindow::new(hm(8, 0), hm(9, 0)),
                TimeWindow::new(hm(10, 0), hm(12, 0)),
            ]
        );
    }

    #[test]
    fn test_intersect_with_wrapping() {
        let night = TimeWindow::new(hm(22, 0), hm(2, 0));
        let late = TimeWindow::new(hm(23, 0), hm(23, 30));
        assert_eq!(intersect(&[night], &[late]), vec![late]);
    }

    #[test]
    fn test_rejoin_midnight() {
        let pieces = union(&[TimeWindow::new(hm(22, 0), hm(2, 0))]);
        assert_eq!(pieces.len(), 2);
        let joined = rejoin_midnight(pieces);
        assert_eq!(joined, vec![TimeWindow::new(hm(22, 0), hm(2, 0))]);
    }

    #[test]
    fn test_normalized_from_raw_fields() {
        let raw = TimeWindow {
            start: 1500,
            end: 1560,
            wraps_midnight: false,
        };
        assert_eq!(raw.normalized(), TimeWindow::new(hm(1, 0), hm(2, 0)));
    }
}
