//! Prayer window builder.
//!
//! Converts the five daily prayer timestamps into buffered avoidance
//! windows: `[time - buffer, time + buffer]`, split at midnight and merged
//! where buffers overlap (Maghrib and Isha often do).
//!
//! Prayer times are computed elsewhere; this builder only checks that the
//! timetable it receives is usable. A timetable with a missing prayer, a
//! timestamp outside the date (Isha may fall after midnight, so the next
//! day is accepted), or prayers out of order is discarded as a whole and
//! reported as missing data.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::AvoidanceSet;
use crate::config::PrayerBufferConfig;
use crate::error::{ConstraintKind, Reported, SchedulingIssue};
use crate::models::{AvoidanceWindow, Minute, Prayer};

/// Localized prayer timestamps for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimes {
    /// The date the timetable is for.
    pub date: NaiveDate,
    /// Timestamp per prayer.
    pub times: BTreeMap<Prayer, NaiveDateTime>,
}

impl PrayerTimes {
    /// Creates an empty timetable for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            times: BTreeMap::new(),
        }
    }

    /// Sets one prayer's timestamp.
    pub fn with(mut self, prayer: Prayer, at: NaiveDateTime) -> Self {
        self.times.insert(prayer, at);
        self
    }

    /// Sets one prayer's time on the timetable's date.
    ///
    /// Out-of-range clock values leave the prayer unset.
    pub fn with_clock(self, prayer: Prayer, hour: u32, minute: u32) -> Self {
        match self.date.and_hms_opt(hour, minute, 0) {
            Some(at) => self.with(prayer, at),
            None => self,
        }
    }

    /// Minute-of-day for a prayer, if present.
    pub fn minute_of(&self, prayer: Prayer) -> Option<Minute> {
        self.times
            .get(&prayer)
            .map(|t| (t.hour() * 60 + t.minute()) as Minute)
    }

    /// Checks completeness, date range and ordering.
    fn check(&self) -> Result<(), String> {
        let next_day = self.date.succ_opt();
        let mut previous: Option<(Prayer, NaiveDateTime)> = None;

        for prayer in Prayer::ALL {
            let at = self
                .times
                .get(&prayer)
                .ok_or_else(|| format!("{prayer} timestamp absent"))?;

            let day = at.date();
            if day != self.date && Some(day) != next_day {
                return Err(format!("{prayer} timestamp {at} is not on {}", self.date));
            }

            if let Some((prev, prev_at)) = previous {
                if *at <= prev_at {
                    return Err(format!("{prayer} is not after {prev}"));
                }
            }
            previous = Some((prayer, *at));
        }
        Ok(())
    }
}

/// Builds prayer avoidance windows from a timetable and buffer settings.
#[derive(Debug, Clone)]
pub struct PrayerWindowBuilder<'a> {
    buffers: &'a PrayerBufferConfig,
}

impl<'a> PrayerWindowBuilder<'a> {
    /// Creates a builder over the given buffer settings.
    pub fn new(buffers: &'a PrayerBufferConfig) -> Self {
        Self { buffers }
    }

    /// Builds the avoidance set.
    ///
    /// `None` or an unusable timetable yields an empty set plus an
    /// [`SchedulingIssue::InputDataMissing`]. A negative buffer drops that
    /// prayer with an [`SchedulingIssue::InvalidConfiguration`]. Disabled
    /// prayers produce no window.
    pub fn build(&self, times: Option<&PrayerTimes>) -> Reported<AvoidanceSet> {
        let Some(times) = times else {
            debug!("no prayer timetable supplied");
            return Reported::with_issue(
                AvoidanceSet::empty(),
                SchedulingIssue::missing(ConstraintKind::PrayerAvoidance, "no prayer timetable"),
            );
        };

        if let Err(reason) = times.check() {
            warn!(date = %times.date, %reason, "prayer timetable unusable, avoidance disabled");
            return Reported::with_issue(
                AvoidanceSet::empty(),
                SchedulingIssue::missing(ConstraintKind::PrayerAvoidance, reason),
            );
        }

        let mut issues = Vec::new();
        let mut windows = Vec::with_capacity(Prayer::ALL.len());

        for prayer in Prayer::ALL {
            let Some(at) = times.minute_of(prayer) else {
                continue;
            };
            let setting = self.buffers.get(prayer);
            if !setting.enabled {
                continue;
            }
            if setting.buffer_minutes < 0 {
                issues.push(SchedulingIssue::invalid(
                    format!("prayer_buffer:{prayer}"),
                    format!("negative buffer {} minutes", setting.buffer_minutes),
                ));
                continue;
            }
            windows.push(AvoidanceWindow::prayer(prayer, at, setting.buffer_minutes));
        }

        let set = AvoidanceSet::new(windows);
        debug!(date = %times.date, windows = set.len(), "prayer avoidance windows built");
        Reported { value: set, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hm, TimeWindow};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn timetable() -> PrayerTimes {
        PrayerTimes::new(date())
            .with_clock(Prayer::Fajr, 5, 10)
            .with_clock(Prayer::Dhuhr, 12, 30)
            .with_clock(Prayer::Asr, 15, 45)
            .with_clock(Prayer::Maghrib, 18, 20)
            .with_clock(Prayer::Isha, 19, 35)
    }

    #[test]
    fn test_build_default_buffers() {
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&timetable()));
        assert!(built.issues.is_empty());

        let windows: Vec<TimeWindow> = built.value.windows.iter().map(|w| w.window).collect();
        // Maghrib 17:50-18:50 and Isha 19:05-20:05 stay apart
        assert_eq!(
            windows,
            vec![
                TimeWindow::new(hm(4, 40), hm(5, 40)),
                TimeWindow::new(hm(12, 0), hm(13, 0)),
                TimeWindow::new(hm(15, 15), hm(16, 15)),
                TimeWindow::new(hm(17, 50), hm(18, 50)),
                TimeWindow::new(hm(19, 5), hm(20, 5)),
            ]
        );
    }

    #[test]
    fn test_overlapping_buffers_merge() {
        let mut buffers = PrayerBufferConfig::default();
        buffers.set_buffer(Prayer::Maghrib, 45);
        buffers.set_buffer(Prayer::Isha, 45);
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&timetable()));

        let evening = built
            .value
            .windows
            .iter()
            .find(|w| w.window.contains(hm(19, 0)))
            .unwrap();
        assert_eq!(evening.window, TimeWindow::new(hm(17, 35), hm(20, 20)));
        assert_eq!(
            evening.prayers().collect::<Vec<_>>(),
            vec![Prayer::Maghrib, Prayer::Isha]
        );
    }

    #[test]
    fn test_missing_timetable() {
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(None);
        assert!(built.value.is_empty());
        assert!(matches!(
            built.issues[0],
            SchedulingIssue::InputDataMissing {
                constraint: ConstraintKind::PrayerAvoidance,
                ..
            }
        ));
    }

    #[test]
    fn test_absent_prayer_disables_all() {
        let mut times = timetable();
        times.times.remove(&Prayer::Asr);
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&times));
        assert!(built.value.is_empty());
        assert_eq!(built.issues.len(), 1);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let times = timetable().with_clock(Prayer::Asr, 11, 0);
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&times));
        assert!(built.value.is_empty());
        assert!(built.issues[0].to_string().contains("asr is not after dhuhr"));
    }

    #[test]
    fn test_isha_after_midnight_accepted() {
        let next = date().succ_opt().unwrap().and_hms_opt(0, 10, 0).unwrap();
        let times = timetable().with(Prayer::Isha, next);
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&times));
        assert!(built.issues.is_empty());
        // split at midnight: 23:40-24:00 and 00:00-00:40
        assert!(built.value.is_blocked(hm(23, 50)));
        assert!(built.value.is_blocked(hm(0, 30)));
    }

    #[test]
    fn test_wrong_date_rejected() {
        let other = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        let times = timetable().with(Prayer::Fajr, other);
        let buffers = PrayerBufferConfig::default();
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&times));
        assert!(built.value.is_empty());
    }

    #[test]
    fn test_negative_buffer_drops_prayer() {
        let mut buffers = PrayerBufferConfig::default();
        buffers.set_buffer(Prayer::Dhuhr, -5);
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&timetable()));
        assert_eq!(built.value.len(), 4);
        assert!(!built.value.is_blocked(hm(12, 30)));
        assert!(matches!(
            &built.issues[0],
            SchedulingIssue::InvalidConfiguration { subject, .. } if subject == "prayer_buffer:dhuhr"
        ));
    }

    #[test]
    fn test_disabled_prayer_produces_no_window() {
        let mut buffers = PrayerBufferConfig::default();
        buffers.set_enabled(Prayer::Asr, false);
        // a disabled prayer with a bad buffer is skipped silently
        buffers.set_buffer(Prayer::Asr, -5);
        let built = PrayerWindowBuilder::new(&buffers).build(Some(&timetable()));
        assert!(built.issues.is_empty());
        assert_eq!(built.value.len(), 4);
        assert!(!built.value.is_blocked(hm(15, 45)));
        assert!(built.value.windows.iter().all(|w| !w.prayers().any(|p| p == Prayer::Asr)));
    }
}
