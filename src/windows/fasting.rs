//! Fasting period analyzer.
//!
//! While a daytime fast is observed, doses not flagged food-independent
//! may only be taken between sunset and dawn. The analyzer turns dawn and sunset into
//! three windows:
//!
//! ```text
//!   suhoor  = [dawn - suhoor_lead, dawn]
//!   iftar   = [sunset, sunset + iftar_length]
//!   night   = [sunset + iftar_length, dawn - suhoor_lead]   (wraps midnight)
//! ```
//!
//! Callers that already know the windows (e.g. from a community
//! timetable) can pass them explicitly instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConstraintKind, Reported, SchedulingIssue};
use crate::models::{normalize, FastingPeriod, Minute, TimeWindow, MINUTES_PER_DAY};

/// Fasting observance for one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastingInput {
    /// Whether the household fasts on this date.
    pub active: bool,
    /// Dawn (start of the fast), minute-of-day.
    #[serde(default)]
    pub dawn: Option<Minute>,
    /// Sunset (end of the fast), minute-of-day.
    #[serde(default)]
    pub sunset: Option<Minute>,
    /// Explicit windows; take precedence over dawn/sunset.
    #[serde(default)]
    pub windows: Option<FastingPeriod>,
}

impl FastingInput {
    /// Not fasting.
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Fasting from dawn to sunset.
    pub fn from_dawn_sunset(dawn: Minute, sunset: Minute) -> Self {
        Self {
            active: true,
            dawn: Some(dawn),
            sunset: Some(sunset),
            windows: None,
        }
    }

    /// Fasting with explicit suhoor, iftar and night windows.
    pub fn explicit(suhoor: TimeWindow, iftar: TimeWindow, night: TimeWindow) -> Self {
        Self {
            active: true,
            dawn: None,
            sunset: None,
            windows: Some(FastingPeriod::active(suhoor, iftar, night)),
        }
    }
}

/// Builds a [`FastingPeriod`] from an observance.
#[derive(Debug, Clone, Copy)]
pub struct FastingAnalyzer {
    suhoor_lead: Minute,
    iftar_length: Minute,
}

impl FastingAnalyzer {
    /// Creates an analyzer with the given window lengths.
    pub fn new(suhoor_lead: Minute, iftar_length: Minute) -> Self {
        Self {
            suhoor_lead,
            iftar_length,
        }
    }

    /// Resolves the fasting period.
    ///
    /// Inactive input gives an inactive period. Active input without
    /// usable windows or dawn/sunset (missing, or sunset not after dawn)
    /// gives an inactive period plus missing-data issue.
    pub fn analyze(&self, input: &FastingInput) -> Reported<FastingPeriod> {
        if !input.active {
            return Reported::ok(FastingPeriod::inactive());
        }

        if let Some(explicit) = &input.windows {
            let period = FastingPeriod {
                active: true,
                suhoor_window: explicit.suhoor_window.map(|w| w.normalized()),
                iftar_window: explicit.iftar_window.map(|w| w.normalized()),
                night_window: explicit.night_window.map(|w| w.normalized()),
            };
            if period.suhoor_window.is_some() && period.iftar_window.is_some() {
                debug!("using explicit fasting windows");
                return Reported::ok(period);
            }
            return self.unusable("explicit fasting windows lack suhoor or iftar");
        }

        let (Some(dawn), Some(sunset)) = (input.dawn, input.sunset) else {
            return self.unusable("dawn or sunset time absent");
        };
        let dawn = normalize(dawn);
        let sunset = normalize(sunset);
        if sunset <= dawn {
            return self.unusable(&format!(
                "sunset {sunset} is not after dawn {dawn}"
            ));
        }

        let suhoor = TimeWindow::new(dawn - self.suhoor_lead, dawn);
        let iftar = TimeWindow::new(sunset, sunset + self.iftar_length);

        // The night window disappears when the fast plus both meal windows
        // fill the whole day.
        let occupied = (sunset - dawn) + self.suhoor_lead + self.iftar_length;
        let night = (occupied < MINUTES_PER_DAY).then(|| {
            TimeWindow::new(sunset + self.iftar_length, dawn - self.suhoor_lead + MINUTES_PER_DAY)
        });

        debug!(dawn, sunset, has_night = night.is_some(), "fasting windows derived");
        Reported::ok(FastingPeriod {
            active: true,
            suhoor_window: Some(suhoor),
            iftar_window: Some(iftar),
            night_window: night,
        })
    }

    fn unusable(&self, reason: &str) -> Reported<FastingPeriod> {
        warn!(reason, "fasting observance unusable, fasting constraint disabled");
        Reported::with_issue(
            FastingPeriod::inactive(),
            SchedulingIssue::missing(ConstraintKind::Fasting, reason),
        )
    }
}

impl Default for FastingAnalyzer {
    fn default() -> Self {
        Self::new(90, 120)
    }
}
