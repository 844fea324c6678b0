//! Fasting period model.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Minute, TimeWindow};

/// The three windows in which doses may be taken while fasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastingSlot {
    /// Last stretch before dawn (pre-dawn meal).
    Suhoor,
    /// From sunset, around the fast-breaking meal.
    Iftar,
    /// Between the end of iftar and the start of suhoor.
    Night,
}

impl FastingSlot {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FastingSlot::Suhoor => "suhoor",
            FastingSlot::Iftar => "iftar",
            FastingSlot::Night => "night",
        }
    }
}

impl fmt::Display for FastingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved fasting windows for one date.
///
/// Built by [`crate::windows::FastingAnalyzer`]. An inactive period carries
/// no windows and excludes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingPeriod {
    /// Whether the household is fasting on this date.
    pub active: bool,
    /// Pre-dawn window.
    pub suhoor_window: Option<TimeWindow>,
    /// Post-sunset window.
    pub iftar_window: Option<TimeWindow>,
    /// Overnight window between iftar and suhoor.
    pub night_window: Option<TimeWindow>,
}

impl FastingPeriod {
    /// A period that imposes nothing.
    pub fn inactive() -> Self {
        Self {
            active: false,
            suhoor_window: None,
            iftar_window: None,
            night_window: None,
        }
    }

    /// An active period with explicit windows.
    pub fn active(suhoor: TimeWindow, iftar: TimeWindow, night: TimeWindow) -> Self {
        Self {
            active: true,
            suhoor_window: Some(suhoor),
            iftar_window: Some(iftar),
            night_window: Some(night),
        }
    }

    /// Windows in which fasting-restricted doses may be placed, with their slot.
    pub fn slots(&self) -> Vec<(FastingSlot, TimeWindow)> {
        if !self.active {
            return Vec::new();
        }
        [
            (FastingSlot::Suhoor, self.suhoor_window),
            (FastingSlot::Iftar, self.iftar_window),
            (FastingSlot::Night, self.night_window),
        ]
        .into_iter()
        .filter_map(|(slot, w)| w.map(|w| (slot, w)))
        .collect()
    }

    /// Daytime span (dawn → sunset) closed to fasting-restricted placement.
    ///
    /// Runs from the end of the suhoor window to the start of the iftar window.
    pub fn daytime_exclusion(&self) -> Option<TimeWindow> {
        if !self.active {
            return None;
        }
        match (self.suhoor_window, self.iftar_window) {
            (Some(suhoor), Some(iftar)) => Some(TimeWindow::new(suhoor.end, iftar.start)),
            _ => None,
        }
    }

    /// Whether `minute` falls strictly inside the daytime exclusion.
    pub fn excludes(&self, minute: Minute) -> bool {
        self.daytime_exclusion()
            .map(|w| w.contains_strictly(minute))
            .unwrap_or(false)
    }
}

impl Default for FastingPeriod {
    fn default() -> Self {
        Self::inactive()
    }
}
