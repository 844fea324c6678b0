//! Optimizer configuration.
//!
//! One validated structure replaces scattered feature flags. Every field
//! has a documented default; thresholds and buffers are product defaults,
//! not domain constants, so households and deployments may override them.
//!
//! # Example
//! ```
//! use u_dose::config::OptimizerConfig;
//! use u_dose::models::Prayer;
//!
//! let config = OptimizerConfig::default()
//!     .with_prayer_buffer(Prayer::Asr, 20)
//!     .with_clustering_threshold(3);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coordination::HierarchyTable;
use crate::error::ConfigError;
use crate::models::{Minute, Prayer, TimeWindow, MINUTES_PER_DAY};
use crate::windows::MealPatternCatalog;

/// Which constraint families are switched on.
///
/// Decided upstream (household profile); the optimizer only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintToggles {
    pub prayer_avoidance: bool,
    pub meal_alignment: bool,
    pub fasting: bool,
    pub family_routine: bool,
    pub festival: bool,
}

impl Default for ConstraintToggles {
    fn default() -> Self {
        Self {
            prayer_avoidance: true,
            meal_alignment: true,
            fasting: true,
            family_routine: true,
            festival: true,
        }
    }
}

impl ConstraintToggles {
    /// Everything off: doses land on the default spread.
    pub fn none() -> Self {
        Self {
            prayer_avoidance: false,
            meal_alignment: false,
            fasting: false,
            family_routine: false,
            festival: false,
        }
    }
}

/// Buffer and enabled flag for one prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerBuffer {
    /// Minutes kept clear on each side of the prayer time.
    pub buffer_minutes: Minute,
    /// Whether this prayer produces an avoidance window.
    pub enabled: bool,
}

impl Default for PrayerBuffer {
    fn default() -> Self {
        Self {
            buffer_minutes: 30,
            enabled: true,
        }
    }
}

/// Per-prayer buffers. Prayers without an entry use [`PrayerBuffer::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrayerBufferConfig {
    pub prayers: BTreeMap<Prayer, PrayerBuffer>,
}

impl PrayerBufferConfig {
    /// Buffer settings for one prayer.
    pub fn get(&self, prayer: Prayer) -> PrayerBuffer {
        self.prayers.get(&prayer).copied().unwrap_or_default()
    }

    /// Sets the buffer for one prayer.
    pub fn set_buffer(&mut self, prayer: Prayer, buffer_minutes: Minute) {
        self.prayers.entry(prayer).or_default().buffer_minutes = buffer_minutes;
    }

    /// Enables or disables one prayer.
    pub fn set_enabled(&mut self, prayer: Prayer, enabled: bool) {
        self.prayers.entry(prayer).or_default().enabled = enabled;
    }
}

/// Adherence score weights.
///
/// `score = 1 - (unresolved_weight * unresolved_ratio
///              + shift_weight * min(avg_abs_shift / shift_normalization_minutes, 1))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub unresolved_weight: f64,
    pub shift_weight: f64,
    pub shift_normalization_minutes: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            unresolved_weight: 0.7,
            shift_weight: 0.3,
            shift_normalization_minutes: 120.0,
        }
    }
}

/// Full optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Constraint families in effect.
    pub toggles: ConstraintToggles,
    /// Per-prayer buffers (default 30 minutes, enabled).
    pub prayer_buffers: PrayerBufferConfig,
    /// Default dosing span start (default 08:00).
    pub waking_start: Minute,
    /// Default dosing span end (default 22:00).
    pub waking_end: Minute,
    /// Minimum gap between doses packed into one window (default 240).
    pub default_min_gap: Minute,
    /// Largest accepted dose count per medication per day (default 96).
    pub max_daily_count: usize,
    /// Outward scan step (default 5).
    pub scan_step: Minute,
    /// How far the scan may leave the window (default 30).
    pub search_extension: Minute,
    /// Length of the before-meal window (default 30).
    pub before_meal_lead: Minute,
    /// Length of the after-meal window (default 60).
    pub after_meal_lag: Minute,
    /// Minimum distance from any meal for empty-stomach doses (default 120).
    pub empty_stomach_clearance: Minute,
    /// Suhoor window length before dawn (default 90).
    pub suhoor_lead: Minute,
    /// Iftar window length after sunset (default 120).
    pub iftar_length: Minute,
    /// Doses per bucket above which clustering is reported (default 2).
    pub clustering_threshold: usize,
    /// Conflict bucket width (default 15).
    pub bucket_minutes: Minute,
    /// Minimum spacing of one caregiver's assignments (default 15).
    pub handling_duration: Minute,
    /// Assignments a caregiver may hold within one handling duration (default 1).
    pub caregiver_concurrency: usize,
    /// Minimum caregiver age (default 18).
    pub adult_age: u32,
    /// Adherence score weights.
    pub score: ScoreWeights,
    /// Meal windows per cultural/dietary category.
    pub meal_patterns: MealPatternCatalog,
    /// Caregiver ordering per culture.
    pub hierarchy: HierarchyTable,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            toggles: ConstraintToggles::default(),
            prayer_buffers: PrayerBufferConfig::default(),
            waking_start: 8 * 60,
            waking_end: 22 * 60,
            default_min_gap: 240,
            max_daily_count: 96,
            scan_step: 5,
            search_extension: 30,
            before_meal_lead: 30,
            after_meal_lag: 60,
            empty_stomach_clearance: 120,
            suhoor_lead: 90,
            iftar_length: 120,
            clustering_threshold: 2,
            bucket_minutes: 15,
            handling_duration: 15,
            caregiver_concurrency: 1,
            adult_age: 18,
            score: ScoreWeights::default(),
            meal_patterns: MealPatternCatalog::default(),
            hierarchy: HierarchyTable::default(),
        }
    }
}

impl OptimizerConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges. Prayer buffers are not checked here: a negative
    /// buffer only disables that prayer and is reported in the schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..MINUTES_PER_DAY).contains(&self.waking_start)
            || self.waking_end <= self.waking_start
            || self.waking_end > MINUTES_PER_DAY
        {
            return Err(ConfigError::out_of_range(
                "waking_start/waking_end",
                "an increasing pair within 0..=1440",
                format!("{}..{}", self.waking_start, self.waking_end),
            ));
        }
        if self.default_min_gap <= 0 {
            return Err(ConfigError::out_of_range(
                "default_min_gap",
                "positive",
                self.default_min_gap,
            ));
        }
        if self.max_daily_count == 0 || self.max_daily_count > MINUTES_PER_DAY as usize {
            return Err(ConfigError::out_of_range(
                "max_daily_count",
                "within 1..=1440",
                self.max_daily_count,
            ));
        }
        if self.scan_step <= 0 {
            return Err(ConfigError::out_of_range("scan_step", "positive", self.scan_step));
        }
        let non_negative = [
            ("search_extension", self.search_extension),
            ("before_meal_lead", self.before_meal_lead),
            ("after_meal_lag", self.after_meal_lag),
            ("empty_stomach_clearance", self.empty_stomach_clearance),
            ("suhoor_lead", self.suhoor_lead),
            ("iftar_length", self.iftar_length),
            ("handling_duration", self.handling_duration),
        ];
        for (field, value) in non_negative {
            if value < 0 {
                return Err(ConfigError::out_of_range(field, "non-negative", value));
            }
        }
        if self.bucket_minutes <= 0 || self.bucket_minutes > MINUTES_PER_DAY {
            return Err(ConfigError::out_of_range(
                "bucket_minutes",
                "within 1..=1440",
                self.bucket_minutes,
            ));
        }
        if self.caregiver_concurrency == 0 {
            return Err(ConfigError::out_of_range(
                "caregiver_concurrency",
                "at least 1",
                self.caregiver_concurrency,
            ));
        }
        let weights = self.score;
        if !(0.0..=1.0).contains(&weights.unresolved_weight)
            || !(0.0..=1.0).contains(&weights.shift_weight)
        {
            return Err(ConfigError::out_of_range(
                "score weights",
                "within 0.0..=1.0",
                format!("{}/{}", weights.unresolved_weight, weights.shift_weight),
            ));
        }
        if weights.shift_normalization_minutes <= 0.0 {
            return Err(ConfigError::out_of_range(
                "score.shift_normalization_minutes",
                "positive",
                weights.shift_normalization_minutes,
            ));
        }
        Ok(())
    }

    /// The default dosing span as a window.
    pub fn waking_span(&self) -> TimeWindow {
        TimeWindow::new(self.waking_start, self.waking_end)
    }

    /// Sets the constraint toggles.
    pub fn with_toggles(mut self, toggles: ConstraintToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Sets the default dosing span.
    pub fn with_waking_span(mut self, start: Minute, end: Minute) -> Self {
        self.waking_start = start;
        self.waking_end = end;
        self
    }

    /// Sets the default minimum inter-dose gap.
    pub fn with_default_min_gap(mut self, minutes: Minute) -> Self {
        self.default_min_gap = minutes;
        self
    }

    /// Sets one prayer's buffer.
    pub fn with_prayer_buffer(mut self, prayer: Prayer, buffer_minutes: Minute) -> Self {
        self.prayer_buffers.set_buffer(prayer, buffer_minutes);
        self
    }

    /// Enables or disables one prayer.
    pub fn with_prayer_enabled(mut self, prayer: Prayer, enabled: bool) -> Self {
        self.prayer_buffers.set_enabled(prayer, enabled);
        self
    }

    /// Sets the clustering threshold.
    pub fn with_clustering_threshold(mut self, threshold: usize) -> Self {
        self.clustering_threshold = threshold;
        self
    }

    /// Sets the caregiver handling duration.
    pub fn with_handling_duration(mut self, minutes: Minute) -> Self {
        self.handling_duration = minutes;
        self
    }

    /// Sets the caregiver hierarchy table.
    pub fn with_hierarchy(mut self, hierarchy: HierarchyTable) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Sets the meal pattern catalog.
    pub fn with_meal_patterns(mut self, catalog: MealPatternCatalog) -> Self {
        self.meal_patterns = catalog;
        self
    }
}
