//! Dose requirements and optimized doses.
//!
//! A [`DoseRequirement`] is one medication for one household member: how
//! many times a day, relative to what, and whether someone must watch it
//! being taken. The optimizer turns it into [`OptimizedDose`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Minute;

/// When a medication should be taken relative to food.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingPreference {
    /// In the half hour before a meal.
    BeforeMeals,
    /// Within an hour after a meal.
    AfterMeals,
    /// During a meal.
    WithFood,
    /// Well away from any meal.
    EmptyStomach,
    /// Taken when required; placed on the anchors.
    AsNeeded,
    /// No food relationship.
    #[default]
    NoPreference,
}

/// One medication's daily dosing requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseRequirement {
    /// Medication identifier.
    pub medication_id: String,
    /// Household member who takes the medication.
    pub member_id: String,
    /// Doses per day. Signed so malformed negative counts can be rejected.
    pub required_daily_count: i32,
    /// Food relationship.
    #[serde(default)]
    pub timing: TimingPreference,
    /// Whether a caregiver must supervise each dose.
    #[serde(default)]
    pub supervision_required: bool,
    /// Minimum gap between doses packed into one window (minutes).
    /// `None` uses the configured default.
    #[serde(default)]
    pub min_gap_minutes: Option<Minute>,
    /// Safe to take during a daytime fast. Every other dose is confined
    /// to the fasting windows while a fast is active.
    #[serde(default)]
    pub food_independent: bool,
    /// Times the prescriber originally wrote down. Used only to measure
    /// displacement; empty means the default spread.
    #[serde(default)]
    pub original_times: Vec<Minute>,
}

impl DoseRequirement {
    /// Creates a requirement with no timing preference.
    pub fn new(
        medication_id: impl Into<String>,
        member_id: impl Into<String>,
        required_daily_count: i32,
    ) -> Self {
        Self {
            medication_id: medication_id.into(),
            member_id: member_id.into(),
            required_daily_count,
            timing: TimingPreference::NoPreference,
            supervision_required: false,
            min_gap_minutes: None,
            food_independent: false,
            original_times: Vec::new(),
        }
    }

    /// Sets the timing preference.
    pub fn with_timing(mut self, timing: TimingPreference) -> Self {
        self.timing = timing;
        self
    }

    /// Marks doses as needing supervision.
    pub fn supervised(mut self) -> Self {
        self.supervision_required = true;
        self
    }

    /// Sets the minimum inter-dose gap.
    pub fn with_min_gap(mut self, minutes: Minute) -> Self {
        self.min_gap_minutes = Some(minutes);
        self
    }

    /// Marks the medication as safe during a daytime fast.
    pub fn food_independent(mut self) -> Self {
        self.food_independent = true;
        self
    }

    /// Sets the original (unadjusted) times.
    pub fn with_original_times(mut self, times: Vec<Minute>) -> Self {
        self.original_times = times;
        self
    }

    /// Whether placement is forced into fasting windows while a fast is active.
    pub fn restricted_while_fasting(&self) -> bool {
        !self.food_independent
    }

    /// `member/medication` key used in logs and conflict ids.
    pub fn key(&self) -> String {
        format!("{}/{}", self.member_id, self.medication_id)
    }
}

/// Kind of cultural adaptation applied to a dose.
///
/// Declaration order is the ranking: earlier variants outrank later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationType {
    PrayerAvoidance,
    FastingAccommodation,
    MealAlignment,
    FamilyRoutine,
    FestivalAdjustment,
}

impl AdaptationType {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptationType::PrayerAvoidance => "prayer_avoidance",
            AdaptationType::FastingAccommodation => "fasting_accommodation",
            AdaptationType::MealAlignment => "meal_alignment",
            AdaptationType::FamilyRoutine => "family_routine",
            AdaptationType::FestivalAdjustment => "festival_adjustment",
        }
    }
}

impl fmt::Display for AdaptationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Importance of an adaptation, by size of the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationPriority {
    Low,
    Medium,
    High,
}

impl AdaptationPriority {
    /// High for shifts of an hour or more, medium from 15 minutes, else low.
    pub fn from_shift(minutes_shifted: Minute) -> Self {
        match minutes_shifted.abs() {
            m if m >= 60 => AdaptationPriority::High,
            m if m >= 15 => AdaptationPriority::Medium,
            _ => AdaptationPriority::Low,
        }
    }
}

/// A recorded adjustment to a dose time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalAdaptation {
    /// Why the dose moved.
    pub adaptation_type: AdaptationType,
    /// Signed shift in minutes (positive = later).
    pub minutes_shifted: Minute,
    /// Priority derived from the shift size.
    pub priority: AdaptationPriority,
    /// What caused it: prayer name, meal type, fasting slot or routine label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CulturalAdaptation {
    /// Creates an adaptation; priority follows from the shift.
    pub fn new(adaptation_type: AdaptationType, minutes_shifted: Minute) -> Self {
        Self {
            adaptation_type,
            minutes_shifted,
            priority: AdaptationPriority::from_shift(minutes_shifted),
            detail: None,
        }
    }

    /// Attaches a detail tag.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One placed dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedDose {
    /// Index of the dose within its medication's day (chronological).
    pub dose_index: usize,
    /// The time the dose would have been taken without adaptation.
    pub original_time: Minute,
    /// The time chosen by the optimizer.
    pub adjusted_time: Minute,
    /// Adaptations applied, highest-ranked type first.
    pub adaptations: Vec<CulturalAdaptation>,
    /// Candidate window the dose was placed from.
    pub source_window_id: String,
    /// No valid time could be found; `adjusted_time` is best-effort only.
    pub unresolved: bool,
}

impl OptimizedDose {
    /// Absolute circular distance between original and adjusted time.
    pub fn displacement(&self) -> Minute {
        super::signed_offset(self.original_time, self.adjusted_time).abs()
    }

    /// Highest priority among the adaptations.
    pub fn max_priority(&self) -> Option<AdaptationPriority> {
        self.adaptations.iter().map(|a| a.priority).max()
    }

    /// Whether an adaptation of the given type was applied.
    pub fn has_adaptation(&self, adaptation_type: AdaptationType) -> bool {
        self.adaptations
            .iter()
            .any(|a| a.adaptation_type == adaptation_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bands() {
        assert_eq!(AdaptationPriority::from_shift(0), AdaptationPriority::Low);
        assert_eq!(AdaptationPriority::from_shift(14), AdaptationPriority::Low);
        assert_eq!(AdaptationPriority::from_shift(-15), AdaptationPriority::Medium);
        assert_eq!(AdaptationPriority::from_shift(59), AdaptationPriority::Medium);
        assert_eq!(AdaptationPriority::from_shift(60), AdaptationPriority::High);
        assert_eq!(AdaptationPriority::from_shift(-90), AdaptationPriority::High);
    }

    #[test]
    fn test_adaptation_ranking_order() {
        let mut types = vec![
            AdaptationType::FestivalAdjustment,
            AdaptationType::MealAlignment,
            AdaptationType::PrayerAvoidance,
            AdaptationType::FamilyRoutine,
            AdaptationType::FastingAccommodation,
        ];
        types.sort();
        assert_eq!(
            types,
            vec![
                AdaptationType::PrayerAvoidance,
                AdaptationType::FastingAccommodation,
                AdaptationType::MealAlignment,
                AdaptationType::FamilyRoutine,
                AdaptationType::FestivalAdjustment,
            ]
        );
    }

    #[test]
    fn test_fasting_restriction() {
        let d = DoseRequirement::new("metformin", "grandma", 2)
            .with_timing(TimingPreference::WithFood);
        assert!(d.restricted_while_fasting());
        assert!(!d.clone().food_independent().restricted_while_fasting());
        for timing in [TimingPreference::AsNeeded, TimingPreference::NoPreference] {
            assert!(DoseRequirement::new("m", "p", 1).with_timing(timing).restricted_while_fasting());
        }
        assert_eq!(d.key(), "grandma/metformin");
    }

    #[test]
    fn test_requirement_deserializes_with_defaults() {
        let json = r#"{"medication_id":"m1","member_id":"p1","required_daily_count":3}"#;
        let d: DoseRequirement = serde_json::from_str(json).unwrap();
        assert_eq!(d.timing, TimingPreference::NoPreference);
        assert!(!d.supervision_required);
        assert!(d.original_times.is_empty());
    }
}
