//! Household planning pipeline.
//!
//! Runs the stages in order for fully resolved inputs:
//!
//! ```text
//! windows ─▶ ScheduleOptimizer ─▶ FamilyCoordinator ─▶ ConflictDetector ─▶ recommend
//! ```
//!
//! Planning is a pure recomputation: nothing is cached or persisted, and
//! the same input always yields the same plan. Hard failures are limited
//! to malformed input shapes and invalid configuration ([`PlanError`]);
//! everything else degrades into issues, unresolved doses and conflicts.
//!
//! # Example
//! ```
//! use u_dose::config::OptimizerConfig;
//! use u_dose::models::{hm, DoseRequirement, FamilyMember};
//! use u_dose::planner::{plan_household, HouseholdInput};
//!
//! let input = HouseholdInput::new("h1")
//!     .with_member(FamilyMember::new("nani", 78))
//!     .with_medication(DoseRequirement::new("metformin", "nani", 2));
//! let config = OptimizerConfig::default();
//!
//! let plan = plan_household(&input, &config).unwrap();
//! let times = plan.schedule.medication("nani", "metformin").unwrap().adjusted_times();
//! assert_eq!(times, vec![hm(8, 0), hm(20, 0)]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::config::{ConstraintToggles, OptimizerConfig};
use crate::conflicts::ConflictDetector;
use crate::coordination::{FamilyCoordinator, DEFAULT_CULTURE};
use crate::error::{PlanError, SchedulingIssue};
use crate::models::{
    AvoidanceWindow, ConflictRecord, ConflictReport, DoseRequirement, FamilyMember, FastingPeriod,
    MealWindow, OptimizedSchedule, Prayer, SupervisionPlan, TimeWindow,
};
use crate::recommendation::{recommend, Recommendation};
use crate::scheduler::{DayContext, ScheduleOptimizer};
use crate::validation::{validate_household, ValidationError, ValidationErrorKind};
use crate::windows::{
    AvoidanceSet, FastingAnalyzer, FastingInput, MealPatternResolver, PrayerTimes,
    PrayerWindowBuilder, FALLBACK_CATEGORY,
};

/// A labelled avoidance interval (school run, festival gathering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledWindow {
    pub label: String,
    pub window: TimeWindow,
}

impl LabelledWindow {
    /// Creates a labelled window.
    pub fn new(label: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            label: label.into(),
            window,
        }
    }
}

/// Everything known about one household for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdInput {
    pub household_id: String,
    /// Culture key for caregiver ranking and, absent a meal category,
    /// for the meal pattern.
    #[serde(default = "default_culture")]
    pub culture: String,
    #[serde(default)]
    pub members: Vec<FamilyMember>,
    #[serde(default)]
    pub medications: Vec<DoseRequirement>,
    /// Overrides the configured toggles for this household.
    #[serde(default)]
    pub toggles: Option<ConstraintToggles>,
    #[serde(default)]
    pub prayer_times: Option<PrayerTimes>,
    /// Meal pattern catalog key.
    #[serde(default)]
    pub meal_category: Option<String>,
    /// Explicit meal windows; take precedence over the catalog.
    #[serde(default)]
    pub meals: Option<Vec<MealWindow>>,
    #[serde(default)]
    pub fasting: FastingInput,
    #[serde(default)]
    pub routine_windows: Vec<LabelledWindow>,
    #[serde(default)]
    pub festival_windows: Vec<LabelledWindow>,
}

fn default_culture() -> String {
    DEFAULT_CULTURE.to_string()
}

impl HouseholdInput {
    /// An empty household in the default culture.
    pub fn new(household_id: impl Into<String>) -> Self {
        Self {
            household_id: household_id.into(),
            culture: default_culture(),
            members: Vec::new(),
            medications: Vec::new(),
            toggles: None,
            prayer_times: None,
            meal_category: None,
            meals: None,
            fasting: FastingInput::inactive(),
            routine_windows: Vec::new(),
            festival_windows: Vec::new(),
        }
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    pub fn with_member(mut self, member: FamilyMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_medication(mut self, requirement: DoseRequirement) -> Self {
        self.medications.push(requirement);
        self
    }

    pub fn with_toggles(mut self, toggles: ConstraintToggles) -> Self {
        self.toggles = Some(toggles);
        self
    }

    pub fn with_prayer_times(mut self, times: PrayerTimes) -> Self {
        self.prayer_times = Some(times);
        self
    }

    pub fn with_meal_category(mut self, category: impl Into<String>) -> Self {
        self.meal_category = Some(category.into());
        self
    }

    pub fn with_meals(mut self, meals: Vec<MealWindow>) -> Self {
        self.meals = Some(meals);
        self
    }

    pub fn with_fasting(mut self, fasting: FastingInput) -> Self {
        self.fasting = fasting;
        self
    }

    pub fn with_routine(mut self, label: impl Into<String>, window: TimeWindow) -> Self {
        self.routine_windows.push(LabelledWindow::new(label, window));
        self
    }

    pub fn with_festival(mut self, label: impl Into<String>, window: TimeWindow) -> Self {
        self.festival_windows.push(LabelledWindow::new(label, window));
        self
    }
}

/// The complete plan for one household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdPlan {
    pub schedule: OptimizedSchedule,
    pub supervision: SupervisionPlan,
    pub conflicts: ConflictReport,
    pub recommendations: Vec<Recommendation>,
}

impl HouseholdPlan {
    pub fn household_id(&self) -> &str {
        &self.schedule.household_id
    }

    /// Degradations raised while planning.
    pub fn issues(&self) -> &[SchedulingIssue] {
        &self.schedule.issues
    }
}

/// Plans one household.
///
/// # Errors
/// [`PlanError::Config`] for an invalid configuration,
/// [`PlanError::Validation`] with every structural problem of the input.
#[instrument(skip_all, fields(
    household = %input.household_id,
    members = input.members.len(),
    medications = input.medications.len()
))]
pub fn plan_household(input: &HouseholdInput, config: &OptimizerConfig) -> Result<HouseholdPlan, PlanError> {
    config.validate()?;
    validate_household(&input.members, &input.medications)?;

    let (schedule, supervision) = stage(input, config);
    let records = ConflictDetector::new(config).detect_household(&schedule, &supervision);
    let plan = finish(schedule, supervision, records);

    info!(
        doses = plan.schedule.dose_count(),
        unresolved = plan.schedule.unresolved_count(),
        conflicts = plan.conflicts.records.len(),
        score = plan.schedule.overall_score(),
        "household planned"
    );
    Ok(plan)
}

/// Plans several households, detecting conflicts across all of them.
///
/// Plans come back in input order.
///
/// # Errors
/// As [`plan_household`]; validation errors of all households are
/// collected, and duplicate household ids are rejected.
#[instrument(skip_all, fields(households = inputs.len()))]
pub fn plan_households(
    inputs: &[HouseholdInput],
    config: &OptimizerConfig,
) -> Result<Vec<HouseholdPlan>, PlanError> {
    config.validate()?;

    let mut errors: Vec<ValidationError> = Vec::new();
    let mut seen = HashSet::new();
    for input in inputs {
        if !seen.insert(input.household_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate household ID: {}", input.household_id),
            ));
        }
        if let Err(mut found) = validate_household(&input.members, &input.medications) {
            for e in &mut found {
                e.message = format!("{}: {}", input.household_id, e.message);
            }
            errors.extend(found);
        }
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let staged: Vec<(OptimizedSchedule, SupervisionPlan)> =
        inputs.iter().map(|input| stage(input, config)).collect();
    let pairs: Vec<(&OptimizedSchedule, &SupervisionPlan)> = staged.iter().map(|(s, p)| (s, p)).collect();
    let report = ConflictDetector::new(config).detect(&pairs);

    let plans: Vec<HouseholdPlan> = staged
        .into_iter()
        .map(|(schedule, supervision)| {
            let records = report
                .records
                .iter()
                .filter(|r| r.household_id == schedule.household_id)
                .cloned()
                .collect();
            finish(schedule, supervision, records)
        })
        .collect();

    info!(
        conflicts = report.records.len(),
        unresolved = plans.iter().map(|p| p.schedule.unresolved_count()).sum::<usize>(),
        "households planned"
    );
    Ok(plans)
}

/// Windows, placement and supervision for one validated household.
fn stage(input: &HouseholdInput, config: &OptimizerConfig) -> (OptimizedSchedule, SupervisionPlan) {
    let toggles = input.toggles.unwrap_or(config.toggles);
    let mut issues: Vec<SchedulingIssue> = Vec::new();

    let avoidance = avoidance_set(input, config, &toggles, &mut issues);
    let meals = if toggles.meal_alignment {
        meal_windows(input, config, &mut issues)
    } else {
        Vec::new()
    };
    let fasting = if toggles.fasting {
        FastingAnalyzer::new(config.suhoor_lead, config.iftar_length)
            .analyze(&fasting_input(input))
            .drain_into(&mut issues)
    } else {
        FastingPeriod::inactive()
    };
    debug!(
        avoidance = avoidance.len(),
        meals = meals.len(),
        fasting = fasting.active,
        "constraint windows ready"
    );

    let day = DayContext::new(&meals, &avoidance, &fasting);
    let mut schedule = ScheduleOptimizer::new(config).optimize_all(&input.household_id, &input.medications, &day);
    issues.append(&mut schedule.issues);
    schedule.issues = issues;

    let members: Vec<FamilyMember> = input
        .members
        .iter()
        .cloned()
        .map(|mut m| {
            m.availability = m.availability.iter().map(|w| w.normalized()).collect();
            m
        })
        .collect();
    let supervision = FamilyCoordinator::new(config).assign(&schedule, &members, &input.culture);

    (schedule, supervision)
}

fn finish(schedule: OptimizedSchedule, supervision: SupervisionPlan, records: Vec<ConflictRecord>) -> HouseholdPlan {
    let recommendations = recommend(&schedule, &records);
    HouseholdPlan {
        schedule,
        supervision,
        conflicts: ConflictReport { records },
        recommendations,
    }
}

fn avoidance_set(
    input: &HouseholdInput,
    config: &OptimizerConfig,
    toggles: &ConstraintToggles,
    issues: &mut Vec<SchedulingIssue>,
) -> AvoidanceSet {
    let mut windows: Vec<AvoidanceWindow> = Vec::new();
    if toggles.prayer_avoidance {
        let prayers = PrayerWindowBuilder::new(&config.prayer_buffers)
            .build(input.prayer_times.as_ref())
            .drain_into(issues);
        windows.extend(prayers.windows);
    }
    if toggles.family_routine {
        windows.extend(
            input
                .routine_windows
                .iter()
                .map(|r| AvoidanceWindow::routine(r.label.clone(), r.window.normalized())),
        );
    }
    if toggles.festival {
        windows.extend(
            input
                .festival_windows
                .iter()
                .map(|f| AvoidanceWindow::festival(f.label.clone(), f.window.normalized())),
        );
    }
    AvoidanceSet::new(windows)
}

/// Explicit meals, else the named category, else the culture's pattern
/// when the catalog knows it, else the fallback pattern.
fn meal_windows(input: &HouseholdInput, config: &OptimizerConfig, issues: &mut Vec<SchedulingIssue>) -> Vec<MealWindow> {
    if let Some(meals) = &input.meals {
        let mut meals: Vec<MealWindow> = meals
            .iter()
            .cloned()
            .map(|mut m| {
                m.window = m.window.normalized();
                m
            })
            .collect();
        meals.sort_by_key(|m| (m.window.start, m.meal_type));
        return meals;
    }

    let resolver = MealPatternResolver::new(&config.meal_patterns);
    let category = match &input.meal_category {
        Some(category) => category.as_str(),
        None if config.meal_patterns.get(&input.culture).is_some() => input.culture.as_str(),
        None => FALLBACK_CATEGORY,
    };
    resolver.resolve(category).drain_into(issues)
}

/// Fills missing dawn/sunset from Fajr and Maghrib.
fn fasting_input(input: &HouseholdInput) -> FastingInput {
    let mut fasting = input.fasting.clone();
    if fasting.active && fasting.windows.is_none() {
        if let Some(times) = &input.prayer_times {
            fasting.dawn = fasting.dawn.or_else(|| times.minute_of(Prayer::Fajr));
            fasting.sunset = fasting.sunset.or_else(|| times.minute_of(Prayer::Maghrib));
        }
    }
    fasting
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintKind;
    use crate::models::{hm, AdaptationType, ConflictType, MealType, TimingPreference};
    use crate::recommendation::ReasonCode;
    use chrono::NaiveDate;

    fn timetable() -> PrayerTimes {
        PrayerTimes::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .with_clock(Prayer::Fajr, 5, 0)
            .with_clock(Prayer::Dhuhr, 13, 0)
            .with_clock(Prayer::Asr, 16, 30)
            .with_clock(Prayer::Maghrib, 19, 15)
            .with_clock(Prayer::Isha, 20, 45)
    }

    fn carer(id: &str) -> FamilyMember {
        FamilyMember::new(id, 45).with_availability(TimeWindow::full_day())
    }

    #[test]
    fn test_plan_without_constraints() {
        let input = HouseholdInput::new("h1")
            .with_toggles(ConstraintToggles::none())
            .with_member(FamilyMember::new("nani", 78))
            .with_medication(DoseRequirement::new("metformin", "nani", 2));
        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();

        let med = plan.schedule.medication("nani", "metformin").unwrap();
        assert_eq!(med.adjusted_times(), vec![hm(8, 0), hm(20, 0)]);
        assert_eq!(med.adherence_score, 1.0);
        assert!(plan.issues().is_empty());
        assert!(plan.conflicts.is_clear());
        assert!(plan.recommendations.is_empty());
    }

    #[test]
    fn test_prayer_avoidance_end_to_end() {
        let toggles = ConstraintToggles {
            meal_alignment: false,
            ..ConstraintToggles::default()
        };
        let input = HouseholdInput::new("h1")
            .with_toggles(toggles)
            .with_prayer_times(timetable())
            .with_member(FamilyMember::new("abu", 70))
            .with_medication(DoseRequirement::new("statin", "abu", 1).with_original_times(vec![hm(16, 30)]));
        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();

        let med = plan.schedule.medication("abu", "statin").unwrap();
        assert_eq!(med.adjusted_times(), vec![hm(17, 0)]);
        let rec = &plan.recommendations[0];
        assert_eq!(rec.code, ReasonCode::PrayerAvoidance);
        assert_eq!(rec.minutes, Some(30));
        assert_eq!(rec.detail.as_deref(), Some("asr"));
    }

    #[test]
    fn test_missing_timetable_is_an_issue() {
        let input = HouseholdInput::new("h1")
            .with_member(FamilyMember::new("abu", 70))
            .with_medication(DoseRequirement::new("statin", "abu", 1));
        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();
        assert!(plan.issues().contains(&SchedulingIssue::missing(
            ConstraintKind::PrayerAvoidance,
            "no prayer timetable"
        )));
        assert_eq!(plan.schedule.unresolved_count(), 0);
    }

    #[test]
    fn test_meal_sources() {
        let config = OptimizerConfig::default();
        let toggles = ConstraintToggles {
            prayer_avoidance: false,
            ..ConstraintToggles::default()
        };
        let base = HouseholdInput::new("h1")
            .with_toggles(toggles)
            .with_member(FamilyMember::new("p", 60))
            .with_medication(DoseRequirement::new("m", "p", 1).with_timing(TimingPreference::WithFood));

        // culture known to the catalog: south_asian breakfast 08:00-09:00
        let plan = plan_household(&base.clone().with_culture("south_asian"), &config).unwrap();
        assert_eq!(plan.schedule.medications[0].adjusted_times(), vec![hm(8, 30)]);

        // unknown category falls back with an issue
        let plan = plan_household(&base.clone().with_meal_category("martian"), &config).unwrap();
        assert_eq!(plan.schedule.medications[0].adjusted_times(), vec![hm(7, 30)]);
        assert!(matches!(
            plan.issues()[0],
            SchedulingIssue::InputDataMissing { constraint: ConstraintKind::MealAlignment, .. }
        ));

        // explicit meals win
        let meals = vec![MealWindow::new(MealType::Lunch, TimeWindow::new(hm(11, 0), hm(11, 40)))];
        let plan = plan_household(&base.with_meals(meals), &config).unwrap();
        assert_eq!(plan.schedule.medications[0].adjusted_times(), vec![hm(11, 20)]);
    }

    #[test]
    fn test_fasting_derived_from_prayer_times() {
        let toggles = ConstraintToggles {
            prayer_avoidance: false,
            ..ConstraintToggles::default()
        };
        let fasting = FastingInput {
            active: true,
            ..FastingInput::default()
        };
        let input = HouseholdInput::new("h1")
            .with_toggles(toggles)
            .with_prayer_times(timetable())
            .with_fasting(fasting)
            .with_member(FamilyMember::new("p", 40))
            .with_medication(DoseRequirement::new("m", "p", 2));
        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();

        // suhoor 03:30-05:00 and night 21:15-03:30
        let med = &plan.schedule.medications[0];
        assert_eq!(med.adjusted_times(), vec![hm(0, 22), hm(4, 15)]);
        let exclusion = TimeWindow::new(hm(5, 0), hm(19, 15));
        assert!(med.doses.iter().all(|d| !d.unresolved && !exclusion.contains_strictly(d.adjusted_time)));
        assert!(med.doses.iter().all(|d| d.source_window_id.starts_with("fasting:")));
        assert!(plan
            .recommendations
            .iter()
            .any(|r| r.code == ReasonCode::FastingAccommodation));
    }

    #[test]
    fn test_routine_toggle() {
        let routine = TimeWindow::new(hm(7, 30), hm(8, 25));
        let input = HouseholdInput::new("h1")
            .with_toggles(ConstraintToggles {
                prayer_avoidance: false,
                meal_alignment: false,
                ..ConstraintToggles::default()
            })
            .with_routine("school_run", routine)
            .with_member(FamilyMember::new("p", 40))
            .with_medication(DoseRequirement::new("m", "p", 1));
        let config = OptimizerConfig::default();

        let plan = plan_household(&input, &config).unwrap();
        let dose = &plan.schedule.medications[0].doses[0];
        assert_eq!(dose.adjusted_time, hm(8, 25));
        assert!(dose.has_adaptation(AdaptationType::FamilyRoutine));

        let off = input.with_toggles(ConstraintToggles::none());
        let plan = plan_household(&off, &config).unwrap();
        assert_eq!(plan.schedule.medications[0].doses[0].adjusted_time, hm(8, 0));
    }

    #[test]
    fn test_supervision_shortage_end_to_end() {
        let mut input = HouseholdInput::new("h1")
            .with_toggles(ConstraintToggles::none())
            .with_member(carer("carer"));
        for p in ["p1", "p2", "p3"] {
            input = input
                .with_member(FamilyMember::new(p, 80))
                .with_medication(
                    DoseRequirement::new("m", p, 1)
                        .supervised()
                        .with_original_times(vec![hm(8, 0)]),
                );
        }
        let config = OptimizerConfig::default().with_clustering_threshold(3);
        let plan = plan_household(&input, &config).unwrap();

        assert_eq!(plan.supervision.assignments.len(), 1);
        let shortages = plan.conflicts.of_type(ConflictType::SupervisionShortage);
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].affected_ids, vec!["p2", "p3"]);
        assert!(plan
            .recommendations
            .iter()
            .any(|r| r.code == ReasonCode::SupervisionShortage));
    }

    #[test]
    fn test_validation_errors_collected() {
        let input = HouseholdInput::new("h1")
            .with_member(FamilyMember::new("a", 30))
            .with_member(FamilyMember::new("a", 31))
            .with_medication(DoseRequirement::new("m", "ghost", -1));
        let err = plan_household(&input, &OptimizerConfig::default()).unwrap_err();
        match err {
            PlanError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OptimizerConfig::default().with_default_min_gap(0);
        let err = plan_household(&HouseholdInput::new("h1"), &config).unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn test_rejected_requirement_does_not_stop_plan() {
        let input = HouseholdInput::new("h1")
            .with_toggles(ConstraintToggles::none())
            .with_member(FamilyMember::new("p", 40))
            .with_medication(DoseRequirement::new("zero", "p", 0))
            .with_medication(DoseRequirement::new("ok", "p", 1));
        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(plan.schedule.medications.len(), 1);
        assert_eq!(plan.recommendations[0].code, ReasonCode::InvalidConfiguration);
        assert_eq!(plan.recommendations[0].medication_id.as_deref(), Some("zero"));
    }

    #[test]
    fn test_plan_households() {
        let config = OptimizerConfig::default();
        let a = HouseholdInput::new("a")
            .with_toggles(ConstraintToggles::none())
            .with_member(FamilyMember::new("p", 40))
            .with_medication(DoseRequirement::new("m", "p", 1));
        let b = HouseholdInput::new("b")
            .with_toggles(ConstraintToggles::none())
            .with_member(FamilyMember::new("q", 40))
            .with_medication(DoseRequirement::new("m", "q", 3));

        let plans = plan_households(&[a.clone(), b], &config).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].household_id(), "a");
        assert_eq!(plans[1].schedule.dose_count(), 3);

        let err = plan_households(&[a.clone(), a], &config).unwrap_err();
        assert!(err.to_string().contains("Duplicate household ID: a"));
    }

    #[test]
    fn test_deterministic() {
        crate::logging::init_test();
        let input = HouseholdInput::new("h1")
            .with_prayer_times(timetable())
            .with_culture("middle_eastern")
            .with_member(carer("c"))
            .with_member(FamilyMember::new("p", 80))
            .with_medication(DoseRequirement::new("a", "p", 3).with_timing(TimingPreference::AfterMeals).supervised())
            .with_medication(DoseRequirement::new("b", "p", 2).with_timing(TimingPreference::EmptyStomach));
        let config = OptimizerConfig::default();
        let first = plan_household(&input, &config).unwrap();
        let second = plan_household(&input, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_from_json() {
        let json = r#"{
            "household_id": "h1",
            "culture": "south_asian",
            "members": [
                { "id": "nani", "age": 78 },
                { "id": "ravi", "age": 45, "cultural_role": "adult_child",
                  "availability": [{ "start": 1260, "end": 420 }] }
            ],
            "medications": [
                { "medication_id": "insulin", "member_id": "nani",
                  "required_daily_count": 1, "supervision_required": true,
                  "original_times": [1320] }
            ],
            "toggles": { "prayer_avoidance": false, "meal_alignment": false }
        }"#;
        let input: HouseholdInput = serde_json::from_str(json).unwrap();
        assert!(input.fasting == FastingInput::inactive());

        let plan = plan_household(&input, &OptimizerConfig::default()).unwrap();
        // overnight availability is normalized into a wrapping window
        assert_eq!(plan.supervision.assignments.len(), 1);
        assert_eq!(plan.supervision.assignments[0].supervisor_id, "ravi");
        assert_eq!(plan.supervision.assignments[0].dose_time, hm(22, 0));
    }
}
