//! Cultural schedule optimizer.
//!
//! # Algorithm
//!
//! 1. Select candidate windows for the dose's timing preference: the
//!    fasting windows while a fast is active (unless the dose is
//!    food-independent), meal-aligned sub-windows otherwise, or point
//!    windows at the anchor times (original times, else the default spread).
//! 2. Distribute the daily count over the windows in chronological order.
//!    Fewer doses than windows: pick windows evenly, first and last
//!    included. More doses than windows: each window holds
//!    `1 + floor(length / min_gap)`; surplus goes chronologically to
//!    windows with room; whatever no window holds is unresolved.
//! 3. Place each dose at its target (window midpoint, or packed position
//!    `min_gap` apart centred in the window). If the target is invalid,
//!    scan outward in `scan_step` increments, later before earlier, up to
//!    `search_extension` beyond the search area. The search area is the
//!    window itself; an anchor point reaches halfway to its neighbouring
//!    anchors (the whole day when it is alone).
//! 4. Record adaptations and score the result.
//!
//! A time is invalid when it lies strictly inside an enabled avoidance
//! window, strictly inside the fasting daytime exclusion (unless
//! food-independent), duplicates a dose of the same medication, or is closer
//! than `min_gap` to a dose packed in the same window.
//!
//! # Complexity
//! O(d * w + d * s * d) where d=doses, w=windows, s=scan positions.

use tracing::{debug, warn};

use super::AdherenceKpi;
use crate::config::OptimizerConfig;
use crate::error::{Reported, SchedulingIssue};
use crate::models::{
    normalize, signed_offset, AdaptationType, AvoidanceSource, CulturalAdaptation,
    DoseRequirement, FastingPeriod, MealWindow, MedicationSchedule, Minute, OptimizedDose,
    OptimizedSchedule, TimeWindow, TimingPreference, MINUTES_PER_DAY,
};
use crate::windows::{AvoidanceSet, CandidateWindow, MealPatternResolver, WindowOrigin};

/// Window sets for one household-day, already filtered by the constraint toggles.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    /// Meal windows, chronological. Empty when meal alignment is off.
    pub meals: &'a [MealWindow],
    /// Merged avoidance windows (prayer, routine, festival).
    pub avoidance: &'a AvoidanceSet,
    /// Fasting period; inactive when fasting is off.
    pub fasting: &'a FastingPeriod,
}

impl<'a> DayContext<'a> {
    /// Creates a context.
    pub fn new(meals: &'a [MealWindow], avoidance: &'a AvoidanceSet, fasting: &'a FastingPeriod) -> Self {
        Self {
            meals,
            avoidance,
            fasting,
        }
    }
}

/// One dose position to fill.
#[derive(Debug, Clone, Copy)]
struct Slot {
    target: Minute,
    window: usize,
    /// No window had room; placed best-effort and unresolved.
    surplus: bool,
}

/// Converts dose requirements into concrete, culturally adapted times.
///
/// # Example
///
/// ```
/// use u_dose::config::OptimizerConfig;
/// use u_dose::models::{hm, DoseRequirement, FastingPeriod};
/// use u_dose::scheduler::{DayContext, ScheduleOptimizer};
/// use u_dose::windows::AvoidanceSet;
///
/// let config = OptimizerConfig::default();
/// let avoidance = AvoidanceSet::empty();
/// let fasting = FastingPeriod::inactive();
/// let day = DayContext::new(&[], &avoidance, &fasting);
///
/// let requirement = DoseRequirement::new("metformin", "nani", 2);
/// let schedule = ScheduleOptimizer::new(&config).optimize(&requirement, &day).unwrap().value;
/// assert_eq!(schedule.adjusted_times(), vec![hm(8, 0), hm(20, 0)]);
/// assert_eq!(schedule.adherence_score, 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptimizer<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> ScheduleOptimizer<'a> {
    /// Creates an optimizer over a validated configuration.
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimizes every requirement of a household.
    ///
    /// Rejected requirements are left out and reported as issues.
    pub fn optimize_all(
        &self,
        household_id: &str,
        requirements: &[DoseRequirement],
        day: &DayContext<'_>,
    ) -> OptimizedSchedule {
        let mut schedule = OptimizedSchedule::new(household_id);
        for requirement in requirements {
            match self.optimize(requirement, day) {
                Ok(reported) => {
                    let medication = reported.drain_into(&mut schedule.issues);
                    schedule.add_medication(medication);
                }
                Err(issue) => {
                    warn!(requirement = %requirement.key(), %issue, "dose requirement rejected");
                    schedule.add_issue(issue);
                }
            }
        }
        schedule
    }

    /// Optimizes one requirement.
    ///
    /// # Errors
    /// [`SchedulingIssue::InvalidConfiguration`] for a non-positive count,
    /// a count above `max_daily_count`, a non-positive minimum gap, or
    /// original times that do not match the count. Unplaceable doses are not errors: they come back
    /// unresolved with an [`SchedulingIssue::InfeasibleSchedule`].
    pub fn optimize(
        &self,
        requirement: &DoseRequirement,
        day: &DayContext<'_>,
    ) -> Result<Reported<MedicationSchedule>, SchedulingIssue> {
        let key = requirement.key();
        if requirement.required_daily_count <= 0 {
            return Err(SchedulingIssue::invalid(
                key,
                format!("dose count {} is not positive", requirement.required_daily_count),
            ));
        }
        let count = requirement.required_daily_count as usize;
        if count > self.config.max_daily_count {
            return Err(SchedulingIssue::invalid(
                key,
                format!(
                    "dose count {count} exceeds the daily maximum {}",
                    self.config.max_daily_count
                ),
            ));
        }

        let gap = requirement
            .min_gap_minutes
            .unwrap_or(self.config.default_min_gap);
        if gap <= 0 {
            return Err(SchedulingIssue::invalid(
                key,
                format!("minimum gap {gap} is not positive"),
            ));
        }

        if !requirement.original_times.is_empty() && requirement.original_times.len() != count {
            return Err(SchedulingIssue::invalid(
                key,
                format!(
                    "{} original times for {} doses",
                    requirement.original_times.len(),
                    count
                ),
            ));
        }

        let mut anchors: Vec<Minute> = if requirement.original_times.is_empty() {
            self.default_spread(count)
        } else {
            requirement.original_times.iter().map(|&t| normalize(t)).collect()
        };
        anchors.sort_unstable();

        let restricted = day.fasting.active && requirement.restricted_while_fasting();
        let windows = self.candidate_windows(requirement, &anchors, day);
        let areas = search_areas(&windows);
        let slots = self.slots(&windows, count, gap);

        let mut placed: Vec<Minute> = Vec::with_capacity(count);
        let mut packed: Vec<Vec<Minute>> = vec![Vec::new(); windows.len()];
        let mut doses: Vec<OptimizedDose> = Vec::with_capacity(count);

        for (slot, &original) in slots.iter().zip(&anchors) {
            let candidate = &windows[slot.window];

            let found = if slot.surplus {
                None
            } else {
                let siblings = &packed[slot.window];
                let taken = &placed;
                self.scan(slot.target, &areas[slot.window], |t| {
                    self.admits(t, day, restricted)
                        && !taken.contains(&t)
                        && siblings.iter().all(|&s| signed_offset(s, t).abs() >= gap)
                })
            };

            let (adjusted, unresolved) = match found {
                Some(t) => (t, false),
                None => (self.best_effort(slot.target, &areas[slot.window], day, restricted, &placed), true),
            };
            placed.push(adjusted);
            if !unresolved {
                packed[slot.window].push(adjusted);
            }

            doses.push(OptimizedDose {
                dose_index: 0,
                original_time: original,
                adjusted_time: adjusted,
                adaptations: self.adaptations(original, slot.target, adjusted, candidate.origin, day, restricted),
                source_window_id: candidate.id.clone(),
                unresolved,
            });
        }

        doses.sort_by_key(|d| (d.adjusted_time, d.original_time));
        for (index, dose) in doses.iter_mut().enumerate() {
            dose.dose_index = index;
        }

        let kpi = AdherenceKpi::calculate(&doses, &self.config.score);
        debug!(
            requirement = %key,
            windows = windows.len(),
            unresolved = kpi.unresolved_doses,
            score = kpi.score,
            "medication optimized"
        );

        let schedule = MedicationSchedule {
            medication_id: requirement.medication_id.clone(),
            member_id: requirement.member_id.clone(),
            supervision_required: requirement.supervision_required,
            doses,
            adherence_score: kpi.score,
        };

        if kpi.unresolved_doses > 0 {
            warn!(requirement = %key, unresolved = kpi.unresolved_doses, "doses left unresolved");
            return Ok(Reported::with_issue(
                schedule,
                SchedulingIssue::InfeasibleSchedule {
                    subject: key,
                    unresolved: kpi.unresolved_doses,
                },
            ));
        }
        Ok(Reported::ok(schedule))
    }

    /// Even spread over the waking span, starting at its start.
    ///
    /// Spacing is `min(1440 / n, span / (n - 1))`: twice daily gives 08:00
    /// and 20:00 with the default span.
    pub fn default_spread(&self, count: usize) -> Vec<Minute> {
        let start = self.config.waking_start;
        if count <= 1 {
            return vec![normalize(start); count];
        }
        let n = count as Minute;
        let span = self.config.waking_end - start;
        let step = (MINUTES_PER_DAY / n).min(span / (n - 1));
        (0..n).map(|i| normalize(start + i * step)).collect()
    }

    /// Candidate windows for a requirement, in chronological order.
    pub fn candidate_windows(
        &self,
        requirement: &DoseRequirement,
        anchors: &[Minute],
        day: &DayContext<'_>,
    ) -> Vec<CandidateWindow> {
        if day.fasting.active && requirement.restricted_while_fasting() {
            let slots = day.fasting.slots();
            if !slots.is_empty() {
                return chronological(
                    slots
                        .into_iter()
                        .map(|(slot, w)| {
                            CandidateWindow::new(format!("fasting:{slot}"), w, WindowOrigin::Fasting(slot))
                        })
                        .collect(),
                );
            }
        }

        let c = self.config;
        let aligned = match requirement.timing {
            TimingPreference::BeforeMeals => MealPatternResolver::before_meals(day.meals, c.before_meal_lead),
            TimingPreference::AfterMeals => MealPatternResolver::after_meals(day.meals, c.after_meal_lag),
            TimingPreference::WithFood => MealPatternResolver::with_food(day.meals),
            TimingPreference::EmptyStomach if !day.meals.is_empty() => MealPatternResolver::empty_stomach(
                day.meals,
                day.avoidance,
                c.empty_stomach_clearance,
                c.waking_span(),
            ),
            _ => Vec::new(),
        };
        if !aligned.is_empty() {
            return chronological(aligned);
        }

        anchors
            .iter()
            .enumerate()
            .map(|(i, &t)| CandidateWindow::new(format!("anchor:{i}"), TimeWindow::point(t), WindowOrigin::Anchor))
            .collect()
    }

    /// Dose positions, ordered by target time.
    fn slots(&self, windows: &[CandidateWindow], count: usize, gap: Minute) -> Vec<Slot> {
        if windows.is_empty() {
            return Vec::new();
        }
        let per_window = distribute(windows, count, gap);
        let held: usize = per_window.iter().sum();

        let mut slots: Vec<Slot> = Vec::with_capacity(count);
        for (index, (candidate, &k)) in windows.iter().zip(&per_window).enumerate() {
            for target in packed_targets(&candidate.window, k, gap) {
                slots.push(Slot {
                    target,
                    window: index,
                    surplus: false,
                });
            }
        }

        // Surplus doses aim at the roomiest window.
        let roomiest = windows
            .iter()
            .enumerate()
            .max_by_key(|(i, w)| (w.window.duration(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        for _ in held..count {
            slots.push(Slot {
                target: windows[roomiest].window.midpoint(),
                window: roomiest,
                surplus: true,
            });
        }

        slots.sort_by_key(|s| (s.target, s.surplus, s.window));
        slots
    }

    /// Outward scan from `target`: the target itself, then `target + step`,
    /// `target - step`, `target + 2*step`, ... within the search area
    /// extended by the search extension.
    fn scan(&self, target: Minute, window: &TimeWindow, is_valid: impl Fn(Minute) -> bool) -> Option<Minute> {
        if is_valid(target) {
            return Some(target);
        }
        let extension = self.config.search_extension;
        let offset = window.offset_of(target).min(window.duration());
        let later_limit = window.duration() - offset + extension;
        let earlier_limit = offset + extension;
        let reach = later_limit.max(earlier_limit).min(MINUTES_PER_DAY);

        let step = self.config.scan_step;
        let mut d = step;
        while d <= reach {
            if d <= later_limit {
                let t = normalize(target + d);
                if is_valid(t) {
                    return Some(t);
                }
            }
            if d <= earlier_limit {
                let t = normalize(target - d);
                if is_valid(t) {
                    return Some(t);
                }
            }
            d += step;
        }
        None
    }

    /// Avoidance and fasting checks shared by placement and best effort.
    fn admits(&self, t: Minute, day: &DayContext<'_>, restricted: bool) -> bool {
        !day.avoidance.is_blocked(t) && !(restricted && day.fasting.excludes(t))
    }

    /// Time for an unresolved dose: the nearest admissible unused time in
    /// reach, else the nearest unused minute.
    fn best_effort(
        &self,
        target: Minute,
        window: &TimeWindow,
        day: &DayContext<'_>,
        restricted: bool,
        placed: &[Minute],
    ) -> Minute {
        self.scan(target, window, |t| self.admits(t, day, restricted) && !placed.contains(&t))
            .unwrap_or_else(|| {
                (0..MINUTES_PER_DAY)
                    .flat_map(|d| [normalize(target + d), normalize(target - d)])
                    .find(|t| !placed.contains(t))
                    .unwrap_or(target)
            })
    }

    fn adaptations(
        &self,
        original: Minute,
        target: Minute,
        adjusted: Minute,
        origin: WindowOrigin,
        day: &DayContext<'_>,
        restricted: bool,
    ) -> Vec<CulturalAdaptation> {
        let mut out = Vec::new();

        let alignment = signed_offset(original, target);
        if alignment != 0 {
            match origin {
                WindowOrigin::Fasting(slot) => out.push(
                    CulturalAdaptation::new(AdaptationType::FastingAccommodation, alignment)
                        .with_detail(slot.as_str()),
                ),
                WindowOrigin::Meal(meal) => out.push(
                    CulturalAdaptation::new(AdaptationType::MealAlignment, alignment).with_detail(meal.as_str()),
                ),
                WindowOrigin::FreeInterval => out.push(
                    CulturalAdaptation::new(AdaptationType::MealAlignment, alignment).with_detail("empty_stomach"),
                ),
                WindowOrigin::Anchor => {}
            }
        }

        let shift = signed_offset(target, adjusted);
        if shift != 0 {
            let blocker = day
                .avoidance
                .blocking(target)
                .into_iter()
                .flat_map(|w| w.sources.iter())
                .min_by_key(|s| source_adaptation(s));
            match blocker {
                Some(source) => {
                    let detail = match source {
                        AvoidanceSource::Prayer(p) => p.as_str().to_string(),
                        AvoidanceSource::FamilyRoutine(label) | AvoidanceSource::Festival(label) => label.clone(),
                    };
                    out.push(CulturalAdaptation::new(source_adaptation(source), shift).with_detail(detail));
                }
                None if restricted && day.fasting.excludes(target) => out.push(
                    CulturalAdaptation::new(AdaptationType::FastingAccommodation, shift).with_detail("daytime"),
                ),
                None => {}
            }
        }

        out.sort_by_key(|a| a.adaptation_type);
        out
    }
}

/// Adaptation type an avoidance source produces.
fn source_adaptation(source: &AvoidanceSource) -> AdaptationType {
    match source {
        AvoidanceSource::Prayer(_) => AdaptationType::PrayerAvoidance,
        AvoidanceSource::FamilyRoutine(_) => AdaptationType::FamilyRoutine,
        AvoidanceSource::Festival(_) => AdaptationType::FestivalAdjustment,
    }
}

/// Area the scan may cover for each candidate window.
fn search_areas(windows: &[CandidateWindow]) -> Vec<TimeWindow> {
    if windows.iter().any(|c| c.origin != WindowOrigin::Anchor) {
        return windows.iter().map(|c| c.window).collect();
    }
    let anchors: Vec<Minute> = windows.iter().map(|c| c.window.start).collect();
    (0..anchors.len()).map(|i| anchor_reach(&anchors, i)).collect()
}

/// Halfway to the nearest distinct anchor on each side; the whole day
/// when there is none.
fn anchor_reach(anchors: &[Minute], i: usize) -> TimeWindow {
    let at = anchors[i];
    let back = anchors.iter().map(|&a| normalize(at - a)).filter(|&d| d > 0).min();
    let ahead = anchors.iter().map(|&a| normalize(a - at)).filter(|&d| d > 0).min();
    match (back, ahead) {
        (Some(back), Some(ahead)) => TimeWindow::new(at - back / 2, at + ahead / 2),
        _ => TimeWindow::full_day(),
    }
}

fn chronological(mut windows: Vec<CandidateWindow>) -> Vec<CandidateWindow> {
    windows.sort_by(|a, b| (a.window.start, &a.id).cmp(&(b.window.start, &b.id)));
    windows
}

/// Doses a window can hold at `gap` spacing.
fn capacity(window: &TimeWindow, gap: Minute) -> usize {
    let length = window.duration();
    let held = if length >= MINUTES_PER_DAY {
        length / gap
    } else {
        1 + length / gap
    };
    held.max(1) as usize
}

/// Doses per window. The sum falls short of `count` when capacity runs out.
fn distribute(windows: &[CandidateWindow], count: usize, gap: Minute) -> Vec<usize> {
    let w = windows.len();
    let mut per_window = vec![0usize; w];

    if count <= w {
        if count == 1 {
            per_window[0] = 1;
        } else {
            // round(i * (w-1) / (count-1)); distinct because the step is >= 1
            let (span, steps) = (w - 1, count - 1);
            for i in 0..count {
                per_window[(i * span + steps / 2) / steps] = 1;
            }
        }
        return per_window;
    }

    let caps: Vec<usize> = windows.iter().map(|c| capacity(&c.window, gap)).collect();
    per_window.iter_mut().for_each(|k| *k = 1);
    let mut remaining = count - w;
    while remaining > 0 {
        let mut progressed = false;
        for (k, &cap) in per_window.iter_mut().zip(&caps) {
            if remaining > 0 && *k < cap {
                *k += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    per_window
}

/// Targets for `k` doses in a window: the midpoint for one, otherwise
/// `gap` apart and centred.
fn packed_targets(window: &TimeWindow, k: usize, gap: Minute) -> Vec<Minute> {
    match k {
        0 => Vec::new(),
        1 => vec![window.midpoint()],
        _ => {
            let span = (k as Minute - 1) * gap;
            let lead = ((window.duration() - span) / 2).max(0);
            (0..k as Minute)
                .map(|j| normalize(window.start + lead + j * gap))
                .collect()
        }
    }
}
