//! Meal pattern resolver.
//!
//! Maps a cultural/dietary category to meal windows through a
//! configurable catalog, then derives the sub-windows each timing
//! preference aligns to:
//!
//! | Preference | Sub-window |
//! |------------|-----------|
//! | before_meals | `[meal_start - lead, meal_start)` |
//! | after_meals | `(meal_end, meal_end + lag]` |
//! | with_food | the meal window itself |
//! | empty_stomach | free time (no meal, no avoidance) at least `clearance` from any meal |
//!
//! New cultures are catalog entries, not code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::{AvoidanceSet, CandidateWindow, WindowOrigin};
use crate::error::{ConstraintKind, Reported, SchedulingIssue};
use crate::models::{hm, time_window, MealType, MealWindow, Minute, TimeWindow};

/// Category used when a profile names an unknown category.
pub const FALLBACK_CATEGORY: &str = "standard";

/// Meal windows per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealPatternCatalog {
    pub patterns: BTreeMap<String, Vec<MealWindow>>,
}

fn pattern(context: &str, meals: &[(MealType, (i32, i32), (i32, i32))]) -> Vec<MealWindow> {
    meals
        .iter()
        .map(|&(meal, (sh, sm), (eh, em))| {
            MealWindow::new(meal, TimeWindow::new(hm(sh, sm), hm(eh, em))).with_context(context)
        })
        .collect()
}

impl Default for MealPatternCatalog {
    fn default() -> Self {
        use MealType::*;
        let entries = [
            (
                "standard",
                pattern(
                    "standard",
                    &[(Breakfast, (7, 0), (8, 0)), (Lunch, (12, 0), (13, 0)), (Dinner, (18, 0), (19, 0))],
                ),
            ),
            (
                "south_asian",
                pattern(
                    "south_asian",
                    &[(Breakfast, (8, 0), (9, 0)), (Lunch, (13, 0), (14, 0)), (Dinner, (20, 0), (21, 0))],
                ),
            ),
            (
                "middle_eastern",
                pattern(
                    "middle_eastern",
                    &[(Breakfast, (7, 30), (8, 30)), (Lunch, (13, 30), (14, 30)), (Dinner, (20, 0), (21, 0))],
                ),
            ),
            (
                "east_asian",
                pattern(
                    "east_asian",
                    &[(Breakfast, (7, 0), (7, 30)), (Lunch, (12, 0), (13, 0)), (Dinner, (18, 0), (19, 0))],
                ),
            ),
            (
                "mediterranean",
                pattern(
                    "mediterranean",
                    &[(Breakfast, (8, 0), (9, 0)), (Lunch, (14, 0), (15, 0)), (Dinner, (21, 0), (22, 0))],
                ),
            ),
            (
                "latin_american",
                pattern(
                    "latin_american",
                    &[(Breakfast, (7, 0), (8, 0)), (Lunch, (13, 0), (14, 0)), (Supper, (20, 0), (21, 0))],
                ),
            ),
        ];
        Self {
            patterns: entries
                .into_iter()
                .map(|(name, meals)| (name.to_string(), meals))
                .collect(),
        }
    }
}

impl MealPatternCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            patterns: BTreeMap::new(),
        }
    }

    /// Adds or replaces a category.
    pub fn with_pattern(mut self, category: impl Into<String>, meals: Vec<MealWindow>) -> Self {
        self.patterns.insert(category.into(), meals);
        self
    }

    /// Meal windows for a category.
    pub fn get(&self, category: &str) -> Option<&[MealWindow]> {
        self.patterns.get(category).map(Vec::as_slice)
    }
}

/// Resolves meal windows and the sub-windows aligned to them.
#[derive(Debug, Clone)]
pub struct MealPatternResolver<'a> {
    catalog: &'a MealPatternCatalog,
}

impl<'a> MealPatternResolver<'a> {
    /// Creates a resolver over a catalog.
    pub fn new(catalog: &'a MealPatternCatalog) -> Self {
        Self { catalog }
    }

    /// Meal windows for a category, sorted chronologically.
    ///
    /// An unknown category falls back to [`FALLBACK_CATEGORY`] and reports
    /// missing data; if the fallback is also absent the result is empty.
    pub fn resolve(&self, category: &str) -> Reported<Vec<MealWindow>> {
        if let Some(meals) = self.catalog.get(category) {
            return Reported::ok(sorted(meals.to_vec()));
        }
        warn!(category, "unknown meal category, using fallback pattern");
        let meals = self
            .catalog
            .get(FALLBACK_CATEGORY)
            .map(|m| sorted(m.to_vec()))
            .unwrap_or_default();
        Reported::with_issue(
            meals,
            SchedulingIssue::missing(
                ConstraintKind::MealAlignment,
                format!("unknown meal category '{category}'"),
            ),
        )
    }

    /// Windows just before each meal.
    pub fn before_meals(meals: &[MealWindow], lead: Minute) -> Vec<CandidateWindow> {
        meals
            .iter()
            .map(|m| {
                CandidateWindow::new(
                    format!("before_meal:{}", m.meal_type),
                    TimeWindow::new(m.window.start - lead, m.window.start),
                    WindowOrigin::Meal(m.meal_type),
                )
            })
            .collect()
    }

    /// Windows just after each meal.
    pub fn after_meals(meals: &[MealWindow], lag: Minute) -> Vec<CandidateWindow> {
        meals
            .iter()
            .map(|m| {
                let end = m.window.start + m.window.duration();
                CandidateWindow::new(
                    format!("after_meal:{}", m.meal_type),
                    TimeWindow::new(end, end + lag),
                    WindowOrigin::Meal(m.meal_type),
                )
            })
            .collect()
    }

    /// The meal windows themselves.
    pub fn with_food(meals: &[MealWindow]) -> Vec<CandidateWindow> {
        meals
            .iter()
            .map(|m| {
                CandidateWindow::new(
                    format!("with_food:{}", m.meal_type),
                    m.window,
                    WindowOrigin::Meal(m.meal_type),
                )
            })
            .collect()
    }

    /// Free intervals at least `clearance` minutes from every meal and
    /// outside all enabled avoidance windows, restricted to `span` when
    /// that leaves anything.
    pub fn empty_stomach(
        meals: &[MealWindow],
        avoidance: &AvoidanceSet,
        clearance: Minute,
        span: TimeWindow,
    ) -> Vec<CandidateWindow> {
        let mut blocked: Vec<TimeWindow> = meals.iter().map(|m| m.window.expand(clearance)).collect();
        blocked.extend(avoidance.enabled_intervals());
        let free = time_window::complement(&blocked);

        let in_span = time_window::intersect(&free, &[span]);
        let chosen = if in_span.is_empty() {
            time_window::rejoin_midnight(free)
        } else {
            in_span
        };

        chosen
            .into_iter()
            .enumerate()
            .map(|(i, w)| CandidateWindow::new(format!("empty_stomach:{i}"), w, WindowOrigin::FreeInterval))
            .collect()
    }
}

fn sorted(mut meals: Vec<MealWindow>) -> Vec<MealWindow> {
    meals.sort_by_key(|m| (m.window.start, m.meal_type));
    meals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvoidanceWindow, Prayer};

    fn meals() -> Vec<MealWindow> {
        MealPatternCatalog::default().get("standard").unwrap().to_vec()
    }

    #[test]
    fn test_resolve_known_category() {
        let catalog = MealPatternCatalog::default();
        let built = MealPatternResolver::new(&catalog).resolve("south_asian");
        assert!(built.issues.is_empty());
        assert_eq!(built.value.len(), 3);
        assert_eq!(built.value[0].meal_type, MealType::Breakfast);
        assert_eq!(built.value[2].window, TimeWindow::new(hm(20, 0), hm(21, 0)));
        assert_eq!(built.value[0].cultural_context, "south_asian");
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let catalog = MealPatternCatalog::default();
        let built = MealPatternResolver::new(&catalog).resolve("martian");
        assert_eq!(built.value.len(), 3);
        assert_eq!(built.value[0].cultural_context, "standard");
        assert_eq!(built.issues.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_without_fallback_is_empty() {
        let catalog = MealPatternCatalog::empty();
        let built = MealPatternResolver::new(&catalog).resolve("martian");
        assert!(built.value.is_empty());
    }

    #[test]
    fn test_custom_catalog_entry() {
        let catalog = MealPatternCatalog::empty().with_pattern(
            "shift_worker",
            vec![MealWindow::new(MealType::Supper, TimeWindow::new(hm(2, 0), hm(2, 30)))],
        );
        let built = MealPatternResolver::new(&catalog).resolve("shift_worker");
        assert_eq!(built.value[0].meal_type, MealType::Supper);
    }

    #[test]
    fn test_before_and_after_windows() {
        let before = MealPatternResolver::before_meals(&meals(), 30);
        assert_eq!(before[0].window, TimeWindow::new(hm(6, 30), hm(7, 0)));
        assert_eq!(before[0].id, "before_meal:breakfast");

        let after = MealPatternResolver::after_meals(&meals(), 60);
        assert_eq!(after[2].window, TimeWindow::new(hm(19, 0), hm(20, 0)));
        assert_eq!(after[2].origin, WindowOrigin::Meal(MealType::Dinner));
    }

    #[test]
    fn test_with_food_is_meal() {
        let with = MealPatternResolver::with_food(&meals());
        assert_eq!(with[1].window, TimeWindow::new(hm(12, 0), hm(13, 0)));
    }

    #[test]
    fn test_empty_stomach_clearance() {
        let free = MealPatternResolver::empty_stomach(
            &meals(),
            &AvoidanceSet::empty(),
            120,
            TimeWindow::new(hm(8, 0), hm(22, 0)),
        );
        // meals expanded by 2h: 05:00-10:00, 10:00-15:00, 16:00-21:00
        let windows: Vec<TimeWindow> = free.iter().map(|c| c.window).collect();
        assert_eq!(
            windows,
            vec![
                TimeWindow::new(hm(15, 0), hm(16, 0)),
                TimeWindow::new(hm(21, 0), hm(22, 0)),
            ]
        );
    }

    #[test]
    fn test_empty_stomach_respects_avoidance() {
        let avoidance = AvoidanceSet::new(vec![AvoidanceWindow::prayer(Prayer::Asr, hm(15, 30), 30)]);
        let free = MealPatternResolver::empty_stomach(
            &meals(),
            &avoidance,
            120,
            TimeWindow::new(hm(8, 0), hm(22, 0)),
        );
        let windows: Vec<TimeWindow> = free.iter().map(|c| c.window).collect();
        assert_eq!(windows, vec![TimeWindow::new(hm(21, 0), hm(22, 0))]);
    }

    #[test]
    fn test_empty_stomach_falls_back_outside_span() {
        let free = MealPatternResolver::empty_stomach(
            &meals(),
            &AvoidanceSet::empty(),
            120,
            TimeWindow::new(hm(10, 0), hm(14, 0)),
        );
        // nothing in 10:00-14:00; overnight 21:00-05:00 is used instead
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].window, TimeWindow::new(hm(21, 0), hm(5, 0)));
        assert!(free[0].window.contains(hm(0, 0)));
    }
}
