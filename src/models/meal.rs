//! Meal windows.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TimeWindow;

/// Meal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Supper,
}

impl MealType {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Supper => "supper",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A meal and the time it is usually eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealWindow {
    /// When the meal is eaten.
    pub window: TimeWindow,
    /// Which meal.
    pub meal_type: MealType,
    /// Cultural pattern this window came from (e.g. "south_asian").
    #[serde(default)]
    pub cultural_context: String,
}

impl MealWindow {
    /// Creates a meal window.
    pub fn new(meal_type: MealType, window: TimeWindow) -> Self {
        Self {
            window,
            meal_type,
            cultural_context: String::new(),
        }
    }

    /// Sets the cultural context tag.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.cultural_context = context.into();
        self
    }
}
