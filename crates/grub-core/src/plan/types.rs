//! Typed meal-plan structures.
//!
//! These are the only shapes handed to callers once an AI reply has been
//! normalized. Every plan serializes with all seven weekday keys present so
//! clients never need to special-case a missing day.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of alternative plans returned per generation request.
pub const MAX_PLANS: usize = 2;

// ---------------------------------------------------------------------------
// Weekday
// ---------------------------------------------------------------------------

/// Canonical weekday keys of a [`MealPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in calendar order, Monday first.
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// The exact key used in plan JSON (`"Monday"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Meal
// ---------------------------------------------------------------------------

/// A single meal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fats: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
}

impl Meal {
    /// A meal with only the required fields set.
    pub fn new(name: impl Into<String>, calories: f64, protein: f64) -> Self {
        Self {
            name: name.into(),
            calories,
            protein,
            carbs: None,
            fats: None,
            ingredients: None,
        }
    }
}

// ---------------------------------------------------------------------------
// MealPlan
// ---------------------------------------------------------------------------

/// A week of meals keyed by weekday, optionally labelled ("Plan A").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "Monday", default)]
    pub monday: Vec<Meal>,
    #[serde(rename = "Tuesday", default)]
    pub tuesday: Vec<Meal>,
    #[serde(rename = "Wednesday", default)]
    pub wednesday: Vec<Meal>,
    #[serde(rename = "Thursday", default)]
    pub thursday: Vec<Meal>,
    #[serde(rename = "Friday", default)]
    pub friday: Vec<Meal>,
    #[serde(rename = "Saturday", default)]
    pub saturday: Vec<Meal>,
    #[serde(rename = "Sunday", default)]
    pub sunday: Vec<Meal>,
}

impl MealPlan {
    /// An unlabelled plan with every day empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Meals scheduled for `day`.
    pub fn day(&self, day: Weekday) -> &[Meal] {
        match day.index() {
            0 => &self.monday,
            1 => &self.tuesday,
            2 => &self.wednesday,
            3 => &self.thursday,
            4 => &self.friday,
            5 => &self.saturday,
            _ => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut Vec<Meal> {
        match day.index() {
            0 => &mut self.monday,
            1 => &mut self.tuesday,
            2 => &mut self.wednesday,
            3 => &mut self.thursday,
            4 => &mut self.friday,
            5 => &mut self.saturday,
            _ => &mut self.sunday,
        }
    }

    /// Iterate over `(day, meal)` pairs in calendar order.
    pub fn meals(&self) -> impl Iterator<Item = (Weekday, &Meal)> {
        Weekday::ALL
            .into_iter()
            .flat_map(move |d| self.day(d).iter().map(move |m| (d, m)))
    }

    pub fn meal_count(&self) -> usize {
        Weekday::ALL.iter().map(|d| self.day(*d).len()).sum()
    }

    /// True when no day has any meal.
    pub fn is_empty(&self) -> bool {
        self.meal_count() == 0
    }
}

// ---------------------------------------------------------------------------
// PlanSet
// ---------------------------------------------------------------------------

/// The 1-2 alternative plans returned per generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanSet {
    pub plans: Vec<MealPlan>,
}

impl PlanSet {
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn first(&self) -> Option<&MealPlan> {
        self.plans.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MealPlan> {
        self.plans.iter()
    }
}

impl IntoIterator for PlanSet {
    type Item = MealPlan;
    type IntoIter = std::vec::IntoIter<MealPlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.into_iter()
    }
}
