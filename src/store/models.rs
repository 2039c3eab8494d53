//! Store models
//!
//! Rust structs for everything the local store holds. All models use serde
//! so the aggregate can be written as one JSON snapshot and the per-date
//! records can travel to the remote document store unchanged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    Athlete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Medicine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Identity, physiology and preferences for the signed-in (or guest) user.
/// `email` doubles as the partition key in the remote document store, so
/// `is_authenticated` is true exactly when `email` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub is_authenticated: bool,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            name: "Guest".to_string(),
            email: String::new(),
            height_cm: 170.0,
            weight_kg: 70.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
            goal: Goal::Maintain,
            onboarding_completed: false,
            photo_url: None,
            phone: None,
        }
    }
}

/// Partial profile update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub is_authenticated: Option<bool>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub onboarding_completed: Option<bool>,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
}

impl ProfilePatch {
    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(v) = self.is_authenticated {
            profile.is_authenticated = v;
        }
        if let Some(v) = self.name {
            profile.name = v;
        }
        if let Some(v) = self.email {
            profile.email = v;
        }
        if let Some(v) = self.height_cm {
            profile.height_cm = v;
        }
        if let Some(v) = self.weight_kg {
            profile.weight_kg = v;
        }
        if let Some(v) = self.age {
            profile.age = v;
        }
        if let Some(v) = self.gender {
            profile.gender = v;
        }
        if let Some(v) = self.activity_level {
            profile.activity_level = v;
        }
        if let Some(v) = self.goal {
            profile.goal = v;
        }
        if let Some(v) = self.onboarding_completed {
            profile.onboarding_completed = v;
        }
        if let Some(v) = self.photo_url {
            profile.photo_url = Some(v);
        }
        if let Some(v) = self.phone {
            profile.phone = Some(v);
        }
    }
}

/// A single consumed or planned food/medication item. Immutable once
/// created, removed only by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: String,
    pub meal_type: MealType,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Entry fields supplied by the caller; id and timestamp are assigned on
/// insertion.
#[derive(Debug, Clone, Deserialize)]
pub struct MealDraft {
    pub meal_type: MealType,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MealEntry {
    pub fn from_draft(draft: MealDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            meal_type: draft.meal_type,
            name: draft.name,
            calories: draft.calories,
            protein_g: draft.protein_g,
            carbs_g: draft.carbs_g,
            fat_g: draft.fat_g,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Actual consumption for one calendar date (YYYY-MM-DD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    pub date: String,
    #[serde(default)]
    pub entries: Vec<MealEntry>,
    /// Milliliters
    #[serde(default)]
    pub water_intake: u32,
}

impl DayLog {
    pub fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            entries: Vec::new(),
            water_intake: 0,
        }
    }
}

/// Intended consumption for one calendar date. Kept in a separate mapping
/// so a date has independent log and plan records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: String,
    #[serde(default)]
    pub entries: Vec<MealEntry>,
    #[serde(default)]
    pub total_calories: f64,
}

impl DayPlan {
    pub fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            entries: Vec::new(),
            total_calories: 0.0,
        }
    }

    /// Aggregate figure kept in lockstep with the entry list
    pub fn recompute_total(&mut self) {
        self.total_calories = self.entries.iter().map(|e| e.calories).sum();
    }
}

/// A saved recipe reference. The id is assigned by the remote store, so an
/// item cannot exist while unauthenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeBookItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Where the recipe came from, e.g. "community" or "manual"
    pub source: String,
    /// Epoch milliseconds
    pub added_at: i64,
}

/// Recipe fields supplied by the caller; id and added_at are assigned when
/// the remote store accepts the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub source: String,
}

/// Medication alert definition. The scanner only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub medicine_name: String,
    /// Time of day as "HH:MM"
    pub time: String,
    pub enabled: bool,
    #[serde(default)]
    pub notes: String,
    /// Epoch milliseconds
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderDraft {
    pub medicine_name: String,
    pub time: String,
    pub enabled: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Reminder {
    pub fn from_draft(draft: ReminderDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medicine_name: draft.medicine_name,
            time: draft.time,
            enabled: draft.enabled,
            notes: draft.notes,
            created_at: Utc::now().timestamp_millis(),
            phone: draft.phone,
        }
    }
}

/// Which of the two notification windows a reminder currently falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPhase {
    Upcoming,
    Due,
}

impl ReminderPhase {
    /// Short code used in de-duplication keys and notification tags
    pub fn code(self) -> &'static str {
        match self {
            ReminderPhase::Upcoming => "pre",
            ReminderPhase::Due => "now",
        }
    }
}

/// Persisted record of the last day a reminder was announced per phase.
/// The local store is the authority for de-duplication, not the remote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderMark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcoming_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_day: Option<String>,
}

/// Summed macros for one logged date, fed to the weekly insight prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// The whole-store aggregate persisted to device storage as one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub logs: HashMap<String, DayLog>,
    #[serde(default)]
    pub plans: HashMap<String, DayPlan>,
    #[serde(default)]
    pub recipe_book: Vec<RecipeBookItem>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    /// Reminder id -> last notified day per phase
    #[serde(default)]
    pub notified: HashMap<String, ReminderMark>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub medicine_mode: bool,
    /// Personal generation-service key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Shared fallback key fetched from the global settings document
    #[serde(default)]
    pub shared_api_key: Option<String>,
}
