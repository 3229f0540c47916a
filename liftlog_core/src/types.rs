//! Core domain types for the liftlog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Catalogue exercises and their categories/muscle groups
//! - Logged workouts and the in-progress draft
//! - The user profile and application settings singletons
//!
//! Field names serialize in camelCase, which is the interchange format of
//! the export document.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// Body region targeted by an exercise.
///
/// The seven named groups are the fixed set used by the built-in catalogue;
/// custom exercises may carry any other label.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Arms,
    Shoulders,
    Abs,
    Cardio,
    Other(String),
}

impl MuscleGroup {
    /// The fixed groups, in catalogue order
    pub const FIXED: [MuscleGroup; 7] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Legs,
        MuscleGroup::Arms,
        MuscleGroup::Shoulders,
        MuscleGroup::Abs,
        MuscleGroup::Cardio,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Arms => "arms",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Abs => "abs",
            MuscleGroup::Cardio => "cardio",
            MuscleGroup::Other(label) => label,
        }
    }
}

impl From<String> for MuscleGroup {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "chest" => MuscleGroup::Chest,
            "back" => MuscleGroup::Back,
            "legs" => MuscleGroup::Legs,
            "arms" => MuscleGroup::Arms,
            "shoulders" => MuscleGroup::Shoulders,
            "abs" => MuscleGroup::Abs,
            "cardio" => MuscleGroup::Cardio,
            _ => MuscleGroup::Other(label),
        }
    }
}

impl From<&str> for MuscleGroup {
    fn from(label: &str) -> Self {
        MuscleGroup::from(label.to_string())
    }
}

impl From<MuscleGroup> for String {
    fn from(group: MuscleGroup) -> Self {
        match group {
            MuscleGroup::Other(label) => label,
            fixed => fixed.as_str().to_string(),
        }
    }
}

impl FromStr for MuscleGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::Validation("muscle group must not be empty".into()));
        }
        Ok(MuscleGroup::from(s))
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
    Sports,
    Custom,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::Cardio => "cardio",
            ExerciseCategory::Flexibility => "flexibility",
            ExerciseCategory::Sports => "sports",
            ExerciseCategory::Custom => "custom",
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(ExerciseCategory::Strength),
            "cardio" => Ok(ExerciseCategory::Cardio),
            "flexibility" => Ok(ExerciseCategory::Flexibility),
            "sports" => Ok(ExerciseCategory::Sports),
            "custom" => Ok(ExerciseCategory::Custom),
            other => Err(Error::Validation(format!(
                "unknown exercise category '{}'",
                other
            ))),
        }
    }
}

/// A catalogue entry (e.g., "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub calories_per_rep: f64,
    pub muscle_group: MuscleGroup,
    pub category: ExerciseCategory,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Exercise {
    /// Check field-level constraints
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("exercise name must not be empty".into()));
        }
        if !self.calories_per_rep.is_finite() || self.calories_per_rep < 0.0 {
            return Err(Error::Validation(format!(
                "caloriesPerRep must be a non-negative number, got {}",
                self.calories_per_rep
            )));
        }
        if let MuscleGroup::Other(label) = &self.muscle_group {
            if label.trim().is_empty() {
                return Err(Error::Validation("muscle group must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Definition of a new custom exercise.
///
/// There is no `is_custom` field: anything added through the store is custom.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewExercise {
    pub name: String,
    pub calories_per_rep: f64,
    pub muscle_group: MuscleGroup,
    pub category: ExerciseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewExercise {
    /// Build the catalogue entry with a fresh id
    pub fn into_exercise(self) -> Exercise {
        Exercise {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            calories_per_rep: self.calories_per_rep,
            muscle_group: self.muscle_group,
            category: self.category,
            is_custom: true,
            description: self.description,
        }
    }
}

impl From<Exercise> for NewExercise {
    fn from(exercise: Exercise) -> Self {
        NewExercise {
            name: exercise.name,
            calories_per_rep: exercise.calories_per_rep,
            muscle_group: exercise.muscle_group,
            category: exercise.category,
            description: exercise.description,
        }
    }
}

// ============================================================================
// Workout Types
// ============================================================================

/// A catalogue exercise copied into a workout together with the logged performance.
///
/// `calories` is derived from the exercise and `sets`/`reps`/`weight`; use
/// [`WorkoutExercise::set_performance`] or [`WorkoutExercise::recompute_calories`]
/// after changing any of them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub sets: u32,
    pub reps: u32,
    /// Load in kilograms
    pub weight: f64,
    #[serde(default)]
    pub calories: u32,
    /// Rest between sets, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutExercise {
    pub fn new(exercise: Exercise, sets: u32, reps: u32, weight: f64) -> Self {
        let calories = crate::metrics::calculate_calories(&exercise, sets, reps, weight);
        Self {
            exercise,
            sets,
            reps,
            weight,
            calories,
            rest_time: None,
            notes: None,
        }
    }

    /// Change sets/reps/weight and recompute calories
    pub fn set_performance(&mut self, sets: u32, reps: u32, weight: f64) {
        self.sets = sets;
        self.reps = reps;
        self.weight = weight;
        self.recompute_calories();
    }

    pub fn recompute_calories(&mut self) {
        self.calories =
            crate::metrics::calculate_calories(&self.exercise, self.sets, self.reps, self.weight);
    }

    /// Check the logged performance
    pub fn validate(&self) -> Result<()> {
        if self.sets < 1 {
            return Err(Error::Validation(format!(
                "'{}': sets must be at least 1",
                self.exercise.name
            )));
        }
        if self.reps < 1 {
            return Err(Error::Validation(format!(
                "'{}': reps must be at least 1",
                self.exercise.name
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(Error::Validation(format!(
                "'{}': weight must be a non-negative number, got {}",
                self.exercise.name, self.weight
            )));
        }
        self.exercise.validate()
    }
}

/// One recorded training session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    pub date: NaiveDate,
    pub exercises: Vec<WorkoutExercise>,
    pub total_calories: u32,
    /// Position in logging order, assigned by the store
    #[serde(default)]
    pub sequence: u64,
    /// Session length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Workout {
    /// Recompute every entry's calories and the workout total
    pub fn recompute(&mut self) {
        for entry in &mut self.exercises {
            entry.recompute_calories();
        }
        self.total_calories = sum_calories(&self.exercises);
    }

    pub fn validate(&self) -> Result<()> {
        validate_entries(&self.exercises)
    }
}

/// The in-progress, unsaved workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    /// Falls back to the current day when the draft is saved
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WorkoutDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn total_calories(&self) -> u32 {
        sum_calories(&self.exercises)
    }

    pub fn recompute(&mut self) {
        for entry in &mut self.exercises {
            entry.recompute_calories();
        }
    }

    /// Validate and turn the draft into a workout with a fresh id
    pub fn into_workout(mut self, fallback_date: NaiveDate) -> Result<Workout> {
        validate_entries(&self.exercises)?;
        self.recompute();
        let total_calories = sum_calories(&self.exercises);
        Ok(Workout {
            id: Uuid::new_v4(),
            date: self.date.unwrap_or(fallback_date),
            exercises: self.exercises,
            total_calories,
            sequence: 0,
            duration: self.duration,
            notes: self.notes,
        })
    }
}

impl From<Workout> for WorkoutDraft {
    fn from(workout: Workout) -> Self {
        WorkoutDraft {
            date: Some(workout.date),
            exercises: workout.exercises,
            duration: workout.duration,
            notes: workout.notes,
        }
    }
}

/// Saturates at `u32::MAX` like the per-entry estimate
fn sum_calories(entries: &[WorkoutExercise]) -> u32 {
    entries
        .iter()
        .fold(0u32, |total, e| total.saturating_add(e.calories))
}

fn validate_entries(entries: &[WorkoutExercise]) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::Validation(
            "a workout needs at least one exercise".into(),
        ));
    }
    entries.iter().try_for_each(WorkoutExercise::validate)
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(Error::Validation(format!("unknown gender '{}'", other))),
        }
    }
}

/// Daily activity level, used to scale BMR into TDEE
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            other => Err(Error::Validation(format!(
                "unknown activity level '{}'",
                other
            ))),
        }
    }
}

pub const AGE_RANGE: RangeInclusive<u32> = 1..=120;
pub const HEIGHT_RANGE_CM: RangeInclusive<f64> = 100.0..=250.0;
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 30.0..=300.0;

/// The single user profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    /// Height in centimetres
    pub height: f64,
    /// Body weight in kilograms
    pub weight: f64,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goals: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("profile name must not be empty".into()));
        }
        if !AGE_RANGE.contains(&self.age) {
            return Err(Error::Validation(format!(
                "age must be between {} and {}, got {}",
                AGE_RANGE.start(),
                AGE_RANGE.end(),
                self.age
            )));
        }
        if !HEIGHT_RANGE_CM.contains(&self.height) {
            return Err(Error::Validation(format!(
                "height must be between {} and {} cm, got {}",
                HEIGHT_RANGE_CM.start(),
                HEIGHT_RANGE_CM.end(),
                self.height
            )));
        }
        if !WEIGHT_RANGE_KG.contains(&self.weight) {
            return Err(Error::Validation(format!(
                "weight must be between {} and {} kg, got {}",
                WEIGHT_RANGE_KG.start(),
                WEIGHT_RANGE_KG.end(),
                self.weight
            )));
        }
        Ok(())
    }
}

/// Profile data handed to `Store::set_profile`.
///
/// `id` and `created_at` are optional: when absent the existing profile's
/// values are kept, or fresh ones assigned.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goals: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileInput {
    /// Build the stored profile. Missing id/creation time come from `existing`,
    /// or are freshly assigned.
    pub fn into_profile(self, existing: Option<&UserProfile>, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: self
                .id
                .or_else(|| existing.map(|p| p.id))
                .unwrap_or_else(Uuid::new_v4),
            name: self.name,
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
            activity_level: self.activity_level,
            goals: self.goals,
            created_at: self
                .created_at
                .or_else(|| existing.map(|p| p.created_at))
                .unwrap_or(now),
            updated_at: now,
        }
    }
}

impl From<UserProfile> for ProfileInput {
    fn from(profile: UserProfile) -> Self {
        ProfileInput {
            id: Some(profile.id),
            name: profile.name,
            age: profile.age,
            gender: profile.gender,
            height: profile.height,
            weight: profile.weight,
            activity_level: profile.activity_level,
            goals: profile.goals,
            created_at: Some(profile.created_at),
        }
    }
}

// ============================================================================
// Settings Types
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Ja,
    En,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeightUnit {
    #[default]
    Cm,
    Ft,
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::Validation(format!("unknown theme '{}'", other))),
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            other => Err(Error::Validation(format!("unknown language '{}'", other))),
        }
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lbs" => Ok(WeightUnit::Lbs),
            other => Err(Error::Validation(format!("unknown weight unit '{}'", other))),
        }
    }
}

impl FromStr for HeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cm" => Ok(HeightUnit::Cm),
            "ft" => Ok(HeightUnit::Ft),
            other => Err(Error::Validation(format!("unknown height unit '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Units {
    pub weight: WeightUnit,
    pub height: HeightUnit,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Notifications {
    pub workout_reminder: bool,
    pub goal_achievement: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            workout_reminder: true,
            goal_achievement: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Privacy {
    pub data_sharing: bool,
    pub analytics: bool,
}

impl Default for Privacy {
    fn default() -> Self {
        Self {
            data_sharing: false,
            analytics: true,
        }
    }
}

/// Application settings singleton
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: Language,
    pub units: Units,
    pub notifications: Notifications,
    pub privacy: Privacy,
}
