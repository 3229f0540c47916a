//! Partial updates for workouts, exercises, the profile and settings.
//!
//! Every field is optional; `None` leaves the current value alone. Optional
//! entity fields use `Option<Option<T>>` so a patch can also clear them.

use crate::types::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shallow merge into a [`Workout`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkoutPatch {
    pub date: Option<NaiveDate>,
    /// Replaces the whole exercise list
    pub exercises: Option<Vec<WorkoutExercise>>,
    pub duration: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
}

impl WorkoutPatch {
    /// Apply the patch and bring derived calories back in line
    pub fn apply(self, workout: &mut Workout) {
        if let Some(date) = self.date {
            workout.date = date;
        }
        if let Some(exercises) = self.exercises {
            workout.exercises = exercises;
        }
        if let Some(duration) = self.duration {
            workout.duration = duration;
        }
        if let Some(notes) = self.notes {
            workout.notes = notes;
        }
        workout.recompute();
    }
}

/// Merge into a custom [`Exercise`]. The id and custom flag cannot be patched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub calories_per_rep: Option<f64>,
    pub muscle_group: Option<MuscleGroup>,
    pub category: Option<ExerciseCategory>,
    pub description: Option<Option<String>>,
}

impl ExercisePatch {
    pub fn apply(self, exercise: &mut Exercise) {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(calories_per_rep) = self.calories_per_rep {
            exercise.calories_per_rep = calories_per_rep;
        }
        if let Some(muscle_group) = self.muscle_group {
            exercise.muscle_group = muscle_group;
        }
        if let Some(category) = self.category {
            exercise.category = category;
        }
        if let Some(description) = self.description {
            exercise.description = description;
        }
    }
}

/// Change to one entry of the current draft
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformancePatch {
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub rest_time: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
}

impl PerformancePatch {
    pub fn apply(self, entry: &mut WorkoutExercise) {
        let sets = self.sets.unwrap_or(entry.sets);
        let reps = self.reps.unwrap_or(entry.reps);
        let weight = self.weight.unwrap_or(entry.weight);
        entry.set_performance(sets, reps, weight);
        if let Some(rest_time) = self.rest_time {
            entry.rest_time = rest_time;
        }
        if let Some(notes) = self.notes {
            entry.notes = notes;
        }
    }
}

/// Merge into the [`UserProfile`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goals: Option<BTreeSet<String>>,
}

impl ProfilePatch {
    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(age) = self.age {
            profile.age = age;
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(height) = self.height {
            profile.height = height;
        }
        if let Some(weight) = self.weight {
            profile.weight = weight;
        }
        if let Some(activity_level) = self.activity_level {
            profile.activity_level = activity_level;
        }
        if let Some(goals) = self.goals {
            profile.goals = goals;
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UnitsPatch {
    pub weight: Option<WeightUnit>,
    pub height: Option<HeightUnit>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationsPatch {
    pub workout_reminder: Option<bool>,
    pub goal_achievement: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacyPatch {
    pub data_sharing: Option<bool>,
    pub analytics: Option<bool>,
}

/// Deep merge into [`AppSettings`]: each nested group merges field by field
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
    pub units: UnitsPatch,
    pub notifications: NotificationsPatch,
    pub privacy: PrivacyPatch,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut AppSettings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(language) = self.language {
            settings.language = language;
        }

        let units = &mut settings.units;
        if let Some(weight) = self.units.weight {
            units.weight = weight;
        }
        if let Some(height) = self.units.height {
            units.height = height;
        }

        let notifications = &mut settings.notifications;
        if let Some(v) = self.notifications.workout_reminder {
            notifications.workout_reminder = v;
        }
        if let Some(v) = self.notifications.goal_achievement {
            notifications.goal_achievement = v;
        }

        let privacy = &mut settings.privacy;
        if let Some(v) = self.privacy.data_sharing {
            privacy.data_sharing = v;
        }
        if let Some(v) = self.privacy.analytics {
            privacy.analytics = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &SettingsPatch::default()
    }
}

/// A full settings value as a patch that overwrites every field
impl From<AppSettings> for SettingsPatch {
    fn from(settings: AppSettings) -> Self {
        SettingsPatch {
            theme: Some(settings.theme),
            language: Some(settings.language),
            units: UnitsPatch {
                weight: Some(settings.units.weight),
                height: Some(settings.units.height),
            },
            notifications: NotificationsPatch {
                workout_reminder: Some(settings.notifications.workout_reminder),
                goal_achievement: Some(settings.notifications.goal_achievement),
            },
            privacy: PrivacyPatch {
                data_sharing: Some(settings.privacy.data_sharing),
                analytics: Some(settings.privacy.analytics),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_patch_keeps_sibling_field() {
        let mut settings = AppSettings::default();
        SettingsPatch {
            units: UnitsPatch {
                weight: Some(WeightUnit::Lbs),
                height: None,
            },
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.units.weight, WeightUnit::Lbs);
        assert_eq!(settings.units.height, HeightUnit::Cm);
        assert_eq!(settings.theme, Theme::Light);
    }

    #[test]
    fn test_nested_groups_merge_independently() {
        let mut settings = AppSettings::default();
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"notifications":{"workoutReminder":false},"privacy":{"dataSharing":true}}"#)
                .unwrap();
        patch.apply(&mut settings);

        assert!(!settings.notifications.workout_reminder);
        assert!(settings.notifications.goal_achievement);
        assert!(settings.privacy.data_sharing);
        assert!(settings.privacy.analytics);
    }

    #[test]
    fn test_full_settings_patch_overwrites_everything() {
        let target = AppSettings {
            theme: Theme::Dark,
            language: Language::En,
            units: Units {
                weight: WeightUnit::Lbs,
                height: HeightUnit::Ft,
            },
            notifications: Notifications {
                workout_reminder: false,
                goal_achievement: false,
            },
            privacy: Privacy {
                data_sharing: true,
                analytics: false,
            },
        };
        let mut settings = AppSettings::default();
        SettingsPatch::from(target.clone()).apply(&mut settings);
        assert_eq!(settings, target);
    }

    #[test]
    fn test_empty_patch() {
        assert!(SettingsPatch::default().is_empty());
        let patch = SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_performance_patch_recomputes() {
        let exercise = crate::catalog::get_default_catalog()
            .get("bench_press")
            .cloned()
            .unwrap();
        let mut entry = WorkoutExercise::new(exercise, 1, 10, 20.0);
        assert_eq!(entry.calories, 8);

        PerformancePatch {
            sets: Some(3),
            weight: Some(40.0),
            ..Default::default()
        }
        .apply(&mut entry);

        assert_eq!(entry.sets, 3);
        assert_eq!(entry.reps, 10);
        assert_eq!(entry.calories, 48);
    }
}
