//! Built-in exercise catalogue.
//!
//! These entries are seeded into every store and can never be edited or
//! deleted. Their ids are stable slugs so logged workouts keep pointing at
//! something meaningful across installs.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Ordered list of built-in exercises
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    use ExerciseCategory::Strength;
    use MuscleGroup::*;

    let entries: [(&str, &str, f64, MuscleGroup, ExerciseCategory); 26] = [
        // Chest
        ("bench_press", "Bench Press", 0.8, Chest, Strength),
        ("push_up", "Push-up", 0.5, Chest, Strength),
        ("dumbbell_fly", "Dumbbell Fly", 0.6, Chest, Strength),
        ("incline_press", "Incline Press", 0.7, Chest, Strength),
        // Back
        ("deadlift", "Deadlift", 1.0, Back, Strength),
        ("pull_up", "Pull-up", 0.7, Back, Strength),
        ("bent_over_row", "Bent-over Row", 0.8, Back, Strength),
        ("lat_pulldown", "Lat Pulldown", 0.6, Back, Strength),
        // Legs
        ("squat", "Squat", 0.9, Legs, Strength),
        ("leg_press", "Leg Press", 0.7, Legs, Strength),
        ("lunge", "Lunge", 0.6, Legs, Strength),
        ("calf_raise", "Calf Raise", 0.3, Legs, Strength),
        // Arms
        ("barbell_curl", "Barbell Curl", 0.4, Arms, Strength),
        ("triceps_press", "Triceps Press", 0.5, Arms, Strength),
        ("hammer_curl", "Hammer Curl", 0.4, Arms, Strength),
        ("dips", "Dips", 0.6, Arms, Strength),
        // Shoulders
        ("shoulder_press", "Shoulder Press", 0.6, Shoulders, Strength),
        ("lateral_raise", "Lateral Raise", 0.3, Shoulders, Strength),
        ("rear_delt_fly", "Rear Delt Fly", 0.4, Shoulders, Strength),
        ("upright_row", "Upright Row", 0.5, Shoulders, Strength),
        // Abs
        ("crunch", "Crunch", 0.2, Abs, Strength),
        ("plank", "Plank", 0.3, Abs, Strength),
        ("leg_raise", "Leg Raise", 0.25, Abs, Strength),
        // Cardio: one "rep" is one minute
        ("running", "Running", 8.0, Cardio, ExerciseCategory::Cardio),
        ("cycling", "Cycling", 6.0, Cardio, ExerciseCategory::Cardio),
        ("walking", "Walking", 4.0, Cardio, ExerciseCategory::Cardio),
    ];

    let exercises = entries
        .into_iter()
        .map(|(id, name, calories_per_rep, muscle_group, category)| Exercise {
            id: id.into(),
            name: name.into(),
            calories_per_rep,
            muscle_group,
            category,
            is_custom: false,
            description: None,
        })
        .collect();

    Catalog { exercises }
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn by_muscle_group<'a>(
        &'a self,
        group: &'a MuscleGroup,
    ) -> impl Iterator<Item = &'a Exercise> + 'a {
        self.exercises.iter().filter(move |e| &e.muscle_group == group)
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", exercise.id));
            }
            if exercise.is_custom {
                errors.push(format!(
                    "Built-in exercise '{}' is flagged as custom",
                    exercise.id
                ));
            }
            if let Err(e) = exercise.validate() {
                errors.push(format!("Exercise '{}': {}", exercise.id, e));
            }
        }

        for group in &MuscleGroup::FIXED {
            if self.by_muscle_group(group).next().is_none() {
                errors.push(format!("Catalog has no exercises for '{}'", group));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 26);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_builtins_are_not_custom() {
        assert!(get_default_catalog().exercises.iter().all(|e| !e.is_custom));
    }

    #[test]
    fn test_lookup_by_group() {
        let catalog = get_default_catalog();
        let abs: Vec<_> = catalog.by_muscle_group(&MuscleGroup::Abs).collect();
        assert_eq!(abs.len(), 3);
        assert_eq!(catalog.get("bench_press").unwrap().calories_per_rep, 0.8);
        assert!(!catalog.contains("nope"));
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let mut catalog = build_default_catalog();
        let dup = catalog.exercises[0].clone();
        catalog.exercises.push(dup);
        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate")));
    }
}
