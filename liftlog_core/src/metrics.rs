//! Derived metrics: calories, body metrics, recommendations and statistics.
//!
//! Everything here is a pure function of its arguments. Nothing is stored;
//! callers recompute from the current workouts and profile.

use crate::{Exercise, Gender, MuscleGroup, UserProfile, Workout};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Load above which the calorie estimate starts to scale up
pub const REFERENCE_WEIGHT_KG: f64 = 20.0;

/// Trailing window used by [`recommendations`]
pub const RECOMMENDATION_WINDOW_DAYS: i64 = 30;

/// Number of weekly buckets in [`WorkoutStats::weekly_stats`].
/// Buckets are anchored on their end date: the last one ends on the reference date.
pub const WEEKS_IN_STATS: usize = 8;

/// Groups suggested when there is no usable history
pub const DEFAULT_RECOMMENDATIONS: [MuscleGroup; 3] =
    [MuscleGroup::Chest, MuscleGroup::Back, MuscleGroup::Legs];

/// Estimate calories burned by one logged exercise.
///
/// Volume (`sets * reps`) times the per-rep cost, scaled by `weight / 20`
/// once the load exceeds 20 kg. Lighter loads, bodyweight work included,
/// use a factor of 1.
pub fn calculate_calories(exercise: &Exercise, sets: u32, reps: u32, weight: f64) -> u32 {
    let base = exercise.calories_per_rep * f64::from(sets) * f64::from(reps);
    let weight_factor = f64::max(1.0, weight / REFERENCE_WEIGHT_KG);
    let calories = (base * weight_factor).round();
    if calories.is_finite() && calories > 0.0 {
        calories as u32
    } else {
        0
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }
}

/// Body metrics derived from a profile
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BmrResult {
    /// Basal metabolic rate, kcal/day
    pub bmr: i64,
    /// Total daily energy expenditure, kcal/day
    pub tdee: i64,
    /// Rounded to one decimal
    pub bmi: f64,
    pub bmi_category: BmiCategory,
}

/// BMR (revised Harris-Benedict), TDEE and BMI for a profile
pub fn calculate_bmr(profile: &UserProfile) -> BmrResult {
    let (weight, height, age) = (profile.weight, profile.height, f64::from(profile.age));

    let bmr = match profile.gender {
        Gender::Male => 88.362 + 13.397 * weight + 4.799 * height - 5.677 * age,
        Gender::Female => 447.593 + 9.247 * weight + 3.098 * height - 4.330 * age,
    };
    let tdee = bmr * profile.activity_level.multiplier();

    let height_m = height / 100.0;
    let bmi = (weight / (height_m * height_m) * 10.0).round() / 10.0;

    BmrResult {
        bmr: bmr.round() as i64,
        tdee: tdee.round() as i64,
        bmi,
        bmi_category: BmiCategory::from_bmi(bmi),
    }
}

/// Up to three muscle groups trained least often in the 30 days up to
/// `reference_date` (inclusive).
///
/// Ties keep the order in which groups were first seen. With no history,
/// or nothing inside the window, the fixed default sequence is returned.
pub fn recommendations(workouts: &[Workout], reference_date: NaiveDate) -> Vec<MuscleGroup> {
    let window_start = reference_date - Duration::days(RECOMMENDATION_WINDOW_DAYS);

    let mut tally: Vec<(&MuscleGroup, usize)> = Vec::new();
    let recent = workouts
        .iter()
        .filter(|w| w.date >= window_start && w.date <= reference_date);
    for workout in recent {
        for entry in &workout.exercises {
            let group = &entry.exercise.muscle_group;
            match tally.iter_mut().find(|(g, _)| *g == group) {
                Some((_, count)) => *count += 1,
                None => tally.push((group, 1)),
            }
        }
    }

    if tally.is_empty() {
        return DEFAULT_RECOMMENDATIONS.to_vec();
    }

    // sort_by_key is stable
    tally.sort_by_key(|(_, count)| *count);
    tally
        .into_iter()
        .take(3)
        .map(|(group, _)| group.clone())
        .collect()
}

/// Workouts and calories for one 7-day bucket
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStat {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub workouts: usize,
    pub calories: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_calories: u64,
    pub avg_calories_per_workout: u64,
    /// Oldest first; the last bucket ends on the reference date
    pub weekly_stats: Vec<WeeklyStat>,
}

/// Totals plus eight trailing weekly buckets ending on `reference_date`
pub fn workout_stats(workouts: &[Workout], reference_date: NaiveDate) -> WorkoutStats {
    let total_workouts = workouts.len();
    let total_calories: u64 = workouts.iter().map(|w| u64::from(w.total_calories)).sum();
    let avg_calories_per_workout = if total_workouts > 0 {
        (total_calories as f64 / total_workouts as f64).round() as u64
    } else {
        0
    };

    let weekly_stats = (0..WEEKS_IN_STATS)
        .rev()
        .map(|weeks_back| {
            let week_end = reference_date - Duration::days(7 * weeks_back as i64);
            let week_start = week_end - Duration::days(6);
            let in_week = workouts
                .iter()
                .filter(|w| w.date >= week_start && w.date <= week_end);
            let (count, calories) = in_week.fold((0, 0u64), |(n, c), w| {
                (n + 1, c + u64::from(w.total_calories))
            });
            WeeklyStat {
                week_start,
                week_end,
                workouts: count,
                calories,
            }
        })
        .collect();

    WorkoutStats {
        total_workouts,
        total_calories,
        avg_calories_per_workout,
        weekly_stats,
    }
}
