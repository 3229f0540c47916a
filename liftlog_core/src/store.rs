//! The authoritative in-memory state and its mutations.
//!
//! Every mutation validates first, writes through to storage, and only then
//! updates memory and notifies observers. A failed write leaves the in-memory
//! state exactly as it was.

use crate::catalog::get_default_catalog;
use crate::metrics::{self, BmrResult, WorkoutStats};
use crate::patch::{ExercisePatch, PerformancePatch, ProfilePatch, SettingsPatch, WorkoutPatch};
use crate::storage::{Storage, StorageExt, PROFILE_KEY, SETTINGS_KEY};
use crate::{
    AppSettings, Error, Exercise, MuscleGroup, NewExercise, ProfileInput, Result, UserProfile,
    Workout, WorkoutDraft, WorkoutExercise,
};
use chrono::{Local, NaiveDate, Utc};
use uuid::Uuid;

/// Everything the view layer renders from
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// In logging order (ascending [`Workout::sequence`])
    pub workouts: Vec<Workout>,
    pub current_workout: WorkoutDraft,
    /// Built-ins first, then custom exercises
    pub exercises: Vec<Exercise>,
    pub profile: Option<UserProfile>,
    pub settings: AppSettings,
}

/// Handle returned by [`Store::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Observer = Box<dyn FnMut(&Snapshot)>;

pub struct Store<S: Storage> {
    storage: S,
    state: Snapshot,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    next_sequence: u64,
}

impl<S: Storage> Store<S> {
    /// Load persisted state and seed the built-in catalogue
    pub fn open(storage: S) -> Result<Self> {
        let mut workouts: Vec<Workout> = storage.list()?;
        // Records without a sequence sort first, by date then id
        workouts.sort_by_key(|w| (w.sequence, w.date, w.id));
        for workout in &mut workouts {
            let stored_total = workout.total_calories;
            let stored_entries: Vec<u32> = workout.exercises.iter().map(|e| e.calories).collect();
            workout.recompute();
            if workout.total_calories != stored_total
                || workout.exercises.iter().map(|e| e.calories).ne(stored_entries)
            {
                tracing::warn!(
                    "Stored calories of workout {} were stale and have been recomputed",
                    workout.id
                );
            }
        }
        let next_sequence = workouts.iter().map(|w| w.sequence + 1).max().unwrap_or(1);

        let mut exercises = get_default_catalog().exercises.clone();
        for exercise in storage.list::<Exercise>()? {
            if !exercise.is_custom || exercises.iter().any(|e| e.id == exercise.id) {
                tracing::warn!(
                    "Ignoring stored exercise {}: not custom or clashes with a built-in id",
                    exercise.id
                );
                continue;
            }
            exercises.push(exercise);
        }

        let profile: Option<UserProfile> = storage.get(PROFILE_KEY)?;
        let settings: AppSettings = storage.get(SETTINGS_KEY)?.unwrap_or_default();

        tracing::info!(
            "Opened store: {} workouts, {} custom exercises, profile: {}",
            workouts.len(),
            exercises.iter().filter(|e| e.is_custom).count(),
            profile.is_some()
        );

        Ok(Self {
            storage,
            state: Snapshot {
                workouts,
                current_workout: WorkoutDraft::default(),
                exercises,
                profile,
                settings,
            },
            observers: Vec::new(),
            next_subscription: 0,
            next_sequence,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    /// Register a callback run with the new snapshot after every mutation
    pub fn subscribe(&mut self, observer: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        for (_, observer) in &mut self.observers {
            observer(&self.state);
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.state.workouts
    }

    pub fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.state.workouts.iter().find(|w| w.id == id)
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.state.exercises
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.state.exercises.iter().find(|e| e.id == id)
    }

    pub fn custom_exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.state.exercises.iter().filter(|e| e.is_custom)
    }

    pub fn exercises_for<'a>(
        &'a self,
        group: &'a MuscleGroup,
    ) -> impl Iterator<Item = &'a Exercise> + 'a {
        self.state
            .exercises
            .iter()
            .filter(move |e| &e.muscle_group == group)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.state.profile.as_ref()
    }

    pub fn settings(&self) -> &AppSettings {
        &self.state.settings
    }

    pub fn current_workout(&self) -> &WorkoutDraft {
        &self.state.current_workout
    }

    /// Workouts newest date first; same-date workouts newest logged first
    pub fn history(&self, limit: Option<usize>, offset: usize) -> Vec<&Workout> {
        let mut workouts: Vec<&Workout> = self.state.workouts.iter().rev().collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        workouts
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    pub fn body_metrics(&self) -> Option<BmrResult> {
        self.state.profile.as_ref().map(metrics::calculate_bmr)
    }

    pub fn recommendations(&self, reference_date: NaiveDate) -> Vec<MuscleGroup> {
        metrics::recommendations(&self.state.workouts, reference_date)
    }

    pub fn workout_stats(&self, reference_date: NaiveDate) -> WorkoutStats {
        metrics::workout_stats(&self.state.workouts, reference_date)
    }

    // ------------------------------------------------------------------------
    // Workouts
    // ------------------------------------------------------------------------

    /// Save a draft as a new workout and clear the current draft
    pub fn add_workout(&mut self, draft: WorkoutDraft) -> Result<Workout> {
        let mut workout = draft.into_workout(today())?;
        workout.sequence = self.next_sequence;
        self.storage.save(&workout)?;
        self.next_sequence += 1;

        tracing::info!(
            "Logged workout {} on {} ({} kcal)",
            workout.id,
            workout.date,
            workout.total_calories
        );
        self.state.workouts.push(workout.clone());
        self.state.current_workout = WorkoutDraft::default();
        self.notify();
        Ok(workout)
    }

    /// Save the current draft
    pub fn save_current_workout(&mut self) -> Result<Workout> {
        let draft = self.state.current_workout.clone();
        self.add_workout(draft)
    }

    pub fn update_workout(&mut self, id: Uuid, patch: WorkoutPatch) -> Result<Workout> {
        let index = self.workout_index(id)?;
        let mut updated = self.state.workouts[index].clone();
        patch.apply(&mut updated);
        updated.validate()?;

        self.storage.save(&updated)?;
        self.state.workouts[index] = updated.clone();
        self.notify();
        Ok(updated)
    }

    pub fn delete_workout(&mut self, id: Uuid) -> Result<()> {
        let index = self.workout_index(id)?;
        self.storage.delete::<Workout>(&id.to_string())?;

        self.state.workouts.remove(index);
        tracing::info!("Deleted workout {}", id);
        self.notify();
        Ok(())
    }

    fn workout_index(&self, id: Uuid) -> Result<usize> {
        self.state
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| Error::not_found("Workout", id))
    }

    /// Store an already-validated workout without touching the draft
    pub(crate) fn insert_workout(&mut self, mut workout: Workout) -> Result<()> {
        workout.sequence = self.next_sequence;
        self.storage.save(&workout)?;
        self.next_sequence += 1;
        self.state.workouts.push(workout);
        self.notify();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Exercise catalogue
    // ------------------------------------------------------------------------

    /// Add a custom exercise under a fresh id
    pub fn add_exercise(&mut self, definition: NewExercise) -> Result<Exercise> {
        let exercise = definition.into_exercise();
        exercise.validate()?;

        self.storage.save(&exercise)?;
        tracing::info!("Added custom exercise {} ({})", exercise.name, exercise.id);
        self.state.exercises.push(exercise.clone());
        self.notify();
        Ok(exercise)
    }

    pub fn update_exercise(&mut self, id: &str, patch: ExercisePatch) -> Result<Exercise> {
        let index = self.custom_exercise_index(id, "edit")?;
        let mut updated = self.state.exercises[index].clone();
        patch.apply(&mut updated);
        updated.validate()?;

        self.storage.save(&updated)?;
        self.state.exercises[index] = updated.clone();
        self.notify();
        Ok(updated)
    }

    pub fn delete_exercise(&mut self, id: &str) -> Result<()> {
        let index = self.custom_exercise_index(id, "delete")?;
        self.storage.delete::<Exercise>(id)?;

        self.state.exercises.remove(index);
        tracing::info!("Deleted custom exercise {}", id);
        self.notify();
        Ok(())
    }

    fn custom_exercise_index(&self, id: &str, action: &str) -> Result<usize> {
        let index = self
            .state
            .exercises
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::not_found("Exercise", id))?;
        if !self.state.exercises[index].is_custom {
            return Err(Error::Permission(format!(
                "cannot {} built-in exercise '{}'",
                action, id
            )));
        }
        Ok(index)
    }

    // ------------------------------------------------------------------------
    // Profile and settings
    // ------------------------------------------------------------------------

    /// Replace the profile. An existing profile keeps its id and creation time
    /// unless the input carries its own.
    pub fn set_profile(&mut self, input: ProfileInput) -> Result<UserProfile> {
        let profile = input.into_profile(self.state.profile.as_ref(), Utc::now());
        profile.validate()?;

        self.storage.save(&profile)?;
        tracing::info!("Saved profile {}", profile.id);
        self.state.profile = Some(profile.clone());
        self.notify();
        Ok(profile)
    }

    pub fn update_profile(&mut self, patch: ProfilePatch) -> Result<UserProfile> {
        let mut updated = self
            .state
            .profile
            .clone()
            .ok_or_else(|| Error::not_found("Profile", PROFILE_KEY))?;
        patch.apply(&mut updated);
        updated.updated_at = Utc::now();
        updated.validate()?;

        self.storage.save(&updated)?;
        self.state.profile = Some(updated.clone());
        self.notify();
        Ok(updated)
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<AppSettings> {
        let mut updated = self.state.settings.clone();
        patch.apply(&mut updated);

        self.storage.save(&updated)?;
        self.state.settings = updated.clone();
        self.notify();
        Ok(updated)
    }

    // ------------------------------------------------------------------------
    // Current draft
    // ------------------------------------------------------------------------

    /// Replace the draft; calories of every entry are recomputed
    pub fn set_current_workout(&mut self, mut draft: WorkoutDraft) {
        draft.recompute();
        self.state.current_workout = draft;
        self.notify();
    }

    pub fn clear_current_workout(&mut self) {
        self.state.current_workout = WorkoutDraft::default();
        self.notify();
    }

    /// Copy a catalogue exercise into the draft with the given performance
    pub fn add_to_current_workout(
        &mut self,
        exercise_id: &str,
        sets: u32,
        reps: u32,
        weight: f64,
    ) -> Result<&WorkoutExercise> {
        let exercise = self
            .exercise(exercise_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Exercise", exercise_id))?;
        let entry = WorkoutExercise::new(exercise, sets, reps, weight);
        entry.validate()?;

        self.state.current_workout.exercises.push(entry);
        self.notify();
        let index = self.state.current_workout.exercises.len() - 1;
        Ok(&self.state.current_workout.exercises[index])
    }

    /// Change one draft entry; its calories are recomputed before returning
    pub fn update_current_exercise(
        &mut self,
        index: usize,
        patch: PerformancePatch,
    ) -> Result<&WorkoutExercise> {
        let mut entry = self
            .state
            .current_workout
            .exercises
            .get(index)
            .cloned()
            .ok_or_else(|| Error::not_found("Draft entry", index))?;
        patch.apply(&mut entry);
        entry.validate()?;

        self.state.current_workout.exercises[index] = entry;
        self.notify();
        Ok(&self.state.current_workout.exercises[index])
    }

    pub fn remove_current_exercise(&mut self, index: usize) -> Result<WorkoutExercise> {
        if index >= self.state.current_workout.exercises.len() {
            return Err(Error::not_found("Draft entry", index));
        }
        let removed = self.state.current_workout.exercises.remove(index);
        self.notify();
        Ok(removed)
    }
}

/// Today's calendar date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
