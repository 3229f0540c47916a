//! Whole-dataset export and import.
//!
//! The export document is a single JSON object with the keys `workouts`,
//! `exercises`, `profile`, `settings` and `exportDate`. Import is additive:
//! every imported workout and custom exercise gets a fresh id, the profile
//! replaces the current one and the settings are merged over the current ones.

use crate::patch::SettingsPatch;
use crate::storage::Storage;
use crate::store::{today, Store};
use crate::{
    AppSettings, Error, Exercise, NewExercise, ProfileInput, Result, UserProfile, Workout,
    WorkoutDraft, WorkoutExercise,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The export document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub workouts: Vec<Workout>,
    /// Built-in and custom exercises alike
    pub exercises: Vec<Exercise>,
    pub profile: Option<UserProfile>,
    pub settings: AppSettings,
    pub export_date: DateTime<Utc>,
}

/// What an import changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub workouts: usize,
    pub exercises: usize,
    pub profile: bool,
    pub settings: bool,
    /// Name of the backup taken before anything was applied
    pub backup: Option<String>,
}

impl ImportReport {
    /// Number of records written
    pub fn applied(&self) -> usize {
        self.workouts + self.exercises + usize::from(self.profile) + usize::from(self.settings)
    }
}

/// Import-side view of a workout; `id` and `totalCalories` are ignored
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedWorkout {
    date: NaiveDate,
    exercises: Vec<WorkoutExercise>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedDocument {
    workouts: Vec<ImportedWorkout>,
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    profile: Option<ProfileInput>,
    #[serde(default)]
    settings: Option<AppSettings>,
}

/// A validated import, ready to apply
struct PreparedImport {
    profile: Option<ProfileInput>,
    settings: Option<AppSettings>,
    workouts: Vec<Workout>,
    exercises: Vec<NewExercise>,
}

fn format_error(detail: impl std::fmt::Display) -> Error {
    Error::Format(detail.to_string())
}

/// Parse and validate an import document without touching any state
fn prepare_import(json: &str) -> Result<PreparedImport> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| format_error(format!("not JSON: {}", e)))?;
    match value.get("workouts") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(format_error("'workouts' must be an array")),
        None => return Err(format_error("missing 'workouts' array")),
    }
    let document: ImportedDocument = serde_json::from_value(value).map_err(format_error)?;

    let fallback = today();
    let mut workouts = Vec::with_capacity(document.workouts.len());
    for (index, imported) in document.workouts.into_iter().enumerate() {
        let draft = WorkoutDraft {
            date: Some(imported.date),
            exercises: imported.exercises,
            duration: imported.duration,
            notes: imported.notes,
        };
        let workout = draft
            .into_workout(fallback)
            .map_err(|e| format_error(format!("workout #{}: {}", index, e)))?;
        workouts.push(workout);
    }

    // Built-ins are already present in every store
    let mut exercises = Vec::new();
    for exercise in document.exercises.into_iter().filter(|e| e.is_custom) {
        exercise
            .validate()
            .map_err(|e| format_error(format!("exercise '{}': {}", exercise.id, e)))?;
        exercises.push(NewExercise::from(exercise));
    }

    if let Some(input) = &document.profile {
        input
            .clone()
            .into_profile(None, Utc::now())
            .validate()
            .map_err(|e| format_error(format!("profile: {}", e)))?;
    }

    Ok(PreparedImport {
        profile: document.profile,
        settings: document.settings,
        workouts,
        exercises,
    })
}

impl<S: Storage> Store<S> {
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument {
            workouts: self.workouts().to_vec(),
            exercises: self.exercises().to_vec(),
            profile: self.profile().cloned(),
            settings: self.settings().clone(),
            export_date: Utc::now(),
        }
    }

    /// Serialize the whole dataset as a pretty-printed export document
    pub fn export_all(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.export_document())?;
        tracing::info!(
            "Exported {} workouts and {} exercises",
            self.workouts().len(),
            self.exercises().len()
        );
        Ok(json)
    }

    /// Merge an export document into the store.
    ///
    /// The document is fully validated before anything is written; a
    /// malformed document is a [`Error::Format`] and changes nothing. A
    /// backup of the current data is taken first. If a write fails partway
    /// the records applied so far stay and the error is reported as
    /// [`Error::PartialImport`].
    pub fn import_all(&mut self, json: &str) -> Result<ImportReport> {
        let prepared = prepare_import(json)?;

        let mut report = ImportReport {
            backup: self.backup_current(),
            ..ImportReport::default()
        };

        if let Err(e) = self.apply_import(prepared, &mut report) {
            tracing::error!("Import stopped after {} records: {}", report.applied(), e);
            return Err(Error::PartialImport {
                applied: report.applied(),
                source: Box::new(e),
            });
        }

        tracing::info!(
            "Imported {} workouts, {} custom exercises (profile: {}, settings: {})",
            report.workouts,
            report.exercises,
            report.profile,
            report.settings
        );
        Ok(report)
    }

    fn apply_import(&mut self, prepared: PreparedImport, report: &mut ImportReport) -> Result<()> {
        if let Some(profile) = prepared.profile {
            self.set_profile(profile)?;
            report.profile = true;
        }
        if let Some(settings) = prepared.settings {
            self.update_settings(SettingsPatch::from(settings))?;
            report.settings = true;
        }
        for workout in prepared.workouts {
            self.insert_workout(workout)?;
            report.workouts += 1;
        }
        for exercise in prepared.exercises {
            self.add_exercise(exercise)?;
            report.exercises += 1;
        }
        Ok(())
    }

    /// Best effort: a failed backup is logged and the import goes ahead
    fn backup_current(&mut self) -> Option<String> {
        let name = format!("backup-{}", Utc::now().timestamp_millis());
        let written = self
            .export_all()
            .and_then(|contents| self.storage_mut().write_backup(&name, &contents));
        match written {
            Ok(()) => Some(name),
            Err(e) => {
                tracing::warn!("Could not write backup before import: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::{FileStorage, Layout};
    use crate::storage::{Collection, MemoryStorage};
    use crate::{ActivityLevel, ExerciseCategory, Gender, MuscleGroup, Theme};
    use std::collections::BTreeSet;

    /// Storage that accepts a fixed number of writes, then fails
    struct BudgetStorage {
        inner: MemoryStorage,
        writes_left: usize,
        fail_backups: bool,
    }

    impl Storage for BudgetStorage {
        fn put(&mut self, collection: Collection, key: &str, value: Value) -> Result<()> {
            if self.writes_left == 0 {
                return Err(Error::Storage("quota exceeded".into()));
            }
            self.writes_left -= 1;
            self.inner.put(collection, key, value)
        }

        fn fetch(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
            self.inner.fetch(collection, key)
        }

        fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>> {
            self.inner.fetch_all(collection)
        }

        fn remove(&mut self, collection: Collection, key: &str) -> Result<bool> {
            self.inner.remove(collection, key)
        }

        fn write_backup(&mut self, name: &str, contents: &str) -> Result<()> {
            if self.fail_backups {
                return Err(Error::Storage("backup volume missing".into()));
            }
            self.inner.write_backup(name, contents)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A store with two workouts, one custom exercise, a profile and dark theme
    fn populated<S: Storage>(storage: S) -> Store<S> {
        let mut store = Store::open(storage).unwrap();
        for (day, id) in [(3, "squat"), (5, "bench_press")] {
            let exercise = store.exercise(id).cloned().unwrap();
            let mut draft = WorkoutDraft::new(date(2024, 5, day));
            let mut entry = WorkoutExercise::new(exercise, 4, 8, 70.0);
            if day == 3 {
                entry.rest_time = Some(90);
                entry.notes = Some("paused reps".into());
                draft.duration = Some(45);
                draft.notes = Some("felt strong".into());
            }
            draft.exercises.push(entry);
            store.add_workout(draft).unwrap();
        }
        store
            .add_exercise(NewExercise {
                name: "Kettlebell Swing".into(),
                calories_per_rep: 0.6,
                muscle_group: MuscleGroup::Legs,
                category: ExerciseCategory::Custom,
                description: None,
            })
            .unwrap();
        store
            .set_profile(ProfileInput {
                id: None,
                name: "Mika".into(),
                age: 29,
                gender: Gender::Female,
                height: 165.0,
                weight: 58.0,
                activity_level: ActivityLevel::Active,
                goals: BTreeSet::from(["endurance".to_string()]),
                created_at: None,
            })
            .unwrap();
        store
            .update_settings(SettingsPatch {
                theme: Some(Theme::Dark),
                ..Default::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn test_export_document_keys() {
        let store = populated(MemoryStorage::new());
        let json = store.export_all().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["exercises", "exportDate", "profile", "settings", "workouts"]
        );
        assert_eq!(value["workouts"].as_array().unwrap().len(), 2);
        // Built-ins are exported alongside the custom exercise
        assert_eq!(
            value["exercises"].as_array().unwrap().len(),
            store.exercises().len()
        );
        assert_eq!(value["settings"]["theme"], "dark");
    }

    #[test]
    fn test_roundtrip_into_empty_store() {
        let source = populated(MemoryStorage::new());
        let json = source.export_all().unwrap();

        let mut target = Store::open(MemoryStorage::new()).unwrap();
        let report = target.import_all(&json).unwrap();
        assert_eq!(report.workouts, 2);
        assert_eq!(report.exercises, 1);
        assert!(report.profile && report.settings);

        // Same content in the same order; only the identity is new
        assert_eq!(target.workouts().len(), source.workouts().len());
        for (imported, original) in target.workouts().iter().zip(source.workouts()) {
            assert!(source.workout(imported.id).is_none());
            let mut expected = original.clone();
            expected.id = imported.id;
            expected.sequence = imported.sequence;
            assert_eq!(imported, &expected);
        }
        let first = &target.workouts()[0];
        assert_eq!(first.duration, Some(45));
        assert_eq!(first.notes.as_deref(), Some("felt strong"));
        assert_eq!(first.exercises[0].rest_time, Some(90));
        assert_eq!(first.exercises[0].notes.as_deref(), Some("paused reps"));

        assert_eq!(target.exercises().len(), source.exercises().len());
        assert_eq!(target.custom_exercises().count(), 1);
        let (imported, original) = (target.profile().unwrap(), source.profile().unwrap());
        assert_eq!(imported.id, original.id);
        assert_eq!(imported.created_at, original.created_at);
        assert_eq!(imported.goals, original.goals);
        assert_eq!(target.settings(), source.settings());
    }

    #[test]
    fn test_import_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let json = populated(MemoryStorage::new()).export_all().unwrap();

        let mut store =
            Store::open(FileStorage::new(temp_dir.path(), Layout::SingleFile)).unwrap();
        store.import_all(&json).unwrap();

        let reopened =
            Store::open(FileStorage::new(temp_dir.path(), Layout::SingleFile)).unwrap();
        assert_eq!(reopened.workouts().len(), 2);
        assert_eq!(reopened.custom_exercises().count(), 1);
        assert_eq!(reopened.settings().theme, Theme::Dark);
        assert!(reopened.profile().is_some());
    }

    #[test]
    fn test_missing_workouts_is_format_error() {
        let mut store = populated(MemoryStorage::new());
        let before = store.workouts().len();

        for bad in [
            "not json at all",
            "{\"exercises\": []}",
            "{\"workouts\": {}}",
            "[1, 2, 3]",
        ] {
            let err = store.import_all(bad).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "{}: {:?}", bad, err);
        }
        assert_eq!(store.workouts().len(), before);
        assert!(store.storage().backups().is_empty());
    }

    #[test]
    fn test_invalid_record_rejected_before_any_write() {
        let mut store = Store::open(MemoryStorage::new()).unwrap();
        let json = serde_json::json!({
            "workouts": [],
            "profile": {
                "name": "Tiny", "age": 30, "gender": "male",
                "height": 20.0, "weight": 70.0, "activityLevel": "light"
            },
            "settings": { "theme": "dark" }
        })
        .to_string();

        let err = store.import_all(&json).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert_eq!(store.settings().theme, Theme::Light);
        assert!(store.profile().is_none());

        let empty_workout = serde_json::json!({
            "workouts": [{ "date": "2024-05-01", "exercises": [] }]
        })
        .to_string();
        assert!(matches!(
            store.import_all(&empty_workout).unwrap_err(),
            Error::Format(_)
        ));
        assert!(store.workouts().is_empty());
    }

    #[test]
    fn test_builtins_not_duplicated() {
        let mut store = Store::open(MemoryStorage::new()).unwrap();
        let builtins = store.exercises().len();
        let json = store.export_all().unwrap();

        let report = store.import_all(&json).unwrap();
        assert_eq!(report.exercises, 0);
        assert_eq!(store.exercises().len(), builtins);
        assert_eq!(store.storage().len(Collection::Exercises), 0);
    }

    #[test]
    fn test_repeated_import_duplicates_workouts() {
        let json = populated(MemoryStorage::new()).export_all().unwrap();
        let mut store = Store::open(MemoryStorage::new()).unwrap();

        store.import_all(&json).unwrap();
        store.import_all(&json).unwrap();
        assert_eq!(store.workouts().len(), 4);
        assert_eq!(store.custom_exercises().count(), 2);
        // The profile singleton is replaced, not duplicated
        assert_eq!(store.storage().len(Collection::Profile), 1);
    }

    #[test]
    fn test_import_ignores_totals_and_ids() {
        let mut store = Store::open(MemoryStorage::new()).unwrap();
        let deadlift = store.exercise("deadlift").cloned().unwrap();
        let mut entry = serde_json::to_value(WorkoutExercise::new(deadlift, 5, 5, 100.0)).unwrap();
        entry["calories"] = serde_json::json!(1);
        let json = serde_json::json!({
            "workouts": [{
                "id": "not-a-uuid",
                "date": "2024-06-01",
                "exercises": [entry],
                "totalCalories": 9999
            }]
        })
        .to_string();

        store.import_all(&json).unwrap();
        let workout = &store.workouts()[0];
        assert_eq!(workout.exercises[0].calories, 125);
        assert_eq!(workout.total_calories, 125);
    }

    #[test]
    fn test_backup_written_before_import() {
        let mut store = populated(MemoryStorage::new());
        let json = store.export_all().unwrap();

        let report = store.import_all(&json).unwrap();
        let name = report.backup.unwrap();
        assert!(name.starts_with("backup-"));

        let backups = store.storage().backups();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].0, name);
        // The backup holds the pre-import data
        let saved: ExportDocument = serde_json::from_str(&backups[0].1).unwrap();
        assert_eq!(saved.workouts.len(), 2);
    }

    #[test]
    fn test_failed_backup_does_not_block_import() {
        crate::logging::init_test();
        let json = populated(MemoryStorage::new()).export_all().unwrap();
        let storage = BudgetStorage {
            inner: MemoryStorage::new(),
            writes_left: usize::MAX,
            fail_backups: true,
        };
        let mut store = Store::open(storage).unwrap();

        let report = store.import_all(&json).unwrap();
        assert!(report.backup.is_none());
        assert_eq!(report.workouts, 2);
    }

    #[test]
    fn test_write_failure_reports_partial_import() {
        crate::logging::init_test();
        let json = populated(MemoryStorage::new()).export_all().unwrap();
        // Profile, settings and one workout fit in the budget
        let storage = BudgetStorage {
            inner: MemoryStorage::new(),
            writes_left: 3,
            fail_backups: false,
        };
        let mut store = Store::open(storage).unwrap();

        match store.import_all(&json).unwrap_err() {
            Error::PartialImport { applied, source } => {
                assert_eq!(applied, 3);
                assert!(source.is_storage());
            }
            other => panic!("expected PartialImport, got {:?}", other),
        }
        // Applied records stay, in memory and in storage
        assert_eq!(store.workouts().len(), 1);
        assert!(store.profile().is_some());
        assert_eq!(store.storage().inner.len(Collection::Workouts), 1);
    }
}
