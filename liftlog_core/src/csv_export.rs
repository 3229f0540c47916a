//! CSV export of the workout history.
//!
//! One row per logged exercise entry, so a spreadsheet can pivot by muscle
//! group or exercise without unpacking nested workouts.

use crate::{Error, Result, Workout, WorkoutExercise};
use fs2::FileExt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: String,
    date: String,
    exercise_id: &'a str,
    exercise_name: &'a str,
    muscle_group: &'a str,
    sets: u32,
    reps: u32,
    weight: f64,
    calories: u32,
    workout_total_calories: u32,
}

impl<'a> CsvRow<'a> {
    fn new(workout: &'a Workout, entry: &'a WorkoutExercise) -> Self {
        CsvRow {
            workout_id: workout.id.to_string(),
            date: workout.date.to_string(),
            exercise_id: &entry.exercise.id,
            exercise_name: &entry.exercise.name,
            muscle_group: entry.exercise.muscle_group.as_str(),
            sets: entry.sets,
            reps: entry.reps,
            weight: entry.weight,
            calories: entry.calories,
            workout_total_calories: workout.total_calories,
        }
    }
}

/// Write `workouts` to `path` as CSV, oldest first, replacing any existing file.
///
/// The file is written to a temp file, synced, then renamed into place, so a
/// crash never leaves a truncated export. Returns the number of rows written.
pub fn export_history_csv(workouts: &[Workout], path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut ordered: Vec<&Workout> = workouts.iter().collect();
    ordered.sort_by_key(|w| w.date);

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    let mut rows = 0;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        for workout in ordered {
            for entry in &workout.exercises {
                writer.serialize(CsvRow::new(workout, entry))?;
                rows += 1;
            }
        }
        writer.flush()?;
    }
    // A header-only file when there is nothing to export
    if rows == 0 {
        writeln!(
            temp.as_file(),
            "workout_id,date,exercise_id,exercise_name,muscle_group,sets,reps,weight,calories,workout_total_calories"
        )?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Wrote {} history rows to {:?}", rows, path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::WorkoutDraft;
    use chrono::NaiveDate;

    fn workout(day: u32, entries: &[(&str, u32, u32, f64)]) -> Workout {
        let mut draft = WorkoutDraft::new(NaiveDate::from_ymd_opt(2024, 7, day).unwrap());
        for (id, sets, reps, weight) in entries {
            let exercise = get_default_catalog().get(id).cloned().unwrap();
            draft
                .exercises
                .push(WorkoutExercise::new(exercise, *sets, *reps, *weight));
        }
        draft.into_workout(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()).unwrap()
    }

    #[test]
    fn test_one_row_per_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("exports").join("history.csv");
        let workouts = vec![
            workout(9, &[("deadlift", 5, 5, 100.0)]),
            workout(2, &[("bench_press", 3, 10, 40.0), ("plank", 3, 1, 0.0)]),
        ];

        let rows = export_history_csv(&workouts, &csv_path).unwrap();
        assert_eq!(rows, 3);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "workout_id");
        assert_eq!(&headers[9], "workout_total_calories");

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        // Oldest workout first
        assert_eq!(&records[0][1], "2024-07-02");
        assert_eq!(&records[0][2], "bench_press");
        assert_eq!(&records[0][4], "chest");
        assert_eq!(&records[2][2], "deadlift");
        assert_eq!(&records[2][8], "125");
        assert_eq!(&records[2][9], "125");
    }

    #[test]
    fn test_existing_file_is_replaced() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");
        std::fs::write(&csv_path, "stale contents\n").unwrap();

        export_history_csv(&[workout(4, &[("squat", 3, 8, 60.0)])], &csv_path).unwrap();
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(!contents.contains("stale"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_empty_history_writes_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        assert_eq!(export_history_csv(&[], &csv_path).unwrap(), 0);
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(contents.starts_with("workout_id,date,"));
        assert_eq!(contents.lines().count(), 1);
    }
}
