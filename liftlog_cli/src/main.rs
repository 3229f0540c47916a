use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use liftlog_core::*;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal workout log with calorie and body metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout
    Log {
        /// Entries as EXERCISE_ID:SETSxREPS[@WEIGHT], e.g. bench_press:3x10@60
        #[arg(required = true)]
        entries: Vec<EntryArg>,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List logged workouts, newest first
    History {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Delete a logged workout
    DeleteWorkout { id: Uuid },

    /// Manage the exercise catalogue
    #[command(subcommand)]
    Exercise(ExerciseCommand),

    /// Show or set the user profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show settings, or change the ones given
    Settings {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        language: Option<Language>,
        #[arg(long)]
        weight_unit: Option<WeightUnit>,
        #[arg(long)]
        height_unit: Option<HeightUnit>,
        #[arg(long)]
        workout_reminder: Option<bool>,
        #[arg(long)]
        goal_achievement: Option<bool>,
        #[arg(long)]
        data_sharing: Option<bool>,
        #[arg(long)]
        analytics: Option<bool>,
    },

    /// Totals and the last eight weeks
    Stats {
        /// Reference date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Muscle groups to train next
    Recommend {
        /// Reference date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Write all data as a JSON export document
    Export {
        /// Output file, stdout if omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge a JSON export document into the log
    Import { file: PathBuf },

    /// Write the workout history as CSV, one row per exercise entry
    ExportCsv { file: PathBuf },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// List exercises
    List {
        /// Only this muscle group
        #[arg(long)]
        muscle_group: Option<MuscleGroup>,

        /// Only custom exercises
        #[arg(long)]
        custom: bool,
    },

    /// Add a custom exercise
    Add {
        name: String,
        #[arg(long)]
        calories_per_rep: f64,
        #[arg(long)]
        muscle_group: MuscleGroup,
        #[arg(long, default_value = "custom")]
        category: ExerciseCategory,
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a custom exercise
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        calories_per_rep: Option<f64>,
        #[arg(long)]
        muscle_group: Option<MuscleGroup>,
        #[arg(long)]
        category: Option<ExerciseCategory>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a custom exercise
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the profile with BMR, TDEE and BMI
    Show,

    /// Create the profile, or update the fields given
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<Gender>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        activity_level: Option<ActivityLevel>,
        /// Replaces the goal list; repeat for several goals
        #[arg(long = "goal")]
        goals: Vec<String>,
    },
}

/// One `EXERCISE_ID:SETSxREPS[@WEIGHT]` argument
#[derive(Clone, Debug, PartialEq)]
struct EntryArg {
    exercise_id: String,
    sets: u32,
    reps: u32,
    weight: f64,
}

impl FromStr for EntryArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("expected EXERCISE_ID:SETSxREPS[@WEIGHT], got '{}'", s);

        let (exercise_id, performance) = s.split_once(':').ok_or_else(invalid)?;
        let (volume, weight) = match performance.split_once('@') {
            Some((volume, weight)) => (volume, weight.parse().map_err(|_| invalid())?),
            None => (performance, 0.0),
        };
        let (sets, reps) = volume.split_once(['x', 'X']).ok_or_else(invalid)?;

        if exercise_id.is_empty() {
            return Err(invalid());
        }
        Ok(EntryArg {
            exercise_id: exercise_id.to_string(),
            sets: sets.parse().map_err(|_| invalid())?,
            reps: reps.parse().map_err(|_| invalid())?,
            weight,
        })
    }
}

fn main() -> Result<()> {
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let errors = get_default_catalog().validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    tracing::debug!(
        "Using data dir {:?} ({:?} layout)",
        config.data.data_dir,
        config.storage.layout
    );
    let mut store = Store::open(config.open_storage())?;

    match cli.command {
        Commands::Log {
            entries,
            date,
            duration,
            notes,
        } => cmd_log(&mut store, entries, date, duration, notes),
        Commands::History { limit, offset } => {
            cmd_history(&store, limit, offset);
            Ok(())
        }
        Commands::DeleteWorkout { id } => {
            store.delete_workout(id)?;
            println!("✓ Deleted workout {}", id);
            Ok(())
        }
        Commands::Exercise(command) => cmd_exercise(&mut store, command),
        Commands::Profile(command) => cmd_profile(&mut store, command),
        Commands::Settings {
            theme,
            language,
            weight_unit,
            height_unit,
            workout_reminder,
            goal_achievement,
            data_sharing,
            analytics,
        } => {
            let patch = SettingsPatch {
                theme,
                language,
                units: UnitsPatch {
                    weight: weight_unit,
                    height: height_unit,
                },
                notifications: NotificationsPatch {
                    workout_reminder,
                    goal_achievement,
                },
                privacy: PrivacyPatch {
                    data_sharing,
                    analytics,
                },
            };
            cmd_settings(&mut store, patch)
        }
        Commands::Stats { date } => {
            cmd_stats(&store, date.unwrap_or_else(today));
            Ok(())
        }
        Commands::Recommend { date } => {
            let groups = store.recommendations(date.unwrap_or_else(today));
            println!("Recommended next:");
            for group in groups {
                println!("  → {}", group);
            }
            Ok(())
        }
        Commands::Export { output } => cmd_export(&store, output),
        Commands::Import { file } => cmd_import(&mut store, file),
        Commands::ExportCsv { file } => {
            let rows = export_history_csv(store.workouts(), &file)?;
            println!("✓ Wrote {} rows to {}", rows, file.display());
            Ok(())
        }
    }
}

fn cmd_log<S: Storage>(
    store: &mut Store<S>,
    entries: Vec<EntryArg>,
    date: Option<NaiveDate>,
    duration: Option<u32>,
    notes: Option<String>,
) -> Result<()> {
    store.set_current_workout(WorkoutDraft {
        date: Some(date.unwrap_or_else(today)),
        exercises: Vec::new(),
        duration,
        notes,
    });
    for entry in entries {
        store.add_to_current_workout(&entry.exercise_id, entry.sets, entry.reps, entry.weight)?;
    }
    let workout = store.save_current_workout()?;

    println!("✓ Workout logged!");
    println!("  Id: {}", workout.id);
    println!("  Date: {}", workout.date);
    for entry in &workout.exercises {
        println!(
            "  {} {}x{} @ {} → {} kcal",
            entry.exercise.name, entry.sets, entry.reps, entry.weight, entry.calories
        );
    }
    println!("  Total: {} kcal", workout.total_calories);
    Ok(())
}

fn cmd_history<S: Storage>(store: &Store<S>, limit: Option<usize>, offset: usize) {
    let workouts = store.history(limit, offset);
    if workouts.is_empty() {
        println!("No workouts logged.");
        return;
    }

    for workout in workouts {
        let names: Vec<&str> = workout
            .exercises
            .iter()
            .map(|e| e.exercise.name.as_str())
            .collect();
        println!(
            "{}  {}  {} kcal  {}",
            workout.date,
            workout.id,
            workout.total_calories,
            names.join(", ")
        );
    }
}

fn cmd_exercise<S: Storage>(store: &mut Store<S>, command: ExerciseCommand) -> Result<()> {
    match command {
        ExerciseCommand::List {
            muscle_group,
            custom,
        } => {
            for exercise in store.exercises() {
                if custom && !exercise.is_custom {
                    continue;
                }
                if muscle_group
                    .as_ref()
                    .is_some_and(|group| *group != exercise.muscle_group)
                {
                    continue;
                }
                println!(
                    "{:<16} {:<20} {:<10} {:>5} kcal/rep{}",
                    exercise.id,
                    exercise.name,
                    exercise.muscle_group,
                    exercise.calories_per_rep,
                    if exercise.is_custom { "  (custom)" } else { "" }
                );
            }
        }
        ExerciseCommand::Add {
            name,
            calories_per_rep,
            muscle_group,
            category,
            description,
        } => {
            let exercise = store.add_exercise(NewExercise {
                name,
                calories_per_rep,
                muscle_group,
                category,
                description,
            })?;
            println!("✓ Added exercise {} ({})", exercise.name, exercise.id);
        }
        ExerciseCommand::Edit {
            id,
            name,
            calories_per_rep,
            muscle_group,
            category,
            description,
        } => {
            let exercise = store.update_exercise(
                &id,
                ExercisePatch {
                    name,
                    calories_per_rep,
                    muscle_group,
                    category,
                    description: description.map(Some),
                },
            )?;
            println!("✓ Updated exercise {} ({})", exercise.name, exercise.id);
        }
        ExerciseCommand::Delete { id } => {
            store.delete_exercise(&id)?;
            println!("✓ Deleted exercise {}", id);
        }
    }
    Ok(())
}

fn cmd_profile<S: Storage>(store: &mut Store<S>, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Show => {
            let Some(profile) = store.profile() else {
                println!("No profile set.");
                return Ok(());
            };
            println!("{}", profile.name);
            println!("  Age: {}", profile.age);
            println!("  Gender: {}", label(&profile.gender));
            println!("  Height: {} cm", profile.height);
            println!("  Weight: {} kg", profile.weight);
            println!("  Activity: {}", label(&profile.activity_level));
            if !profile.goals.is_empty() {
                let goals: Vec<&str> = profile.goals.iter().map(String::as_str).collect();
                println!("  Goals: {}", goals.join(", "));
            }
            if let Some(metrics) = store.body_metrics() {
                println!();
                println!("  BMR: {} kcal/day", metrics.bmr);
                println!("  TDEE: {} kcal/day", metrics.tdee);
                println!("  BMI: {} ({})", metrics.bmi, metrics.bmi_category.as_str());
            }
        }
        ProfileCommand::Set {
            name,
            age,
            gender,
            height,
            weight,
            activity_level,
            goals,
        } => {
            let goals = (!goals.is_empty()).then(|| goals.into_iter().collect());
            let profile = if store.profile().is_some() {
                store.update_profile(ProfilePatch {
                    name,
                    age,
                    gender,
                    height,
                    weight,
                    activity_level,
                    goals,
                })?
            } else {
                let missing = |field: &str| {
                    Error::Validation(format!("--{} is required when creating a profile", field))
                };
                store.set_profile(ProfileInput {
                    id: None,
                    name: name.ok_or_else(|| missing("name"))?,
                    age: age.ok_or_else(|| missing("age"))?,
                    gender: gender.ok_or_else(|| missing("gender"))?,
                    height: height.ok_or_else(|| missing("height"))?,
                    weight: weight.ok_or_else(|| missing("weight"))?,
                    activity_level: activity_level.ok_or_else(|| missing("activity-level"))?,
                    goals: goals.unwrap_or_default(),
                    created_at: None,
                })?
            };
            println!("✓ Saved profile for {}", profile.name);
        }
    }
    Ok(())
}

fn cmd_settings<S: Storage>(store: &mut Store<S>, patch: SettingsPatch) -> Result<()> {
    let settings = if patch.is_empty() {
        store.settings().clone()
    } else {
        let settings = store.update_settings(patch)?;
        println!("✓ Settings updated");
        settings
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn cmd_stats<S: Storage>(store: &Store<S>, reference_date: NaiveDate) {
    let stats = store.workout_stats(reference_date);
    println!("Workouts: {}", stats.total_workouts);
    println!("Calories: {} kcal", stats.total_calories);
    println!("Average: {} kcal/workout", stats.avg_calories_per_workout);
    println!();
    for week in &stats.weekly_stats {
        println!(
            "  {} – {}  {:>3} workouts  {:>6} kcal",
            week.week_start, week.week_end, week.workouts, week.calories
        );
    }
}

fn cmd_export<S: Storage>(store: &Store<S>, output: Option<PathBuf>) -> Result<()> {
    let json = store.export_all()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("✓ Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import<S: Storage>(store: &mut Store<S>, file: PathBuf) -> Result<()> {
    let json = std::fs::read_to_string(&file)?;
    let report = store.import_all(&json)?;

    println!("✓ Imported {} workouts", report.workouts);
    println!("  Custom exercises: {}", report.exercises);
    println!("  Profile: {}", if report.profile { "replaced" } else { "unchanged" });
    println!("  Settings: {}", if report.settings { "merged" } else { "unchanged" });
    if let Some(backup) = report.backup {
        println!("  Backup: {}", backup);
    }
    Ok(())
}

/// The serialized name of a unit-like enum value
fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_arg_parsing() {
        let entry: EntryArg = "bench_press:3x10@60".parse().unwrap();
        assert_eq!(entry.exercise_id, "bench_press");
        assert_eq!((entry.sets, entry.reps), (3, 10));
        assert_eq!(entry.weight, 60.0);

        let bodyweight: EntryArg = "push_up:4X15".parse().unwrap();
        assert_eq!(bodyweight.weight, 0.0);

        for bad in ["bench_press", ":3x10", "squat:3", "squat:ax10", "squat:3x10@heavy"] {
            assert!(bad.parse::<EntryArg>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
