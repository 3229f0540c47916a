#![forbid(unsafe_code)]

//! Core domain model and business logic for liftlog, a personal workout log.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, profile, settings) and partial updates
//! - The built-in exercise catalogue
//! - Calorie, body-metric, recommendation and statistics calculations
//! - The observable [`Store`] with write-through persistence
//! - Storage backends, export/import and CSV history export

pub mod types;
pub mod error;
pub mod patch;
pub mod catalog;
pub mod metrics;
pub mod storage;
pub mod file_store;
pub mod store;
pub mod transfer;
pub mod config;
pub mod logging;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use patch::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog};
pub use metrics::{
    calculate_bmr, calculate_calories, recommendations, workout_stats, BmiCategory, BmrResult,
    WeeklyStat, WorkoutStats,
};
pub use storage::{Collection, MemoryStorage, Record, Storage, StorageExt};
pub use file_store::{FileStorage, Layout};
pub use store::{today, Snapshot, Store, SubscriptionId};
pub use transfer::{ExportDocument, ImportReport};
pub use config::Config;
pub use csv_export::export_history_csv;
