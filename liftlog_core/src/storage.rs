//! Keyed storage for the four record collections.
//!
//! Backends implement the raw [`Storage`] trait over JSON values; the typed
//! [`StorageExt`] layer on top serializes records and knows which collection
//! and key each one lives under.

use crate::{AppSettings, Exercise, Result, UserProfile, Workout};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Fixed key of the profile singleton
pub const PROFILE_KEY: &str = "user-profile";

/// Fixed key of the settings singleton
pub const SETTINGS_KEY: &str = "app-settings";

/// One of the persisted record collections
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Workouts,
    Exercises,
    Profile,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Workouts,
        Collection::Exercises,
        Collection::Profile,
        Collection::Settings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Workouts => "workouts",
            Collection::Exercises => "exercises",
            Collection::Profile => "profile",
            Collection::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw durable storage
///
/// A call returns only once the change is durable; an `Err` means nothing
/// was written.
pub trait Storage {
    fn put(&mut self, collection: Collection, key: &str, value: Value) -> Result<()>;
    fn fetch(&self, collection: Collection, key: &str) -> Result<Option<Value>>;
    fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>>;
    /// Returns whether a record was removed
    fn remove(&mut self, collection: Collection, key: &str) -> Result<bool>;
    /// Keep a named copy of an export document
    fn write_backup(&mut self, name: &str, contents: &str) -> Result<()>;
}

/// A record that knows where it is stored
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn key(&self) -> String;
}

impl Record for Workout {
    const COLLECTION: Collection = Collection::Workouts;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Record for Exercise {
    const COLLECTION: Collection = Collection::Exercises;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Record for UserProfile {
    const COLLECTION: Collection = Collection::Profile;

    fn key(&self) -> String {
        PROFILE_KEY.to_string()
    }
}

impl Record for AppSettings {
    const COLLECTION: Collection = Collection::Settings;

    fn key(&self) -> String {
        SETTINGS_KEY.to_string()
    }
}

/// Typed access on top of any [`Storage`]
pub trait StorageExt: Storage {
    fn save<R: Record>(&mut self, record: &R) -> Result<()> {
        let key = record.key();
        self.put(R::COLLECTION, &key, serde_json::to_value(record)?)?;
        tracing::debug!("Saved {} record {}", R::COLLECTION, key);
        Ok(())
    }

    fn get<R: Record>(&self, key: &str) -> Result<Option<R>> {
        match self.fetch(R::COLLECTION, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// All readable records of a collection; unreadable ones are logged and skipped
    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let mut records = Vec::new();
        for value in self.fetch_all(R::COLLECTION)? {
            match serde_json::from_value::<R>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable {} record: {}", R::COLLECTION, e);
                }
            }
        }
        Ok(records)
    }

    fn delete<R: Record>(&mut self, key: &str) -> Result<bool> {
        let removed = self.remove(R::COLLECTION, key)?;
        tracing::debug!("Deleted {} record {} (existed: {})", R::COLLECTION, key, removed);
        Ok(removed)
    }

    /// Workouts newest date first, skipping `offset` and returning at most `limit`
    fn workouts_by_date(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Workout>> {
        let mut workouts: Vec<Workout> = self.list()?;
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(workouts
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// Volatile storage, used for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: HashMap<Collection, BTreeMap<String, Value>>,
    backups: Vec<(String, String)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backups written so far, as (name, contents)
    pub fn backups(&self) -> &[(String, String)] {
        &self.backups
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.tables.get(&collection).map_or(0, BTreeMap::len)
    }
}

impl Storage for MemoryStorage {
    fn put(&mut self, collection: Collection, key: &str, value: Value) -> Result<()> {
        self.tables
            .entry(collection)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn fetch(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        Ok(self
            .tables
            .get(&collection)
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self
            .tables
            .get(&collection)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    fn remove(&mut self, collection: Collection, key: &str) -> Result<bool> {
        Ok(self
            .tables
            .get_mut(&collection)
            .map_or(false, |table| table.remove(key).is_some()))
    }

    fn write_backup(&mut self, name: &str, contents: &str) -> Result<()> {
        self.backups.push((name.to_string(), contents.to_string()));
        Ok(())
    }
}
