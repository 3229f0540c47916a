//! File-backed [`Storage`] with locking and atomic replacement.
//!
//! Two on-disk layouts are supported:
//! - `per_collection`: `workouts.json`, `exercises.json`, `profile.json` and
//!   `settings.json`, each a JSON object of key -> record
//! - `single_file`: one `workout-storage.json` holding all four collections
//!
//! Backups go to `backups/<name>.json` under the same root.

use crate::storage::{Collection, Storage};
use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the combined document in the `single_file` layout
pub const SNAPSHOT_FILE: &str = "workout-storage.json";

type Table = BTreeMap<String, Value>;

/// How collections are laid out on disk
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    PerCollection,
    SingleFile,
}

/// JSON files under a root directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
    layout: Layout,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    fn table_path(&self, collection: Collection) -> PathBuf {
        match self.layout {
            Layout::PerCollection => self.root.join(format!("{}.json", collection.name())),
            Layout::SingleFile => self.root.join(SNAPSHOT_FILE),
        }
    }

    fn load_table(&self, collection: Collection) -> Result<Table> {
        let path = self.table_path(collection);
        match self.layout {
            Layout::PerCollection => read_json(&path),
            Layout::SingleFile => {
                let mut doc: BTreeMap<String, Table> = read_json(&path)?;
                Ok(doc.remove(collection.name()).unwrap_or_default())
            }
        }
    }

    /// Load a table, let `f` change it, and write the result back
    fn modify_table<T>(
        &mut self,
        collection: Collection,
        f: impl FnOnce(&mut Table) -> T,
    ) -> Result<T> {
        let path = self.table_path(collection);
        match self.layout {
            Layout::PerCollection => {
                let mut table: Table = read_json(&path)?;
                let out = f(&mut table);
                write_json(&path, &table)?;
                Ok(out)
            }
            Layout::SingleFile => {
                let mut doc: BTreeMap<String, Table> = read_json(&path)?;
                let out = f(doc.entry(collection.name().to_string()).or_default());
                write_json(&path, &doc)?;
                Ok(out)
            }
        }
    }
}

impl Storage for FileStorage {
    fn put(&mut self, collection: Collection, key: &str, value: Value) -> Result<()> {
        self.modify_table(collection, |table| {
            table.insert(key.to_string(), value);
        })
    }

    fn fetch(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        Ok(self.load_table(collection)?.remove(key))
    }

    fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.load_table(collection)?.into_values().collect())
    }

    fn remove(&mut self, collection: Collection, key: &str) -> Result<bool> {
        // Nothing to rewrite when the record is absent
        if !self.load_table(collection)?.contains_key(key) {
            return Ok(false);
        }
        self.modify_table(collection, |table| table.remove(key).is_some())
    }

    fn write_backup(&mut self, name: &str, contents: &str) -> Result<()> {
        let path = self.backup_dir().join(format!("{}.json", name));
        write_atomic(&path, contents.as_bytes())?;
        tracing::info!("Wrote backup to {:?}", path);
        Ok(())
    }
}

/// Read a JSON file under a shared lock; a missing file yields the default
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    // A corrupt table is an error rather than an empty one: the next write
    // would otherwise replace it and lose every record.
    serde_json::from_str(&contents)
        .map_err(|e| Error::Storage(format!("corrupt storage file {:?}: {}", path, e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_vec(value)?;
    write_atomic(path, &contents)
}

/// Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::Storage(format!("storage path {:?} has no parent directory", path))
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    // Acquire exclusive lock on the temp file to serialize concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(contents)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Wrote {:?}", path);
    Ok(())
}
