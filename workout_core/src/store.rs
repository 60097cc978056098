//! Workout persistence with file locking.
//!
//! All workouts live in one JSON file. Reads take a shared lock on it.
//! Writers hold an exclusive lock on a sibling `.lock` file from load to
//! rename, and write through a temp file in the same directory which is then
//! renamed over the original. A store that cannot be parsed is moved aside to
//! a `.corrupt` file before it is first overwritten.

use crate::{Error, Result, Workout};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the store inside the data directory
pub const STORE_FILE: &str = "workouts.json";

/// The saved workout list
#[derive(Debug)]
pub struct WorkoutStore {
    path: PathBuf,
    workouts: Vec<Workout>,
    /// Set when the file on disk could not be read back
    unreadable: bool,
    /// Held exclusive lock on the writer lock file, released on drop
    writer_lock: Option<File>,
}

impl WorkoutStore {
    /// Open the store in a data directory for reading
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::load(&data_dir.join(STORE_FILE))
    }

    /// Open the store for a read-modify-write.
    ///
    /// Blocks until no other writer holds the store, and keeps it locked
    /// until the returned store is dropped.
    pub fn open_exclusive(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STORE_FILE);
        let lock = acquire_writer_lock(&path)?;
        let mut store = Self::load(&path)?;
        store.writer_lock = Some(lock);
        Ok(store)
    }

    /// Load workouts from a file with shared locking
    ///
    /// Returns an empty store if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let (workouts, unreadable) = match read_workouts(path) {
            Some(workouts) => (workouts, false),
            None => (Vec::new(), true),
        };
        Ok(Self {
            path: path.to_path_buf(),
            workouts,
            unreadable,
            writer_lock: None,
        })
    }

    /// Whether this store holds the writer lock
    pub fn is_exclusive(&self) -> bool {
        self.writer_lock.is_some()
    }

    /// Save all workouts atomically
    pub fn save(&mut self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        if self.unreadable && self.path.exists() {
            let backup = backup_path(&self.path);
            std::fs::rename(&self.path, &backup)?;
            tracing::warn!("Moved unreadable workout store to {:?}", backup);
        }
        self.unreadable = false;

        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(&self.workouts)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved {} workouts to {:?}", self.workouts.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Look up by id, then by case-insensitive name
    pub fn find(&self, key: &str) -> Option<&Workout> {
        self.get(key).or_else(|| {
            let key = key.to_lowercase();
            self.workouts.iter().find(|w| w.name.to_lowercase() == key)
        })
    }

    /// Like [`find`](Self::find), but a miss is a validation error
    pub fn require(&self, key: &str) -> Result<&Workout> {
        self.find(key)
            .ok_or_else(|| Error::Validation(format!("No workout named or with id {:?}", key)))
    }

    /// Add a new workout or replace the stored one with the same id.
    ///
    /// Replacing refreshes `updated_at`.
    pub fn upsert(&mut self, mut workout: Workout) {
        match self.workouts.iter_mut().find(|w| w.id == workout.id) {
            Some(existing) => {
                workout.touch();
                tracing::debug!("Replacing workout {}", workout.id);
                *existing = workout;
            }
            None => {
                tracing::debug!("Adding workout {}", workout.id);
                self.workouts.push(workout);
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Workout> {
        let index = self.workouts.iter().position(|w| w.id == id)?;
        Some(self.workouts.remove(index))
    }

    /// Load, modify and save back one workout.
    ///
    /// A store opened without the writer lock takes it here and re-reads the
    /// file first, so concurrent updates never overwrite each other.
    pub fn update<F>(&mut self, key: &str, f: F) -> Result<Workout>
    where
        F: FnOnce(&mut Workout) -> Result<()>,
    {
        if self.writer_lock.is_none() {
            self.writer_lock = Some(acquire_writer_lock(&self.path)?);
            let reloaded = Self::load(&self.path)?;
            self.workouts = reloaded.workouts;
            self.unreadable = reloaded.unreadable;
        }

        let mut workout = self.require(key)?.clone();
        f(&mut workout)?;
        self.upsert(workout.clone());
        self.save()?;
        Ok(self.get(&workout.id).cloned().unwrap_or(workout))
    }
}

fn lock_path(store_path: &Path) -> PathBuf {
    store_path.with_extension("json.lock")
}

fn backup_path(store_path: &Path) -> PathBuf {
    store_path.with_extension("json.corrupt")
}

fn acquire_writer_lock(store_path: &Path) -> Result<File> {
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path(store_path))?;
    file.lock_exclusive()?;
    tracing::debug!("Acquired writer lock for {:?}", store_path);
    Ok(file)
}

/// `None` means the file exists but could not be read or parsed
fn read_workouts(path: &Path) -> Option<Vec<Workout>> {
    if !path.exists() {
        tracing::info!("No workout store at {:?}, starting empty", path);
        return Some(Vec::new());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open workout store {:?}: {}. Starting empty.", path, e);
            return None;
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock workout store {:?}: {}. Starting empty.", path, e);
        return None;
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();

    if let Err(e) = read {
        tracing::warn!("Failed to read workout store {:?}: {}. Starting empty.", path, e);
        return None;
    }

    match serde_json::from_str::<Vec<Workout>>(&contents) {
        Ok(workouts) => {
            tracing::debug!("Loaded {} workouts from {:?}", workouts.len(), path);
            Some(workouts)
        }
        Err(e) => {
            tracing::warn!("Failed to parse workout store {:?}: {}. Starting empty.", path, e);
            None
        }
    }
}
