// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON document storage on the local filesystem.
//!
//! Every record is one pretty-printed JSON file. Writes go to a uniquely
//! named temp file first and are renamed into place, so readers never see a
//! half-written document. Exclusive creation (`create_json`) publishes the
//! temp file with a hard link, which fails if the target exists, so
//! uniqueness checks (e.g. one account per email) are atomic without a lock.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage not initialized")]
    NotInitialized,

    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Filesystem-backed JSON document store.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl JsonStorage {
    /// Create a new JsonStorage instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Create and initialize storage rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let mut storage = Self::new(StoragePaths::new(root));
        storage.initialize()?;
        Ok(storage)
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create all collection directories. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        for dir in self.paths.collection_dirs() {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete probe used by the readiness check.
    pub fn health_check(&self) -> StorageResult<()> {
        self.ensure_initialized()?;

        let probe = self.paths.root().join(".health_check");
        let data = b"health_check_data";

        fs::write(&probe, data)?;
        let read_back = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read_back != data {
            return Err(StorageError::Io(io::Error::other(
                "health check data mismatch",
            )));
        }

        Ok(())
    }

    // ========== Generic JSON Operations ==========

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        self.ensure_initialized()?;

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write a JSON file, replacing any existing document atomically.
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        self.ensure_initialized()?;

        let path = path.as_ref();
        let temp_path = self.write_temp(path, value)?;

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Write a JSON file only if it does not exist yet.
    ///
    /// The document is written to a temp file and published with a hard
    /// link, which fails if the target exists. Readers therefore see either
    /// no file or the complete document. Returns `StorageError::AlreadyExists`
    /// when another writer got there first.
    pub fn create_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> StorageResult<()> {
        self.ensure_initialized()?;

        let path = path.as_ref();
        let temp_path = self.write_temp(path, value)?;

        let published = fs::hard_link(&temp_path, path);
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
        }
        published.map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.display().to_string()),
            _ => StorageError::from(e),
        })
    }

    /// Serialize `value` into a fresh temp file next to `path`.
    fn write_temp<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let written = File::create(&temp_path).map_err(StorageError::from).and_then(|file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            Ok(())
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(temp_path)
    }

    /// When the file at `path` was last modified.
    pub fn modified_at(&self, path: impl AsRef<Path>) -> StorageResult<SystemTime> {
        self.ensure_initialized()?;
        Ok(fs::metadata(path.as_ref())?.modified()?)
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Delete a file. Missing files are reported as `NotFound`.
    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        self.ensure_initialized()?;
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// List the stems of all files with `extension` in a directory.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        self.ensure_initialized()?;

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Read every document in a directory that satisfies `keep`.
    ///
    /// Unreadable documents are logged and skipped so one corrupt file does
    /// not take a whole listing down.
    pub fn read_all<T, F>(&self, dir: impl AsRef<Path>, mut keep: F) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let dir = dir.as_ref();
        let mut records = Vec::new();
        for id in self.list_files(dir, "json")? {
            match self.read_json::<T>(dir.join(format!("{id}.json"))) {
                Ok(record) if keep(&record) => records.push(record),
                Ok(_) => {}
                // Deleted between listing and reading.
                Err(StorageError::NotFound(_)) => {}
                Err(e) => tracing::warn!(document = %id, error = %e, "Skipping unreadable document"),
            }
        }
        Ok(records)
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, JsonStorage) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::open(temp.path()).expect("initialize storage");
        (temp, storage)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: String,
        value: i32,
    }

    #[test]
    fn initialize_creates_directories() {
        let (_temp, storage) = test_storage();
        for dir in storage.paths().collection_dirs() {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
    }

    #[test]
    fn uninitialized_storage_refuses_io() {
        let temp = TempDir::new().unwrap();
        let storage = JsonStorage::new(StoragePaths::new(temp.path()));
        let result: StorageResult<TestData> = storage.read_json(temp.path().join("x.json"));
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }

    #[test]
    fn write_and_read_json() {
        let (_temp, storage) = test_storage();
        let data = TestData {
            id: "test-1".to_string(),
            value: 42,
        };

        let path = storage.paths().goals_dir().join("test.json");
        storage.write_json(&path, &data).unwrap();

        let read: TestData = storage.read_json(&path).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn write_json_replaces_and_leaves_no_temp_files() {
        let (_temp, storage) = test_storage();
        let path = storage.paths().goals_dir().join("g.json");
        for value in 0..3 {
            storage
                .write_json(&path, &TestData { id: "g".into(), value })
                .unwrap();
        }

        let read: TestData = storage.read_json(&path).unwrap();
        assert_eq!(read.value, 2);
        let entries = fs::read_dir(storage.paths().goals_dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn create_json_is_exclusive() {
        let (_temp, storage) = test_storage();
        let path = storage.paths().users_dir().join("u.json");
        let data = TestData { id: "u".into(), value: 1 };

        storage.create_json(&path, &data).unwrap();
        let second = storage.create_json(&path, &TestData { id: "u".into(), value: 2 });
        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));

        let kept: TestData = storage.read_json(&path).unwrap();
        assert_eq!(kept, data);
        let entries = fs::read_dir(storage.paths().users_dir()).unwrap().count();
        assert_eq!(entries, 1, "temp files must not be left behind");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_temp, storage) = test_storage();
        let result: StorageResult<TestData> =
            storage.read_json(storage.paths().goals_dir().join("missing.json"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(matches!(
            storage.delete(storage.paths().goals_dir().join("missing.json")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn read_all_filters_and_skips_corrupt_documents() {
        let (_temp, storage) = test_storage();
        let dir = storage.paths().habits_dir();
        for i in 1..=3 {
            storage
                .write_json(dir.join(format!("h{i}.json")), &TestData { id: format!("h{i}"), value: i })
                .unwrap();
        }
        fs::write(dir.join("broken.json"), b"{not json").unwrap();

        let mut odd: Vec<TestData> = storage.read_all(&dir, |d: &TestData| d.value % 2 == 1).unwrap();
        odd.sort_by_key(|d| d.value);
        assert_eq!(odd.len(), 2);
        assert_eq!(odd[0].id, "h1");
        assert_eq!(odd[1].id, "h3");
    }

    #[test]
    fn health_check_works() {
        let (_temp, storage) = test_storage();
        storage.health_check().expect("health check should pass");
    }
}
