// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Voice diary repository. Entries are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{paths::is_safe_id, JsonStorage, OwnedResource, StorageError, StorageResult};

/// A diary entry, usually a transcribed voice note.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredDiaryEntry {
    pub id: String,
    pub owner_user_id: String,
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for StoredDiaryEntry {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn kind() -> &'static str {
        "Diary entry"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct DiaryRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> DiaryRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    pub fn create(&self, entry: &StoredDiaryEntry) -> StorageResult<()> {
        if !is_safe_id(&entry.id) {
            return Err(StorageError::InvalidId(entry.id.clone()));
        }
        self.storage
            .create_json(self.storage.paths().diary_entry(&entry.id), entry)
    }

    /// A user's entries, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredDiaryEntry>> {
        let mut entries = self
            .storage
            .read_all(self.storage.paths().diary_dir(), |e: &StoredDiaryEntry| {
                e.owner_user_id == user_id
            })?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
