// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the document store layout.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::DEFAULT_DATA_DIR;

/// Namespace for email index keys.
const EMAIL_INDEX_NAMESPACE: Uuid = Uuid::from_u128(0x6d6f_6d65_6e74_756d_8000_656d_6169_6c73);

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

/// Whether `id` is safe to embed in a file name.
///
/// Identifiers reach the store from URL paths, so anything outside
/// `[A-Za-z0-9_-]` is refused before a path is built.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every collection directory, in creation order.
    pub fn collection_dirs(&self) -> [PathBuf; 8] {
        [
            self.users_dir(),
            self.email_index_dir(),
            self.goals_dir(),
            self.challenges_dir(),
            self.habits_dir(),
            self.habit_logs_dir(),
            self.diary_dir(),
            self.coach_dir(),
        ]
    }

    // ========== Users ==========

    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    /// Directory of email → user id index entries.
    pub fn email_index_dir(&self) -> PathBuf {
        self.root.join("email_index")
    }

    /// Index entry for a (normalized) email address.
    ///
    /// Named by the UUIDv5 of the address, so the file name has a fixed
    /// length whatever the address contains.
    pub fn email_index(&self, normalized_email: &str) -> PathBuf {
        let key = Uuid::new_v5(&EMAIL_INDEX_NAMESPACE, normalized_email.as_bytes());
        self.email_index_dir().join(format!("{}.json", key.simple()))
    }

    // ========== Goals & Challenges ==========

    pub fn goals_dir(&self) -> PathBuf {
        self.root.join("goals")
    }

    pub fn goal(&self, goal_id: &str) -> PathBuf {
        self.goals_dir().join(format!("{goal_id}.json"))
    }

    pub fn challenges_dir(&self) -> PathBuf {
        self.root.join("challenges")
    }

    pub fn challenge(&self, challenge_id: &str) -> PathBuf {
        self.challenges_dir().join(format!("{challenge_id}.json"))
    }

    // ========== Habits ==========

    pub fn habits_dir(&self) -> PathBuf {
        self.root.join("habits")
    }

    pub fn habit(&self, habit_id: &str) -> PathBuf {
        self.habits_dir().join(format!("{habit_id}.json"))
    }

    pub fn habit_logs_dir(&self) -> PathBuf {
        self.root.join("habit_logs")
    }

    pub fn habit_log(&self, log_id: &str) -> PathBuf {
        self.habit_logs_dir().join(format!("{log_id}.json"))
    }

    // ========== Diary & Coaches ==========

    pub fn diary_dir(&self) -> PathBuf {
        self.root.join("diary")
    }

    pub fn diary_entry(&self, entry_id: &str) -> PathBuf {
        self.diary_dir().join(format!("{entry_id}.json"))
    }

    pub fn coach_dir(&self) -> PathBuf {
        self.root.join("coach")
    }

    pub fn coach_message(&self, message_id: &str) -> PathBuf {
        self.coach_dir().join(format!("{message_id}.json"))
    }
}
