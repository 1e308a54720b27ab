// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User account repository.
//!
//! Accounts are stored under `users/{user_id}.json`. Email uniqueness is
//! enforced by an exclusive-create index entry under `email_index/`, written
//! before the account itself.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::{paths::is_safe_id, JsonStorage, StorageError, StorageResult};

/// User account as stored on disk. Never serialized to clients directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: String,
    /// Normalized (trimmed, lower-cased) email address.
    pub email: String,
    pub display_name: String,
    /// bcrypt digest of the password.
    pub password_hash: String,
    #[serde(default)]
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailIndexEntry {
    user_id: String,
}

/// Age after which an index entry without an account is considered abandoned.
pub const STALE_INDEX_AGE: Duration = Duration::from_secs(60);

/// Canonical form of an email address used for lookups and uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        if !is_safe_id(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage
            .read_json(self.storage.paths().user(user_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => StorageError::NotFound(format!("User {user_id}")),
                other => other,
            })
    }

    /// Look a user up by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let path = self.storage.paths().email_index(&normalize_email(email));
        let entry: EmailIndexEntry = match self.storage.read_json(path) {
            Ok(entry) => entry,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match self.get(&entry.user_id) {
            Ok(user) => Ok(Some(user)),
            // Index written but account write failed or was removed.
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a new account.
    ///
    /// Returns `StorageError::AlreadyExists` if the email is taken, including
    /// when two registrations for the same address race. An index entry left
    /// behind by a registration that never wrote its account is reclaimed
    /// once it is older than [`STALE_INDEX_AGE`].
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if !is_safe_id(&user.id) {
            return Err(StorageError::InvalidId(user.id.clone()));
        }

        let index_path = self.storage.paths().email_index(&user.email);
        let entry = EmailIndexEntry {
            user_id: user.id.clone(),
        };
        let taken = || StorageError::AlreadyExists(format!("User with email {}", user.email));

        match self.storage.create_json(&index_path, &entry) {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => {
                if !self.reclaim_stale_index(&index_path)? {
                    return Err(taken());
                }
                self.storage
                    .create_json(&index_path, &entry)
                    .map_err(|e| match e {
                        StorageError::AlreadyExists(_) => taken(),
                        other => other,
                    })?;
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = self.storage.write_json(self.storage.paths().user(&user.id), user) {
            if let Err(cleanup) = self.storage.delete(&index_path) {
                warn!(user_id = %user.id, error = %cleanup, "Failed to remove email index entry");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Delete the index entry at `index_path` if its account does not exist
    /// and the entry is old enough that no registration can still be writing
    /// it. Returns whether the slot is free again.
    fn reclaim_stale_index(&self, index_path: &Path) -> StorageResult<bool> {
        let entry: EmailIndexEntry = match self.storage.read_json(index_path) {
            Ok(entry) => entry,
            Err(StorageError::NotFound(_)) => return Ok(true),
            Err(e) => return Err(e),
        };
        let account_exists = is_safe_id(&entry.user_id)
            && self.storage.exists(self.storage.paths().user(&entry.user_id));
        if account_exists {
            return Ok(false);
        }

        let modified = match self.storage.modified_at(index_path) {
            Ok(modified) => modified,
            Err(StorageError::NotFound(_)) => return Ok(true),
            Err(e) => return Err(e),
        };
        if modified.elapsed().unwrap_or_default() < STALE_INDEX_AGE {
            return Ok(false);
        }

        match self.storage.delete(index_path) {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        warn!(user_id = %entry.user_id, "Reclaimed email index entry without an account");
        Ok(true)
    }
}
