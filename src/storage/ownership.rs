// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for owned records.
//!
//! A record owned by another user is reported exactly like a missing one
//! (`StorageError::NotFound`), so callers cannot probe for other users' ids.

use super::{StorageError, StorageResult};

/// Trait for records that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Human-readable kind used in error messages ("Goal", "Habit", ...).
    fn kind() -> &'static str;

    fn id(&self) -> &str;
}

/// Extension trait narrowing a lookup result to the caller's own records.
pub trait OwnershipCheck<T> {
    /// Return the record if `user_id` owns it, `NotFound` otherwise.
    fn owned_by(self, user_id: &str) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<T> {
    fn owned_by(self, user_id: &str) -> StorageResult<T> {
        let resource = self?;
        if resource.owner_user_id() == user_id {
            Ok(resource)
        } else {
            Err(StorageError::NotFound(format!(
                "{} {}",
                T::kind(),
                resource.id()
            )))
        }
    }
}
