// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit and habit log repository.
//!
//! Habits live under `habits/{habit_id}.json`. Logs are keyed by habit and
//! calendar day (`habit_logs/{habit_id}_{YYYY-MM-DD}.json`), so logging the
//! same habit twice on one day replaces the earlier entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_safe_id, JsonStorage, OwnedResource, OwnershipCheck, StorageError, StorageResult,
};
use crate::models::DATE_FORMAT;

/// A tracked habit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredHabit {
    pub id: String,
    pub owner_user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Words that identify this habit in a spoken check-in.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for StoredHabit {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn kind() -> &'static str {
        "Habit"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// How a log entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Manual,
    Voice,
}

/// One habit on one day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredHabitLog {
    /// `{habit_id}_{YYYY-MM-DD}`
    pub id: String,
    pub habit_id: String,
    pub owner_user_id: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source: LogSource,
    pub logged_at: DateTime<Utc>,
}

impl StoredHabitLog {
    pub fn new(
        habit: &StoredHabit,
        date: NaiveDate,
        completed: bool,
        note: Option<String>,
        source: LogSource,
    ) -> Self {
        Self {
            id: habit_log_id(&habit.id, date),
            habit_id: habit.id.clone(),
            owner_user_id: habit.owner_user_id.clone(),
            date,
            completed,
            note,
            source,
            logged_at: Utc::now(),
        }
    }
}

/// Storage key of the log for `habit_id` on `date`.
pub fn habit_log_id(habit_id: &str, date: NaiveDate) -> String {
    format!("{habit_id}_{}", date.format(DATE_FORMAT))
}

/// Repository for habits and their daily logs.
pub struct HabitRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> HabitRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    pub fn create(&self, habit: &StoredHabit) -> StorageResult<()> {
        if !is_safe_id(&habit.id) {
            return Err(StorageError::InvalidId(habit.id.clone()));
        }
        self.storage
            .create_json(self.storage.paths().habit(&habit.id), habit)
    }

    pub fn get(&self, habit_id: &str) -> StorageResult<StoredHabit> {
        let not_found = || StorageError::NotFound(format!("Habit {habit_id}"));
        if !is_safe_id(habit_id) {
            return Err(not_found());
        }
        self.storage
            .read_json(self.storage.paths().habit(habit_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => not_found(),
                other => other,
            })
    }

    /// Get a habit only if `user_id` owns it.
    pub fn get_owned(&self, habit_id: &str, user_id: &str) -> StorageResult<StoredHabit> {
        self.get(habit_id).owned_by(user_id)
    }

    /// All habits owned by a user, oldest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredHabit>> {
        let mut habits = self
            .storage
            .read_all(self.storage.paths().habits_dir(), |h: &StoredHabit| {
                h.owner_user_id == user_id
            })?;
        habits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(habits)
    }

    /// Delete a habit together with all of its logs.
    pub fn delete(&self, habit_id: &str) -> StorageResult<()> {
        if !is_safe_id(habit_id) {
            return Err(StorageError::NotFound(format!("Habit {habit_id}")));
        }
        for log in self.list_logs_for_habit(habit_id)? {
            match self.storage.delete(self.storage.paths().habit_log(&log.id)) {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.storage.delete(self.storage.paths().habit(habit_id))
    }

    // ========== Logs ==========

    /// Insert or replace the log for `(log.habit_id, log.date)`.
    pub fn upsert_log(&self, log: &StoredHabitLog) -> StorageResult<()> {
        let id = habit_log_id(&log.habit_id, log.date);
        if !is_safe_id(&log.habit_id) || log.id != id {
            return Err(StorageError::InvalidId(log.id.clone()));
        }
        self.storage
            .write_json(self.storage.paths().habit_log(&id), log)
    }

    /// A user's logs for one day.
    pub fn list_logs_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<StoredHabitLog>> {
        let mut logs = self
            .storage
            .read_all(self.storage.paths().habit_logs_dir(), |l: &StoredHabitLog| {
                l.owner_user_id == user_id && l.date == date
            })?;
        logs.sort_by(|a, b| a.habit_id.cmp(&b.habit_id));
        Ok(logs)
    }

    /// Every log of one habit, oldest day first.
    pub fn list_logs_for_habit(&self, habit_id: &str) -> StorageResult<Vec<StoredHabitLog>> {
        let mut logs = self
            .storage
            .read_all(self.storage.paths().habit_logs_dir(), |l: &StoredHabitLog| {
                l.habit_id == habit_id
            })?;
        logs.sort_by_key(|l| l.date);
        Ok(logs)
    }
}
