// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Goal repository.
//!
//! Goals are 30-day commitments. Each goal is stored as a separate JSON file
//! under `goals/{goal_id}.json`.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_safe_id, JsonStorage, OwnedResource, OwnershipCheck, StorageError, StorageResult,
};

/// Length of every goal's plan, in days.
pub const GOAL_DURATION_DAYS: u32 = 30;

/// Goal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Goal is in progress
    Active,
    /// User finished the plan
    Completed,
    /// User gave up on the goal
    Abandoned,
}

/// A goal as stored on disk and returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredGoal {
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

impl StoredGoal {
    /// Last day of the plan (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(self.duration_days.saturating_sub(1))))
            .unwrap_or(self.start_date)
    }

    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }
}

impl OwnedResource for StoredGoal {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn kind() -> &'static str {
        "Goal"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Repository for goals.
pub struct GoalRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> GoalRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    /// Create a new goal.
    pub fn create(&self, goal: &StoredGoal) -> StorageResult<()> {
        if !is_safe_id(&goal.id) {
            return Err(StorageError::InvalidId(goal.id.clone()));
        }
        self.storage
            .create_json(self.storage.paths().goal(&goal.id), goal)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("Goal {}", goal.id))
                }
                other => other,
            })
    }

    /// Get a goal by ID, regardless of owner.
    pub fn get(&self, goal_id: &str) -> StorageResult<StoredGoal> {
        let not_found = || StorageError::NotFound(format!("Goal {goal_id}"));
        if !is_safe_id(goal_id) {
            return Err(not_found());
        }
        self.storage
            .read_json(self.storage.paths().goal(goal_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => not_found(),
                other => other,
            })
    }

    /// Get a goal only if `user_id` owns it.
    pub fn get_owned(&self, goal_id: &str, user_id: &str) -> StorageResult<StoredGoal> {
        self.get(goal_id).owned_by(user_id)
    }

    /// Replace an existing goal.
    pub fn update(&self, goal: &StoredGoal) -> StorageResult<()> {
        let path = self.storage.paths().goal(&goal.id);
        if !is_safe_id(&goal.id) || !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Goal {}", goal.id)));
        }
        self.storage.write_json(path, goal)
    }

    /// Delete a goal. Its challenges are removed by the caller.
    pub fn delete(&self, goal_id: &str) -> StorageResult<()> {
        if !is_safe_id(goal_id) {
            return Err(StorageError::NotFound(format!("Goal {goal_id}")));
        }
        self.storage.delete(self.storage.paths().goal(goal_id))
    }

    /// All goals owned by a user, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredGoal>> {
        let mut goals = self
            .storage
            .read_all(self.storage.paths().goals_dir(), |g: &StoredGoal| {
                g.owner_user_id == user_id
            })?;
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonStorage) {
        let temp = TempDir::new().unwrap();
        let storage = JsonStorage::open(temp.path()).unwrap();
        (temp, storage)
    }

    fn test_goal(id: &str, owner: &str, created_at: DateTime<Utc>) -> StoredGoal {
        StoredGoal {
            id: id.to_string(),
            owner_user_id: owner.to_string(),
            title: "Run every morning".to_string(),
            description: None,
            category: Some("fitness".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            duration_days: GOAL_DURATION_DAYS,
            status: GoalStatus::Active,
            created_at,
        }
    }

    #[test]
    fn create_get_update_delete() {
        let (_temp, storage) = setup();
        let repo = GoalRepository::new(&storage);
        let mut goal = test_goal("g1", "u1", Utc::now());

        repo.create(&goal).unwrap();
        assert_eq!(repo.get("g1").unwrap(), goal);

        goal.status = GoalStatus::Completed;
        repo.update(&goal).unwrap();
        assert_eq!(repo.get("g1").unwrap().status, GoalStatus::Completed);

        repo.delete("g1").unwrap();
        assert!(matches!(repo.get("g1"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn foreign_goal_is_not_found() {
        let (_temp, storage) = setup();
        let repo = GoalRepository::new(&storage);
        repo.create(&test_goal("g1", "u1", Utc::now())).unwrap();

        assert!(repo.get_owned("g1", "u1").is_ok());
        assert!(matches!(
            repo.get_owned("g1", "u2"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn update_of_missing_goal_fails() {
        let (_temp, storage) = setup();
        let repo = GoalRepository::new(&storage);
        let result = repo.update(&test_goal("ghost", "u1", Utc::now()));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn list_by_owner_is_newest_first() {
        let (_temp, storage) = setup();
        let repo = GoalRepository::new(&storage);
        let now = Utc::now();
        repo.create(&test_goal("old", "u1", now - Duration::days(2)))
            .unwrap();
        repo.create(&test_goal("new", "u1", now)).unwrap();
        repo.create(&test_goal("other", "u2", now)).unwrap();

        let ids: Vec<String> = repo
            .list_by_owner("u1")
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn end_date_covers_thirty_days() {
        let goal = test_goal("g1", "u1", Utc::now());
        assert_eq!(goal.end_date(), NaiveDate::from_ymd_opt(2026, 1, 30).unwrap());
    }

    #[test]
    fn serializes_camel_case() {
        let goal = test_goal("g1", "u1", Utc::now());
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["ownerUserId"], "u1");
        assert_eq!(json["startDate"], "2026-01-01");
        assert_eq!(json["durationDays"], 30);
        assert_eq!(json["status"], "active");
        assert!(json.get("description").is_none());
    }
}
