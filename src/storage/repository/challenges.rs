// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Daily challenge repository.
//!
//! Challenges belong to a goal and occupy one day of its plan. Each challenge
//! is stored as a separate JSON file under `challenges/{challenge_id}.json`.
//!
//! Status transitions:
//!
//! ```text
//! pending ──complete──► completed   (completing again is a no-op)
//!    │
//!    └────skip────────► skipped     (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_safe_id, JsonStorage, OwnedResource, OwnershipCheck, StorageError, StorageResult,
};

/// Challenge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Completed,
    Skipped,
}

/// How demanding a challenge is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse used on model output; anything unrecognised is `Medium`.
    pub fn from_loose(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "beginner" | "low" => Difficulty::Easy,
            "hard" | "difficult" | "advanced" | "high" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeTransitionError {
    #[error("Challenge has already been skipped")]
    AlreadySkipped,

    #[error("Challenge has already been completed")]
    AlreadyCompleted,
}

/// A daily challenge as stored on disk and returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredChallenge {
    pub id: String,
    pub goal_id: String,
    pub owner_user_id: String,
    /// Day of the goal's plan, 1-based.
    pub day_number: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub status: ChallengeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StoredChallenge {
    /// Mark the challenge completed.
    ///
    /// Returns `Ok(false)` when it already was, leaving `completed_at` intact.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<bool, ChallengeTransitionError> {
        match self.status {
            ChallengeStatus::Pending => {
                self.status = ChallengeStatus::Completed;
                self.completed_at = Some(now);
                Ok(true)
            }
            ChallengeStatus::Completed => Ok(false),
            ChallengeStatus::Skipped => Err(ChallengeTransitionError::AlreadySkipped),
        }
    }

    /// Skip a pending challenge, recording the optional reason.
    pub fn skip(&mut self, reason: Option<String>) -> Result<(), ChallengeTransitionError> {
        match self.status {
            ChallengeStatus::Pending => {
                self.status = ChallengeStatus::Skipped;
                self.skip_reason = reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
                Ok(())
            }
            ChallengeStatus::Completed => Err(ChallengeTransitionError::AlreadyCompleted),
            ChallengeStatus::Skipped => Err(ChallengeTransitionError::AlreadySkipped),
        }
    }
}

impl OwnedResource for StoredChallenge {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn kind() -> &'static str {
        "Challenge"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Repository for daily challenges.
pub struct ChallengeRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> ChallengeRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    pub fn create(&self, challenge: &StoredChallenge) -> StorageResult<()> {
        if !is_safe_id(&challenge.id) {
            return Err(StorageError::InvalidId(challenge.id.clone()));
        }
        self.storage
            .create_json(self.storage.paths().challenge(&challenge.id), challenge)
    }

    pub fn get(&self, challenge_id: &str) -> StorageResult<StoredChallenge> {
        let not_found = || StorageError::NotFound(format!("Challenge {challenge_id}"));
        if !is_safe_id(challenge_id) {
            return Err(not_found());
        }
        self.storage
            .read_json(self.storage.paths().challenge(challenge_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => not_found(),
                other => other,
            })
    }

    /// Get a challenge only if `user_id` owns it.
    pub fn get_owned(&self, challenge_id: &str, user_id: &str) -> StorageResult<StoredChallenge> {
        self.get(challenge_id).owned_by(user_id)
    }

    pub fn update(&self, challenge: &StoredChallenge) -> StorageResult<()> {
        let path = self.storage.paths().challenge(&challenge.id);
        if !is_safe_id(&challenge.id) || !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Challenge {}", challenge.id)));
        }
        self.storage.write_json(path, challenge)
    }

    /// Challenges of a goal, ordered by day.
    pub fn list_by_goal(&self, goal_id: &str) -> StorageResult<Vec<StoredChallenge>> {
        let mut challenges = self
            .storage
            .read_all(self.storage.paths().challenges_dir(), |c: &StoredChallenge| {
                c.goal_id == goal_id
            })?;
        challenges.sort_by(|a, b| {
            a.day_number
                .cmp(&b.day_number)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(challenges)
    }

    /// Remove every challenge of a goal. Returns how many were deleted.
    pub fn delete_by_goal(&self, goal_id: &str) -> StorageResult<usize> {
        let mut deleted = 0;
        for challenge in self.list_by_goal(goal_id)? {
            match self
                .storage
                .delete(self.storage.paths().challenge(&challenge.id))
            {
                Ok(()) => deleted += 1,
                Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }
}
