// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Storage Module
//!
//! This module provides persistent storage as JSON documents on the local
//! filesystem, one file per record, under the configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   users/{user_id}.json
//!   email_index/{hex(email)}.json   # email → user id, created exclusively
//!   goals/{goal_id}.json
//!   challenges/{challenge_id}.json
//!   habits/{habit_id}.json
//!   habit_logs/{habit_id}_{YYYY-MM-DD}.json
//!   diary/{entry_id}.json
//!   coach/{message_id}.json
//! ```
//!
//! ## Important Notes
//!
//! - Writes are atomic (temp file + rename); readers never see partial JSON
//! - Identifiers from URLs are validated before any path is built
//! - Records owned by another user are reported as not found

pub mod json_fs;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use json_fs::{JsonStorage, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipCheck};
pub use paths::StoragePaths;
pub use repository::{
    habit_log_id, normalize_email, ChallengeRepository, ChallengeStatus,
    ChallengeTransitionError, CoachRepository, DiaryRepository, Difficulty, GoalRepository,
    GoalStatus, HabitRepository, LogSource, StoredChallenge, StoredCoachMessage,
    StoredDiaryEntry, StoredGoal, StoredHabit, StoredHabitLog, StoredUser, UserRepository,
    GOAL_DURATION_DAYS,
};
