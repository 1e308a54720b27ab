// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the document store.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the JsonStorage for all file operations.

pub mod challenges;
pub mod coach;
pub mod diary;
pub mod goals;
pub mod habits;
pub mod users;

pub use challenges::{
    ChallengeRepository, ChallengeStatus, ChallengeTransitionError, Difficulty, StoredChallenge,
};
pub use coach::{CoachRepository, StoredCoachMessage};
pub use diary::{DiaryRepository, StoredDiaryEntry};
pub use goals::{GoalRepository, GoalStatus, StoredGoal, GOAL_DURATION_DAYS};
pub use habits::{habit_log_id, HabitRepository, LogSource, StoredHabit, StoredHabitLog};
pub use users::{normalize_email, StoredUser, UserRepository};
