// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Demo account provisioning.
//!
//! The demo account is created the first time someone starts a demo session
//! and is seeded with a goal, challenges, habits with recent logs and a diary
//! entry. Seeding is best-effort: a failure is logged and the session still
//! starts, possibly with partial sample data.

use chrono::{Days, Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::auth::{PasswordError, PasswordHasher};
use crate::models::today;
use crate::storage::{
    ChallengeRepository, ChallengeStatus, DiaryRepository, Difficulty, GoalRepository, GoalStatus,
    HabitRepository, JsonStorage, LogSource, StorageError, StorageResult, StoredChallenge,
    StoredDiaryEntry, StoredGoal, StoredHabit, StoredHabitLog, StoredUser, UserRepository,
    GOAL_DURATION_DAYS,
};

pub const DEMO_EMAIL: &str = "demo@momentum.app";
pub const DEMO_DISPLAY_NAME: &str = "Demo User";

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Return the demo account, creating and seeding it on first use.
pub fn ensure_demo_user(
    storage: &JsonStorage,
    hasher: &PasswordHasher,
) -> Result<StoredUser, DemoError> {
    let users = UserRepository::new(storage);
    if let Some(user) = users.find_by_email(DEMO_EMAIL)? {
        return Ok(user);
    }

    // Random password: the demo account cannot be logged into directly.
    let password_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;
    let user = StoredUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: DEMO_EMAIL.to_string(),
        display_name: DEMO_DISPLAY_NAME.to_string(),
        password_hash,
        is_demo: true,
        created_at: Utc::now(),
    };

    match users.create(&user) {
        Ok(()) => {}
        // Another request created it first; use theirs.
        Err(StorageError::AlreadyExists(_)) => {
            return users
                .find_by_email(DEMO_EMAIL)?
                .ok_or_else(|| StorageError::NotFound(format!("User {DEMO_EMAIL}")).into());
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, "Created demo account");
    if let Err(e) = seed_demo_data(storage, &user.id, today()) {
        warn!(user_id = %user.id, error = %e, "Failed to seed demo data");
    }
    Ok(user)
}

/// Write the demo sample data for `user_id`, as of `today`.
pub fn seed_demo_data(storage: &JsonStorage, user_id: &str, today: NaiveDate) -> StorageResult<()> {
    let now = Utc::now();
    let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);

    let goal = StoredGoal {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user_id.to_string(),
        title: "Build a calm morning routine".to_string(),
        description: Some(
            "Start every day with movement, stillness and a few pages of reading.".to_string(),
        ),
        category: Some("wellness".to_string()),
        start_date: days_ago(2),
        duration_days: GOAL_DURATION_DAYS,
        status: GoalStatus::Active,
        created_at: now - Duration::days(2),
    };
    GoalRepository::new(storage).create(&goal)?;

    let challenges = ChallengeRepository::new(storage);
    let plan = [
        (
            1,
            "Wake up 15 minutes earlier",
            "Set your alarm 15 minutes earlier and use the time for yourself.",
            Difficulty::Easy,
            ChallengeStatus::Completed,
        ),
        (
            2,
            "Five minutes of stillness",
            "Sit quietly for five minutes before checking your phone.",
            Difficulty::Easy,
            ChallengeStatus::Completed,
        ),
        (
            3,
            "Move before breakfast",
            "Do ten minutes of stretching or a short walk before you eat.",
            Difficulty::Medium,
            ChallengeStatus::Pending,
        ),
    ];
    for (day, title, description, difficulty, status) in plan {
        let created_at = now - Duration::days(3 - i64::from(day));
        challenges.create(&StoredChallenge {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            owner_user_id: user_id.to_string(),
            day_number: day,
            title: title.to_string(),
            description: description.to_string(),
            difficulty,
            status,
            skip_reason: None,
            completed_at: (status == ChallengeStatus::Completed).then_some(created_at),
            created_at,
        })?;
    }

    let habits = HabitRepository::new(storage);
    let seeds: [(&str, &[&str], [bool; 2]); 3] = [
        ("Meditate", &["meditate", "meditated", "meditation"], [true, true]),
        ("Exercise", &["workout", "exercised", "gym", "ran", "walk"], [true, false]),
        ("Read", &["book", "reading", "pages"], [false, true]),
    ];
    for (name, keywords, done) in seeds {
        let habit = StoredHabit {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id: user_id.to_string(),
            name: name.to_string(),
            description: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            created_at: now - Duration::days(2),
        };
        habits.create(&habit)?;
        for (offset, completed) in [(2, done[0]), (1, done[1])] {
            habits.upsert_log(&StoredHabitLog::new(
                &habit,
                days_ago(offset),
                completed,
                None,
                LogSource::Manual,
            ))?;
        }
    }

    DiaryRepository::new(storage).create(&StoredDiaryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user_id.to_string(),
        transcript: "Second morning in a row that I sat still before grabbing my phone. \
                     It felt strange at first, but the day started calmer."
            .to_string(),
        mood: Some("calm".to_string()),
        created_at: now - Duration::days(1),
    })?;

    Ok(())
}
