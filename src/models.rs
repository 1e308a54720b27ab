// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Data Models
//!
//! Types used by more than one layer (storage, AI prompts, HTTP handlers).
//! All types derive `Serialize`, `Deserialize`, and `ToSchema` for automatic
//! JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: the public summary returned by the auth endpoints
//! - **Coaches**: the persona a coach conversation is held with
//! - **Dates**: calendar-day parsing shared by goals and habit logs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredUser;

// =============================================================================
// Users
// =============================================================================

/// Public view of an account. Never includes the password digest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_demo: bool,
}

impl From<&StoredUser> for UserSummary {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_demo: user.is_demo,
        }
    }
}

// =============================================================================
// Coaches
// =============================================================================

/// AI coach persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Coach {
    /// High-energy encouragement
    Motivator,
    /// Plans, systems and next steps
    Strategist,
    /// Calm reflection and self-compassion
    Mindful,
}

impl Coach {
    pub const ALL: [Coach; 3] = [Coach::Motivator, Coach::Strategist, Coach::Mindful];

    pub fn as_str(&self) -> &'static str {
        match self {
            Coach::Motivator => "motivator",
            Coach::Strategist => "strategist",
            Coach::Mindful => "mindful",
        }
    }
}

impl std::fmt::Display for Coach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Coach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coach::ALL
            .into_iter()
            .find(|coach| coach.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown coach: {s}"))
    }
}

/// Author of a message in a coach conversation.
///
/// Ordered so that, for equal timestamps, a user's message sorts before the
/// reply to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CoachRole {
    User,
    Assistant,
}

// =============================================================================
// Dates
// =============================================================================

/// Format used for calendar days on the wire and in log ids.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
