// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Goal endpoints.
//!
//! A goal is a 30-day plan owned by one user. Goals owned by someone else
//! are reported as not found.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::envelope::{ApiJson, Empty, Envelope};
use crate::{
    auth::Auth,
    error::ApiError,
    models::{parse_date, today},
    state::AppState,
    storage::{
        ChallengeRepository, GoalRepository, GoalStatus, StoredChallenge, StoredGoal,
        GOAL_DURATION_DAYS,
    },
};

pub const TITLE_MAX_CHARS: usize = 120;
const DESCRIPTION_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// `YYYY-MM-DD`; defaults to today (UTC).
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateGoalRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalResponse {
    pub goal: StoredGoal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalListResponse {
    pub goals: Vec<StoredGoal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalDetailResponse {
    pub goal: StoredGoal,
    pub challenges: Vec<StoredChallenge>,
}

pub(crate) fn validate_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Trim optional free text; blank becomes `None`.
pub(crate) fn optional_text(raw: Option<String>, max_chars: usize) -> Result<Option<String>, ApiError> {
    let Some(text) = raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max_chars {
        return Err(ApiError::bad_request(format!(
            "Text must be at most {max_chars} characters"
        )));
    }
    Ok(Some(text))
}

/// List the caller's goals, newest first.
#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "Goals",
    responses(
        (status = 200, description = "Goals owned by the caller", body = GoalListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_goals(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<GoalListResponse>>, ApiError> {
    let goals = GoalRepository::new(state.storage()).list_by_owner(&user.user_id)?;
    Ok(Envelope::ok(GoalListResponse { goals }))
}

/// Start a new 30-day goal.
#[utoipa::path(
    post,
    path = "/api/goals",
    tag = "Goals",
    request_body = CreateGoalRequest,
    responses(
        (status = 200, description = "Goal created", body = GoalResponse),
        (status = 400, description = "Invalid title or date"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateGoalRequest>,
) -> Result<Json<Envelope<GoalResponse>>, ApiError> {
    let title = validate_title(&request.title)?;
    let start_date = match request.start_date.as_deref() {
        Some(raw) => parse_date(raw)
            .ok_or_else(|| ApiError::bad_request("startDate must be a YYYY-MM-DD date"))?,
        None => today(),
    };

    let goal = StoredGoal {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user.user_id.clone(),
        title,
        description: optional_text(request.description, DESCRIPTION_MAX_CHARS)?,
        category: optional_text(request.category, TITLE_MAX_CHARS)?,
        start_date,
        duration_days: GOAL_DURATION_DAYS,
        status: GoalStatus::Active,
        created_at: Utc::now(),
    };
    GoalRepository::new(state.storage()).create(&goal)?;

    info!(user_id = %user.user_id, goal_id = %goal.id, "Created goal");
    Ok(Envelope::ok(GoalResponse { goal }))
}

/// A goal together with its challenges, ordered by day.
#[utoipa::path(
    get,
    path = "/api/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = String, Path, description = "Goal ID")),
    responses(
        (status = 200, description = "Goal and its challenges", body = GoalDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn get_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> Result<Json<Envelope<GoalDetailResponse>>, ApiError> {
    let storage = state.storage();
    let goal = GoalRepository::new(storage).get_owned(&goal_id, &user.user_id)?;
    let challenges = ChallengeRepository::new(storage).list_by_goal(&goal.id)?;
    Ok(Envelope::ok(GoalDetailResponse { goal, challenges }))
}

/// Rename a goal, change its description or move it to another status.
#[utoipa::path(
    patch,
    path = "/api/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = String, Path, description = "Goal ID")),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Updated goal", body = GoalResponse),
        (status = 400, description = "Invalid title"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn update_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
    ApiJson(request): ApiJson<UpdateGoalRequest>,
) -> Result<Json<Envelope<GoalResponse>>, ApiError> {
    let repo = GoalRepository::new(state.storage());
    let mut goal = repo.get_owned(&goal_id, &user.user_id)?;

    if let Some(title) = request.title.as_deref() {
        goal.title = validate_title(title)?;
    }
    if request.description.is_some() {
        goal.description = optional_text(request.description, DESCRIPTION_MAX_CHARS)?;
    }
    if let Some(status) = request.status {
        goal.status = status;
    }
    repo.update(&goal)?;

    Ok(Envelope::ok(GoalResponse { goal }))
}

/// Delete a goal and all of its challenges.
#[utoipa::path(
    delete,
    path = "/api/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = String, Path, description = "Goal ID")),
    responses(
        (status = 200, description = "Goal deleted", body = Empty),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn delete_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    let storage = state.storage();
    let goal = GoalRepository::new(storage).get_owned(&goal_id, &user.user_id)?;

    let removed = ChallengeRepository::new(storage).delete_by_goal(&goal.id)?;
    GoalRepository::new(storage).delete(&goal.id)?;

    info!(
        user_id = %user.user_id,
        goal_id = %goal.id,
        challenges = removed,
        "Deleted goal"
    );
    Ok(Envelope::ok(Empty::default()))
}
