// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Voice diary endpoints.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::envelope::{ApiJson, Envelope};
use crate::{
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::{DiaryRepository, StoredDiaryEntry},
};

const TRANSCRIPT_MAX_CHARS: usize = 20_000;
const MOOD_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDiaryEntryRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiaryListResponse {
    pub entries: Vec<StoredDiaryEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiaryEntryResponse {
    pub entry: StoredDiaryEntry,
}

/// The caller's diary, newest first.
#[utoipa::path(
    get,
    path = "/api/diary",
    tag = "Voice",
    responses(
        (status = 200, description = "Diary entries", body = DiaryListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_entries(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<DiaryListResponse>>, ApiError> {
    let entries = DiaryRepository::new(state.storage()).list_by_owner(&user.user_id)?;
    Ok(Envelope::ok(DiaryListResponse { entries }))
}

/// Save a diary entry, usually a transcribed recording.
#[utoipa::path(
    post,
    path = "/api/diary",
    tag = "Voice",
    request_body = CreateDiaryEntryRequest,
    responses(
        (status = 200, description = "Entry saved", body = DiaryEntryResponse),
        (status = 400, description = "Empty or oversized transcript"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDiaryEntryRequest>,
) -> Result<Json<Envelope<DiaryEntryResponse>>, ApiError> {
    let transcript = request.transcript.trim();
    if transcript.is_empty() {
        return Err(ApiError::bad_request("Transcript is required"));
    }
    if transcript.chars().count() > TRANSCRIPT_MAX_CHARS {
        return Err(ApiError::bad_request("Transcript is too long"));
    }
    let mood = request
        .mood
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty());
    if mood.as_ref().is_some_and(|m| m.chars().count() > MOOD_MAX_CHARS) {
        return Err(ApiError::bad_request("Mood is too long"));
    }

    let entry = StoredDiaryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user.user_id,
        transcript: transcript.to_string(),
        mood,
        created_at: Utc::now(),
    };
    DiaryRepository::new(state.storage()).create(&entry)?;

    Ok(Envelope::ok(DiaryEntryResponse { entry }))
}
