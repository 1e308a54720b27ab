// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Speech-to-text for voice check-ins and diary entries.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::envelope::Envelope;
use crate::{ai::AiError, auth::Auth, error::ApiError, state::AppState};

/// Largest accepted upload; matches the provider's own limit.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

const DEFAULT_FILE_NAME: &str = "audio.webm";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TranscriptResponse {
    pub transcript: String,
}

/// Multipart form with a single `file` part.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct TranscribeForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

struct AudioUpload {
    bytes: Vec<u8>,
    file_name: String,
    content_type: Option<String>,
}

async fn read_audio(mut multipart: Multipart) -> Result<Option<AudioUpload>, ApiError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        ApiError::bad_request(format!("Invalid upload: {}", e.body_text()))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(invalid)?;
        return Ok(Some(AudioUpload {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        }));
    }
    Ok(None)
}

/// Transcribe an uploaded recording.
#[utoipa::path(
    post,
    path = "/api/transcribe",
    tag = "Voice",
    request_body(content = TranscribeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcript of the recording", body = TranscriptResponse),
        (status = 400, description = "Not a multipart upload, no file, or an empty file"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "AI provider error or not configured"),
        (status = 504, description = "AI provider timed out")
    )
)]
pub async fn transcribe(
    Auth(user): Auth,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<TranscriptResponse>>, ApiError> {
    let multipart =
        multipart.map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e.body_text())))?;
    let upload = read_audio(multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    if upload.bytes.is_empty() {
        return Err(ApiError::bad_request("Audio file is empty"));
    }

    let client = state.ai().ok_or(AiError::NotConfigured)?;
    let size = upload.bytes.len();
    let transcript = client
        .transcribe(upload.bytes, upload.file_name, upload.content_type.as_deref())
        .await?;

    tracing::debug!(user_id = %user.user_id, bytes = size, "Transcribed audio");
    Ok(Envelope::ok(TranscriptResponse { transcript }))
}
