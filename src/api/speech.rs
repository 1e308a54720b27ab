// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Text-to-speech for coach replies.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::envelope::ApiJson;
use crate::{ai::AiError, auth::Auth, error::ApiError, state::AppState};

/// Provider limit on input length.
pub const MAX_SPEECH_CHARS: usize = 4096;

const VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
    /// One of `alloy`, `echo`, `fable`, `onyx`, `nova`, `shimmer`.
    #[serde(default)]
    pub voice: Option<String>,
}

/// Read text aloud. Answers with MP3 audio.
#[utoipa::path(
    post,
    path = "/api/speech",
    tag = "Voice",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "MP3 audio", content_type = "audio/mpeg"),
        (status = 400, description = "Empty text, text too long or unknown voice"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "AI provider error or not configured"),
        (status = 504, description = "AI provider timed out")
    )
)]
pub async fn speech(
    Auth(_user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }
    if text.chars().count() > MAX_SPEECH_CHARS {
        return Err(ApiError::bad_request(format!(
            "Text must be at most {MAX_SPEECH_CHARS} characters"
        )));
    }
    let voice = match request.voice.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(voice) if VOICES.contains(&voice) => Some(voice),
        Some(voice) => return Err(ApiError::bad_request(format!("Unknown voice: {voice}"))),
        None => None,
    };

    let client = state.ai().ok_or(AiError::NotConfigured)?;
    let audio = client.speech(text, voice).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        audio,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::ai::openai::tests::test_client;
    use crate::api::test_support::TestApp;
    use axum::http::{header, StatusCode};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn blank_text_is_bad_request() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app.post("/api/speech", Some(&cookie), json!({"text": "  "})).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_voice_is_bad_request() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app
            .post("/api/speech", Some(&cookie), json!({"text": "hi", "voice": "robot"}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn without_provider_is_configuration_error() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app.post("/api/speech", Some(&cookie), json!({"text": "hi"})).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["error"], "Server configuration error");
    }

    #[tokio::test]
    async fn returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(body_partial_json(json!({"input": "Well done", "voice": "nova"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake".to_vec()))
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_secs(5))))
        });
        let cookie = app.cookie_for(&app.create_user("a@example.com"));

        let response = app
            .post(
                "/api/speech",
                Some(&cookie),
                json!({"text": "Well done", "voice": "nova"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE).unwrap(),
            "audio/mpeg"
        );
    }
}
