// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AI coach conversations.
//!
//! Each user holds one running conversation per coach persona. A turn sends
//! the persona prompt, the user's active goals and the recent history to the
//! model; the user's message and the reply are stored only once the model
//! has answered.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::envelope::{ApiJson, Envelope};
use crate::{
    ai::{coach_reply, AiError, COACH_HISTORY_LIMIT},
    auth::Auth,
    error::ApiError,
    models::{Coach, CoachRole},
    state::AppState,
    storage::{CoachRepository, GoalRepository, StoredCoachMessage},
};

const MESSAGE_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CoachChatRequest {
    /// `motivator`, `strategist` or `mindful`.
    #[serde(default)]
    pub coach: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoachChatResponse {
    pub reply: String,
    /// The stored user message and reply.
    pub messages: Vec<StoredCoachMessage>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoachHistoryResponse {
    pub messages: Vec<StoredCoachMessage>,
}

fn parse_coach(raw: &str) -> Result<Coach, ApiError> {
    raw.parse().map_err(ApiError::bad_request)
}

/// Send a message to a coach and get the reply.
#[utoipa::path(
    post,
    path = "/api/coach/chat",
    tag = "Coaches",
    request_body = CoachChatRequest,
    responses(
        (status = 200, description = "Coach reply", body = CoachChatResponse),
        (status = 400, description = "Unknown coach or empty message"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "AI provider error or not configured"),
        (status = 504, description = "AI provider timed out")
    )
)]
pub async fn chat(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CoachChatRequest>,
) -> Result<Json<Envelope<CoachChatResponse>>, ApiError> {
    let coach = parse_coach(&request.coach)?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Message must be at most {MESSAGE_MAX_CHARS} characters"
        )));
    }
    let client = state.ai().ok_or(AiError::NotConfigured)?;

    let storage = state.storage();
    let conversation = CoachRepository::new(storage);
    let goals = GoalRepository::new(storage).list_by_owner(&user.user_id)?;
    let history = conversation.history(&user.user_id, coach, Some(COACH_HISTORY_LIMIT))?;

    let reply = coach_reply(client, coach, &user.display_name, &goals, &history, message).await?;

    let question = StoredCoachMessage::new(&user.user_id, coach, CoachRole::User, message.to_string());
    let mut answer = StoredCoachMessage::new(&user.user_id, coach, CoachRole::Assistant, reply.clone());
    // Keep the reply strictly after the question when both land in the same instant.
    if answer.created_at <= question.created_at {
        answer.created_at = question.created_at + chrono::Duration::milliseconds(1);
    }
    conversation.append(&question)?;
    conversation.append(&answer)?;

    tracing::info!(user_id = %user.user_id, coach = %coach, "Coach replied");
    Ok(Envelope::ok(CoachChatResponse {
        reply,
        messages: vec![question, answer],
    }))
}

/// The whole conversation with one coach, oldest first.
#[utoipa::path(
    get,
    path = "/api/coach/{coach}/messages",
    tag = "Coaches",
    params(("coach" = Coach, Path, description = "Coach persona")),
    responses(
        (status = 200, description = "Conversation history", body = CoachHistoryResponse),
        (status = 400, description = "Unknown coach"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn messages(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(coach): Path<String>,
) -> Result<Json<Envelope<CoachHistoryResponse>>, ApiError> {
    let coach = parse_coach(&coach)?;
    let messages = CoachRepository::new(state.storage()).history(&user.user_id, coach, None)?;
    Ok(Envelope::ok(CoachHistoryResponse { messages }))
}

#[cfg(test)]
mod tests {
    use crate::ai::openai::tests::{chat_response, test_client};
    use crate::api::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer};

    async fn app_with_reply(reply: &str) -> (TestApp, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response(reply))
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_secs(5))))
        });
        (app, server)
    }

    #[tokio::test]
    async fn unknown_coach_is_bad_request() {
        let (app, _server) = app_with_reply("hi").await;
        let cookie = app.cookie_for(&app.create_user("a@example.com"));

        let chat = app
            .post(
                "/api/coach/chat",
                Some(&cookie),
                json!({"coach": "drill-sergeant", "message": "hi"}),
            )
            .await;
        assert_eq!(chat.status, StatusCode::BAD_REQUEST);

        let history = app.get("/api/coach/drill-sergeant/messages", Some(&cookie)).await;
        assert_eq!(history.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_stores_both_sides_per_coach() {
        let (app, _server) = app_with_reply("Let's plan your week.").await;
        let cookie = app.cookie_for(&app.create_user("a@example.com"));

        let response = app
            .post(
                "/api/coach/chat",
                Some(&cookie),
                json!({"coach": "Strategist", "message": "Where do I start?"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["reply"], "Let's plan your week.");
        assert_eq!(response.body["messages"][0]["role"], "user");
        assert_eq!(response.body["messages"][1]["role"], "assistant");

        let history = app.get("/api/coach/strategist/messages", Some(&cookie)).await;
        let messages = history.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "Where do I start?");
        assert_eq!(messages[1]["content"], "Let's plan your week.");

        let other_coach = app.get("/api/coach/mindful/messages", Some(&cookie)).await;
        assert_eq!(other_coach.body["messages"], json!([]));
    }

    #[tokio::test]
    async fn prompt_includes_active_goals() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Run a marathon"))
            .respond_with(chat_response("You can do it!"))
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_secs(5))))
        });
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        app.post("/api/goals", Some(&cookie), json!({"title": "Run a marathon"}))
            .await;

        let response = app
            .post(
                "/api/coach/chat",
                Some(&cookie),
                json!({"coach": "motivator", "message": "Pump me up"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["reply"], "You can do it!");
    }

    #[tokio::test]
    async fn without_provider_is_configuration_error() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app
            .post(
                "/api/coach/chat",
                Some(&cookie),
                json!({"coach": "mindful", "message": "hello"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["error"], "Server configuration error");

        let history = app.get("/api/coach/mindful/messages", Some(&cookie)).await;
        assert_eq!(history.body["messages"], json!([]));
    }
}
