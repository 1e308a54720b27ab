// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Daily challenge endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::envelope::{ApiJson, Envelope};
use crate::{
    ai::generate_challenges,
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::{ChallengeRepository, ChallengeStatus, GoalRepository, StoredChallenge},
};

/// Most challenges generated by one request.
pub const MAX_GENERATE_COUNT: u32 = 3;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateChallengesRequest {
    #[serde(default)]
    pub goal_id: Option<String>,
    /// 1 to 3, default 1.
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SkipChallengeRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeListResponse {
    pub challenges: Vec<StoredChallenge>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: StoredChallenge,
}

/// Generate the next day(s) of a goal's plan.
///
/// Day numbers continue after the goal's existing challenges. Without an AI
/// provider, default challenges are produced.
#[utoipa::path(
    post,
    path = "/api/challenges/generate",
    tag = "Challenges",
    request_body = GenerateChallengesRequest,
    responses(
        (status = 200, description = "Generated challenges", body = ChallengeListResponse),
        (status = 400, description = "Missing goalId, invalid count or plan already full"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Goal not found"),
        (status = 500, description = "AI provider error"),
        (status = 504, description = "AI provider timed out")
    )
)]
pub async fn generate(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateChallengesRequest>,
) -> Result<Json<Envelope<ChallengeListResponse>>, ApiError> {
    let goal_id = request
        .goal_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("goalId is required"))?;
    let count = request.count.unwrap_or(1);
    if !(1..=MAX_GENERATE_COUNT).contains(&count) {
        return Err(ApiError::bad_request(format!(
            "count must be between 1 and {MAX_GENERATE_COUNT}"
        )));
    }

    let storage = state.storage();
    let goal = GoalRepository::new(storage).get_owned(goal_id, &user.user_id)?;
    let challenges = ChallengeRepository::new(storage);
    let existing = challenges.list_by_goal(&goal.id)?;

    let next_day = existing.iter().map(|c| c.day_number).max().unwrap_or(0) + 1;
    if next_day > goal.duration_days {
        return Err(ApiError::bad_request(format!(
            "This goal's {}-day plan is already complete",
            goal.duration_days
        )));
    }
    let last_day = (next_day + count - 1).min(goal.duration_days);
    let days: Vec<u32> = (next_day..=last_day).collect();

    let suggestions = generate_challenges(state.ai(), &goal, &existing, &days).await?;

    let now = Utc::now();
    let mut created = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        let challenge = StoredChallenge {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            owner_user_id: user.user_id.clone(),
            day_number: suggestion.day_number,
            title: suggestion.title,
            description: suggestion.description,
            difficulty: suggestion.difficulty,
            status: ChallengeStatus::Pending,
            skip_reason: None,
            completed_at: None,
            created_at: now,
        };
        challenges.create(&challenge)?;
        created.push(challenge);
    }

    info!(
        user_id = %user.user_id,
        goal_id = %goal.id,
        count = created.len(),
        ai = state.ai().is_some(),
        "Generated challenges"
    );
    Ok(Envelope::ok(ChallengeListResponse {
        challenges: created,
    }))
}

/// Challenges of one goal, ordered by day.
#[utoipa::path(
    get,
    path = "/api/goals/{goal_id}/challenges",
    tag = "Challenges",
    params(("goal_id" = String, Path, description = "Goal ID")),
    responses(
        (status = 200, description = "Challenges of the goal", body = ChallengeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn list_for_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> Result<Json<Envelope<ChallengeListResponse>>, ApiError> {
    let storage = state.storage();
    let goal = GoalRepository::new(storage).get_owned(&goal_id, &user.user_id)?;
    let challenges = ChallengeRepository::new(storage).list_by_goal(&goal.id)?;
    Ok(Envelope::ok(ChallengeListResponse { challenges }))
}

/// Mark a challenge completed. Completing it twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/challenges/{challenge_id}/complete",
    tag = "Challenges",
    params(("challenge_id" = String, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Completed challenge", body = ChallengeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Challenge was skipped")
    )
)]
pub async fn complete(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Envelope<ChallengeResponse>>, ApiError> {
    let repo = ChallengeRepository::new(state.storage());
    let mut challenge = repo.get_owned(&challenge_id, &user.user_id)?;

    if challenge.complete(Utc::now())? {
        repo.update(&challenge)?;
    }
    Ok(Envelope::ok(ChallengeResponse { challenge }))
}

/// Skip a pending challenge, with an optional reason. Skipped is final.
#[utoipa::path(
    post,
    path = "/api/challenges/{challenge_id}/skip",
    tag = "Challenges",
    params(("challenge_id" = String, Path, description = "Challenge ID")),
    request_body(content = SkipChallengeRequest, description = "Optional; may be omitted"),
    responses(
        (status = 200, description = "Skipped challenge", body = ChallengeResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Challenge is not pending")
    )
)]
pub async fn skip(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope<ChallengeResponse>>, ApiError> {
    let request: SkipChallengeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SkipChallengeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request: {e}")))?
    };

    let repo = ChallengeRepository::new(state.storage());
    let mut challenge = repo.get_owned(&challenge_id, &user.user_id)?;
    challenge.skip(request.reason)?;
    repo.update(&challenge)?;

    Ok(Envelope::ok(ChallengeResponse { challenge }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::openai::tests::{chat_response, test_client};
    use crate::api::test_support::{request, TestApp};
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn new_goal(app: &TestApp, cookie: &str) -> String {
        let created = app
            .post("/api/goals", Some(cookie), json!({"title": "Learn Spanish"}))
            .await;
        created.body["goal"]["id"].as_str().unwrap().to_string()
    }

    fn days(body: &Value) -> Vec<u64> {
        body["challenges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["dayNumber"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn generate_without_session_is_unauthorized() {
        let app = TestApp::new();
        let response = app
            .post("/api/challenges/generate", None, json!({"goalId": "g1"}))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn generate_checks_session_before_body() {
        let app = TestApp::new();
        let response = app
            .send(request("POST", "/api/challenges/generate", None, None))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generate_requires_goal_id() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app
            .post("/api/challenges/generate", Some(&cookie), json!({}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "goalId is required");
    }

    #[tokio::test]
    async fn generate_for_unknown_or_foreign_goal_is_not_found() {
        let app = TestApp::new();
        let owner = app.cookie_for(&app.create_user("owner@example.com"));
        let other = app.cookie_for(&app.create_user("other@example.com"));
        let goal_id = new_goal(&app, &owner).await;

        for goal in ["missing", goal_id.as_str()] {
            let response = app
                .post("/api/challenges/generate", Some(&other), json!({"goalId": goal}))
                .await;
            assert_eq!(response.status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn generate_rejects_count_out_of_range() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        for count in [0, 4] {
            let response = app
                .post(
                    "/api/challenges/generate",
                    Some(&cookie),
                    json!({"goalId": goal_id, "count": count}),
                )
                .await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn default_challenges_continue_the_plan() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        let first = app
            .post(
                "/api/challenges/generate",
                Some(&cookie),
                json!({"goalId": goal_id, "count": 2}),
            )
            .await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(days(&first.body), vec![1, 2]);
        assert_eq!(first.body["challenges"][0]["status"], "pending");

        let second = app
            .post("/api/challenges/generate", Some(&cookie), json!({"goalId": goal_id}))
            .await;
        assert_eq!(days(&second.body), vec![3]);

        let listed = app
            .get(&format!("/api/goals/{goal_id}/challenges"), Some(&cookie))
            .await;
        assert_eq!(days(&listed.body), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn full_plan_is_rejected() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        for _ in 0..10 {
            let response = app
                .post(
                    "/api/challenges/generate",
                    Some(&cookie),
                    json!({"goalId": goal_id, "count": 3}),
                )
                .await;
            assert_eq!(response.status, StatusCode::OK);
        }
        let response = app
            .post("/api/challenges/generate", Some(&cookie), json!({"goalId": goal_id}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ai_challenges_are_stored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response(
                r#"{"challenges":[{"title":"Learn 10 words","description":"Use flashcards","difficulty":"easy"}]}"#,
            ))
            .mount(&server)
            .await;
        let client = test_client(&server.uri(), Duration::from_secs(5));
        let app = TestApp::new().with_state(|s| s.with_ai(Some(client)));
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        let response = app
            .post("/api/challenges/generate", Some(&cookie), json!({"goalId": goal_id}))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["challenges"][0]["title"], "Learn 10 words");
        assert_eq!(response.body["challenges"][0]["difficulty"], "easy");
    }

    #[tokio::test]
    async fn ai_timeout_is_gateway_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response("{}").set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
        let client = test_client(&server.uri(), Duration::from_millis(100));
        let app = TestApp::new().with_state(|s| s.with_ai(Some(client)));
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        let response = app
            .post("/api/challenges/generate", Some(&cookie), json!({"goalId": goal_id}))
            .await;
        assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.body["errorType"], "timeout");
        assert!(response.body["error"].as_str().unwrap().contains("100ms"));
    }

    #[tokio::test]
    async fn ai_error_message_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached for requests"}
            })))
            .mount(&server)
            .await;
        let client = test_client(&server.uri(), Duration::from_secs(5));
        let app = TestApp::new().with_state(|s| s.with_ai(Some(client)));
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let goal_id = new_goal(&app, &cookie).await;

        let response = app
            .post("/api/challenges/generate", Some(&cookie), json!({"goalId": goal_id}))
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["error"], "Rate limit reached for requests");
    }

    async fn first_challenge(app: &TestApp, cookie: &str) -> String {
        let goal_id = new_goal(app, cookie).await;
        let generated = app
            .post("/api/challenges/generate", Some(cookie), json!({"goalId": goal_id}))
            .await;
        generated.body["challenges"][0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = first_challenge(&app, &cookie).await;
        let uri = format!("/api/challenges/{id}/complete");

        let first = app.post(&uri, Some(&cookie), json!({})).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["challenge"]["status"], "completed");
        let completed_at = first.body["challenge"]["completedAt"].clone();
        assert!(completed_at.is_string());

        let again = app.post(&uri, Some(&cookie), json!({})).await;
        assert_eq!(again.status, StatusCode::OK);
        assert_eq!(again.body["challenge"]["completedAt"], completed_at);

        let skip = app
            .post(&format!("/api/challenges/{id}/skip"), Some(&cookie), json!({}))
            .await;
        assert_eq!(skip.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn skip_is_terminal_and_keeps_reason() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = first_challenge(&app, &cookie).await;
        let uri = format!("/api/challenges/{id}/skip");

        let skipped = app
            .post(&uri, Some(&cookie), json!({"reason": "  travelling  "}))
            .await;
        assert_eq!(skipped.status, StatusCode::OK);
        assert_eq!(skipped.body["challenge"]["status"], "skipped");
        assert_eq!(skipped.body["challenge"]["skipReason"], "travelling");

        let again = app.post(&uri, Some(&cookie), json!({})).await;
        assert_eq!(again.status, StatusCode::CONFLICT);

        let complete = app
            .post(&format!("/api/challenges/{id}/complete"), Some(&cookie), json!({}))
            .await;
        assert_eq!(complete.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn skip_accepts_empty_body() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = first_challenge(&app, &cookie).await;

        let response = app
            .send(request(
                "POST",
                &format!("/api/challenges/{id}/skip"),
                Some(&cookie),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body["challenge"].get("skipReason").is_none());
    }

    #[tokio::test]
    async fn foreign_challenge_is_not_found() {
        let app = TestApp::new();
        let owner = app.cookie_for(&app.create_user("owner@example.com"));
        let other = app.cookie_for(&app.create_user("other@example.com"));
        let id = first_challenge(&app, &owner).await;

        let response = app
            .post(&format!("/api/challenges/{id}/complete"), Some(&other), json!({}))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
