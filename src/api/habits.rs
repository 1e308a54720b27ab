// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit endpoints: habits, daily logs and spoken check-ins.
//!
//! A check-in transcript is interpreted by the AI strategy when a provider
//! is configured, and by keyword matching otherwise. An AI failure other
//! than a timeout falls back to keywords; a timeout is reported as 504.

use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use super::envelope::{ApiJson, Empty, Envelope};
use crate::{
    ai::{AiError, AiInterpreter, HabitInterpreter, InterpretMethod, InterpretedLog, KeywordInterpreter},
    auth::Auth,
    error::ApiError,
    models::{parse_date, today},
    state::AppState,
    storage::{HabitRepository, LogSource, StoredHabit, StoredHabitLog},
};

pub const NAME_MAX_CHARS: usize = 80;
const MAX_KEYWORDS: usize = 20;
const NOTE_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateHabitRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Extra words that identify the habit in a spoken check-in.
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LogHabitRequest {
    pub completed: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InterpretRequest {
    #[serde(default)]
    pub transcript: String,
    /// `YYYY-MM-DD`; defaults to today (UTC).
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LogsQuery {
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HabitListResponse {
    pub habits: Vec<StoredHabit>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HabitResponse {
    pub habit: StoredHabit,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HabitLogResponse {
    pub log: StoredHabitLog,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HabitLogListResponse {
    pub logs: Vec<StoredHabitLog>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterpretResponse {
    pub logs: Vec<StoredHabitLog>,
    pub method: InterpretMethod,
}

fn date_or_today(raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    match raw.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw).ok_or_else(|| invalid_date(raw)),
        None => Ok(today()),
    }
}

fn invalid_date(raw: &str) -> ApiError {
    ApiError::bad_request(format!("Invalid date {raw:?}, expected YYYY-MM-DD"))
}

fn trimmed_note(note: Option<String>) -> Result<Option<String>, ApiError> {
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if note.as_ref().is_some_and(|n| n.chars().count() > NOTE_MAX_CHARS) {
        return Err(ApiError::bad_request(format!(
            "Note must be at most {NOTE_MAX_CHARS} characters"
        )));
    }
    Ok(note)
}

/// Lower-cased, trimmed, de-duplicated keywords.
fn normalize_keywords(raw: Vec<String>) -> Result<Vec<String>, ApiError> {
    let keywords: BTreeSet<String> = raw
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.len() > MAX_KEYWORDS {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_KEYWORDS} keywords are allowed"
        )));
    }
    Ok(keywords.into_iter().collect())
}

/// List the caller's habits, oldest first.
#[utoipa::path(
    get,
    path = "/api/habits",
    tag = "Habits",
    responses(
        (status = 200, description = "Habits owned by the caller", body = HabitListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_habits(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<HabitListResponse>>, ApiError> {
    let habits = HabitRepository::new(state.storage()).list_by_owner(&user.user_id)?;
    Ok(Envelope::ok(HabitListResponse { habits }))
}

/// Start tracking a habit.
#[utoipa::path(
    post,
    path = "/api/habits",
    tag = "Habits",
    request_body = CreateHabitRequest,
    responses(
        (status = 200, description = "Habit created", body = HabitResponse),
        (status = 400, description = "Invalid name or keywords"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_habit(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateHabitRequest>,
) -> Result<Json<Envelope<HabitResponse>>, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Name must be at most {NAME_MAX_CHARS} characters"
        )));
    }

    let habit = StoredHabit {
        id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: user.user_id.clone(),
        name: name.to_string(),
        description: request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        keywords: normalize_keywords(request.keywords)?,
        created_at: Utc::now(),
    };
    HabitRepository::new(state.storage()).create(&habit)?;

    info!(user_id = %user.user_id, habit_id = %habit.id, "Created habit");
    Ok(Envelope::ok(HabitResponse { habit }))
}

/// Stop tracking a habit; its logs are deleted too.
#[utoipa::path(
    delete,
    path = "/api/habits/{habit_id}",
    tag = "Habits",
    params(("habit_id" = String, Path, description = "Habit ID")),
    responses(
        (status = 200, description = "Habit deleted", body = Empty),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn delete_habit(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    let repo = HabitRepository::new(state.storage());
    let habit = repo.get_owned(&habit_id, &user.user_id)?;
    repo.delete(&habit.id)?;

    info!(user_id = %user.user_id, habit_id = %habit.id, "Deleted habit");
    Ok(Envelope::ok(Empty::default()))
}

/// Record whether a habit was done on a day. Repeating the call replaces
/// the earlier log.
#[utoipa::path(
    put,
    path = "/api/habits/{habit_id}/logs/{date}",
    tag = "Habits",
    params(
        ("habit_id" = String, Path, description = "Habit ID"),
        ("date" = String, Path, description = "Day, YYYY-MM-DD")
    ),
    request_body = LogHabitRequest,
    responses(
        (status = 200, description = "Stored log", body = HabitLogResponse),
        (status = 400, description = "Invalid date or body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn log_habit(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((habit_id, date)): Path<(String, String)>,
    ApiJson(request): ApiJson<LogHabitRequest>,
) -> Result<Json<Envelope<HabitLogResponse>>, ApiError> {
    let date = parse_date(&date).ok_or_else(|| invalid_date(&date))?;
    let repo = HabitRepository::new(state.storage());
    let habit = repo.get_owned(&habit_id, &user.user_id)?;

    let log = StoredHabitLog::new(
        &habit,
        date,
        request.completed,
        trimmed_note(request.note)?,
        LogSource::Manual,
    );
    repo.upsert_log(&log)?;

    Ok(Envelope::ok(HabitLogResponse { log }))
}

/// The caller's habit logs for one day.
#[utoipa::path(
    get,
    path = "/api/habits/logs",
    tag = "Habits",
    params(LogsQuery),
    responses(
        (status = 200, description = "Logs for the day", body = HabitLogListResponse),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_logs(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Envelope<HabitLogListResponse>>, ApiError> {
    let date = date_or_today(query.date.as_deref())?;
    let logs = HabitRepository::new(state.storage()).list_logs_by_date(&user.user_id, date)?;
    Ok(Envelope::ok(HabitLogListResponse { logs }))
}

async fn run_interpreter<I: HabitInterpreter>(
    interpreter: &I,
    transcript: &str,
    habits: &[StoredHabit],
) -> Result<(Vec<InterpretedLog>, InterpretMethod), AiError> {
    let logs = interpreter.interpret(transcript, habits).await?;
    Ok((logs, interpreter.method()))
}

/// Pick the interpretation strategy for this request.
async fn interpret_check_in(
    state: &AppState,
    transcript: &str,
    habits: &[StoredHabit],
) -> Result<(Vec<InterpretedLog>, InterpretMethod), AiError> {
    if habits.is_empty() {
        return Ok((Vec::new(), InterpretMethod::Keyword));
    }
    let Some(client) = state.ai() else {
        return run_interpreter(&KeywordInterpreter, transcript, habits).await;
    };

    match run_interpreter(&AiInterpreter::new(client), transcript, habits).await {
        Ok(result) => Ok(result),
        Err(e) if e.is_timeout() => Err(e),
        Err(e) => {
            warn!(error = %e, "AI check-in interpretation failed, using keyword matching");
            run_interpreter(&KeywordInterpreter, transcript, habits).await
        }
    }
}

/// Turn a spoken check-in into habit logs for one day.
#[utoipa::path(
    post,
    path = "/api/habits/interpret",
    tag = "Habits",
    request_body = InterpretRequest,
    responses(
        (status = 200, description = "Logs written from the check-in", body = InterpretResponse),
        (status = 400, description = "Empty transcript or invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 504, description = "AI provider timed out")
    )
)]
pub async fn interpret(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InterpretRequest>,
) -> Result<Json<Envelope<InterpretResponse>>, ApiError> {
    let transcript = request.transcript.trim();
    if transcript.is_empty() {
        return Err(ApiError::bad_request("Transcript is required"));
    }
    let date = date_or_today(request.date.as_deref())?;

    let repo = HabitRepository::new(state.storage());
    let habits = repo.list_by_owner(&user.user_id)?;
    let (interpreted, method) = interpret_check_in(&state, transcript, &habits).await?;

    let by_id: HashMap<&str, &StoredHabit> = habits.iter().map(|h| (h.id.as_str(), h)).collect();
    let mut logs = Vec::with_capacity(interpreted.len());
    for entry in interpreted {
        let Some(habit) = by_id.get(entry.habit_id.as_str()) else {
            continue;
        };
        let log = StoredHabitLog::new(habit, date, entry.completed, entry.note, LogSource::Voice);
        repo.upsert_log(&log)?;
        logs.push(log);
    }

    info!(
        user_id = %user.user_id,
        method = ?method,
        logged = logs.len(),
        "Interpreted habit check-in"
    );
    Ok(Envelope::ok(InterpretResponse { logs, method }))
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

    async fn create(app: &TestApp, cookie: &str, name: &str, keywords: &[&str]) -> String {
        let response = app
            .post(
                "/api/habits",
                Some(cookie),
                json!({"name": name, "keywords": keywords}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["habit"]["id"].as_str().unwrap().to_string()
    }

    fn completed_by_habit(body: &Value) -> HashMap<String, bool> {
        body["logs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| {
                (
                    l["habitId"].as_str().unwrap().to_string(),
                    l["completed"].as_bool().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn keywords_are_normalized() {
        let keywords = normalize_keywords(vec![
            " Gym ".into(),
            "gym".into(),
            "".into(),
            "Run".into(),
        ])
        .unwrap();
        assert_eq!(keywords, vec!["gym".to_string(), "run".to_string()]);
    }

    #[tokio::test]
    async fn create_list_and_delete() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = create(&app, &cookie, "Meditate", &["Meditated"]).await;

        let list = app.get("/api/habits", Some(&cookie)).await;
        assert_eq!(list.body["habits"][0]["keywords"], json!(["meditated"]));

        app.send(request(
            "PUT",
            &format!("/api/habits/{id}/logs/2026-03-01"),
            Some(&cookie),
            Some(json!({"completed": true})),
        ))
        .await;

        let deleted = app
            .send(request("DELETE", &format!("/api/habits/{id}"), Some(&cookie), None))
            .await;
        assert_eq!(deleted.status, StatusCode::OK);

        let list = app.get("/api/habits", Some(&cookie)).await;
        assert_eq!(list.body["habits"], json!([]));
        let logs = app.get("/api/habits/logs?date=2026-03-01", Some(&cookie)).await;
        assert_eq!(logs.body["logs"], json!([]));
    }

    #[tokio::test]
    async fn create_rejects_blank_and_long_names() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        for name in ["   ".to_string(), "x".repeat(NAME_MAX_CHARS + 1)] {
            let response = app.post("/api/habits", Some(&cookie), json!({"name": name})).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn log_upsert_is_idempotent() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = create(&app, &cookie, "Read", &[]).await;
        let uri = format!("/api/habits/{id}/logs/2026-03-01");

        for completed in [true, false] {
            let response = app
                .send(request(
                    "PUT",
                    &uri,
                    Some(&cookie),
                    Some(json!({"completed": completed, "note": " ok "})),
                ))
                .await;
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body["log"]["id"], format!("{id}_2026-03-01"));
            assert_eq!(response.body["log"]["source"], "manual");
            assert_eq!(response.body["log"]["note"], "ok");
        }

        let logs = app.get("/api/habits/logs?date=2026-03-01", Some(&cookie)).await;
        assert_eq!(logs.body["logs"].as_array().unwrap().len(), 1);
        assert_eq!(logs.body["logs"][0]["completed"], false);
    }

    #[tokio::test]
    async fn log_with_invalid_date_is_bad_request() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let id = create(&app, &cookie, "Read", &[]).await;

        let response = app
            .send(request(
                "PUT",
                &format!("/api/habits/{id}/logs/2026-02-30"),
                Some(&cookie),
                Some(json!({"completed": true})),
            ))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let query = app.get("/api/habits/logs?date=tomorrow", Some(&cookie)).await;
        assert_eq!(query.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn log_for_foreign_habit_is_not_found() {
        let app = TestApp::new();
        let owner = app.cookie_for(&app.create_user("owner@example.com"));
        let other = app.cookie_for(&app.create_user("other@example.com"));
        let id = create(&app, &owner, "Read", &[]).await;

        let response = app
            .send(request(
                "PUT",
                &format!("/api/habits/{id}/logs/2026-03-01"),
                Some(&other),
                Some(json!({"completed": true})),
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn interpret_rejects_blank_transcript() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let response = app
            .post("/api/habits/interpret", Some(&cookie), json!({"transcript": "  "}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interpret_without_provider_uses_keywords() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let run = create(&app, &cookie, "Morning run", &["ran"]).await;
        let water = create(&app, &cookie, "Drink water", &[]).await;
        let read = create(&app, &cookie, "Read", &["book"]).await;

        let response = app
            .post(
                "/api/habits/interpret",
                Some(&cookie),
                json!({"transcript": "I ran 5k but didn't drink water", "date": "2026-03-01"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["method"], "keyword");
        assert_eq!(response.body["logs"][0]["source"], "voice");

        let outcome = completed_by_habit(&response.body);
        assert_eq!(outcome.get(&run), Some(&true));
        assert_eq!(outcome.get(&water), Some(&false));
        assert_eq!(outcome.get(&read), None);

        let stored = app.get("/api/habits/logs?date=2026-03-01", Some(&cookie)).await;
        assert_eq!(stored.body["logs"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn interpret_uses_ai_when_available() {
        let app = TestApp::new();
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        let med = create(&app, &cookie, "Meditate", &[]).await;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response(&format!(
                r#"{{"logs":[{{"habitId":"{med}","completed":true,"note":"10 minutes"}}]}}"#
            )))
            .mount(&server)
            .await;
        let app = app.with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_secs(5))))
        });

        let response = app
            .post(
                "/api/habits/interpret",
                Some(&cookie),
                json!({"transcript": "sat quietly for a while"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["method"], "ai");
        assert_eq!(response.body["logs"][0]["habitId"], med.as_str());
        assert_eq!(response.body["logs"][0]["note"], "10 minutes");
    }

    #[tokio::test]
    async fn interpret_falls_back_when_ai_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_secs(5))))
        });
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        create(&app, &cookie, "Meditate", &["meditated"]).await;

        let response = app
            .post(
                "/api/habits/interpret",
                Some(&cookie),
                json!({"transcript": "I meditated"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["method"], "keyword");
        assert_eq!(response.body["logs"][0]["completed"], true);
    }

    #[tokio::test]
    async fn interpret_timeout_is_gateway_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response("{}").set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_millis(100))))
        });
        let cookie = app.cookie_for(&app.create_user("a@example.com"));
        create(&app, &cookie, "Meditate", &["meditated"]).await;

        let response = app
            .post(
                "/api/habits/interpret",
                Some(&cookie),
                json!({"transcript": "I meditated"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.body["errorType"], "timeout");

        let stored = app.get("/api/habits/logs", Some(&cookie)).await;
        assert_eq!(stored.body["logs"], json!([]));
    }

    #[tokio::test]
    async fn interpret_without_habits_skips_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_response("{}").set_delay(Duration::from_secs(2)))
            .expect(0)
            .mount(&server)
            .await;
        let app = TestApp::new().with_state(|s| {
            s.with_ai(Some(test_client(&server.uri(), Duration::from_millis(100))))
        });
        let cookie = app.cookie_for(&app.create_user("a@example.com"));

        let response = app
            .post(
                "/api/habits/interpret",
                Some(&cookie),
                json!({"transcript": "I meditated"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["logs"], json!([]));
        assert_eq!(response.body["method"], "keyword");
    }
}
