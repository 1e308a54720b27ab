// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    ai::InterpretMethod,
    models::{Coach, CoachRole, UserSummary},
    state::AppState,
    storage::{
        ChallengeStatus, Difficulty, GoalStatus, LogSource, StoredChallenge, StoredCoachMessage,
        StoredDiaryEntry, StoredGoal, StoredHabit, StoredHabitLog,
    },
};

pub mod auth;
pub mod challenges;
pub mod coach;
pub mod diary;
pub mod envelope;
pub mod goals;
pub mod habits;
pub mod health;
pub mod speech;
pub mod transcribe;

#[cfg(test)]
pub(crate) mod test_support;

pub use envelope::{ApiJson, Empty, Envelope};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/demo", post(auth::demo))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Goals
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/{goal_id}",
            get(goals::get_goal)
                .patch(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/goals/{goal_id}/challenges", get(challenges::list_for_goal))
        // Challenges
        .route("/challenges/generate", post(challenges::generate))
        .route("/challenges/{challenge_id}/complete", post(challenges::complete))
        .route("/challenges/{challenge_id}/skip", post(challenges::skip))
        // Habits
        .route("/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/habits/logs", get(habits::list_logs))
        .route("/habits/interpret", post(habits::interpret))
        .route(
            "/habits/{habit_id}",
            axum::routing::delete(habits::delete_habit),
        )
        .route("/habits/{habit_id}/logs/{date}", put(habits::log_habit))
        // Voice
        .route(
            "/transcribe",
            post(transcribe::transcribe).layer(DefaultBodyLimit::max(transcribe::MAX_AUDIO_BYTES)),
        )
        .route("/diary", get(diary::list_entries).post(diary::create_entry))
        .route("/speech", post(speech::speech))
        // Coaches
        .route("/coach/chat", post(coach::chat))
        .route("/coach/{coach}/messages", get(coach::messages));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::demo,
        auth::logout,
        auth::me,
        goals::list_goals,
        goals::create_goal,
        goals::get_goal,
        goals::update_goal,
        goals::delete_goal,
        challenges::generate,
        challenges::list_for_goal,
        challenges::complete,
        challenges::skip,
        habits::list_habits,
        habits::create_habit,
        habits::delete_habit,
        habits::log_habit,
        habits::list_logs,
        habits::interpret,
        transcribe::transcribe,
        diary::list_entries,
        diary::create_entry,
        speech::speech,
        coach::chat,
        coach::messages,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            UserSummary,
            Coach,
            CoachRole,
            GoalStatus,
            ChallengeStatus,
            Difficulty,
            LogSource,
            InterpretMethod,
            StoredGoal,
            StoredChallenge,
            StoredHabit,
            StoredHabitLog,
            StoredDiaryEntry,
            StoredCoachMessage,
            Empty,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserResponse,
            goals::CreateGoalRequest,
            goals::UpdateGoalRequest,
            goals::GoalResponse,
            goals::GoalListResponse,
            goals::GoalDetailResponse,
            challenges::GenerateChallengesRequest,
            challenges::SkipChallengeRequest,
            challenges::ChallengeListResponse,
            challenges::ChallengeResponse,
            habits::CreateHabitRequest,
            habits::LogHabitRequest,
            habits::InterpretRequest,
            habits::HabitListResponse,
            habits::HabitResponse,
            habits::HabitLogResponse,
            habits::HabitLogListResponse,
            habits::InterpretResponse,
            transcribe::TranscribeForm,
            transcribe::TranscriptResponse,
            diary::CreateDiaryEntryRequest,
            diary::DiaryListResponse,
            diary::DiaryEntryResponse,
            speech::SpeechRequest,
            coach::CoachChatRequest,
            coach::CoachChatResponse,
            coach::CoachHistoryResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Accounts and cookie sessions"),
        (name = "Goals", description = "30-day goals"),
        (name = "Challenges", description = "Daily challenges for a goal"),
        (name = "Habits", description = "Habits, daily logs and spoken check-ins"),
        (name = "Voice", description = "Transcription, voice diary and speech"),
        (name = "Coaches", description = "AI coach conversations"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
