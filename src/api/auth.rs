// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account and session endpoints.
//!
//! Successful register, login and demo calls answer with the user summary
//! and set the `auth_token` cookie. Logout clears it.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::envelope::{ApiJson, Empty, Envelope};
use crate::{
    auth::{Auth, NewSession, PasswordHasher},
    demo::ensure_demo_user,
    error::ApiError,
    models::UserSummary,
    state::AppState,
    storage::{normalize_email, StorageError, StoredUser, UserRepository},
};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

const DISPLAY_NAME_MAX_CHARS: usize = 80;

/// Longest address a mail system will deliver to (RFC 5321 path limit).
const EMAIL_MAX_CHARS: usize = 254;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Defaults to the part of the email before `@`.
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user: UserSummary,
}

/// Loose syntactic check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Run bcrypt off the async workers.
async fn hash_password(hasher: PasswordHasher, password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

async fn verify_password(hasher: PasswordHasher, password: String, digest: String) -> bool {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
        .await
        .unwrap_or(false)
}

/// Answer with the user summary and a fresh session cookie.
fn session_response(state: &AppState, user: &StoredUser) -> Result<Response, ApiError> {
    let token = state
        .sessions()
        .sign(&NewSession::for_user(user))
        .map_err(ApiError::internal)?;
    let cookie = state
        .cookies()
        .set_cookie_header(&token)
        .ok_or_else(|| ApiError::internal("session cookie is not a valid header value"))?;

    let body = Envelope::ok(UserResponse {
        user: UserSummary::from(user),
    });
    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Create an account and start a session.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, session cookie set", body = UserResponse),
        (status = 400, description = "Invalid email, short password or malformed body"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Email must be at most {EMAIL_MAX_CHARS} characters"
        )));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    if display_name.chars().count() > DISPLAY_NAME_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Display name must be at most {DISPLAY_NAME_MAX_CHARS} characters"
        )));
    }

    let users = UserRepository::new(state.storage());
    let already_exists = || ApiError::conflict("An account with this email already exists");
    if users.find_by_email(&email)?.is_some() {
        return Err(already_exists());
    }

    let password_hash = hash_password(*state.hasher(), request.password).await?;
    let user = StoredUser {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        display_name,
        password_hash,
        is_demo: false,
        created_at: Utc::now(),
    };
    match users.create(&user) {
        Ok(()) => {}
        // Lost a race with a concurrent registration.
        Err(StorageError::AlreadyExists(_)) => return Err(already_exists()),
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, "Registered new account");
    session_response(&state, &user)
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = UserResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid credentials");

    let user = UserRepository::new(state.storage())
        .find_by_email(&request.email)?
        .ok_or_else(invalid)?;

    let hasher = *state.hasher();
    if !verify_password(hasher, request.password, user.password_hash.clone()).await {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    session_response(&state, &user)
}

/// Start a session on the shared demo account.
///
/// The account and its sample data are created on first use.
#[utoipa::path(
    post,
    path = "/api/auth/demo",
    tag = "Auth",
    responses(
        (status = 200, description = "Demo session cookie set", body = UserResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn demo(State(state): State<AppState>) -> Result<Response, ApiError> {
    let storage = state.storage().clone();
    let hasher = *state.hasher();
    let user = tokio::task::spawn_blocking(move || ensure_demo_user(&storage, &hasher))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    session_response(&state, &user)
}

/// End the session by clearing the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared", body = Empty))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let body = Envelope::ok(Empty::default());
    match state.cookies().delete_cookie_header() {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
        None => body.into_response(),
    }
}

/// The account behind the current session.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn me(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<axum::Json<Envelope<UserResponse>>, ApiError> {
    let user = UserRepository::new(state.storage()).get(&session.user_id)?;
    Ok(Envelope::ok(UserResponse {
        user: UserSummary::from(&user),
    }))
}
