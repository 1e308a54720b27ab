// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require a session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Place `Auth` before any body extractor so that a request without a
//! session is answered with 401 before its body is validated.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{cookie::extract_cookie, AuthError, AuthenticatedUser, SessionVerdict, SESSION_COOKIE};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Reads the `auth_token` cookie and verifies it with the session codec held
/// in `AppState`.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_goals(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Envelope<GoalList>>, ApiError> {
///     // user.user_id contains the authenticated user's ID
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved earlier in this request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = extract_cookie(&parts.headers, SESSION_COOKIE)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingSession)?;

        match state.sessions().verify(&token) {
            SessionVerdict::Valid(claims) => {
                let user = AuthenticatedUser::from(claims);
                parts.extensions.insert(user.clone());
                Ok(Auth(user))
            }
            SessionVerdict::Invalid => Err(AuthError::InvalidSession),
        }
    }
}
