// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// All variants are answered with the same `401 Unauthorized` body; the
/// variant is only visible in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `auth_token` cookie present
    MissingSession,
    /// Token is malformed, forged or expired
    InvalidSession,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: &'static str,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSession => "missing_session",
            AuthError::InvalidSession => "invalid_session",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSession => write!(f, "Session cookie is required"),
            AuthError::InvalidSession => write!(f, "Session token is invalid or expired"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = self.error_code(), "Rejected unauthenticated request");
        let body = Json(AuthErrorBody {
            success: false,
            error: "Unauthorized",
        });
        (self.status_code(), body).into_response()
    }
}
