// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ai::AiError;
use crate::storage::{ChallengeTransitionError, StorageError};

/// Handler error, rendered as `{ "success": false, "error": ..., "errorType"? }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_type: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_type: None,
        }
    }

    pub fn with_error_type(mut self, error_type: &'static str) -> Self {
        self.error_type = Some(error_type);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// 500 with a generic message; `detail` is logged, never returned.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal server error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn server_configuration() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error")
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message).with_error_type("timeout")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
            error_type: self.error_type,
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            StorageError::AlreadyExists(what) => {
                ApiError::conflict(format!("{what} already exists"))
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<ChallengeTransitionError> for ApiError {
    fn from(e: ChallengeTransitionError) -> Self {
        ApiError::conflict(e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Timeout(message) => ApiError::gateway_timeout(message),
            AiError::NotConfigured => {
                tracing::error!("AI request attempted without OPENAI_API_KEY");
                ApiError::server_configuration()
            }
            AiError::Upstream { status, message } => {
                tracing::error!(upstream_status = ?status, error = %message, "AI provider error");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AiError::InvalidResponse(detail) => {
                tracing::error!(error = %detail, "Unusable AI response");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI service returned an invalid response",
                )
            }
        }
    }
}
