// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # AI Integration
//!
//! Content generation backed by an OpenAI-compatible API:
//!
//! - **Challenges**: daily challenges for a goal (`challenges`)
//! - **Habit check-ins**: spoken check-ins mapped to habit logs (`interpret`)
//! - **Coaches**: persona chat (`coach`)
//! - **Voice**: transcription and speech synthesis (`openai`)
//!
//! Every provider call goes through Bounded Fetch, so a slow provider
//! surfaces as [`AiError::Timeout`] rather than a hung request.

pub mod challenges;
pub mod coach;
pub mod interpret;
pub mod openai;

pub use challenges::{default_suggestions, generate_challenges, ChallengeSuggestion};
pub use coach::{build_coach_messages, coach_reply, COACH_HISTORY_LIMIT};
pub use interpret::{
    AiInterpreter, HabitInterpreter, InterpretMethod, InterpretedLog, KeywordInterpreter,
};
pub use openai::{ChatMessage, OpenAiClient};

use crate::http::FetchError;

/// AI call failure.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No API key is configured for a feature without a fallback.
    #[error("AI provider is not configured")]
    NotConfigured,

    /// The provider did not answer before the deadline.
    #[error("{0}")]
    Timeout(String),

    /// The provider answered with an error, or could not be reached.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// The provider answered 2xx but the content was unusable.
    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AiError::Timeout(_))
    }
}

impl From<FetchError> for AiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout { .. } => AiError::Timeout(e.to_string()),
            FetchError::Request(inner) => AiError::Upstream {
                status: inner.status().map(|s| s.as_u16()),
                message: format!("AI request failed: {inner}"),
            },
            FetchError::Http { status } => AiError::Upstream {
                status: Some(status.as_u16()),
                message: e.to_string(),
            },
            FetchError::Decode(inner) => AiError::InvalidResponse(inner.to_string()),
        }
    }
}

/// Extract the JSON object from model output that may be wrapped in a
/// Markdown code fence.
pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
