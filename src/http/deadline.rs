// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Bounded Fetch
//!
//! Outbound HTTP with a wall-clock deadline.
//!
//! ```text
//! idle ──send──► in-flight ──┬── response ──► completed  (any status)
//!                            ├── deadline ──► timed-out  (FetchError::Timeout)
//!                            └── error ─────► failed     (FetchError::Request, unchanged)
//! ```
//!
//! The deadline is a [`CancellationToken`] fired by a spawned timer. The
//! request races the token; whichever settles first wins, and the timer is
//! disarmed on every exit path. The deadline covers the request up to the
//! response headers. Reading the body is the caller's concern.
//!
//! Nothing here retries. Timeouts and non-2xx statuses are ordinary outcomes
//! the caller must handle.

use std::time::Duration;

use reqwest::{Client, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Deadline applied when the caller does not choose one.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded Fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The deadline elapsed before the response arrived.
    #[error("Request to {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u128 },

    /// Transport failure (connect, DNS, TLS, body read), passed through as-is.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// Non-2xx response from `fetch_json_with_deadline`.
    #[error("HTTP error! status: {}", .status.as_u16())]
    Http { status: StatusCode },

    /// The 2xx body did not match the expected shape.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Armed deadline timer.
///
/// Dropping the guard disarms it. Disarming is idempotent, and disarming a
/// timer that already fired is a no-op.
#[derive(Debug)]
pub struct DeadlineGuard {
    token: CancellationToken,
    timer: Option<JoinHandle<()>>,
}

impl DeadlineGuard {
    /// Start a timer that cancels the guard's token after `timeout`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn arm(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let fire = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            fire.cancel();
        });
        Self {
            token,
            timer: Some(timer),
        }
    }

    /// Token cancelled when the deadline elapses.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether the deadline elapsed before the guard was disarmed.
    pub fn has_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the timer. Returns `true` only for the call that disarmed it.
    pub fn disarm(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Send `request` and wait for its response headers for at most `timeout`.
///
/// The response is returned unchanged whatever its status.
pub async fn fetch_with_deadline(
    client: &Client,
    request: Request,
    timeout: Duration,
) -> Result<Response, FetchError> {
    let target = request.url().to_string();
    let mut guard = DeadlineGuard::arm(timeout);

    let outcome = tokio::select! {
        biased;
        result = client.execute(request) => Some(result),
        _ = guard.token().cancelled() => None,
    };
    guard.disarm();

    match outcome {
        Some(result) => Ok(result?),
        None => {
            tracing::warn!(
                target_url = %target,
                timeout_ms = timeout.as_millis() as u64,
                "Outbound request timed out"
            );
            Err(FetchError::Timeout {
                target,
                timeout_ms: timeout.as_millis(),
            })
        }
    }
}

/// [`fetch_with_deadline`], then require a 2xx status and decode the JSON body.
pub async fn fetch_json_with_deadline<T: DeserializeOwned>(
    client: &Client,
    request: Request,
    timeout: Duration,
) -> Result<T, FetchError> {
    let response = fetch_with_deadline(client, request, timeout).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http { status });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
