// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Helpers for driving the router in handler tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use super::router;
use crate::auth::{NewSession, PasswordHasher, SessionCodec};
use crate::state::AppState;
use crate::storage::{JsonStorage, StoredUser, UserRepository};

pub const TEST_PASSWORD: &str = "correct horse";

pub struct TestApp {
    pub state: AppState,
    _temp_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = JsonStorage::open(temp_dir.path()).expect("Failed to initialize storage");
        let state = AppState::new(storage, SessionCodec::new("test-secret"))
            .with_hasher(PasswordHasher::new(4));
        Self {
            state,
            _temp_dir: temp_dir,
        }
    }

    pub fn with_state(mut self, f: impl FnOnce(AppState) -> AppState) -> Self {
        self.state = f(self.state);
        self
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Store a user whose password is [`TEST_PASSWORD`].
    pub fn create_user(&self, email: &str) -> StoredUser {
        let user = StoredUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: self.state.hasher().hash(TEST_PASSWORD).unwrap(),
            is_demo: false,
            created_at: Utc::now(),
        };
        UserRepository::new(self.state.storage()).create(&user).unwrap();
        user
    }

    /// `Cookie` header value with a valid session for `user`.
    pub fn cookie_for(&self, user: &StoredUser) -> String {
        let token = self.state.sessions().sign(&NewSession::for_user(user)).unwrap();
        format!("auth_token={token}")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, cookie, None)).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(request("POST", uri, cookie, Some(body))).await
    }
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

impl TestResponse {
    /// The `Set-Cookie` header, if any.
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// `Cookie` header value reusing the session set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        let set_cookie = self.set_cookie()?;
        let pair = set_cookie.split(';').next()?;
        Some(pair.to_string())
    }
}
