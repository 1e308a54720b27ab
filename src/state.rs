// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::ai::OpenAiClient;
use crate::auth::{CookieConfig, PasswordHasher, SessionCodec};
use crate::config::AppConfig;
use crate::storage::JsonStorage;

/// Shared application state.
///
/// Everything a handler needs is constructed once (in `main`, or per test)
/// and passed in here; nothing is read from globals.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<JsonStorage>,
    sessions: Arc<SessionCodec>,
    hasher: PasswordHasher,
    cookies: CookieConfig,
    ai: Option<Arc<OpenAiClient>>,
}

impl AppState {
    /// State with development defaults: no AI provider, non-secure cookie,
    /// default bcrypt cost.
    pub fn new(storage: JsonStorage, sessions: SessionCodec) -> Self {
        let cookies = CookieConfig::new(false, sessions.ttl_secs());
        Self {
            storage: Arc::new(storage),
            sessions: Arc::new(sessions),
            hasher: PasswordHasher::default(),
            cookies,
            ai: None,
        }
    }

    /// Build the production state from configuration.
    pub fn from_config(config: &AppConfig, storage: JsonStorage) -> Self {
        Self::new(storage, SessionCodec::new(&config.session_secret))
            .with_hasher(PasswordHasher::new(config.bcrypt_cost))
            .with_secure_cookies(config.environment.is_production())
            .with_ai(OpenAiClient::from_config(&config.ai))
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.cookies.secure = secure;
        self
    }

    pub fn with_ai(mut self, client: Option<OpenAiClient>) -> Self {
        self.ai = client.map(Arc::new);
        self
    }

    pub fn storage(&self) -> &JsonStorage {
        &self.storage
    }

    pub fn sessions(&self) -> &SessionCodec {
        &self.sessions
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn cookies(&self) -> &CookieConfig {
        &self.cookies
    }

    /// The AI client, or `None` when no API key is configured.
    pub fn ai(&self) -> Option<&OpenAiClient> {
        self.ai.as_deref()
    }
}
