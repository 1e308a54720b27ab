// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] loaded once at startup. Nothing else in the crate reads the
//! environment; handlers receive configuration through `AppState`.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory of the document store | `./data` |
//! | `APP_ENV` | `production` enables `Secure` cookies and requires `SESSION_SECRET` | `development` |
//! | `SESSION_SECRET` | HS256 secret for session tokens | Required in production |
//! | `OPENAI_API_KEY` | AI provider key (quotes stripped) | Optional |
//! | `OPENAI_BASE_URL` | AI provider base URL | `https://api.openai.com` |
//! | `OPENAI_CHAT_MODEL` | Chat completion model | `gpt-4o-mini` |
//! | `OPENAI_TRANSCRIBE_MODEL` | Transcription model | `whisper-1` |
//! | `OPENAI_TTS_MODEL` | Text-to-speech model | `tts-1` |
//! | `OPENAI_TTS_VOICE` | Default speech voice | `alloy` |
//! | `AI_TIMEOUT_MS` | Deadline for outbound AI calls | `30000` |
//! | `BCRYPT_COST` | Password hashing work factor | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the document store directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const APP_ENV_ENV: &str = "APP_ENV";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_CHAT_MODEL_ENV: &str = "OPENAI_CHAT_MODEL";
pub const OPENAI_TRANSCRIBE_MODEL_ENV: &str = "OPENAI_TRANSCRIBE_MODEL";
pub const OPENAI_TTS_MODEL_ENV: &str = "OPENAI_TTS_MODEL";
pub const OPENAI_TTS_VOICE_ENV: &str = "OPENAI_TTS_VOICE";
pub const AI_TIMEOUT_MS_ENV: &str = "AI_TIMEOUT_MS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";
pub const DEFAULT_TTS_MODEL: &str = "tts-1";
pub const DEFAULT_TTS_VOICE: &str = "alloy";
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Used only outside production when `SESSION_SECRET` is unset.
const DEVELOPMENT_SESSION_SECRET: &str = "momentum-development-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set when APP_ENV=production")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment flavour. Only affects cookie security and secret requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// AI provider settings. `api_key` is `None` when no usable key was supplied.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub transcribe_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            transcribe_model: DEFAULT_TRANSCRIBE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            timeout: Duration::from_millis(DEFAULT_AI_TIMEOUT_MS),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub environment: Environment,
    pub session_secret: String,
    pub bcrypt_cost: u32,
    pub ai: AiConfig,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var(APP_ENV_ENV).as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => parse_number::<u16>(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                    reason: e.to_string(),
                })?;

        let session_secret = match var(SESSION_SECRET_ENV).map(|s| strip_quotes(&s)) {
            Some(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::Missing(SESSION_SECRET_ENV))
            }
            _ => DEVELOPMENT_SESSION_SECRET.to_string(),
        };

        let bcrypt_cost = match var(BCRYPT_COST_ENV) {
            Some(raw) => {
                let cost = parse_number::<u32>(BCRYPT_COST_ENV, &raw)?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid {
                        name: BCRYPT_COST_ENV,
                        value: raw,
                        reason: "must be between 4 and 31".to_string(),
                    });
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let timeout_ms = match var(AI_TIMEOUT_MS_ENV) {
            Some(raw) => parse_number::<u64>(AI_TIMEOUT_MS_ENV, &raw)?,
            None => DEFAULT_AI_TIMEOUT_MS,
        };

        let base_url = var(OPENAI_BASE_URL_ENV)
            .map(|u| strip_quotes(&u))
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            name: OPENAI_BASE_URL_ENV,
            value: base_url.clone(),
            reason: e.to_string(),
        })?;

        let ai = AiConfig {
            api_key: var(OPENAI_API_KEY_ENV)
                .map(|k| strip_quotes(&k))
                .filter(|k| !k.is_empty()),
            base_url,
            chat_model: var(OPENAI_CHAT_MODEL_ENV).unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            transcribe_model: var(OPENAI_TRANSCRIBE_MODEL_ENV)
                .unwrap_or_else(|| DEFAULT_TRANSCRIBE_MODEL.into()),
            tts_model: var(OPENAI_TTS_MODEL_ENV).unwrap_or_else(|| DEFAULT_TTS_MODEL.into()),
            tts_voice: var(OPENAI_TTS_VOICE_ENV).unwrap_or_else(|| DEFAULT_TTS_VOICE.into()),
            timeout: Duration::from_millis(timeout_ms),
        };

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            environment,
            session_secret,
            bcrypt_cost,
            ai,
            json_logs: var(LOG_FORMAT_ENV)
                .map(|f| f.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

impl AppConfig {
    /// Whether sessions are signed with the built-in development secret.
    pub fn uses_development_secret(&self) -> bool {
        self.session_secret == DEVELOPMENT_SESSION_SECRET
    }
}

/// Trim whitespace and one layer of surrounding `"` or `'` quotes.
///
/// Keys pasted into `.env` files frequently arrive as `"sk-..."`.
pub fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
